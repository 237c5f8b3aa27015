//! Rewriting of pagination links
//!
//! Local development stacks reach the archive through a gateway whose
//! hostname differs from the public one the archive embeds in `next` links.

use std::sync::Arc;

use archivist_domain::ArchiveConfig;

/// Strategy applied to every `next` link before it is followed
pub trait UrlRewriter: Send + Sync {
    fn rewrite(&self, url: &str) -> String;
}

/// Leaves links untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRewriter;

impl UrlRewriter for IdentityRewriter {
    fn rewrite(&self, url: &str) -> String {
        url.to_string()
    }
}

/// Replaces the first occurrence of one hostname fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRewriter {
    from: String,
    to: String,
}

impl HostRewriter {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}

impl UrlRewriter for HostRewriter {
    fn rewrite(&self, url: &str) -> String {
        if self.from.is_empty() {
            return url.to_string();
        }
        url.replacen(&self.from, &self.to, 1)
    }
}

/// Host substitution in local environments with a configured rewrite,
/// identity everywhere else.
pub fn rewriter_for(config: &ArchiveConfig) -> Arc<dyn UrlRewriter> {
    match (&config.local_host_rewrite, config.is_local()) {
        (Some(rewrite), true) => Arc::new(HostRewriter::new(&rewrite.from, &rewrite.to)),
        _ => Arc::new(IdentityRewriter),
    }
}

#[cfg(test)]
mod tests {
    use archivist_domain::HostRewrite;

    use super::*;

    const NEXT: &str = "https://archive.example.com/v1/documents/?page=2";

    #[test]
    fn host_fragment_is_replaced_once() {
        let rewriter = HostRewriter::new("archive.example.com", "archive.gateway.local");
        assert_eq!(rewriter.rewrite(NEXT), "https://archive.gateway.local/v1/documents/?page=2");
    }

    #[test]
    fn rewriting_only_applies_in_local_environment() {
        let mut config = ArchiveConfig {
            local_host_rewrite: Some(HostRewrite {
                from: "archive.example.com".into(),
                to: "localhost:8080".into(),
            }),
            environment: "production".into(),
            ..Default::default()
        };
        assert_eq!(rewriter_for(&config).rewrite(NEXT), NEXT);

        config.environment = "local".into();
        assert_eq!(rewriter_for(&config).rewrite(NEXT), "https://localhost:8080/v1/documents/?page=2");
    }
}
