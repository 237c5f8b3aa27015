//! Authentication header resolution
//!
//! Every archive call is authenticated either with the service API key or
//! with a per-user bearer token. [`AuthResolver::resolve`] picks one for a
//! single call and returns it as an [`AuthHeaders`] value; nothing is stored
//! on the resolver, so one instance can serve concurrent callers.

pub mod ports;

use std::fmt;
use std::sync::Arc;

use archivist_domain::constants::{API_KEY_HEADER, AUTHORIZATION_HEADER};
use archivist_domain::{ArchiveConfig, ArchiveError, Result};
use tracing::{debug, instrument, warn};

use self::ports::TokenProvider;

/// How credentials for one call are chosen
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AuthMode {
    /// Role-based selection
    #[default]
    Resolve,
    /// Always use the service API key (administrative operations)
    ForceApiKey,
    /// Use the given bearer token as-is
    Token(String),
}

impl AuthMode {
    const fn label(&self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::ForceApiKey => "api_key",
            Self::Token(_) => "token",
        }
    }
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Credential headers for a single call
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthHeaders {
    api_key: Option<String>,
    bearer: Option<String>,
}

impl AuthHeaders {
    pub fn api_key(key: impl Into<String>) -> Self {
        Self { api_key: Some(key.into()), bearer: None }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self { api_key: None, bearer: Some(token.into()) }
    }

    /// No credentials; the archive decides what an anonymous call may do.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.is_none() && self.bearer.is_none()
    }

    pub const fn uses_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub const fn uses_bearer(&self) -> bool {
        self.bearer.is_some()
    }

    /// Header name/value pairs to send.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(1);
        if let Some(key) = &self.api_key {
            pairs.push((API_KEY_HEADER, key.clone()));
        }
        if let Some(token) = &self.bearer {
            pairs.push((AUTHORIZATION_HEADER, format!("Bearer {token}")));
        }
        pairs
    }

    /// Merge into request-specific headers.
    ///
    /// Any existing `Authorization` or `X-Api-Key` entry (compared
    /// case-insensitively) is replaced when these headers set that name.
    /// Everything else is kept.
    pub fn merge_into(&self, headers: &mut Vec<(String, String)>) {
        let pairs = self.pairs();
        headers.retain(|(name, _)| !pairs.iter().any(|(own, _)| own.eq_ignore_ascii_case(name)));
        headers.extend(pairs.into_iter().map(|(name, value)| (name.to_string(), value)));
    }
}

impl fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthHeaders")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Picks API key or bearer token credentials per call
pub struct AuthResolver {
    api_key: String,
    admin_roles: Vec<String>,
    user_roles: Vec<String>,
    use_token_auth: bool,
    token_name: Option<String>,
    tokens: Arc<dyn TokenProvider>,
}

impl AuthResolver {
    pub fn new(config: &ArchiveConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            api_key: config.api_key.clone(),
            admin_roles: config.admin_roles.clone(),
            user_roles: config.user_roles.clone(),
            use_token_auth: config.use_token_auth,
            token_name: config.token_name().map(str::to_string),
            tokens,
        }
    }

    /// Resolve credentials for one call.
    ///
    /// Order of precedence:
    /// 1. [`AuthMode::ForceApiKey`] uses the API key.
    /// 2. [`AuthMode::Token`] uses the given bearer token.
    /// 3. With token auth disabled, the API key is used.
    /// 4. Callers with an admin role use the API key.
    /// 5. Callers with an archive-user role use the configured named token.
    ///    A token missing from the provider yields empty headers and a
    ///    warning.
    /// 6. Anyone else is refused.
    ///
    /// # Errors
    /// - `ArchiveError::AuthConfiguration` when a user token is needed but no
    ///   token name is configured
    /// - `ArchiveError::Authorization` when the caller holds no usable role
    /// - any error from the token provider, such as `TokenExpired`
    #[instrument(skip(self))]
    pub async fn resolve(&self, mode: &AuthMode) -> Result<AuthHeaders> {
        match mode {
            AuthMode::ForceApiKey => return Ok(self.api_key_headers()),
            AuthMode::Token(token) => return Ok(AuthHeaders::bearer(token.clone())),
            AuthMode::Resolve => {}
        }

        if !self.use_token_auth {
            return Ok(self.api_key_headers());
        }

        let roles = self.tokens.current_caller_roles().await?;

        if has_allowed_role(&self.admin_roles, &roles) {
            debug!("admin caller, using API key");
            return Ok(self.api_key_headers());
        }

        if has_allowed_role(&self.user_roles, &roles) {
            let token_name = self.token_name.as_deref().ok_or_else(|| {
                ArchiveError::AuthConfiguration(
                    "token authentication is enabled but no token name is configured".into(),
                )
            })?;

            let tokens = self.tokens.access_tokens().await?;
            return Ok(match tokens.get(token_name) {
                Some(token) => AuthHeaders::bearer(token.clone()),
                None => {
                    warn!(token_name, "access token not available for caller");
                    AuthHeaders::none()
                }
            });
        }

        Err(ArchiveError::Authorization("caller is not externally authenticated".into()))
    }

    fn api_key_headers(&self) -> AuthHeaders {
        AuthHeaders::api_key(self.api_key.clone())
    }
}

/// True when the two role sets share at least one role.
pub fn has_allowed_role(allowed: &[String], user_roles: &[String]) -> bool {
    allowed.iter().any(|role| user_roles.contains(role))
}
