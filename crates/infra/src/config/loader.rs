//! Configuration loader
//!
//! Loads the archive client configuration from environment variables or
//! files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `ARCHIVE_BASE_URL` is missing or a value is invalid, falls back to
//!    loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `ARCHIVE_BASE_URL`: Archive base URL (required)
//! - `ARCHIVE_VERSION`: API version segment (default `v1`)
//! - `ARCHIVE_API_KEY`: Service API key
//! - `ARCHIVE_SERVICE`: Owning service name
//! - `ARCHIVE_USE_TOKEN_AUTH`: Enable per-user token auth (true/false)
//! - `ARCHIVE_TOKEN_NAME`: Name of the user token to request
//! - `ARCHIVE_ADMIN_ROLES`: Comma-separated admin roles
//! - `ARCHIVE_USER_ROLES`: Comma-separated archive-user roles
//! - `ARCHIVE_MAX_PAGES`: Page bound for paginated calls
//! - `APP_ENV`: Environment name (`local` enables host rewriting)
//! - `ARCHIVE_USE_CACHE`: Enable the response cache (true/false)
//! - `ARCHIVE_CACHE_TTL_SECONDS`: Optional cache entry lifetime
//! - `ARCHIVE_TIMEOUT_SECONDS`: HTTP timeout
//! - `ARCHIVE_LOCAL_HOST_FROM` / `ARCHIVE_LOCAL_HOST_TO`: Host rewrite pair
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./archivist.json` or `./archivist.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. `../archivist.json` or `../archivist.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use archivist_domain::{ArchiveConfig, ArchiveError, HostRewrite, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the base URL is
/// missing or a value fails to parse, falls back to a config file.
///
/// # Errors
/// Returns `ArchiveError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<ArchiveConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Archive configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `ARCHIVE_BASE_URL` is required; everything else falls back to the
/// [`ArchiveConfig`] defaults.
///
/// # Errors
/// Returns `ArchiveError::Config` if the base URL is missing, a numeric
/// variable does not parse, or validation fails.
pub fn load_from_env() -> Result<ArchiveConfig> {
    let defaults = ArchiveConfig::default();

    let local_host_rewrite = match (
        optional_env("ARCHIVE_LOCAL_HOST_FROM"),
        optional_env("ARCHIVE_LOCAL_HOST_TO"),
    ) {
        (Some(from), Some(to)) => Some(HostRewrite { from, to }),
        _ => None,
    };

    let config = ArchiveConfig {
        base_url: env_var("ARCHIVE_BASE_URL")?,
        version: optional_env("ARCHIVE_VERSION").unwrap_or(defaults.version),
        api_key: optional_env("ARCHIVE_API_KEY").unwrap_or_default(),
        service_name: optional_env("ARCHIVE_SERVICE"),
        admin_roles: env_list("ARCHIVE_ADMIN_ROLES"),
        user_roles: env_list("ARCHIVE_USER_ROLES"),
        use_token_auth: env_bool("ARCHIVE_USE_TOKEN_AUTH", false),
        token_name: optional_env("ARCHIVE_TOKEN_NAME"),
        max_pages: env_parse("ARCHIVE_MAX_PAGES")?.unwrap_or(defaults.max_pages),
        environment: optional_env("APP_ENV").unwrap_or_default(),
        use_cache: env_bool("ARCHIVE_USE_CACHE", false),
        cache_ttl_secs: env_parse("ARCHIVE_CACHE_TTL_SECONDS")?,
        timeout_secs: env_parse("ARCHIVE_TIMEOUT_SECONDS")?.unwrap_or(defaults.timeout_secs),
        local_host_rewrite,
        attachment_prefix: defaults.attachment_prefix,
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `ArchiveError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ArchiveConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ArchiveError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ArchiveError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading archive configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ArchiveError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ArchiveConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ArchiveError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ArchiveError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ArchiveError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 6] = [
        "archivist.json",
        "archivist.toml",
        "config.json",
        "config.toml",
        "../archivist.json",
        "../archivist.toml",
    ];

    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(NAMES.iter().map(|name| cwd.join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `ArchiveError::Config` if the variable is not set or empty.
fn env_var(key: &str) -> Result<String> {
    optional_env(key).ok_or_else(|| {
        ArchiveError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Environment variable, treating empty values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ArchiveError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Comma-separated list, ignoring blanks.
fn env_list(key: &str) -> Vec<String> {
    optional_env(key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|role| !role.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
