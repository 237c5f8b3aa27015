//! Archive client configuration loading
//!
//! `ArchiveConfig` itself lives in `archivist-domain`; this module fills it
//! from `ARCHIVE_*` environment variables or a JSON/TOML file.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
