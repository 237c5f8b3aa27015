use serde::{Deserialize, Serialize};

/// Handle returned by the file store after persisting a downloaded attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// Filename taken from the `Content-Disposition` header
    pub filename: String,
    /// Store-specific location (path, object key, ...)
    pub location: String,
    pub size: u64,
}
