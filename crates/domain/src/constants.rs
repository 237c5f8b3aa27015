//! Archive client constants
//!
//! Centralized location for wire names and defaults shared by the client
//! crates.

// Defaults
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_MAX_PAGES: u32 = 10;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ATTACHMENT_PREFIX: &str = "attachments";
pub const LOCAL_ENVIRONMENT: &str = "local";

// Header names
pub const API_KEY_HEADER: &str = "X-Api-Key";
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const CONTENT_DISPOSITION_HEADER: &str = "Content-Disposition";

// Query and payload keys
pub const LOOKFOR_PARAM: &str = "lookfor";
pub const TRANSACTION_ID_PARAM: &str = "transaction_id";
pub const SERVICE_NAME_PARAM: &str = "service_name";
pub const USER_ID_FIELD: &str = "user_id";

// Endpoints
pub const DOCUMENTS_ENDPOINT: &str = "documents";
pub const USER_DOCUMENTS_ENDPOINT: &str = "userdocuments";
pub const GDPR_ENDPOINT: &str = "gdpr-api";

/// Component name attached to exception notifications.
pub const NOTIFICATION_COMPONENT: &str = "archivist";
