//! Macro for implementing Display and FromStr for label enums
//!
//! Error kinds and operation kinds travel as lowercase labels in logs and
//! notification events. This macro keeps the label mapping in one place and
//! makes parsing case-insensitive.
//!
//! # Example
//!
//! ```rust
//! use archivist_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum DocumentState {
//!     Draft,
//!     Submitted,
//!     Received,
//! }
//!
//! impl_domain_status_conversions!(DocumentState {
//!     Draft => "draft",
//!     Submitted => "submitted",
//!     Received => "received",
//! });
//!
//! assert_eq!(DocumentState::Draft.to_string(), "draft");
//! assert_eq!("RECEIVED".parse::<DocumentState>(), Ok(DocumentState::Received));
//! ```

/// Implements Display and FromStr traits for label enums
///
/// This macro generates:
/// - Display trait: converts enum variants to their label
/// - FromStr trait: parses case-insensitive strings to enum variants
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase label
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
