//! Response cache keys
//!
//! The store itself lives in infrastructure; key derivation is pure and
//! shared by every caller.

pub mod key;
