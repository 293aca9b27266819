//! Account persistence.
//!
//! # Directory layout
//!
//! By convention the default root is `~/.credhash/`:
//!
//! ```text
//! ~/.credhash/
//! ├── params.json            — hasher parameters the accounts were created with
//! ├── accounts/
//! │   └── {account_id}.json
//! └── index/
//!     ├── username/{sha256}  — holds the ID of the account using that username
//!     └── email/{sha256}     — same, keyed by lowercased email
//! ```
//!
//! # Modules
//!
//! - [`account_store`] — the [`AccountStore`] trait and its JSON-file backend.
//! - [`memory_store`] — an in-process backend for tests and embedders.

pub mod account_store;
pub mod memory_store;

pub use account_store::{AccountStore, FileAccountStore};
pub use memory_store::MemoryAccountStore;

use crate::error::CredentialError;

/// Key under which an email is unique: trimmed and lowercased.
pub(crate) fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn username_taken_reason(username: &str) -> String {
    format!("username already registered: {username}")
}

pub(crate) fn username_taken(username: &str) -> CredentialError {
    CredentialError::AlreadyExists(username_taken_reason(username))
}

pub(crate) fn email_taken(email: &str) -> CredentialError {
    CredentialError::AlreadyExists(format!("email already registered: {email}"))
}
