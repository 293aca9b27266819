//! credhash — salted PBKDF2 password credentials.
//!
//! Hashes passwords with PBKDF2-HMAC-SHA256 under a fresh random salt,
//! verifies candidates against a stored (hash, salt) pair, and carries the
//! account plumbing around it: user records, a persistent store, and
//! register/login/password-change flows.
//!
//! ```no_run
//! use credhash::{PasswordHasher, Pbkdf2Hasher};
//!
//! let hasher = Pbkdf2Hasher::default();
//! let (hash, salt) = hasher.hash_password("Tr0ub4dor&3")?;
//! assert!(hasher.verify_password("Tr0ub4dor&3", &hash, salt.as_bytes()));
//! # Ok::<(), credhash::CredentialError>(())
//! ```

pub mod account;
pub mod auth;
pub mod config;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod events;
pub mod hasher;
pub mod storage;

// Re-export primary types
pub use account::{AccountId, AccountInfo, UserAccount};
pub use auth::Authenticator;
pub use config::HasherParams;
pub use credential::{Credential, Salt};
pub use error::{CredentialError, Result};
pub use events::AccountEvent;
pub use hasher::{PasswordHasher, Pbkdf2Hasher};
pub use storage::{AccountStore, FileAccountStore, MemoryAccountStore};
