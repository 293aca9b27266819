//! Error types for credhash.
//!
//! All errors are strongly typed and propagated without panicking.
//! Plaintext passwords and derived keys are never included in error messages.
//!
//! A password that does not match is not an error: verification returns
//! `false` and login returns `None`.

/// Credential error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Secure random source failed: {0}")]
    RandomSource(String),

    #[error("Invalid hasher parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CredentialError>;
