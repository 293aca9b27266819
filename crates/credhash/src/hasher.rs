//! Password hashing and verification.
//!
//! [`Pbkdf2Hasher`] turns a plaintext password into a base64 PBKDF2 hash plus
//! the fresh random salt it was derived with, and later checks a candidate
//! password against that pair. The plaintext is never stored or logged.
//!
//! Hashing is deterministic only for a fixed (password, salt) pair: every
//! call to [`PasswordHasher::hash_password`] draws a new salt, so two hashes
//! of the same password differ.

use crate::config::HasherParams;
use crate::credential::Salt;
use crate::crypto::derivation::{constant_time_eq, decode_key, derive_key, encode_key};
use crate::crypto::random::random_salt;
use crate::error::Result;

/// Hash and verify passwords.
///
/// Implementations are stateless apart from their fixed parameters and may
/// be shared freely between threads.
pub trait PasswordHasher: Send + Sync {
    /// Hash `password` with a freshly generated salt.
    ///
    /// Returns the encoded hash and the raw salt. Emptiness of `password` is
    /// not checked here; callers validate input.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::RandomSource` if no salt could be drawn.
    fn hash_password(&self, password: &str) -> Result<(String, Salt)>;

    /// Return `true` iff `password`, derived with `salt`, equals `hash`.
    ///
    /// A wrong password and a corrupt stored hash both yield `false`.
    fn verify_password(&self, password: &str, hash: &str, salt: &[u8]) -> bool;
}

/// PBKDF2-HMAC-SHA256 password hasher.
#[derive(Debug, Clone, Default)]
pub struct Pbkdf2Hasher {
    params: HasherParams,
}

impl Pbkdf2Hasher {
    /// Create a hasher with validated parameters.
    pub fn new(params: HasherParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// The parameters this hasher derives with.
    pub fn params(&self) -> &HasherParams {
        &self.params
    }

    /// Derive the encoded hash of `password` under a caller-supplied salt.
    pub fn hash_with_salt(&self, password: &str, salt: &[u8]) -> String {
        let key = derive_key(
            password.as_bytes(),
            salt,
            self.params.iterations,
            self.params.key_len,
        );
        encode_key(&key)
    }
}

impl PasswordHasher for Pbkdf2Hasher {
    fn hash_password(&self, password: &str) -> Result<(String, Salt)> {
        let salt = Salt::from(random_salt(self.params.salt_len)?);
        let hash = self.hash_with_salt(password, salt.as_bytes());
        Ok((hash, salt))
    }

    fn verify_password(&self, password: &str, hash: &str, salt: &[u8]) -> bool {
        if hash.is_empty() || salt.is_empty() {
            return false;
        }

        let stored = match decode_key(hash) {
            Ok(stored) => stored,
            Err(e) => {
                log::debug!("rejecting stored hash: {e}");
                return false;
            }
        };

        let candidate = derive_key(
            password.as_bytes(),
            salt,
            self.params.iterations,
            self.params.key_len,
        );
        constant_time_eq(&candidate, &stored)
    }
}
