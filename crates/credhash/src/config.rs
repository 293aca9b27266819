//! Hasher configuration.
//!
//! [`HasherParams`] fixes the PBKDF2 cost and output sizes. The same
//! parameters must be used to verify a credential as were used to create
//! it, so stores persist them alongside their records.
//!
//! Parameters come from, in increasing precedence:
//! 1. [`HasherParams::default`] (100 000 iterations, 16-byte salt, 32-byte key)
//! 2. a JSON file (`HasherParams::from_file`)
//! 3. `CREDHASH_ITERATIONS`, `CREDHASH_SALT_LEN`, `CREDHASH_KEY_LEN`

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CredentialError, Result};

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;
/// Default salt length in bytes (128 bits).
pub const DEFAULT_SALT_LEN: usize = 16;
/// Default derived key length in bytes (256 bits).
pub const DEFAULT_KEY_LEN: usize = 32;

const MIN_SALT_LEN: usize = 8;
const MIN_KEY_LEN: usize = 16;
const MAX_KEY_LEN: usize = 64;

pub const ENV_ITERATIONS: &str = "CREDHASH_ITERATIONS";
pub const ENV_SALT_LEN: &str = "CREDHASH_SALT_LEN";
pub const ENV_KEY_LEN: &str = "CREDHASH_KEY_LEN";

/// PBKDF2-HMAC-SHA256 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherParams {
    /// Number of PBKDF2 rounds.
    pub iterations: u32,
    /// Length of freshly generated salts, in bytes.
    pub salt_len: usize,
    /// Length of the derived key, in bytes.
    pub key_len: usize,
}

impl Default for HasherParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            salt_len: DEFAULT_SALT_LEN,
            key_len: DEFAULT_KEY_LEN,
        }
    }
}

impl HasherParams {
    /// Check the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::InvalidParameters` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(CredentialError::InvalidParameters(
                "iterations must be at least 1".into(),
            ));
        }
        if self.salt_len < MIN_SALT_LEN {
            return Err(CredentialError::InvalidParameters(format!(
                "salt_len must be at least {MIN_SALT_LEN} bytes, got {}",
                self.salt_len
            )));
        }
        if !(MIN_KEY_LEN..=MAX_KEY_LEN).contains(&self.key_len) {
            return Err(CredentialError::InvalidParameters(format!(
                "key_len must be between {MIN_KEY_LEN} and {MAX_KEY_LEN} bytes, got {}",
                self.key_len
            )));
        }
        Ok(())
    }

    /// Load parameters from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Io` if the file cannot be read,
    /// `CredentialError::InvalidFileFormat` if it is not valid JSON, or
    /// `CredentialError::InvalidParameters` if validation fails.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let params: Self = serde_json::from_slice(&bytes).map_err(|e| {
            CredentialError::InvalidFileFormat(format!(
                "failed to parse hasher params {}: {e}",
                path.display()
            ))
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup, then validate.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::InvalidParameters` if a value does not parse
    /// or the result fails validation.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_ITERATIONS) {
            self.iterations = parse_var(ENV_ITERATIONS, &v)?;
        }
        if let Some(v) = lookup(ENV_SALT_LEN) {
            self.salt_len = parse_var(ENV_SALT_LEN, &v)?;
        }
        if let Some(v) = lookup(ENV_KEY_LEN) {
            self.key_len = parse_var(ENV_KEY_LEN, &v)?;
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CredentialError::InvalidParameters(format!("{name} is not a valid number: {value:?}"))
    })
}
