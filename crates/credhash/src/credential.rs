//! Stored credentials.
//!
//! A [`Credential`] is the (hash, salt) pair kept for one account in place of
//! its password. Credentials are immutable: a password change or reset
//! builds a new one and replaces the old value wholesale.
//!
//! JSON form:
//! ```json
//! { "hash": "<base64 derived key>", "salt": "<base64 salt bytes>" }
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{CredentialError, Result};
use crate::hasher::PasswordHasher;

// ── Salt ──────────────────────────────────────────────────────────────────────

/// Raw salt bytes. Serialized as base64.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Salt(#[serde(with = "base64_bytes")] Vec<u8>);

impl Salt {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Parse a base64-encoded salt.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        STANDARD
            .decode(encoded.trim())
            .map(Self)
            .map_err(|e| CredentialError::InvalidCredential(format!("invalid base64 salt: {e}")))
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Salt {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Salt {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Salt({})", hex::encode(&self.0))
    }
}

impl std::fmt::Display for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}

// ── Credential ────────────────────────────────────────────────────────────────

/// A password hash and the salt it was derived with.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CredentialRecord")]
pub struct Credential {
    hash: String,
    salt: Salt,
}

/// Unvalidated shape read from storage.
#[derive(Deserialize)]
struct CredentialRecord {
    hash: String,
    salt: Salt,
}

impl TryFrom<CredentialRecord> for Credential {
    type Error = CredentialError;

    fn try_from(record: CredentialRecord) -> Result<Self> {
        Self::from_parts(record.hash, record.salt)
    }
}

impl Credential {
    /// Hash a new password into a credential.
    ///
    /// # Errors
    ///
    /// Propagates `CredentialError::RandomSource` from the hasher.
    pub fn create<H: PasswordHasher + ?Sized>(hasher: &H, password: &str) -> Result<Self> {
        let (hash, salt) = hasher.hash_password(password)?;
        Ok(Self { hash, salt })
    }

    /// Rebuild a credential from stored parts.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::InvalidCredential` if the hash is empty or
    /// not base64, or the salt is empty.
    pub fn from_parts(hash: String, salt: Salt) -> Result<Self> {
        if hash.is_empty() {
            return Err(CredentialError::InvalidCredential("hash is empty".into()));
        }
        if salt.is_empty() {
            return Err(CredentialError::InvalidCredential("salt is empty".into()));
        }
        STANDARD.decode(&hash).map_err(|e| {
            CredentialError::InvalidCredential(format!("hash is not valid base64: {e}"))
        })?;
        Ok(Self { hash, salt })
    }

    /// Check `password` against this credential.
    pub fn verify<H: PasswordHasher + ?Sized>(&self, hasher: &H, password: &str) -> bool {
        hasher.verify_password(password, &self.hash, self.salt.as_bytes())
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn salt(&self) -> &Salt {
        &self.salt
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("hash", &"<redacted>")
            .field("salt", &self.salt)
            .finish()
    }
}
