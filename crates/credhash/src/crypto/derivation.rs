//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! Stretches a password and salt into a fixed-length key (RFC 8018).
//! Derived keys are held in zeroizing buffers and only leave this module
//! as base64 text.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{CredentialError, Result};

/// Derive `key_len` bytes from `password` and `salt` with `iterations`
/// rounds of PBKDF2-HMAC-SHA256.
pub fn derive_key(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    key_len: usize,
) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(vec![0u8; key_len]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    key
}

/// Encode a derived key as standard padded base64.
pub fn encode_key(key: &[u8]) -> String {
    STANDARD.encode(key)
}

/// Decode a base64 key produced by [`encode_key`].
pub fn decode_key(encoded: &str) -> Result<Zeroizing<Vec<u8>>> {
    STANDARD
        .decode(encoded)
        .map(Zeroizing::new)
        .map_err(|e| CredentialError::InvalidCredential(format!("invalid base64 hash: {e}")))
}

/// Compare two byte strings without short-circuiting on the first
/// differing byte. Lengths are not secret.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
