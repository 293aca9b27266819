//! Secure random number generation.
//!
//! Reads directly from the operating system's cryptographic random source.
//! A failing source is reported as [`CredentialError::RandomSource`] and
//! must not be retried or papered over with a weaker generator.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CredentialError, Result};

/// Fill a buffer with cryptographically secure random bytes.
pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CredentialError::RandomSource(e.to_string()))
}

/// Generate a fixed-size array of cryptographically secure random bytes.
pub fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    fill_random(&mut buf)?;
    Ok(buf)
}

/// Generate a fresh salt of `len` bytes.
pub fn random_salt(len: usize) -> Result<Vec<u8>> {
    let mut salt = vec![0u8; len];
    fill_random(&mut salt)?;
    Ok(salt)
}
