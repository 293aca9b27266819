//! Cryptographic primitives for credhash.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 password-based key derivation
//! - Base64 encoding of derived keys and constant-time comparison
//! - Cryptographically secure random salts and identifiers

pub mod derivation;
pub mod random;
