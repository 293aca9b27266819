//! Edge cases for hashing and verification inputs.

use credhash::{Credential, HasherParams, PasswordHasher, Pbkdf2Hasher, Salt};

fn fast_hasher() -> Pbkdf2Hasher {
    Pbkdf2Hasher::new(HasherParams {
        iterations: 1_000,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn unicode_passwords_round_trip() {
    let hasher = fast_hasher();
    for password in ["pässwörd", "пароль", "密码🔑", "\u{0}\u{1}\u{7f}"] {
        let (hash, salt) = hasher.hash_password(password).unwrap();
        assert!(hasher.verify_password(password, &hash, salt.as_bytes()));
    }
}

#[test]
fn unicode_normalization_is_not_applied() {
    let hasher = fast_hasher();
    let composed = "caf\u{e9}";
    let decomposed = "cafe\u{301}";
    let (hash, salt) = hasher.hash_password(composed).unwrap();
    assert!(!hasher.verify_password(decomposed, &hash, salt.as_bytes()));
}

#[test]
fn long_password() {
    let hasher = fast_hasher();
    let password = "x".repeat(10_000);
    let (hash, salt) = hasher.hash_password(&password).unwrap();
    assert!(hasher.verify_password(&password, &hash, salt.as_bytes()));
    assert!(!hasher.verify_password(&password[..9_999], &hash, salt.as_bytes()));
}

#[test]
fn whitespace_is_significant() {
    let hasher = fast_hasher();
    let (hash, salt) = hasher.hash_password("secret").unwrap();
    assert!(!hasher.verify_password("secret ", &hash, salt.as_bytes()));
    assert!(!hasher.verify_password(" secret", &hash, salt.as_bytes()));
    assert!(!hasher.verify_password("Secret", &hash, salt.as_bytes()));
}

#[test]
fn short_and_long_salts_verify() {
    let hasher = fast_hasher();
    for len in [1usize, 8, 16, 64, 256] {
        let salt = vec![0x5au8; len];
        let hash = hasher.hash_with_salt("pw", &salt);
        assert!(hasher.verify_password("pw", &hash, &salt), "salt len {len}");
    }
}

#[test]
fn one_bit_salt_change_fails() {
    let hasher = fast_hasher();
    let (hash, salt) = hasher.hash_password("pw").unwrap();
    let mut flipped = salt.into_bytes();
    flipped[15] ^= 0x01;
    assert!(!hasher.verify_password("pw", &hash, &flipped));
}

#[test]
fn hash_with_whitespace_or_missing_padding_fails() {
    let hasher = fast_hasher();
    let salt = [1u8; 16];
    let hash = hasher.hash_with_salt("pw", &salt);
    assert!(!hasher.verify_password("pw", &format!(" {hash}"), &salt));
    assert!(!hasher.verify_password("pw", hash.trim_end_matches('='), &salt));
}

#[test]
fn credential_survives_json_storage() {
    let hasher = fast_hasher();
    let cred = Credential::create(&hasher, "pw").unwrap();
    let json = serde_json::to_string(&cred).unwrap();
    let loaded: Credential = serde_json::from_str(&json).unwrap();
    assert!(loaded.verify(&hasher, "pw"));

    let salt = Salt::from_base64(&cred.salt().to_base64()).unwrap();
    let rebuilt = Credential::from_parts(cred.hash().to_string(), salt).unwrap();
    assert_eq!(rebuilt, cred);
}
