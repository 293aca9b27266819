//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle against a file-backed store:
//! 1. Seed an administrator
//! 2. Register users and log in
//! 3. Change and reset passwords
//! 4. Reopen the store and verify persisted credentials
//! 5. Remove an account

use credhash::auth::ADMIN_ROLE;
use credhash::{
    AccountEvent, AccountStore, Authenticator, FileAccountStore, HasherParams, PasswordHasher,
    Pbkdf2Hasher,
};

fn fast_params() -> HasherParams {
    HasherParams {
        iterations: 1_000,
        ..Default::default()
    }
}

#[test]
fn full_workflow_register_to_removal() {
    let dir = tempfile::tempdir().unwrap();

    // ── Step 1: Seed an administrator ───────────────────────────────────
    let store = FileAccountStore::new(dir.path()).unwrap();
    store.pin_params(&fast_params()).unwrap();
    let auth = Authenticator::new(store, Pbkdf2Hasher::new(fast_params()).unwrap());

    let admin = auth
        .seed_admin("admin", "admin@example.local", "Admin123!")
        .expect("seeding should not error")
        .expect("admin should be created on first seed");
    assert!(admin.has_role(ADMIN_ROLE));

    // ── Step 2: Register users and log in ───────────────────────────────
    let (alice, event) = auth
        .register("alice", "alice@example.com", "Tr0ub4dor&3", &["User"])
        .unwrap();
    assert!(matches!(event, AccountEvent::Registered { .. }));
    assert!(alice.id.0.starts_with("acct_"));

    let info = auth
        .login("alice", "Tr0ub4dor&3")
        .unwrap()
        .expect("correct password should log in");
    assert_eq!(info.username, "alice");
    assert_eq!(info.roles, vec!["User".to_string()]);

    assert!(auth.login("alice", "wrongpassword").unwrap().is_none());

    // ── Step 3: Change and reset passwords ──────────────────────────────
    auth.change_password("alice", "Tr0ub4dor&3", "correct horse battery staple")
        .unwrap()
        .expect("current password is correct");
    assert!(auth.login("alice", "Tr0ub4dor&3").unwrap().is_none());

    auth.reset_password(&admin.id, "N3wAdm1n!").unwrap();
    assert!(auth.login("admin", "Admin123!").unwrap().is_none());

    // ── Step 4: Reopen the store ────────────────────────────────────────
    drop(auth);
    let store = FileAccountStore::new(dir.path()).unwrap();
    let params = store.pinned_params().unwrap().expect("params were pinned");
    assert_eq!(params, fast_params());
    let auth = Authenticator::new(store, Pbkdf2Hasher::new(params).unwrap());

    assert!(auth
        .login("alice", "correct horse battery staple")
        .unwrap()
        .is_some());
    assert!(auth.login("admin", "N3wAdm1n!").unwrap().is_some());
    assert_eq!(auth.store().list_ids().unwrap().len(), 2);

    // Seeding again must not overwrite the changed admin password.
    assert!(auth
        .seed_admin("admin", "admin@example.local", "Admin123!")
        .unwrap()
        .is_none());
    assert!(auth.login("admin", "N3wAdm1n!").unwrap().is_some());

    // ── Step 5: Edit profile and roles ──────────────────────────────────
    auth.update_profile(&alice.id, None, Some("alice@new.example"))
        .unwrap();
    assert!(auth.grant_role(&alice.id, "Editor").unwrap().is_some());
    assert!(auth
        .register("alice2", "ALICE@new.example", "pw", &[])
        .is_err());
    let info = auth
        .login("alice", "correct horse battery staple")
        .unwrap()
        .unwrap();
    assert_eq!(info.email, "alice@new.example");
    assert_eq!(info.roles, vec!["User".to_string(), "Editor".to_string()]);

    // ── Step 6: Remove an account ───────────────────────────────────────
    let event = auth.remove(&alice.id).unwrap();
    assert_eq!(event.account_id(), &alice.id);
    assert!(auth
        .login("alice", "correct horse battery staple")
        .unwrap()
        .is_none());
    assert_eq!(auth.store().list_ids().unwrap().len(), 1);

    // The removed account's username and email are free again.
    auth.register("alice", "alice@new.example", "again", &[])
        .unwrap();
}

#[test]
fn stored_credential_matches_hasher_output() {
    let dir = tempfile::tempdir().unwrap();
    let hasher = Pbkdf2Hasher::new(fast_params()).unwrap();
    let auth = Authenticator::new(FileAccountStore::new(dir.path()).unwrap(), hasher.clone());

    let (account, _) = auth.register("bob", "bob@example.com", "s3cret", &[]).unwrap();
    let stored = auth.store().load(&account.id).unwrap();
    let cred = stored.credential();

    // The stored pair is exactly what the hasher needs to verify.
    assert!(hasher.verify_password("s3cret", cred.hash(), cred.salt().as_bytes()));
    assert_eq!(
        hasher.hash_with_salt("s3cret", cred.salt().as_bytes()),
        cred.hash()
    );

    // The plaintext never reaches disk.
    let path = dir
        .path()
        .join("accounts")
        .join(format!("{}.json", account.id));
    let text = std::fs::read_to_string(path).unwrap();
    assert!(!text.contains("s3cret"));
    assert!(text.contains(cred.hash()));
}
