//! Scale test: many accounts in one file store.

use credhash::{AccountStore, Authenticator, FileAccountStore, HasherParams, Pbkdf2Hasher};

#[test]
fn stress_200_accounts_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let hasher = Pbkdf2Hasher::new(HasherParams {
        iterations: 200,
        ..Default::default()
    })
    .unwrap();
    let auth = Authenticator::new(FileAccountStore::new(dir.path()).unwrap(), hasher);

    for i in 0..200 {
        let name = format!("user{i:03}");
        auth.register(&name, &format!("{name}@example.com"), &format!("pw-{i}"), &[])
            .unwrap();
    }
    assert_eq!(auth.store().list_ids().unwrap().len(), 200);

    for i in (0..200).step_by(37) {
        let name = format!("user{i:03}");
        assert!(auth.login(&name, &format!("pw-{i}")).unwrap().is_some());
        assert!(auth.login(&name, &format!("pw-{}", i + 1)).unwrap().is_none());
    }
}
