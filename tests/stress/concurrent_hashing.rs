//! Concurrency test: one hasher shared across threads.
//!
//! Hashing keeps no shared mutable state, so parallel callers must each get
//! a credential that verifies with its own password and no other.

use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use credhash::{
    AccountStore, Authenticator, CredentialError, FileAccountStore, HasherParams,
    MemoryAccountStore, PasswordHasher, Pbkdf2Hasher, Salt,
};

fn fast_hasher() -> Pbkdf2Hasher {
    Pbkdf2Hasher::new(HasherParams {
        iterations: 500,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn stress_16_threads_hash_and_verify() {
    let hasher = Arc::new(fast_hasher());
    let results: Arc<Mutex<Vec<(String, String, Salt)>>> = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for thread_id in 0..16 {
        let hasher = Arc::clone(&hasher);
        let results = Arc::clone(&results);
        handles.push(thread::spawn(move || {
            for i in 0..20 {
                let password = format!("thread-{thread_id}-pw-{i}");
                let (hash, salt) = hasher.hash_password(&password).expect("hashing");
                assert!(hasher.verify_password(&password, &hash, salt.as_bytes()));
                results.lock().unwrap().push((password, hash, salt));
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let results = results.lock().unwrap();
    assert_eq!(results.len(), 320);

    // Every salt is distinct.
    let salts: std::collections::HashSet<Vec<u8>> =
        results.iter().map(|(_, _, s)| s.as_bytes().to_vec()).collect();
    assert_eq!(salts.len(), 320);

    // A credential never verifies another thread's password.
    for pair in results.windows(2) {
        let (pw_a, _, _) = &pair[0];
        let (_, hash_b, salt_b) = &pair[1];
        assert!(!hasher.verify_password(pw_a, hash_b, salt_b.as_bytes()));
    }
}

#[test]
fn stress_concurrent_registrations_share_store() {
    let auth = Arc::new(Authenticator::new(MemoryAccountStore::new(), fast_hasher()));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let auth = Arc::clone(&auth);
            thread::spawn(move || {
                for i in 0..10 {
                    let name = format!("user-{t}-{i}");
                    auth.register(&name, &format!("{name}@example.com"), &name, &[])
                        .expect("register");
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(auth.store().list_ids().unwrap().len(), 80);

    let logins: Vec<_> = (0..8)
        .map(|t| {
            let auth = Arc::clone(&auth);
            thread::spawn(move || {
                (0..10).all(|i| {
                    let name = format!("user-{t}-{i}");
                    auth.login(&name, &name).unwrap().is_some()
                        && auth.login(&name, "nope").unwrap().is_none()
                })
            })
        })
        .collect();
    for h in logins {
        assert!(h.join().unwrap());
    }
}

/// Eight threads released together all try to register the same username.
/// Exactly one wins; the rest see `AlreadyExists`.
fn race_same_username<S: AccountStore + 'static>(store: S) {
    let auth = Arc::new(Authenticator::new(store, fast_hasher()));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let auth = Arc::clone(&auth);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                auth.register("alice", &format!("alice{t}@example.com"), &format!("pw-{t}"), &[])
                    .map(|_| t)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners: Vec<usize> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
    assert_eq!(winners.len(), 1, "results: {results:?}");
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, CredentialError::AlreadyExists(_))));
    assert_eq!(auth.store().list_ids().unwrap().len(), 1);

    let winner = winners[0];
    assert!(auth.login("alice", &format!("pw-{winner}")).unwrap().is_some());
}

#[test]
fn stress_same_username_registers_once_in_memory() {
    for _ in 0..20 {
        race_same_username(MemoryAccountStore::new());
    }
}

#[test]
fn stress_same_username_registers_once_on_disk() {
    for _ in 0..10 {
        let dir = tempfile::tempdir().unwrap();
        race_same_username(FileAccountStore::new(dir.path()).unwrap());
    }
}

#[test]
fn stress_concurrent_seed_admin_creates_one_account() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileAccountStore::new(dir.path()).unwrap();
    let auth = Arc::new(Authenticator::new(store, fast_hasher()));
    let barrier = Arc::new(Barrier::new(6));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let auth = Arc::clone(&auth);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                auth.seed_admin("admin", "admin@example.local", "Admin123!")
                    .unwrap()
                    .is_some()
            })
        })
        .collect();
    let created = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|c| *c)
        .count();

    assert_eq!(created, 1);
    assert_eq!(auth.store().list_ids().unwrap().len(), 1);
}
