//! In-memory account store.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::account::{AccountId, UserAccount};
use crate::error::{CredentialError, Result};
use crate::storage::{email_key, email_taken, username_taken, AccountStore};

type AccountMap = HashMap<AccountId, UserAccount>;

/// Account store held entirely in process memory.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<AccountMap>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::StorageError` if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, AccountMap>> {
        self.accounts
            .read()
            .map_err(|_| CredentialError::StorageError("account map lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, AccountMap>> {
        self.accounts
            .write()
            .map_err(|_| CredentialError::StorageError("account map lock poisoned".into()))
    }
}

/// Fail if another account already uses `account`'s username or email.
fn check_unique(accounts: &AccountMap, account: &UserAccount) -> Result<()> {
    let email = email_key(account.email());
    for other in accounts.values().filter(|a| a.id != account.id) {
        if other.username() == account.username() {
            return Err(username_taken(account.username()));
        }
        if email_key(other.email()) == email {
            return Err(email_taken(account.email()));
        }
    }
    Ok(())
}

impl AccountStore for MemoryAccountStore {
    fn insert_new(&self, account: &UserAccount) -> Result<()> {
        let mut accounts = self.write()?;
        if accounts.contains_key(&account.id) {
            return Err(CredentialError::AlreadyExists(format!(
                "account already exists: {}",
                account.id
            )));
        }
        check_unique(&accounts, account)?;
        accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    fn update(&self, account: &UserAccount) -> Result<()> {
        let mut accounts = self.write()?;
        if !accounts.contains_key(&account.id) {
            return Err(CredentialError::NotFound(format!(
                "account not found: {}",
                account.id
            )));
        }
        check_unique(&accounts, account)?;
        accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    fn load(&self, id: &AccountId) -> Result<UserAccount> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| CredentialError::NotFound(format!("account not found: {id}")))
    }

    fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>> {
        Ok(self
            .read()?
            .values()
            .find(|a| a.username() == username)
            .cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        let key = email_key(email);
        Ok(self
            .read()?
            .values()
            .find(|a| email_key(a.email()) == key)
            .cloned())
    }

    fn list_ids(&self) -> Result<Vec<AccountId>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    fn delete(&self, id: &AccountId) -> Result<()> {
        self.write()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CredentialError::NotFound(format!("account not found: {id}")))
    }
}
