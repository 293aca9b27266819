//! Account persistence.
//!
//! Stores `UserAccount` records as JSON files:
//!
//! ```text
//! {base_dir}/
//! ├── params.json
//! ├── accounts/
//! │   └── {account_id}.json
//! └── index/
//!     ├── username/{sha256 of username}
//!     └── email/{sha256 of lowercased email}
//! ```
//!
//! File format for accounts:
//! ```json
//! { "version": 1, "account": { ... UserAccount ... } }
//! ```
//!
//! Index entries are created with `create_new`, so two writers can never
//! hold the same username or email. Each entry contains the owning account
//! ID and is only trusted when that account still carries the indexed value.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::account::{AccountId, UserAccount};
use crate::config::HasherParams;
use crate::error::{CredentialError, Result};
use crate::storage::{email_key, email_taken, username_taken};

// ── AccountStore ──────────────────────────────────────────────────────────────

/// Persistence backend for accounts.
///
/// Implementations must be safe to share between threads, and must keep
/// usernames and emails unique even under concurrent writers.
pub trait AccountStore: Send + Sync {
    /// Persist a new account.
    ///
    /// The uniqueness check and the insert are one atomic step. Returns
    /// `CredentialError::AlreadyExists` if the ID, the username, or the
    /// email (case-insensitive) is already in use.
    fn insert_new(&self, account: &UserAccount) -> Result<()>;

    /// Overwrite an existing account.
    ///
    /// Returns `CredentialError::NotFound` if it was never inserted, and
    /// `CredentialError::AlreadyExists` if a changed username or email
    /// belongs to another account.
    fn update(&self, account: &UserAccount) -> Result<()>;

    /// Load an account by ID. Missing accounts are `CredentialError::NotFound`.
    fn load(&self, id: &AccountId) -> Result<UserAccount>;

    /// Look up an account by exact username.
    fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>>;

    /// Look up an account by email, ignoring case.
    fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>>;

    /// IDs of all stored accounts, in no particular order.
    fn list_ids(&self) -> Result<Vec<AccountId>>;

    /// Delete an account. Missing accounts are `CredentialError::NotFound`.
    fn delete(&self, id: &AccountId) -> Result<()>;
}

// ── File format constants ─────────────────────────────────────────────────────

const ACCOUNT_FILE_VERSION: u32 = 1;
const ACCOUNTS_DIR: &str = "accounts";
const INDEX_DIR: &str = "index";
const USERNAME_INDEX: &str = "username";
const EMAIL_INDEX: &str = "email";
const PARAMS_FILE: &str = "params.json";

/// Wrapper written to disk for each account.
#[derive(Debug, Serialize, Deserialize)]
struct AccountFile {
    /// Format version number.
    version: u32,
    /// The stored account.
    account: UserAccount,
}

// ── FileAccountStore ──────────────────────────────────────────────────────────

/// Filesystem-backed account store.
pub struct FileAccountStore {
    base_dir: PathBuf,
}

impl FileAccountStore {
    /// Create a store rooted at `base_dir`, creating `accounts/` and
    /// `index/` if needed.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Io` if a directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join(ACCOUNTS_DIR))?;
        for kind in [USERNAME_INDEX, EMAIL_INDEX] {
            std::fs::create_dir_all(base_dir.join(INDEX_DIR).join(kind))?;
        }
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Read the hasher parameters pinned to this store, if any.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::InvalidFileFormat` or
    /// `CredentialError::InvalidParameters` for a damaged `params.json`.
    pub fn pinned_params(&self) -> Result<Option<HasherParams>> {
        let path = self.base_dir.join(PARAMS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        HasherParams::from_file(&path).map(Some)
    }

    /// Pin hasher parameters to this store so later sessions verify with
    /// the same cost and sizes.
    pub fn pin_params(&self, params: &HasherParams) -> Result<()> {
        params.validate()?;
        let json = serde_json::to_string_pretty(params)
            .map_err(|e| CredentialError::SerializationError(e.to_string()))?;
        write_atomic(&self.base_dir.join(PARAMS_FILE), json.as_bytes())
    }

    /// Path of an account file. Malformed IDs never reach the filesystem.
    fn account_path(&self, id: &AccountId) -> Result<PathBuf> {
        id.validate()?;
        Ok(self
            .base_dir
            .join(ACCOUNTS_DIR)
            .join(format!("{}.json", id.0)))
    }

    fn index_entry(&self, kind: &str, key: &str) -> PathBuf {
        self.base_dir
            .join(INDEX_DIR)
            .join(kind)
            .join(hex::encode(Sha256::digest(key.as_bytes())))
    }

    fn username_entry(&self, username: &str) -> PathBuf {
        self.index_entry(USERNAME_INDEX, username)
    }

    fn email_entry(&self, email: &str) -> PathBuf {
        self.index_entry(EMAIL_INDEX, &email_key(email))
    }

    fn read_account(&self, path: &Path) -> Result<UserAccount> {
        let bytes = std::fs::read(path)?;
        let file: AccountFile = serde_json::from_slice(&bytes).map_err(|e| {
            CredentialError::InvalidFileFormat(format!(
                "failed to parse account file {}: {e}",
                path.display()
            ))
        })?;
        if file.version != ACCOUNT_FILE_VERSION {
            return Err(CredentialError::InvalidFileFormat(format!(
                "unsupported account file version {} in {}",
                file.version,
                path.display()
            )));
        }
        Ok(file.account)
    }

    fn write_account(&self, path: &Path, account: &UserAccount) -> Result<()> {
        let file = AccountFile {
            version: ACCOUNT_FILE_VERSION,
            account: account.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| CredentialError::SerializationError(e.to_string()))?;
        write_atomic(path, json.as_bytes())
    }

    /// Take an index entry for `id`. Fails with `taken` if any account
    /// already holds it.
    fn claim(
        &self,
        entry: &Path,
        id: &AccountId,
        taken: impl FnOnce() -> CredentialError,
    ) -> Result<()> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(entry) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(taken()),
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = file.write_all(id.0.as_bytes()) {
            let _ = std::fs::remove_file(entry);
            return Err(e.into());
        }
        Ok(())
    }

    /// The account ID an index entry points at. An entry that is missing
    /// or still being written has no owner.
    fn entry_owner(&self, entry: &Path) -> Result<Option<AccountId>> {
        match std::fs::read_to_string(entry) {
            Ok(text) => Ok(AccountId::parse(text.trim()).ok()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove an index entry, but only while it still belongs to `id`.
    fn release(&self, entry: &Path, id: &AccountId) -> Result<()> {
        if self.entry_owner(entry)?.as_ref() != Some(id) {
            return Ok(());
        }
        match std::fs::remove_file(entry) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Undo claims after a failed write. The original error is what the
    /// caller reports, so release failures are only logged.
    fn rollback(&self, entries: &[PathBuf], id: &AccountId) {
        for entry in entries {
            if let Err(e) = self.release(entry, id) {
                log::warn!("failed to release index entry {}: {e}", entry.display());
            }
        }
    }

    /// Remove every index entry owned by `id`. Used when the account file
    /// can no longer be read to learn its username and email.
    fn release_all_owned_by(&self, id: &AccountId) -> Result<()> {
        for kind in [USERNAME_INDEX, EMAIL_INDEX] {
            for entry in std::fs::read_dir(self.base_dir.join(INDEX_DIR).join(kind))? {
                self.release(&entry?.path(), id)?;
            }
        }
        Ok(())
    }

    /// Resolve an index entry to its account. `matches` re-checks the
    /// indexed value, so an entry left behind by a rename finds nothing.
    fn find_indexed(
        &self,
        entry: &Path,
        matches: impl FnOnce(&UserAccount) -> bool,
    ) -> Result<Option<UserAccount>> {
        let Some(id) = self.entry_owner(entry)? else {
            return Ok(None);
        };
        let path = self.account_path(&id)?;
        if !path.exists() {
            // Claimed by an insert that has not written its account yet.
            return Ok(None);
        }
        let account = self.read_account(&path)?;
        Ok(matches(&account).then_some(account))
    }
}

impl AccountStore for FileAccountStore {
    fn insert_new(&self, account: &UserAccount) -> Result<()> {
        let path = self.account_path(&account.id)?;
        if path.exists() {
            return Err(CredentialError::AlreadyExists(format!(
                "account already exists: {}",
                account.id
            )));
        }

        let username_entry = self.username_entry(account.username());
        self.claim(&username_entry, &account.id, || {
            username_taken(account.username())
        })?;

        let email_entry = self.email_entry(account.email());
        if let Err(e) = self.claim(&email_entry, &account.id, || email_taken(account.email())) {
            self.rollback(&[username_entry], &account.id);
            return Err(e);
        }

        if let Err(e) = self.write_account(&path, account) {
            self.rollback(&[username_entry, email_entry], &account.id);
            return Err(e);
        }
        Ok(())
    }

    fn update(&self, account: &UserAccount) -> Result<()> {
        let path = self.account_path(&account.id)?;
        if !path.exists() {
            return Err(CredentialError::NotFound(format!(
                "account not found: {}",
                account.id
            )));
        }
        let previous = self.read_account(&path)?;

        let mut claimed = Vec::new();
        let mut stale = Vec::new();
        if previous.username() != account.username() {
            let entry = self.username_entry(account.username());
            self.claim(&entry, &account.id, || username_taken(account.username()))?;
            claimed.push(entry);
            stale.push(self.username_entry(previous.username()));
        }
        if email_key(previous.email()) != email_key(account.email()) {
            let entry = self.email_entry(account.email());
            if let Err(e) = self.claim(&entry, &account.id, || email_taken(account.email())) {
                self.rollback(&claimed, &account.id);
                return Err(e);
            }
            claimed.push(entry);
            stale.push(self.email_entry(previous.email()));
        }

        if let Err(e) = self.write_account(&path, account) {
            self.rollback(&claimed, &account.id);
            return Err(e);
        }
        for entry in &stale {
            self.release(entry, &account.id)?;
        }
        Ok(())
    }

    fn load(&self, id: &AccountId) -> Result<UserAccount> {
        let path = self.account_path(id)?;
        if !path.exists() {
            return Err(CredentialError::NotFound(format!("account not found: {id}")));
        }
        self.read_account(&path)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>> {
        self.find_indexed(&self.username_entry(username), |a| {
            a.username() == username
        })
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        let key = email_key(email);
        self.find_indexed(&self.email_entry(email), |a| email_key(a.email()) == key)
    }

    fn list_ids(&self) -> Result<Vec<AccountId>> {
        let dir = self.base_dir.join(ACCOUNTS_DIR);
        let mut ids = Vec::new();

        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            let Some(stem) = name_str.strip_suffix(".json") else {
                continue;
            };
            match AccountId::parse(stem) {
                Ok(id) => ids.push(id),
                Err(_) => log::warn!("ignoring unexpected file in {}: {name_str}", dir.display()),
            }
        }

        Ok(ids)
    }

    fn delete(&self, id: &AccountId) -> Result<()> {
        let path = self.account_path(id)?;
        if !path.exists() {
            return Err(CredentialError::NotFound(format!("account not found: {id}")));
        }
        let account = self.read_account(&path);
        std::fs::remove_file(&path)?;

        match account {
            Ok(account) => {
                self.release(&self.username_entry(account.username()), id)?;
                self.release(&self.email_entry(account.email()), id)?;
            }
            Err(e) => {
                log::warn!("removed unreadable account {id}: {e}");
                self.release_all_owned_by(id)?;
            }
        }
        Ok(())
    }
}

/// Write `data` to `path` through a sibling temp file and a rename, so
/// readers never see a partial file.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, data)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
