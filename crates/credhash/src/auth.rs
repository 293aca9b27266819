//! Account flows: registration, login, and password changes.
//!
//! [`Authenticator`] ties a [`PasswordHasher`] to an [`AccountStore`]. Login
//! answers `None` both for an unknown username and for a wrong password, so
//! callers can report a single "invalid credentials" outcome without
//! revealing which check failed. Store failures are real errors.

use chrono::Utc;

use crate::account::{require_non_blank, AccountId, AccountInfo, UserAccount};
use crate::credential::Credential;
use crate::error::{CredentialError, Result};
use crate::events::AccountEvent;
use crate::hasher::PasswordHasher;
use crate::storage::{self, AccountStore};

/// Role given to accounts created by [`Authenticator::seed_admin`].
pub const ADMIN_ROLE: &str = "Admin";

/// Decoy credential verified when the username is unknown, so that both
/// failure paths pay for one key derivation.
const DECOY_HASH: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";
const DECOY_SALT: [u8; 16] = [0u8; 16];

/// Password-based account authentication over a store.
pub struct Authenticator<S, H> {
    store: S,
    hasher: H,
}

impl<S: AccountStore, H: PasswordHasher> Authenticator<S, H> {
    pub fn new(store: S, hasher: H) -> Self {
        Self { store, hasher }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Create and persist a new account.
    ///
    /// # Errors
    ///
    /// - `CredentialError::InvalidAccount` for a blank username or email, or
    ///   an empty password.
    /// - `CredentialError::AlreadyExists` if the username or the email is
    ///   taken.
    /// - Store and random-source errors are propagated.
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        roles: &[&str],
    ) -> Result<(UserAccount, AccountEvent)> {
        require_password(password)?;
        for role in roles {
            require_non_blank("role", role)?;
        }
        // Early rejection before paying for a key derivation; `insert_new`
        // is what actually enforces uniqueness.
        if self.store.find_by_username(username)?.is_some() {
            return Err(storage::username_taken(username));
        }
        if self.store.find_by_email(email)?.is_some() {
            return Err(storage::email_taken(email));
        }

        let credential = Credential::create(&self.hasher, password)?;
        let mut account = UserAccount::new(username, email, credential)?;
        for role in roles {
            account.add_role(role);
        }
        self.store.insert_new(&account)?;

        log::info!("Registered account {} ({username})", account.id);
        let event = AccountEvent::Registered {
            account_id: account.id.clone(),
            username: account.username().to_string(),
            at: account.created_at,
        };
        Ok((account, event))
    }

    /// Check a username and password.
    ///
    /// Returns `Ok(None)` when the credentials are not valid, whatever the
    /// reason.
    pub fn login(&self, username: &str, password: &str) -> Result<Option<AccountInfo>> {
        log::debug!("Login attempt for username: {username}");

        let Some(account) = self.store.find_by_username(username)? else {
            let _ = self.hasher.verify_password(password, DECOY_HASH, &DECOY_SALT);
            log::warn!("Login failed: user not found for username: {username}");
            return Ok(None);
        };

        if !account.credential().verify(&self.hasher, password) {
            log::warn!("Login failed: invalid password for username: {username}");
            return Ok(None);
        }

        log::info!("Login successful for username: {username}");
        Ok(Some(account.info()))
    }

    /// Replace a user's password after confirming the current one.
    ///
    /// Returns `Ok(None)` if the username is unknown or `current` is wrong.
    pub fn change_password(
        &self,
        username: &str,
        current: &str,
        new: &str,
    ) -> Result<Option<AccountEvent>> {
        require_password(new)?;

        let Some(mut account) = self.store.find_by_username(username)? else {
            log::warn!("Password change failed: user not found for username: {username}");
            return Ok(None);
        };
        if !account.credential().verify(&self.hasher, current) {
            log::warn!("Password change failed: invalid password for username: {username}");
            return Ok(None);
        }

        self.replace_credential(&mut account, new).map(Some)
    }

    /// Administrative password reset; the current password is not checked.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::NotFound` if the account does not exist.
    pub fn reset_password(&self, id: &AccountId, new: &str) -> Result<AccountEvent> {
        require_password(new)?;
        let mut account = self.store.load(id)?;
        self.replace_credential(&mut account, new)
    }

    /// Change the username and/or email of an account. `None` leaves a
    /// field untouched.
    ///
    /// # Errors
    ///
    /// - `CredentialError::NotFound` if the account does not exist.
    /// - `CredentialError::InvalidAccount` for a blank value.
    /// - `CredentialError::AlreadyExists` if another account already uses
    ///   the new username or email.
    pub fn update_profile(
        &self,
        id: &AccountId,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<AccountEvent> {
        let mut account = self.store.load(id)?;
        account.update_profile(username, email)?;
        self.store.update(&account)?;

        log::info!("Updated profile for account {id} ({})", account.username());
        Ok(AccountEvent::ProfileUpdated {
            account_id: id.clone(),
            username: account.username().to_string(),
            email: account.email().to_string(),
            at: account.updated_at,
        })
    }

    /// Grant a role. Returns `None` if the account already has it.
    pub fn grant_role(&self, id: &AccountId, role: &str) -> Result<Option<AccountEvent>> {
        require_non_blank("role", role)?;
        let mut account = self.store.load(id)?;
        if !account.add_role(role) {
            log::info!("Account {id} already has role {role}");
            return Ok(None);
        }
        self.store.update(&account)?;

        log::info!("Granted role {role} to account {id}");
        Ok(Some(AccountEvent::RoleGranted {
            account_id: id.clone(),
            role: role.to_string(),
            at: account.updated_at,
        }))
    }

    /// Revoke a role. Returns `None` if the account did not have it.
    pub fn revoke_role(&self, id: &AccountId, role: &str) -> Result<Option<AccountEvent>> {
        let mut account = self.store.load(id)?;
        if !account.remove_role(role) {
            log::info!("Account {id} does not have role {role}");
            return Ok(None);
        }
        self.store.update(&account)?;

        log::info!("Revoked role {role} from account {id}");
        Ok(Some(AccountEvent::RoleRevoked {
            account_id: id.clone(),
            role: role.to_string(),
            at: account.updated_at,
        }))
    }

    /// Delete an account.
    pub fn remove(&self, id: &AccountId) -> Result<AccountEvent> {
        self.store.delete(id)?;
        log::info!("Removed account {id}");
        Ok(AccountEvent::Removed {
            account_id: id.clone(),
            at: Utc::now(),
        })
    }

    /// Create an administrator account unless `username` already exists.
    ///
    /// Returns the new account, or `None` if nothing was created. Concurrent
    /// seeders race through [`AccountStore::insert_new`], so exactly one of
    /// them creates the account.
    pub fn seed_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<UserAccount>> {
        match self.register(username, email, password, &[ADMIN_ROLE]) {
            Ok((account, _)) => {
                log::info!("Created admin user {username} with {ADMIN_ROLE} role");
                Ok(Some(account))
            }
            // The winner of a concurrent seed may not have written its
            // record yet, so the clash itself is the evidence.
            Err(CredentialError::AlreadyExists(reason))
                if reason == storage::username_taken_reason(username) =>
            {
                log::info!("Admin account {username} already exists, skipping seed ({reason})");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn replace_credential(&self, account: &mut UserAccount, new: &str) -> Result<AccountEvent> {
        account.set_credential(Credential::create(&self.hasher, new)?);
        self.store.update(account)?;

        log::info!("Password changed for account {}", account.id);
        Ok(AccountEvent::PasswordChanged {
            account_id: account.id.clone(),
            at: account.updated_at,
        })
    }
}

fn require_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(CredentialError::InvalidAccount(
            "password cannot be empty".into(),
        ));
    }
    Ok(())
}
