//! User accounts.
//!
//! A [`UserAccount`] owns exactly one [`Credential`]. The credential can
//! only change through [`UserAccount::set_credential`], which swaps in a
//! whole new value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::Credential;
use crate::crypto::random::random_bytes;
use crate::error::{CredentialError, Result};

/// Unique identifier for an account.
///
/// Format: `acct_` + base58 of 16 random bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub String);

/// Number of random bytes behind an account ID.
const ID_BYTES: usize = 16;

impl AccountId {
    pub const PREFIX: &'static str = "acct_";

    /// Generate a fresh random account ID.
    pub fn generate() -> Result<Self> {
        let bytes: [u8; ID_BYTES] = random_bytes()?;
        Ok(Self(format!(
            "{}{}",
            Self::PREFIX,
            bs58::encode(bytes).into_string()
        )))
    }

    /// Parse an ID from user input or storage.
    ///
    /// The text must be `acct_` followed by the base58 encoding of exactly
    /// 16 bytes. Anything else (path separators, dots, a missing prefix) is
    /// rejected, so a parsed ID is always safe to use as a file name.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::InvalidAccount` for a malformed ID.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || CredentialError::InvalidAccount(format!("malformed account ID: {s:?}"));
        let body = s.strip_prefix(Self::PREFIX).ok_or_else(invalid)?;
        let bytes = bs58::decode(body).into_vec().map_err(|_| invalid())?;
        if bytes.len() != ID_BYTES {
            return Err(invalid());
        }
        Ok(Self(s.to_string()))
    }

    /// Check that this ID is well formed; see [`AccountId::parse`].
    pub fn validate(&self) -> Result<()> {
        Self::parse(&self.0).map(|_| ())
    }
}

impl std::str::FromStr for AccountId {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user account and its stored credential.
///
/// Deserialization applies the same checks as [`UserAccount::new`] and
/// drops duplicate roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "UserAccountRecord")]
pub struct UserAccount {
    pub id: AccountId,
    username: String,
    email: String,
    credential: Credential,
    roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unchecked serialized form of [`UserAccount`].
#[derive(Deserialize)]
struct UserAccountRecord {
    id: AccountId,
    username: String,
    email: String,
    credential: Credential,
    #[serde(default)]
    roles: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserAccountRecord> for UserAccount {
    type Error = CredentialError;

    fn try_from(record: UserAccountRecord) -> Result<Self> {
        record.id.validate()?;
        require_non_blank("username", &record.username)?;
        require_non_blank("email", &record.email)?;

        let mut account = Self {
            id: record.id,
            username: record.username,
            email: record.email,
            credential: record.credential,
            roles: Vec::with_capacity(record.roles.len()),
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        for role in &record.roles {
            require_non_blank("role", role)?;
            if !account.has_role(role) {
                account.roles.push(role.clone());
            }
        }
        Ok(account)
    }
}

/// Public view of an account, safe to hand back after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl UserAccount {
    /// Create an account with a fresh ID.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::InvalidAccount` if `username` or `email` is
    /// blank, or `CredentialError::RandomSource` if no ID could be drawn.
    pub fn new(username: &str, email: &str, credential: Credential) -> Result<Self> {
        require_non_blank("username", username)?;
        require_non_blank("email", email)?;

        let now = Utc::now();
        Ok(Self {
            id: AccountId::generate()?,
            username: username.to_string(),
            email: email.to_string(),
            credential,
            roles: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Change username and/or email. `None` leaves a field untouched.
    pub fn update_profile(&mut self, username: Option<&str>, email: Option<&str>) -> Result<()> {
        if let Some(u) = username {
            require_non_blank("username", u)?;
        }
        if let Some(e) = email {
            require_non_blank("email", e)?;
        }
        if let Some(u) = username {
            self.username = u.to_string();
        }
        if let Some(e) = email {
            self.email = e.to_string();
        }
        self.touch();
        Ok(())
    }

    /// Replace the stored credential.
    pub fn set_credential(&mut self, credential: Credential) {
        self.credential = credential;
        self.touch();
    }

    /// Add a role. Returns `false` if the account already had it.
    pub fn add_role(&mut self, role: &str) -> bool {
        if self.has_role(role) {
            return false;
        }
        self.roles.push(role.to_string());
        self.touch();
        true
    }

    /// Remove a role. Returns `false` if the account did not have it.
    pub fn remove_role(&mut self, role: &str) -> bool {
        let before = self.roles.len();
        self.roles.retain(|r| !r.eq_ignore_ascii_case(role));
        let removed = self.roles.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Case-insensitive role check.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn info(&self) -> AccountInfo {
        AccountInfo {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            roles: self.roles.clone(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CredentialError::InvalidAccount(format!(
            "{field} cannot be empty"
        )));
    }
    Ok(())
}
