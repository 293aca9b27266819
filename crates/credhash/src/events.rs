//! Account notification records.
//!
//! Plain data returned by the account flows in [`crate::auth`] so callers
//! can forward them to whatever sink they use. Nothing is dispatched here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountId;

/// Something that happened to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccountEvent {
    Registered {
        account_id: AccountId,
        username: String,
        at: DateTime<Utc>,
    },
    PasswordChanged {
        account_id: AccountId,
        at: DateTime<Utc>,
    },
    ProfileUpdated {
        account_id: AccountId,
        username: String,
        email: String,
        at: DateTime<Utc>,
    },
    RoleGranted {
        account_id: AccountId,
        role: String,
        at: DateTime<Utc>,
    },
    RoleRevoked {
        account_id: AccountId,
        role: String,
        at: DateTime<Utc>,
    },
    Removed {
        account_id: AccountId,
        at: DateTime<Utc>,
    },
}

impl AccountEvent {
    pub fn account_id(&self) -> &AccountId {
        match self {
            Self::Registered { account_id, .. }
            | Self::PasswordChanged { account_id, .. }
            | Self::ProfileUpdated { account_id, .. }
            | Self::RoleGranted { account_id, .. }
            | Self::RoleRevoked { account_id, .. }
            | Self::Removed { account_id, .. } => account_id,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Registered { at, .. }
            | Self::PasswordChanged { at, .. }
            | Self::ProfileUpdated { at, .. }
            | Self::RoleGranted { at, .. }
            | Self::RoleRevoked { at, .. }
            | Self::Removed { at, .. } => *at,
        }
    }
}
