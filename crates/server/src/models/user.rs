//! User domain types.
//!
//! These types represent validated domain objects separate from database row
//! types. The password hash is never part of [`User`], so a user can be
//! serialized straight into a response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gallery_core::{AccountStatus, Address, Email, Role, UserId};

/// A gallery account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email, stored lowercased.
    pub email: Email,
    pub role: Role,
    pub status: AccountStatus,
    pub phone: Option<String>,
    pub address: Address,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the account may sign in.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Fields an administrator may change on an account.
///
/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

impl UserUpdate {
    /// Apply the update to `user` in place.
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty()) {
            user.name = name;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(status) = self.status {
            user.status = status;
        }
        if let Some(phone) = self.phone {
            let phone = phone.trim().to_owned();
            user.phone = (!phone.is_empty()).then_some(phone);
        }
        if let Some(address) = self.address {
            user.address = address.normalized();
        }
    }
}
