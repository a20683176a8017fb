//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ecommerce_store_core::{Role, UserId, Username};

/// A registered user (domain type). The password hash never leaves `crate::db`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub roles: Vec<Role>,
    /// Disabled users cannot log in.
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub roles: Vec<Role>,
}

/// The authenticated caller, as recovered from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub roles: Vec<Role>,
}

impl CurrentUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.to_string(),
            roles: user.roles.clone(),
        }
    }
}
