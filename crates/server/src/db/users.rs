//! User accounts backed by `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ecommerce_store_core::{Role, UserId, Username};

use super::{RepositoryError, UserStore};
use crate::models::{NewUser, User};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    password_hash: String,
    roles: Vec<String>,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<(User, String), RepositoryError> {
        let username = Username::parse(&self.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        let roles = self
            .roles
            .iter()
            .map(|r| r.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RepositoryError::DataCorruption(format!("user {}: {e}", self.id)))?;

        let user = User {
            id: UserId::new(self.id),
            username,
            roles,
            enabled: self.enabled,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        Ok((user, self.password_hash))
    }
}

/// `PostgreSQL` implementation of [`UserStore`].
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let roles: Vec<&str> = user.roles.iter().map(Role::as_str).collect();

        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (username, password_hash, roles)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, roles, enabled, created_at, updated_at
            ",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&roles)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "username"))?;

        row.into_user().map(|(user, _)| user)
    }

    async fn find_with_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, password_hash, roles, enabled, created_at, updated_at
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(UserRow::into_user)
        .transpose()
    }
}
