//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! es-cli admin create -u admin -p 'a long password'
//! ```
//!
//! # Environment Variables
//!
//! - `STORE_DATABASE_URL` - `PostgreSQL` connection string

use thiserror::Error;

use ecommerce_store_core::{Role, UserId};
use ecommerce_store_server::db::PgUserStore;
use ecommerce_store_server::services::AuthError;
use ecommerce_store_server::services::auth::create_account;

use super::{CommandError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    /// User already exists.
    #[error("User already exists with username: {0}")]
    UserExists(String),

    #[error("Could not create user: {0}")]
    Auth(#[from] AuthError),
}

/// Create a user holding both `ROLE_ADMIN` and `ROLE_USER`.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if the credentials are invalid, the username is taken,
/// or the database is unreachable.
pub async fn create_user(username: &str, password: &str) -> Result<UserId, AdminError> {
    let pool = connect().await?;
    let users = PgUserStore::new(pool);

    tracing::info!("Creating admin user: {}", username);

    let user = create_account(&users, username, password, vec![Role::Admin, Role::User])
        .await
        .map_err(|e| match e {
            AuthError::UserAlreadyExists => AdminError::UserExists(username.to_owned()),
            other => AdminError::Auth(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Username: {}",
        user.id,
        user.username
    );
    Ok(user.id)
}
