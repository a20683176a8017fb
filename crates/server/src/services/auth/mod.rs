//! Authentication service.
//!
//! Username/password accounts with argon2id hashes. A successful login
//! returns a signed bearer token; nothing is kept server-side.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenError, TokenKeys};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use ecommerce_store_core::{Role, Username};

use crate::db::{RepositoryError, UserStore};
use crate::models::{NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
}

/// Authentication service.
///
/// Handles user registration and login.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
    keys: &'a TokenKeys,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserStore, keys: &'a TokenKeys) -> Self {
        Self { users, keys }
    }

    /// Register a new shopper account with `ROLE_USER`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        self.create_user(username, password, vec![Role::User]).await
    }

    /// Create an account with the given roles.
    ///
    /// # Errors
    ///
    /// Same as [`Self::register`].
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        roles: Vec<Role>,
    ) -> Result<User, AuthError> {
        create_account(self.users, username, password, roles).await
    }

    /// Check a username and password and issue a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the user is unknown or
    /// disabled, or the password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .find_with_password_hash(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.enabled {
            tracing::warn!(user_id = %user.id, "login attempt for disabled user");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.keys.issue(&user)?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(LoginOutcome { user, token })
    }
}

/// Validate and hash credentials, then store a new enabled account.
///
/// Used by the service and by offline tooling that has no signing key.
///
/// # Errors
///
/// Returns `AuthError::InvalidUsername` if the username format is invalid.
/// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
/// Returns `AuthError::UserAlreadyExists` if the username is taken.
#[instrument(skip(users, password))]
pub async fn create_account(
    users: &dyn UserStore,
    username: &str,
    password: &str,
    roles: Vec<Role>,
) -> Result<User, AuthError> {
    let username = Username::parse(username)?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let user = users
        .create(&NewUser {
            username,
            password_hash,
            roles,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
