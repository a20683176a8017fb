//! Authentication extractors.
//!
//! Callers authenticate with `Authorization: Bearer <token>`. The token's
//! claims are trusted once the signature and expiry check out; there is no
//! per-request user lookup.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_owned()))?;

        let claims = state.token_keys().verify(token).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            AppError::Unauthorized("Invalid or expired token".to_owned())
        })?;

        let user = CurrentUser::from(claims);
        set_sentry_user(&user.id, &user.username);
        Ok(Self(user))
    }
}

/// Extractor that requires a valid bearer token carrying `ROLE_ADMIN`.
///
/// Unauthenticated callers get 401, authenticated non-admins get 403.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "admin access denied");
            return Err(AppError::Forbidden("Access denied".to_owned()));
        }
        Ok(Self(user))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
