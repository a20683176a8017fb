//! Registration and login.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use ecommerce_store_core::UserId;

use crate::error::{ApiJson, AppError, Result};
use crate::state::AppState;

/// Body of both auth endpoints.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Credentials {
    fn require(self) -> Result<(String, String)> {
        match (self.username, self.password) {
            (Some(username), Some(password))
                if !username.trim().is_empty() && !password.is_empty() =>
            {
                Ok((username, password))
            }
            _ => Err(AppError::BadRequest(
                "Username and password are required".to_owned(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Registered {
    pub id: UserId,
    pub username: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LoggedIn {
    pub token: String,
    pub id: UserId,
    pub username: String,
}

/// Create a shopper account.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<Registered>)> {
    let (username, password) = credentials.require()?;
    let user = state.auth().register(&username, &password).await?;

    Ok((
        StatusCode::CREATED,
        Json(Registered {
            id: user.id,
            username: user.username.to_string(),
            message: "Registration successful",
        }),
    ))
}

/// Exchange a username and password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<LoggedIn>> {
    let (username, password) = credentials.require()?;
    let outcome = state.auth().login(&username, &password).await?;

    Ok(Json(LoggedIn {
        token: outcome.token,
        id: outcome.user.id,
        username: outcome.user.username.to_string(),
    }))
}
