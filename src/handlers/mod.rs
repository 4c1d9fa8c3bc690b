pub mod admin;
pub mod auth;
pub mod bookings;
pub mod health;
pub mod payments;
pub mod reviews;
pub mod rooms;

use axum::http::HeaderMap;

use crate::errors::AppError;
use crate::models::User;
use crate::services::auth as auth_service;
use crate::services::policy::{self, Action};
use crate::state::AppState;

/// Resolves the bearer token, if any, to its session user.
pub(crate) fn session_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<User>, AppError> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = token else {
        return Ok(None);
    };

    let db = state.db.lock().unwrap();
    Ok(auth_service::resolve_session(&db, token)?)
}

pub(crate) fn require_user(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    session_user(state, headers)?.ok_or(AppError::Unauthorized)
}

pub(crate) fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let user = require_user(state, headers)?;
    if !policy::allows(Some(&user), Action::AdminArea) {
        return Err(AppError::Forbidden);
    }
    Ok(user)
}
