use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Role;
use crate::services::auth as auth_service;
use crate::state::AppState;

// POST /api/auth/register
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub phone: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.email.trim().is_empty()
        || body.password.is_empty()
        || body.full_name.trim().is_empty()
        || body.phone.trim().is_empty()
    {
        return Err(AppError::Validation("All fields are required".to_string()));
    }
    if body.password != body.confirm_password {
        return Err(AppError::Validation(
            "Password confirmation does not match".to_string(),
        ));
    }
    if body.password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let db = state.db.lock().unwrap();
    if queries::get_user_by_email(&db, body.email.trim())?.is_some() {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    let password_hash = auth_service::hash_password(&body.password)?;
    let user_id = queries::create_user(
        &db,
        body.email.trim(),
        &password_hash,
        body.full_name.trim(),
        Some(body.phone.trim()),
        Role::Customer,
    )?;

    tracing::info!(user_id, "registered new customer");
    Ok(Json(serde_json::json!({ "id": user_id })))
}

// POST /api/auth/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    token: String,
    expires_at: String,
    role: String,
    full_name: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let db = state.db.lock().unwrap();

    let user = queries::get_user_by_email(&db, body.email.trim())?;
    let Some(user) = user else {
        // Same message as a bad password so emails can't be probed.
        return Err(AppError::Validation("Invalid email or password".to_string()));
    };

    if !auth_service::verify_password(&body.password, &user.password_hash)? {
        return Err(AppError::Validation("Invalid email or password".to_string()));
    }

    let session = auth_service::issue_session(&db, user.id, state.config.session_ttl_hours)?;
    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: queries::fmt_dt(&session.expires_at),
        role: user.role.as_str().to_string(),
        full_name: user.full_name,
    }))
}

// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let db = state.db.lock().unwrap();
    queries::delete_session(&db, token)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

// GET /api/my/account
#[derive(Serialize)]
pub struct AccountResponse {
    email: String,
    full_name: String,
    phone: Option<String>,
    address: Option<String>,
    role: String,
    total_bookings: i64,
    completed_bookings: i64,
    cancelled_bookings: i64,
    total_spent: f64,
}

pub async fn my_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AccountResponse>, AppError> {
    let user = super::require_user(&state, &headers)?;

    let stats = {
        let db = state.db.lock().unwrap();
        queries::user_booking_stats(&db, user.id)?
    };

    Ok(Json(AccountResponse {
        email: user.email,
        full_name: user.full_name,
        phone: user.phone,
        address: user.address,
        role: user.role.as_str().to_string(),
        total_bookings: stats.total_bookings,
        completed_bookings: stats.completed_bookings,
        cancelled_bookings: stats.cancelled_bookings,
        total_spent: stats.total_spent,
    }))
}

// PUT /api/my/account
#[derive(Deserialize)]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

pub async fn update_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UpdateAccountRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut user = super::require_user(&state, &headers)?;

    if let Some(full_name) = body.full_name.filter(|v| !v.trim().is_empty()) {
        user.full_name = full_name;
    }
    if let Some(phone) = body.phone.filter(|v| !v.trim().is_empty()) {
        user.phone = Some(phone);
    }
    if let Some(address) = body.address.filter(|v| !v.trim().is_empty()) {
        user.address = Some(address);
    }

    let db = state.db.lock().unwrap();
    queries::update_user_profile(&db, &user)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

// POST /api/my/password
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = super::require_user(&state, &headers)?;

    if !auth_service::verify_password(&body.current_password, &user.password_hash)? {
        return Err(AppError::Validation(
            "Current password is incorrect".to_string(),
        ));
    }
    if body.new_password != body.confirm_password {
        return Err(AppError::Validation(
            "Password confirmation does not match".to_string(),
        ));
    }
    if body.new_password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let password_hash = auth_service::hash_password(&body.new_password)?;
    let db = state.db.lock().unwrap();
    queries::update_user_password(&db, user.id, &password_hash)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
