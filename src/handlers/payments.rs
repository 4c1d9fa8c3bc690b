use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, PaymentMethod};
use crate::services::payments as payment_service;
use crate::services::policy::{self, Action};
use crate::state::AppState;

fn parse_method(s: &str) -> Result<PaymentMethod, AppError> {
    PaymentMethod::parse(s)
        .ok_or_else(|| AppError::Validation(format!("unknown payment method: {s}")))
}

fn load_booking_for_payment(
    state: &AppState,
    headers: &HeaderMap,
    booking_id: &str,
) -> Result<Booking, AppError> {
    let user = super::session_user(state, headers)?;
    let db = state.db.lock().unwrap();
    let booking = queries::get_booking(&db, booking_id)?
        .ok_or_else(|| AppError::NotFound("booking".to_string()))?;
    if !policy::allows(user.as_ref(), Action::PayBooking(&booking)) {
        return Err(AppError::Forbidden);
    }
    Ok(booking)
}

// GET /api/bookings/:id/payment/:method
pub async fn initiate_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((booking_id, method)): Path<(String, String)>,
) -> Result<Json<payment_service::PaymentIntent>, AppError> {
    let method = parse_method(&method)?;
    let booking = load_booking_for_payment(&state, &headers, &booking_id)?;

    let provider = state
        .gateways
        .get(method)
        .ok_or_else(|| AppError::Validation(format!("{} is not enabled", method.as_str())))?;

    let intent = provider.create_payment(&booking).await?;
    Ok(Json(intent))
}

// POST /api/payments/:method/simulate/:booking_id
#[derive(Serialize)]
pub struct PaymentResultResponse {
    ok: bool,
    payment_status: String,
    status: String,
}

pub async fn simulate_success(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((method, booking_id)): Path<(String, String)>,
) -> Result<Json<PaymentResultResponse>, AppError> {
    let method = parse_method(&method)?;
    if method == PaymentMethod::Banking {
        return Err(AppError::Validation(
            "Bank transfers are confirmed by an administrator".to_string(),
        ));
    }

    let booking = load_booking_for_payment(&state, &headers, &booking_id)?;

    {
        let db = state.db.lock().unwrap();
        payment_service::simulate_success(&db, &booking.id, method)?;
    }

    tracing::info!(booking_id = %booking.id, method = method.as_str(), "payment simulated");
    Ok(Json(PaymentResultResponse {
        ok: true,
        payment_status: "paid".to_string(),
        status: "confirmed".to_string(),
    }))
}

// POST /api/bookings/:id/bank-transfer
pub async fn record_bank_transfer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = load_booking_for_payment(&state, &headers, &booking_id)?;

    {
        let db = state.db.lock().unwrap();
        payment_service::record_bank_transfer(&db, &booking.id)?;
    }

    Ok(Json(serde_json::json!({
        "ok": true,
        "message": "Transfer recorded; the booking is awaiting admin confirmation",
    })))
}

// POST /api/admin/bookings/:id/confirm-payment
pub async fn admin_confirm_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;

    let db = state.db.lock().unwrap();
    let booking = queries::get_booking(&db, &booking_id)?
        .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

    if payment_service::confirm_bank_transfer(&db, &booking)? {
        tracing::info!(booking_id = %booking_id, "bank transfer confirmed");
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        tracing::warn!(booking_id = %booking_id, "confirm skipped: payment not pending");
        Ok(Json(serde_json::json!({
            "ok": false,
            "warning": "This booking is not awaiting payment confirmation",
        })))
    }
}

// POST /api/admin/bookings/:id/reject-payment
pub async fn admin_reject_payment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;

    let db = state.db.lock().unwrap();
    let booking = queries::get_booking(&db, &booking_id)?
        .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

    if payment_service::reject_bank_transfer(&db, &booking)? {
        tracing::info!(booking_id = %booking_id, "bank transfer rejected");
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        tracing::warn!(booking_id = %booking_id, "reject skipped: payment not pending");
        Ok(Json(serde_json::json!({
            "ok": false,
            "warning": "This booking is not awaiting payment confirmation",
        })))
    }
}
