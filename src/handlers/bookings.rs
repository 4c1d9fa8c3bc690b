use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Booking;
use crate::services::booking::{self as booking_service, BookingRequest, PromotionOutcome};
use crate::services::policy::{self, Action};
use crate::services::reviews;
use crate::state::AppState;

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {s}")))
}

#[derive(Serialize)]
pub struct BookingResponse {
    id: String,
    room_id: i64,
    guest_name: String,
    check_in: String,
    check_out: String,
    nights: i64,
    adults: i64,
    children: i64,
    total_price: f64,
    payment_method: Option<String>,
    payment_status: String,
    status: String,
    promotion_code: Option<String>,
    created_at: String,
}

impl BookingResponse {
    pub(crate) fn from_booking(b: &Booking) -> Self {
        Self {
            id: b.id.clone(),
            room_id: b.room_id,
            guest_name: b.guest_name.clone(),
            check_in: queries::fmt_dt(&b.check_in),
            check_out: queries::fmt_dt(&b.check_out),
            nights: b.nights(),
            adults: b.adults,
            children: b.children,
            total_price: b.total_price,
            payment_method: b.payment_method.map(|m| m.as_str().to_string()),
            payment_status: b.payment_status.as_str().to_string(),
            status: b.status.as_str().to_string(),
            promotion_code: b.promotion_code.clone(),
            created_at: queries::fmt_dt(&b.created_at),
        }
    }
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub room_id: i64,
    pub guest_name: String,
    pub guest_phone: String,
    pub guest_address: Option<String>,
    pub check_in: String,
    pub check_out: String,
    #[serde(default = "default_adults")]
    pub adults: i64,
    #[serde(default)]
    pub children: i64,
    pub promotion_code: Option<String>,
    pub special_requests: Option<String>,
}

fn default_adults() -> i64 {
    1
}

#[derive(Serialize)]
pub struct CreateBookingResponse {
    booking: BookingResponse,
    promotion_applied: bool,
    promotion_message: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> Result<Json<CreateBookingResponse>, AppError> {
    let user = super::session_user(&state, &headers)?;

    if body.guest_name.trim().is_empty() || body.guest_phone.trim().is_empty() {
        return Err(AppError::Validation(
            "Guest name and phone are required".to_string(),
        ));
    }

    let request = BookingRequest {
        room_id: body.room_id,
        user_id: user.map(|u| u.id),
        guest_name: body.guest_name.trim().to_string(),
        guest_phone: body.guest_phone.trim().to_string(),
        guest_address: body.guest_address,
        check_in: parse_date(&body.check_in)?,
        check_out: parse_date(&body.check_out)?,
        adults: body.adults,
        children: body.children,
        promotion_code: body.promotion_code,
        special_requests: body.special_requests,
    };

    let created = {
        let mut db = state.db.lock().unwrap();
        booking_service::create_booking(&mut db, &request, Utc::now().naive_utc())?
    };

    let (promotion_applied, promotion_message) = match &created.promotion {
        PromotionOutcome::NotRequested => (false, None),
        PromotionOutcome::Applied { code, discount } => (
            true,
            Some(format!("Code {code} applied, you saved {discount:.0}")),
        ),
        PromotionOutcome::Skipped(skip) => (false, Some(skip.to_string())),
    };

    tracing::info!(
        booking_id = %created.booking.id,
        room_id = created.booking.room_id,
        "booking created"
    );

    Ok(Json(CreateBookingResponse {
        booking: BookingResponse::from_booking(&created.booking),
        promotion_applied,
        promotion_message,
    }))
}

// POST /api/rooms/:id/quick-book
pub async fn quick_book(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(room_id): Path<i64>,
) -> Result<Json<BookingResponse>, AppError> {
    let user = super::require_user(&state, &headers)?;

    let booking = {
        let mut db = state.db.lock().unwrap();
        booking_service::quick_book(&mut db, &user, room_id, Utc::now().naive_utc())?
    };

    Ok(Json(BookingResponse::from_booking(&booking)))
}

// GET /api/bookings/:id
pub async fn booking_detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let user = super::session_user(&state, &headers)?;

    let db = state.db.lock().unwrap();
    let booking = queries::get_booking(&db, &booking_id)?
        .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

    if !policy::allows(user.as_ref(), Action::ViewBooking(&booking)) {
        return Err(AppError::Forbidden);
    }

    Ok(Json(BookingResponse::from_booking(&booking)))
}

// GET /api/my/bookings
#[derive(Serialize)]
pub struct MyBookingResponse {
    #[serde(flatten)]
    booking: BookingResponse,
    can_review: bool,
}

pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<MyBookingResponse>>, AppError> {
    let user = super::require_user(&state, &headers)?;

    let db = state.db.lock().unwrap();
    let bookings = queries::bookings_for_user(&db, user.id)?;

    let mut response = Vec::with_capacity(bookings.len());
    for booking in &bookings {
        response.push(MyBookingResponse {
            booking: BookingResponse::from_booking(booking),
            can_review: reviews::can_review(&db, booking)?,
        });
    }
    Ok(Json(response))
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = super::session_user(&state, &headers)?;

    let outcome = {
        let db = state.db.lock().unwrap();
        booking_service::cancel_booking(&db, &booking_id, user.as_ref(), Utc::now().naive_utc())?
    };

    tracing::info!(booking_id = %booking_id, "booking cancelled");
    Ok(Json(serde_json::json!({
        "ok": true,
        "note": outcome.refund_note,
    })))
}
