use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{BookingStatus, Hotel, Location, Promotion, Room, RoomStatus};
use crate::services::policy::{self, Action};
use crate::services::reports::{self, Period};
use crate::state::AppState;

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {s}")))
}

// GET /api/admin/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<reports::DashboardSummary>, AppError> {
    super::require_admin(&state, &headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(reports::dashboard_summary(&db, Utc::now().naive_utc())?))
}

// GET /api/admin/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<super::bookings::BookingResponse>>, AppError> {
    super::require_admin(&state, &headers)?;

    let db = state.db.lock().unwrap();
    let bookings = queries::all_bookings_pending_first(&db)?;
    Ok(Json(
        bookings
            .iter()
            .map(super::bookings::BookingResponse::from_booking)
            .collect(),
    ))
}

// POST /api/admin/bookings/:id/check-in
pub async fn check_in_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;

    let db = state.db.lock().unwrap();
    let booking = queries::get_booking(&db, &booking_id)?
        .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

    if booking.status != BookingStatus::Confirmed {
        return Err(AppError::Conflict(
            "Only confirmed bookings can be checked in".to_string(),
        ));
    }
    let today = Utc::now().naive_utc().date();
    if today < booking.check_in.date() {
        return Err(AppError::Conflict(
            "The check-in date has not arrived yet".to_string(),
        ));
    }

    queries::update_booking_status(&db, &booking_id, BookingStatus::CheckedIn)?;
    Ok(Json(serde_json::json!({ "ok": true, "status": "checked_in" })))
}

// GET /api/admin/room-map
#[derive(Deserialize)]
pub struct RoomMapQuery {
    pub date: Option<String>,
}

pub async fn room_map(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<RoomMapQuery>,
) -> Result<Json<Vec<reports::HotelRoomMap>>, AppError> {
    super::require_admin(&state, &headers)?;

    let date = match query.date.as_deref() {
        Some(s) => parse_date(s)?,
        None => Utc::now().naive_utc().date(),
    };

    let db = state.db.lock().unwrap();
    Ok(Json(reports::room_map(&db, date)?))
}

// GET /api/admin/rooms/:id
pub async fn room_detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(room_id): Path<i64>,
) -> Result<Json<reports::AdminRoomDetail>, AppError> {
    super::require_admin(&state, &headers)?;

    let db = state.db.lock().unwrap();
    reports::admin_room_detail(&db, room_id, Utc::now().naive_utc())?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("room".to_string()))
}

// ── Room CRUD ──

#[derive(Deserialize)]
pub struct RoomBody {
    pub hotel_id: i64,
    pub room_number: String,
    pub room_type: String,
    pub price: f64,
    pub max_people: i64,
    #[serde(default = "default_floor")]
    pub floor: i64,
    pub description: Option<String>,
    pub status: Option<String>,
}

fn default_floor() -> i64 {
    1
}

fn room_from_body(id: i64, body: RoomBody) -> Result<Room, AppError> {
    if body.room_number.trim().is_empty() || body.room_type.trim().is_empty() {
        return Err(AppError::Validation(
            "Room number and type are required".to_string(),
        ));
    }
    if body.price <= 0.0 {
        return Err(AppError::Validation("Price must be positive".to_string()));
    }
    if body.max_people <= 0 {
        return Err(AppError::Validation(
            "Occupancy must be at least 1".to_string(),
        ));
    }
    Ok(Room {
        id,
        hotel_id: body.hotel_id,
        room_number: body.room_number.trim().to_string(),
        room_type: body.room_type.trim().to_string(),
        price: body.price,
        max_people: body.max_people,
        floor: body.floor,
        description: body.description,
        status: body
            .status
            .as_deref()
            .map(RoomStatus::parse)
            .unwrap_or(RoomStatus::Available),
    })
}

// POST /api/admin/rooms
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RoomBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;
    let room = room_from_body(0, body)?;

    let db = state.db.lock().unwrap();
    if queries::get_hotel(&db, room.hotel_id)?.is_none() {
        return Err(AppError::NotFound("hotel".to_string()));
    }
    let id = queries::create_room(&db, &room)?;
    Ok(Json(serde_json::json!({ "id": id })))
}

// PUT /api/admin/rooms/:id
pub async fn update_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(room_id): Path<i64>,
    Json(body): Json<RoomBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;
    let room = room_from_body(room_id, body)?;

    let db = state.db.lock().unwrap();
    if !queries::update_room(&db, &room)? {
        return Err(AppError::NotFound("room".to_string()));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

// DELETE /api/admin/rooms/:id
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(room_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;

    let db = state.db.lock().unwrap();
    // Rooms stay around while any booking references them.
    if queries::count_bookings_for_room(&db, room_id)? > 0 {
        return Err(AppError::Conflict(
            "Rooms with bookings cannot be deleted; mark them as maintenance instead".to_string(),
        ));
    }
    if !queries::delete_room(&db, room_id)? {
        return Err(AppError::NotFound("room".to_string()));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

// ── Hotel CRUD ──

#[derive(Deserialize)]
pub struct HotelBody {
    pub location_id: i64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub rating: f64,
}

fn hotel_from_body(id: i64, body: HotelBody) -> Result<Hotel, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Hotel name is required".to_string()));
    }
    Ok(Hotel {
        id,
        location_id: body.location_id,
        name: body.name.trim().to_string(),
        address: body.address,
        phone: body.phone,
        email: body.email,
        description: body.description,
        rating: body.rating,
    })
}

// POST /api/admin/hotels
pub async fn create_hotel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<HotelBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;
    let hotel = hotel_from_body(0, body)?;

    let db = state.db.lock().unwrap();
    if queries::get_location(&db, hotel.location_id)?.is_none() {
        return Err(AppError::NotFound("location".to_string()));
    }
    let id = queries::create_hotel(&db, &hotel)?;
    Ok(Json(serde_json::json!({ "id": id })))
}

// PUT /api/admin/hotels/:id
pub async fn update_hotel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(hotel_id): Path<i64>,
    Json(body): Json<HotelBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;
    let hotel = hotel_from_body(hotel_id, body)?;

    let db = state.db.lock().unwrap();
    if !queries::update_hotel(&db, &hotel)? {
        return Err(AppError::NotFound("hotel".to_string()));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

// DELETE /api/admin/hotels/:id
pub async fn delete_hotel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(hotel_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;

    let db = state.db.lock().unwrap();
    if queries::count_rooms_in_hotel(&db, hotel_id)? > 0 {
        return Err(AppError::Conflict(
            "Hotels with rooms cannot be deleted".to_string(),
        ));
    }
    if !queries::delete_hotel(&db, hotel_id)? {
        return Err(AppError::NotFound("hotel".to_string()));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

// ── Location CRUD ──

#[derive(Deserialize)]
pub struct LocationBody {
    pub name: String,
    pub city: Option<String>,
    pub description: Option<String>,
}

fn location_from_body(id: i64, body: LocationBody) -> Result<Location, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("Location name is required".to_string()));
    }
    Ok(Location {
        id,
        name: body.name.trim().to_string(),
        city: body.city,
        description: body.description,
    })
}

// POST /api/admin/locations
pub async fn create_location(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<LocationBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;
    let location = location_from_body(0, body)?;

    let db = state.db.lock().unwrap();
    let id = queries::create_location(&db, &location)?;
    Ok(Json(serde_json::json!({ "id": id })))
}

// PUT /api/admin/locations/:id
pub async fn update_location(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(location_id): Path<i64>,
    Json(body): Json<LocationBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;
    let location = location_from_body(location_id, body)?;

    let db = state.db.lock().unwrap();
    if !queries::update_location(&db, &location)? {
        return Err(AppError::NotFound("location".to_string()));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

// DELETE /api/admin/locations/:id
pub async fn delete_location(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(location_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;

    let db = state.db.lock().unwrap();
    let hotels = queries::count_hotels_in_location(&db, location_id)?;
    if hotels > 0 {
        return Err(AppError::Conflict(format!(
            "Location still has {hotels} hotels"
        )));
    }
    if !queries::delete_location(&db, location_id)? {
        return Err(AppError::NotFound("location".to_string()));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

// ── Promotion CRUD ──

// GET /api/admin/promotions
pub async fn list_promotions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Promotion>>, AppError> {
    super::require_admin(&state, &headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_promotions(&db)?))
}

#[derive(Deserialize)]
pub struct PromotionBody {
    pub code: Option<String>,
    pub description: Option<String>,
    pub discount_percent: f64,
    #[serde(default)]
    pub min_amount: f64,
    pub max_uses: Option<i64>,
    pub start_date: String,
    pub end_date: String,
}

fn promotion_from_body(id: i64, code: String, body: PromotionBody) -> Result<Promotion, AppError> {
    if body.discount_percent <= 0.0 || body.discount_percent > 100.0 {
        return Err(AppError::Validation(
            "Discount must be between 0 and 100 percent".to_string(),
        ));
    }
    let start = parse_date(&body.start_date)?;
    let end = parse_date(&body.end_date)?;
    if end < start {
        return Err(AppError::Validation(
            "End date must not be before start date".to_string(),
        ));
    }
    let midnight = |d: NaiveDate| d.and_hms_opt(0, 0, 0).expect("midnight is valid");
    Ok(Promotion {
        id,
        code,
        description: body.description,
        discount_percent: body.discount_percent,
        min_amount: body.min_amount,
        max_uses: body.max_uses,
        current_uses: 0,
        start_date: midnight(start),
        // Codes stay valid through their final day.
        end_date: midnight(end) + chrono::Duration::days(1) - chrono::Duration::seconds(1),
        active: true,
    })
}

// POST /api/admin/promotions
pub async fn create_promotion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<PromotionBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;

    let code = body
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("Promotion code is required".to_string()))?
        .to_string();

    let promotion = promotion_from_body(0, code, body)?;

    let db = state.db.lock().unwrap();
    if queries::get_promotion_by_code(&db, &promotion.code)?.is_some() {
        return Err(AppError::Conflict("Promotion code already exists".to_string()));
    }
    let id = queries::create_promotion(&db, &promotion)?;
    Ok(Json(serde_json::json!({ "id": id })))
}

// PUT /api/admin/promotions/:id
pub async fn update_promotion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(promo_id): Path<i64>,
    Json(body): Json<PromotionBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;

    let db = state.db.lock().unwrap();
    let existing = queries::get_promotion(&db, promo_id)?
        .ok_or_else(|| AppError::NotFound("promotion".to_string()))?;

    // The code itself is immutable once issued.
    let promotion = promotion_from_body(promo_id, existing.code, body)?;
    queries::update_promotion(&db, &promotion)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

// POST /api/admin/promotions/:id/toggle
pub async fn toggle_promotion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(promo_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;

    let db = state.db.lock().unwrap();
    if !queries::toggle_promotion(&db, promo_id)? {
        return Err(AppError::NotFound("promotion".to_string()));
    }
    let promotion = queries::get_promotion(&db, promo_id)?;
    Ok(Json(serde_json::json!({
        "ok": true,
        "active": promotion.map(|p| p.active),
    })))
}

// DELETE /api/admin/promotions/:id
pub async fn delete_promotion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(promo_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;

    let db = state.db.lock().unwrap();
    let promotion = queries::get_promotion(&db, promo_id)?
        .ok_or_else(|| AppError::NotFound("promotion".to_string()))?;

    if promotion.current_uses > 0 {
        return Err(AppError::Conflict(
            "Used promotions cannot be deleted; deactivate them instead".to_string(),
        ));
    }
    queries::delete_promotion(&db, promo_id)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

// GET /api/admin/revenue
#[derive(Deserialize)]
pub struct RevenueQuery {
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub async fn revenue(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<reports::RevenueReport>, AppError> {
    let user = super::require_user(&state, &headers)?;
    if !policy::allows(Some(&user), Action::ViewRevenue) {
        return Err(AppError::Forbidden);
    }

    let now = Utc::now().naive_utc();
    let period = match query.period.as_deref().unwrap_or("month") {
        "day" => Period::Day,
        "week" => Period::Week,
        "year" => Period::Year,
        "custom" => match (query.start_date.as_deref(), query.end_date.as_deref()) {
            (Some(start), Some(end)) => {
                let start = parse_date(start)?;
                let end = parse_date(end)?;
                if end < start {
                    return Err(AppError::Validation(
                        "End date must not be before start date".to_string(),
                    ));
                }
                Period::Custom { start, end }
            }
            // Missing bounds fall back to the last 30 days.
            _ => Period::Custom {
                start: now.date() - chrono::Duration::days(30),
                end: now.date(),
            },
        },
        _ => Period::Month,
    };

    let db = state.db.lock().unwrap();
    Ok(Json(reports::revenue_report(&db, period, now)?))
}
