use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

// GET /api/locations
pub async fn list_locations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<crate::models::Location>>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_locations(&db)?))
}

// GET /api/hotels
pub async fn list_hotels(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<crate::models::Hotel>>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_hotels(&db)?))
}

// GET /api/rooms/search
#[derive(Deserialize)]
pub struct SearchQuery {
    pub location_id: Option<i64>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub guests: Option<i64>,
    pub room_type: Option<String>,
}

#[derive(Serialize)]
pub struct RoomSummaryResponse {
    id: i64,
    hotel_id: i64,
    hotel_name: String,
    room_number: String,
    room_type: String,
    price: f64,
    max_people: i64,
}

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {s}")))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<RoomSummaryResponse>>, AppError> {
    let interval = match (query.check_in.as_deref(), query.check_out.as_deref()) {
        (Some(in_str), Some(out_str)) => {
            let check_in = parse_date(in_str)?;
            let check_out = parse_date(out_str)?;
            if check_out <= check_in {
                return Err(AppError::Validation(
                    "Check-out date must be after check-in".to_string(),
                ));
            }
            let midnight = |d: NaiveDate| d.and_hms_opt(0, 0, 0).expect("midnight is valid");
            Some((midnight(check_in), midnight(check_out)))
        }
        (None, None) => None,
        _ => {
            return Err(AppError::Validation(
                "Both check-in and check-out dates are required".to_string(),
            ))
        }
    };

    let search = queries::RoomSearch {
        location_id: query.location_id,
        guests: query.guests,
        room_type: query.room_type.filter(|t| !t.trim().is_empty()),
        interval,
    };

    let rooms = {
        let db = state.db.lock().unwrap();
        queries::search_rooms(&db, &search)?
    };

    Ok(Json(
        rooms
            .into_iter()
            .map(|r| RoomSummaryResponse {
                id: r.id,
                hotel_id: r.hotel_id,
                hotel_name: r.hotel_name,
                room_number: r.room_number,
                room_type: r.room_type,
                price: r.price,
                max_people: r.max_people,
            })
            .collect(),
    ))
}

// GET /api/rooms/:id
#[derive(Serialize)]
pub struct ReviewResponse {
    rating: i64,
    comment: Option<String>,
    admin_reply: Option<String>,
    created_at: String,
}

#[derive(Serialize)]
pub struct RoomDetailResponse {
    room: crate::models::Room,
    hotel: Option<crate::models::Hotel>,
    reviews: Vec<ReviewResponse>,
    avg_rating: Option<f64>,
    can_review: bool,
    booking_to_review: Option<String>,
}

pub async fn room_detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(room_id): Path<i64>,
) -> Result<Json<RoomDetailResponse>, AppError> {
    let user = super::session_user(&state, &headers)?;

    let db = state.db.lock().unwrap();
    let room = queries::get_room(&db, room_id)?
        .ok_or_else(|| AppError::NotFound("room".to_string()))?;
    let hotel = queries::get_hotel(&db, room.hotel_id)?;

    let reviews = queries::approved_reviews_for_room(&db, room_id)?
        .into_iter()
        .map(|r| ReviewResponse {
            rating: r.rating,
            comment: r.comment,
            admin_reply: r.admin_reply,
            created_at: queries::fmt_dt(&r.created_at),
        })
        .collect();
    let avg_rating = queries::avg_rating_for_room(&db, room_id)?;

    let booking_to_review = match &user {
        Some(u) => queries::reviewable_booking(&db, u.id, room_id)?,
        None => None,
    };

    Ok(Json(RoomDetailResponse {
        room,
        hotel,
        reviews,
        avg_rating,
        can_review: booking_to_review.is_some(),
        booking_to_review,
    }))
}

// GET /api/promotions
#[derive(Serialize)]
pub struct PromotionResponse {
    code: String,
    description: Option<String>,
    discount_percent: f64,
    min_amount: f64,
    end_date: String,
}

pub async fn list_promotions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PromotionResponse>>, AppError> {
    let now = Utc::now().naive_utc();
    let db = state.db.lock().unwrap();
    let promotions = queries::list_valid_promotions(&db, &now)?;

    Ok(Json(
        promotions
            .into_iter()
            .map(|p| PromotionResponse {
                code: p.code,
                description: p.description,
                discount_percent: p.discount_percent,
                min_amount: p.min_amount,
                end_date: queries::fmt_dt(&p.end_date),
            })
            .collect(),
    ))
}
