use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Review, ReviewStatus};
use crate::services::reviews as review_service;
use crate::state::AppState;

// POST /api/bookings/:id/review
#[derive(Deserialize)]
pub struct SubmitReviewRequest {
    pub rating: i64,
    pub comment: Option<String>,
}

pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(booking_id): Path<String>,
    Json(body): Json<SubmitReviewRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = super::require_user(&state, &headers)?;

    let review = {
        let db = state.db.lock().unwrap();
        review_service::submit_review(
            &db,
            &booking_id,
            user.id,
            body.rating,
            body.comment,
            Utc::now().naive_utc(),
        )?
    };

    tracing::info!(review_id = review.id, booking_id = %booking_id, "review submitted");
    Ok(Json(serde_json::json!({ "id": review.id, "status": "pending" })))
}

// GET /api/admin/reviews
#[derive(Serialize)]
pub struct AdminReviewResponse {
    id: i64,
    booking_id: String,
    room_id: i64,
    user_id: i64,
    rating: i64,
    comment: Option<String>,
    status: String,
    admin_reply: Option<String>,
    created_at: String,
}

impl AdminReviewResponse {
    fn from_review(r: Review) -> Self {
        Self {
            id: r.id,
            booking_id: r.booking_id,
            room_id: r.room_id,
            user_id: r.user_id,
            rating: r.rating,
            comment: r.comment,
            status: r.status.as_str().to_string(),
            admin_reply: r.admin_reply,
            created_at: queries::fmt_dt(&r.created_at),
        }
    }
}

#[derive(Serialize)]
pub struct AdminReviewsResponse {
    reviews: Vec<AdminReviewResponse>,
    total: i64,
    pending: i64,
    approved: i64,
    average_rating: f64,
}

pub async fn admin_list_reviews(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AdminReviewsResponse>, AppError> {
    super::require_admin(&state, &headers)?;

    let db = state.db.lock().unwrap();
    let reviews = queries::list_reviews_pending_first(&db)?;
    let stats = queries::review_stats(&db)?;

    Ok(Json(AdminReviewsResponse {
        reviews: reviews.into_iter().map(AdminReviewResponse::from_review).collect(),
        total: stats.total,
        pending: stats.pending,
        approved: stats.approved,
        average_rating: stats.average_rating,
    }))
}

fn moderate(
    state: &AppState,
    headers: &HeaderMap,
    review_id: i64,
    status: ReviewStatus,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(state, headers)?;

    let db = state.db.lock().unwrap();
    if !queries::set_review_status(&db, review_id, status)? {
        return Err(AppError::NotFound("review".to_string()));
    }
    Ok(Json(serde_json::json!({ "ok": true, "status": status.as_str() })))
}

// POST /api/admin/reviews/:id/approve
pub async fn admin_approve_review(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(review_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    moderate(&state, &headers, review_id, ReviewStatus::Approved)
}

// POST /api/admin/reviews/:id/reject
pub async fn admin_reject_review(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(review_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    moderate(&state, &headers, review_id, ReviewStatus::Rejected)
}

// POST /api/admin/reviews/:id/reply
#[derive(Deserialize)]
pub struct ReplyRequest {
    pub reply: String,
}

pub async fn admin_reply_review(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(review_id): Path<i64>,
    Json(body): Json<ReplyRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    super::require_admin(&state, &headers)?;

    let reply = body.reply.trim();
    if reply.is_empty() {
        return Err(AppError::Validation("Reply text is required".to_string()));
    }

    let db = state.db.lock().unwrap();
    if !queries::set_review_reply(&db, review_id, reply, &Utc::now().naive_utc())? {
        return Err(AppError::NotFound("review".to_string()));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}
