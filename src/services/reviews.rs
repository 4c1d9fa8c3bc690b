use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Booking, BookingStatus, Review, ReviewStatus};

#[derive(Debug)]
pub enum ReviewError {
    BookingNotFound,
    NotYourBooking,
    StayNotCompleted,
    AlreadyReviewed,
    InvalidRating,
    Database(anyhow::Error),
}

impl std::fmt::Display for ReviewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewError::BookingNotFound => write!(f, "Booking not found"),
            ReviewError::NotYourBooking => write!(f, "You can only review your own bookings"),
            ReviewError::StayNotCompleted => {
                write!(f, "Reviews are only possible after a completed stay")
            }
            ReviewError::AlreadyReviewed => write!(f, "This booking was already reviewed"),
            ReviewError::InvalidRating => write!(f, "Rating must be between 1 and 5"),
            ReviewError::Database(e) => write!(f, "database error: {e}"),
        }
    }
}

/// Each completed booking gets at most one review, submitted by its owner.
/// New reviews start out pending moderation.
pub fn submit_review(
    conn: &Connection,
    booking_id: &str,
    user_id: i64,
    rating: i64,
    comment: Option<String>,
    now: NaiveDateTime,
) -> Result<Review, ReviewError> {
    let booking = queries::get_booking(conn, booking_id)
        .map_err(ReviewError::Database)?
        .ok_or(ReviewError::BookingNotFound)?;

    if booking.user_id != Some(user_id) {
        return Err(ReviewError::NotYourBooking);
    }
    if booking.status != BookingStatus::Completed {
        return Err(ReviewError::StayNotCompleted);
    }
    if queries::review_exists_for_booking(conn, booking_id).map_err(ReviewError::Database)? {
        return Err(ReviewError::AlreadyReviewed);
    }
    if !(1..=5).contains(&rating) {
        return Err(ReviewError::InvalidRating);
    }

    let mut review = Review {
        id: 0,
        booking_id: booking_id.to_string(),
        room_id: booking.room_id,
        user_id,
        rating,
        comment,
        status: ReviewStatus::Pending,
        admin_reply: None,
        reply_at: None,
        created_at: now,
    };
    review.id = queries::insert_review(conn, &review).map_err(ReviewError::Database)?;
    Ok(review)
}

/// Pure view-side helper: a booking is reviewable by its owner once the stay
/// completed and no review exists yet.
pub fn can_review(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    if booking.status != BookingStatus::Completed {
        return Ok(false);
    }
    Ok(!queries::review_exists_for_booking(conn, &booking.id)?)
}
