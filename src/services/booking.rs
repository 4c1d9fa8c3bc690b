use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::models::{Booking, BookingStatus, PaymentStatus, User};
use crate::services::policy::{self, Action};

#[derive(Debug)]
pub enum BookingError {
    RoomNotFound,
    CheckInPast,
    InvalidRange,
    Overcapacity { max_people: i64 },
    Unavailable,
    Database(anyhow::Error),
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingError::RoomNotFound => write!(f, "Room not found"),
            BookingError::CheckInPast => {
                write!(f, "Check-in date must be today or later")
            }
            BookingError::InvalidRange => {
                write!(f, "Check-out date must be after check-in")
            }
            BookingError::Overcapacity { max_people } => {
                write!(f, "This room sleeps at most {max_people} guests")
            }
            BookingError::Unavailable => {
                write!(f, "The room is already booked for those dates")
            }
            BookingError::Database(e) => write!(f, "database error: {e}"),
        }
    }
}

/// Why a requested promotion code was not applied. None of these abort the
/// booking; the reason is surfaced alongside the created booking.
#[derive(Debug, PartialEq)]
pub enum PromotionSkip {
    NotFound,
    NotValid,
    BelowMinimum { min_amount: f64 },
    Exhausted,
}

impl std::fmt::Display for PromotionSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromotionSkip::NotFound => write!(f, "Promotion code not found"),
            PromotionSkip::NotValid => write!(f, "Promotion code is not currently valid"),
            PromotionSkip::BelowMinimum { min_amount } => {
                write!(f, "Order must be at least {min_amount:.0} to use this code")
            }
            PromotionSkip::Exhausted => write!(f, "Promotion code has no uses left"),
        }
    }
}

#[derive(Debug)]
pub enum PromotionOutcome {
    NotRequested,
    Applied { code: String, discount: f64 },
    Skipped(PromotionSkip),
}

pub struct BookingRequest {
    pub room_id: i64,
    pub user_id: Option<i64>,
    pub guest_name: String,
    pub guest_phone: String,
    pub guest_address: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: i64,
    pub children: i64,
    pub promotion_code: Option<String>,
    pub special_requests: Option<String>,
}

#[derive(Debug)]
pub struct CreatedBooking {
    pub booking: Booking,
    pub promotion: PromotionOutcome,
}

/// Creates a booking in pending/unpaid state.
///
/// Validation runs in a fixed order (dates, occupancy, availability) and
/// the first failure aborts without touching the database. The availability
/// check, the optional promotion-usage increment and the insert share one
/// transaction, so a failed commit leaves neither a booking nor a consumed
/// promotion use behind.
pub fn create_booking(
    conn: &mut Connection,
    req: &BookingRequest,
    now: NaiveDateTime,
) -> Result<CreatedBooking, BookingError> {
    let room = queries::get_room(conn, req.room_id)
        .map_err(BookingError::Database)?
        .ok_or(BookingError::RoomNotFound)?;

    if req.check_in < now.date() {
        return Err(BookingError::CheckInPast);
    }
    if req.check_out <= req.check_in {
        return Err(BookingError::InvalidRange);
    }
    if req.adults + req.children > room.max_people {
        return Err(BookingError::Overcapacity {
            max_people: room.max_people,
        });
    }

    let check_in = req.check_in.and_hms_opt(0, 0, 0).expect("midnight is valid");
    let check_out = req.check_out.and_hms_opt(0, 0, 0).expect("midnight is valid");

    let tx = conn.transaction().map_err(|e| BookingError::Database(e.into()))?;

    let taken = queries::has_overlapping_booking(&tx, req.room_id, &check_in, &check_out)
        .map_err(BookingError::Database)?;
    if taken {
        return Err(BookingError::Unavailable);
    }

    let nights = (req.check_out - req.check_in).num_days();
    let mut total_price = room.price * nights as f64;

    let mut promotion = PromotionOutcome::NotRequested;
    let mut applied_code = None;
    if let Some(code) = req.promotion_code.as_deref().filter(|c| !c.is_empty()) {
        promotion = match queries::get_promotion_by_code(&tx, code)
            .map_err(BookingError::Database)?
        {
            None => PromotionOutcome::Skipped(PromotionSkip::NotFound),
            Some(promo) if !promo.active || now < promo.start_date || now > promo.end_date => {
                PromotionOutcome::Skipped(PromotionSkip::NotValid)
            }
            Some(promo) if total_price < promo.min_amount => {
                PromotionOutcome::Skipped(PromotionSkip::BelowMinimum {
                    min_amount: promo.min_amount,
                })
            }
            Some(promo) if promo.exhausted() => PromotionOutcome::Skipped(PromotionSkip::Exhausted),
            Some(promo) => {
                let discount = total_price * (promo.discount_percent / 100.0);
                total_price -= discount;
                queries::increment_promotion_use(&tx, &promo.code)
                    .map_err(BookingError::Database)?;
                applied_code = Some(promo.code.clone());
                PromotionOutcome::Applied {
                    code: promo.code,
                    discount,
                }
            }
        };
    }

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        user_id: req.user_id,
        room_id: req.room_id,
        guest_name: req.guest_name.clone(),
        guest_phone: req.guest_phone.clone(),
        guest_address: req.guest_address.clone(),
        check_in,
        check_out,
        adults: req.adults,
        children: req.children,
        total_price,
        payment_method: None,
        payment_status: PaymentStatus::Unpaid,
        status: BookingStatus::Pending,
        promotion_code: applied_code,
        special_requests: req.special_requests.clone(),
        created_at: now,
        updated_at: now,
    };

    queries::insert_booking(&tx, &booking).map_err(BookingError::Database)?;
    tx.commit().map_err(|e| BookingError::Database(e.into()))?;

    Ok(CreatedBooking { booking, promotion })
}

/// One-click booking: tomorrow 14:00 for a single night at full price.
pub fn quick_book(
    conn: &mut Connection,
    user: &User,
    room_id: i64,
    now: NaiveDateTime,
) -> Result<Booking, BookingError> {
    let room = queries::get_room(conn, room_id)
        .map_err(BookingError::Database)?
        .ok_or(BookingError::RoomNotFound)?;

    let check_in = (now.date() + Duration::days(1))
        .and_hms_opt(14, 0, 0)
        .expect("14:00 is valid");
    let check_out = check_in + Duration::days(1);

    let tx = conn.transaction().map_err(|e| BookingError::Database(e.into()))?;

    let taken = queries::has_overlapping_booking(&tx, room_id, &check_in, &check_out)
        .map_err(BookingError::Database)?;
    if taken {
        return Err(BookingError::Unavailable);
    }

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        user_id: Some(user.id),
        room_id,
        guest_name: user.full_name.clone(),
        guest_phone: user.phone.clone().unwrap_or_default(),
        guest_address: user.address.clone(),
        check_in,
        check_out,
        adults: 1,
        children: 0,
        total_price: room.price,
        payment_method: None,
        payment_status: PaymentStatus::Unpaid,
        status: BookingStatus::Pending,
        promotion_code: None,
        special_requests: None,
        created_at: now,
        updated_at: now,
    };

    queries::insert_booking(&tx, &booking).map_err(BookingError::Database)?;
    tx.commit().map_err(|e| BookingError::Database(e.into()))?;

    Ok(booking)
}

#[derive(Debug)]
pub enum CancelError {
    NotFound,
    NotPermitted,
    AlreadyCancelled,
    CheckInStarted,
    Database(anyhow::Error),
}

impl std::fmt::Display for CancelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelError::NotFound => write!(f, "Booking not found"),
            CancelError::NotPermitted => write!(f, "You cannot cancel this booking"),
            CancelError::AlreadyCancelled => write!(f, "This booking was already cancelled"),
            CancelError::CheckInStarted => {
                write!(f, "Bookings cannot be cancelled on or after the check-in date")
            }
            CancelError::Database(e) => write!(f, "database error: {e}"),
        }
    }
}

#[derive(Debug)]
pub struct CancelOutcome {
    /// Set when the booking was already paid; no automated refunds exist.
    pub refund_note: Option<&'static str>,
}

pub fn cancel_booking(
    conn: &Connection,
    booking_id: &str,
    actor: Option<&User>,
    now: NaiveDateTime,
) -> Result<CancelOutcome, CancelError> {
    let booking = queries::get_booking(conn, booking_id)
        .map_err(CancelError::Database)?
        .ok_or(CancelError::NotFound)?;

    if !policy::allows(actor, Action::CancelBooking(&booking)) {
        return Err(CancelError::NotPermitted);
    }
    if booking.status == BookingStatus::Cancelled {
        return Err(CancelError::AlreadyCancelled);
    }
    if booking.check_in <= now {
        return Err(CancelError::CheckInStarted);
    }

    queries::update_booking_status(conn, booking_id, BookingStatus::Cancelled)
        .map_err(CancelError::Database)?;

    let refund_note = (booking.payment_status == PaymentStatus::Paid)
        .then_some("This booking was already paid; contact support for a refund.");
    Ok(CancelOutcome { refund_note })
}
