use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::models::{Booking, BookingStatus, Hotel, PaymentMethod, Room, RoomStatus};

#[derive(Debug, Clone, Copy)]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
    Custom { start: NaiveDate, end: NaiveDate },
}

/// Reporting window for a period selector, as `[start, end)`. The rolling
/// periods end one second past `now` so rows stamped this instant are still
/// inside the half-open range.
pub(crate) fn period_window(period: Period, now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let midnight = |d: NaiveDate| d.and_hms_opt(0, 0, 0).expect("midnight is valid");
    let through_now = now + Duration::seconds(1);
    match period {
        Period::Day => (midnight(now.date()), through_now),
        Period::Week => {
            let monday = now.date()
                - Duration::days(i64::from(now.date().weekday().num_days_from_monday()));
            (midnight(monday), through_now)
        }
        Period::Month => {
            let first = now.date().with_day0(0).expect("day 1 exists");
            (midnight(first), through_now)
        }
        Period::Year => {
            let first = now.date().with_ordinal0(0).expect("Jan 1 exists");
            (midnight(first), through_now)
        }
        Period::Custom { start, end } => (midnight(start), midnight(end) + Duration::days(1)),
    }
}

#[derive(Debug, Serialize)]
pub struct DailyRevenue {
    pub day: String,
    pub revenue: f64,
}

#[derive(Debug, Serialize)]
pub struct BookingStatusCounts {
    pub pending: i64,
    pub confirmed: i64,
    pub completed: i64,
    pub cancelled: i64,
}

#[derive(Debug, Serialize)]
pub struct PaymentMethodCounts {
    pub momo: i64,
    pub vnpay: i64,
    pub zalopay: i64,
    pub banking: i64,
}

#[derive(Debug, Serialize)]
pub struct TopRoomEntry {
    pub room_id: i64,
    pub room_number: String,
    pub room_type: String,
    pub revenue: f64,
    pub bookings_count: i64,
}

#[derive(Debug, Serialize)]
pub struct RevenueReport {
    pub total_revenue: f64,
    pub total_bookings: i64,
    pub avg_booking_value: f64,
    pub occupancy_rate: f64,
    pub revenue_growth: f64,
    pub booking_growth: f64,
    pub daily_revenue: Vec<DailyRevenue>,
    pub status_counts: BookingStatusCounts,
    pub payment_methods: PaymentMethodCounts,
    pub top_rooms: Vec<TopRoomEntry>,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Growth vs the immediately preceding equal-length window. A zero prior
/// value is treated as 1 to keep the ratio defined; the result is an
/// approximation, not a precise statistic.
fn growth_percent(current: f64, prior: f64) -> f64 {
    let prior = if prior <= 0.0 { 1.0 } else { prior };
    round1((current - prior) / prior * 100.0)
}

pub fn revenue_report(
    conn: &Connection,
    period: Period,
    now: NaiveDateTime,
) -> anyhow::Result<RevenueReport> {
    let (start, end) = period_window(period, now);

    let total_revenue = queries::paid_revenue_between(conn, &start, &end)?;
    let total_bookings = queries::bookings_created_between(conn, &start, &end)?;
    let avg_booking_value = if total_bookings > 0 {
        total_revenue / total_bookings as f64
    } else {
        0.0
    };

    let occupied = queries::confirmed_spanning(conn, &now)?;
    let room_count = queries::available_room_count(conn)?;
    let occupancy_rate = if room_count > 0 {
        round1(occupied as f64 / room_count as f64 * 100.0)
    } else {
        0.0
    };

    let window = end - start;
    let prev_start = start - window;
    let prev_revenue = queries::paid_revenue_between(conn, &prev_start, &start)?;
    let prev_bookings = queries::bookings_created_between(conn, &prev_start, &start)?;

    let mut daily_revenue = Vec::with_capacity(30);
    for i in (1..=30).rev() {
        let day = now.date() - Duration::days(i);
        let day_start = day.and_hms_opt(0, 0, 0).expect("midnight is valid");
        let day_end = day_start + Duration::days(1);
        daily_revenue.push(DailyRevenue {
            day: day.format("%d/%m").to_string(),
            revenue: queries::paid_revenue_between(conn, &day_start, &day_end)?,
        });
    }

    let counts = queries::booking_status_counts(conn)?;
    let payment_methods = PaymentMethodCounts {
        momo: queries::paid_count_for_method(conn, PaymentMethod::Momo)?,
        vnpay: queries::paid_count_for_method(conn, PaymentMethod::Vnpay)?,
        zalopay: queries::paid_count_for_method(conn, PaymentMethod::Zalopay)?,
        banking: queries::paid_count_for_method(conn, PaymentMethod::Banking)?,
    };

    let top_rooms = queries::top_rooms_by_revenue(conn, 5)?
        .into_iter()
        .map(|r| TopRoomEntry {
            room_id: r.room_id,
            room_number: r.room_number,
            room_type: r.room_type,
            revenue: r.revenue,
            bookings_count: r.bookings_count,
        })
        .collect();

    Ok(RevenueReport {
        total_revenue,
        total_bookings,
        avg_booking_value,
        occupancy_rate,
        revenue_growth: growth_percent(total_revenue, prev_revenue),
        booking_growth: growth_percent(total_bookings as f64, prev_bookings as f64),
        daily_revenue,
        status_counts: BookingStatusCounts {
            pending: counts.pending,
            confirmed: counts.confirmed,
            completed: counts.completed,
            cancelled: counts.cancelled,
        },
        payment_methods,
        top_rooms,
    })
}

#[derive(Debug, Serialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: f64,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub total_users: i64,
    pub total_bookings: i64,
    pub total_rooms: i64,
    pub pending_reviews: i64,
    pub total_revenue: f64,
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

pub fn dashboard_summary(
    conn: &Connection,
    now: NaiveDateTime,
) -> anyhow::Result<DashboardSummary> {
    let since = now - Duration::days(180);
    let actual = queries::monthly_revenue_since(conn, &since)?;

    // Six fixed buckets so the chart has no gaps.
    let mut monthly_revenue = Vec::with_capacity(6);
    for i in (0..6u32).rev() {
        let month = (now.date() - Months::new(i)).format("%Y-%m").to_string();
        let revenue = actual
            .iter()
            .find(|(m, _)| *m == month)
            .map(|(_, r)| *r)
            .unwrap_or(0.0);
        monthly_revenue.push(MonthlyRevenue { month, revenue });
    }

    Ok(DashboardSummary {
        total_users: queries::count_users(conn)?,
        total_bookings: queries::count_bookings(conn)?,
        total_rooms: queries::count_rooms(conn)?,
        pending_reviews: queries::pending_review_count(conn)?,
        total_revenue: queries::completed_paid_revenue(conn)?,
        monthly_revenue,
    })
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    Available,
    Reserved,
    Occupied,
    Maintenance,
}

/// Booking-aware room state for the occupancy map. A spanning booking means
/// reserved until the guest has actually checked in.
pub fn derive_room_state(room: &Room, current: Option<&Booking>) -> RoomState {
    if room.status == RoomStatus::Maintenance {
        return RoomState::Maintenance;
    }
    match current {
        Some(b) if b.status == BookingStatus::CheckedIn => RoomState::Occupied,
        Some(_) => RoomState::Reserved,
        None => RoomState::Available,
    }
}

#[derive(Debug, Serialize)]
pub struct RoomMapEntry {
    pub room: Room,
    pub state: RoomState,
    pub current_booking: Option<Booking>,
}

#[derive(Debug, Serialize)]
pub struct HotelRoomMap {
    pub hotel: Hotel,
    pub rooms: Vec<RoomMapEntry>,
}

pub fn room_map(conn: &Connection, date: NaiveDate) -> anyhow::Result<Vec<HotelRoomMap>> {
    let at = date.and_hms_opt(0, 0, 0).expect("midnight is valid");
    let mut map = vec![];
    for hotel in queries::list_hotels(conn)? {
        let mut rooms = vec![];
        for room in queries::rooms_for_hotel(conn, hotel.id)? {
            let current = queries::current_booking_for_room(conn, room.id, &at)?;
            let state = derive_room_state(&room, current.as_ref());
            rooms.push(RoomMapEntry {
                room,
                state,
                current_booking: current,
            });
        }
        map.push(HotelRoomMap { hotel, rooms });
    }
    Ok(map)
}

#[derive(Debug, Serialize)]
pub struct AdminRoomDetail {
    pub room: Room,
    pub state: RoomState,
    pub current_booking: Option<Booking>,
    pub upcoming_bookings: Vec<Booking>,
}

pub fn admin_room_detail(
    conn: &Connection,
    room_id: i64,
    now: NaiveDateTime,
) -> anyhow::Result<Option<AdminRoomDetail>> {
    let Some(room) = queries::get_room(conn, room_id)? else {
        return Ok(None);
    };
    let current = queries::current_booking_for_room(conn, room_id, &now)?;
    let state = derive_room_state(&room, current.as_ref());
    let upcoming = queries::upcoming_bookings_for_room(conn, room_id, &now, 5)?;
    Ok(Some(AdminRoomDetail {
        room,
        state,
        current_booking: current,
        upcoming_bookings: upcoming,
    }))
}
