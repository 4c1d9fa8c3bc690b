use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries;

/// A room is available for `[check_in, check_out)` when no non-cancelled
/// booking overlaps it. Two intervals `[a1,a2)` and `[b1,b2)` overlap iff
/// `a1 < b2 && b1 < a2`, so a stay that ends on another's check-in day is
/// fine. Read-only.
pub fn is_available(
    conn: &Connection,
    room_id: i64,
    check_in: &NaiveDateTime,
    check_out: &NaiveDateTime,
) -> anyhow::Result<bool> {
    Ok(!queries::has_overlapping_booking(
        conn, room_id, check_in, check_out,
    )?)
}
