use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Booking, BookingStatus, Hotel, Location, PaymentMethod, PaymentStatus, Promotion, Review,
    ReviewStatus, Role, Room, RoomStatus, User,
};

const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format(DT_FORMAT).to_string()
}

pub fn parse_dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DT_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Locations ──

pub fn list_locations(conn: &Connection) -> anyhow::Result<Vec<Location>> {
    let mut stmt = conn.prepare("SELECT id, name, city, description FROM locations ORDER BY name")?;
    let rows = stmt.query_map([], |row| {
        Ok(Location {
            id: row.get(0)?,
            name: row.get(1)?,
            city: row.get(2)?,
            description: row.get(3)?,
        })
    })?;

    let mut locations = vec![];
    for row in rows {
        locations.push(row?);
    }
    Ok(locations)
}

pub fn get_location(conn: &Connection, id: i64) -> anyhow::Result<Option<Location>> {
    let result = conn.query_row(
        "SELECT id, name, city, description FROM locations WHERE id = ?1",
        params![id],
        |row| {
            Ok(Location {
                id: row.get(0)?,
                name: row.get(1)?,
                city: row.get(2)?,
                description: row.get(3)?,
            })
        },
    );

    match result {
        Ok(location) => Ok(Some(location)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn create_location(conn: &Connection, location: &Location) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO locations (name, city, description) VALUES (?1, ?2, ?3)",
        params![location.name, location.city, location.description],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_location(conn: &Connection, location: &Location) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE locations SET name = ?1, city = ?2, description = ?3 WHERE id = ?4",
        params![location.name, location.city, location.description, location.id],
    )?;
    Ok(count > 0)
}

pub fn delete_location(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM locations WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn count_hotels_in_location(conn: &Connection, location_id: i64) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM hotels WHERE location_id = ?1",
        params![location_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ── Hotels ──

fn parse_hotel_row(row: &rusqlite::Row) -> rusqlite::Result<Hotel> {
    Ok(Hotel {
        id: row.get(0)?,
        location_id: row.get(1)?,
        name: row.get(2)?,
        address: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        description: row.get(6)?,
        rating: row.get(7)?,
    })
}

pub fn list_hotels(conn: &Connection) -> anyhow::Result<Vec<Hotel>> {
    let mut stmt = conn.prepare(
        "SELECT id, location_id, name, address, phone, email, description, rating
         FROM hotels ORDER BY name",
    )?;
    let rows = stmt.query_map([], parse_hotel_row)?;

    let mut hotels = vec![];
    for row in rows {
        hotels.push(row?);
    }
    Ok(hotels)
}

pub fn get_hotel(conn: &Connection, id: i64) -> anyhow::Result<Option<Hotel>> {
    let result = conn.query_row(
        "SELECT id, location_id, name, address, phone, email, description, rating
         FROM hotels WHERE id = ?1",
        params![id],
        parse_hotel_row,
    );

    match result {
        Ok(hotel) => Ok(Some(hotel)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn create_hotel(conn: &Connection, hotel: &Hotel) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO hotels (location_id, name, address, phone, email, description, rating)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            hotel.location_id,
            hotel.name,
            hotel.address,
            hotel.phone,
            hotel.email,
            hotel.description,
            hotel.rating,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_hotel(conn: &Connection, hotel: &Hotel) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE hotels SET location_id = ?1, name = ?2, address = ?3, phone = ?4,
                email = ?5, description = ?6, rating = ?7
         WHERE id = ?8",
        params![
            hotel.location_id,
            hotel.name,
            hotel.address,
            hotel.phone,
            hotel.email,
            hotel.description,
            hotel.rating,
            hotel.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_hotel(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM hotels WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn count_rooms_in_hotel(conn: &Connection, hotel_id: i64) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM rooms WHERE hotel_id = ?1",
        params![hotel_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ── Rooms ──

fn parse_room_row(row: &rusqlite::Row) -> rusqlite::Result<Room> {
    let status_str: String = row.get(8)?;
    Ok(Room {
        id: row.get(0)?,
        hotel_id: row.get(1)?,
        room_number: row.get(2)?,
        room_type: row.get(3)?,
        price: row.get(4)?,
        max_people: row.get(5)?,
        floor: row.get(6)?,
        description: row.get(7)?,
        status: RoomStatus::parse(&status_str),
    })
}

const ROOM_COLUMNS: &str =
    "id, hotel_id, room_number, room_type, price, max_people, floor, description, status";

pub fn get_room(conn: &Connection, id: i64) -> anyhow::Result<Option<Room>> {
    let result = conn.query_row(
        &format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?1"),
        params![id],
        parse_room_row,
    );

    match result {
        Ok(room) => Ok(Some(room)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn rooms_for_hotel(conn: &Connection, hotel_id: i64) -> anyhow::Result<Vec<Room>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ROOM_COLUMNS} FROM rooms WHERE hotel_id = ?1 ORDER BY floor, room_number"
    ))?;
    let rows = stmt.query_map(params![hotel_id], parse_room_row)?;

    let mut rooms = vec![];
    for row in rows {
        rooms.push(row?);
    }
    Ok(rooms)
}

pub fn create_room(conn: &Connection, room: &Room) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO rooms (hotel_id, room_number, room_type, price, max_people, floor, description, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            room.hotel_id,
            room.room_number,
            room.room_type,
            room.price,
            room.max_people,
            room.floor,
            room.description,
            room.status.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_room(conn: &Connection, room: &Room) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE rooms SET hotel_id = ?1, room_number = ?2, room_type = ?3, price = ?4,
                max_people = ?5, floor = ?6, description = ?7, status = ?8
         WHERE id = ?9",
        params![
            room.hotel_id,
            room.room_number,
            room.room_type,
            room.price,
            room.max_people,
            room.floor,
            room.description,
            room.status.as_str(),
            room.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_room(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM rooms WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn count_bookings_for_room(conn: &Connection, room_id: i64) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE room_id = ?1",
        params![room_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub struct RoomSearch {
    pub location_id: Option<i64>,
    pub guests: Option<i64>,
    pub room_type: Option<String>,
    pub interval: Option<(NaiveDateTime, NaiveDateTime)>,
}

pub struct RoomSummary {
    pub id: i64,
    pub hotel_id: i64,
    pub hotel_name: String,
    pub room_number: String,
    pub room_type: String,
    pub price: f64,
    pub max_people: i64,
}

pub fn search_rooms(conn: &Connection, search: &RoomSearch) -> anyhow::Result<Vec<RoomSummary>> {
    let mut sql = String::from(
        "SELECT r.id, r.hotel_id, h.name, r.room_number, r.room_type, r.price, r.max_people
         FROM rooms r JOIN hotels h ON h.id = r.hotel_id
         WHERE r.status = 'available'",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(location_id) = search.location_id {
        params_vec.push(Box::new(location_id));
        sql.push_str(&format!(" AND h.location_id = ?{}", params_vec.len()));
    }
    if let Some(guests) = search.guests {
        params_vec.push(Box::new(guests));
        sql.push_str(&format!(" AND r.max_people >= ?{}", params_vec.len()));
    }
    if let Some(room_type) = &search.room_type {
        params_vec.push(Box::new(format!("%{room_type}%")));
        sql.push_str(&format!(" AND r.room_type LIKE ?{}", params_vec.len()));
    }
    if let Some((check_in, check_out)) = &search.interval {
        params_vec.push(Box::new(fmt_dt(check_out)));
        params_vec.push(Box::new(fmt_dt(check_in)));
        sql.push_str(&format!(
            " AND r.id NOT IN (
                 SELECT room_id FROM bookings
                 WHERE status IN ('pending', 'confirmed', 'checked_in')
                   AND check_in < ?{} AND check_out > ?{}
             )",
            params_vec.len() - 1,
            params_vec.len()
        ));
    }
    sql.push_str(" ORDER BY r.price");

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok(RoomSummary {
            id: row.get(0)?,
            hotel_id: row.get(1)?,
            hotel_name: row.get(2)?,
            room_number: row.get(3)?,
            room_type: row.get(4)?,
            price: row.get(5)?,
            max_people: row.get(6)?,
        })
    })?;

    let mut rooms = vec![];
    for row in rows {
        rooms.push(row?);
    }
    Ok(rooms)
}

// ── Users & Sessions ──

fn parse_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let role_str: String = row.get(6)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        full_name: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        role: Role::parse(&role_str),
    })
}

const USER_COLUMNS: &str = "id, email, password_hash, full_name, phone, address, role";

pub fn get_user(conn: &Connection, id: i64) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        parse_user_row,
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
        params![email],
        parse_user_row,
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn create_user(
    conn: &Connection,
    email: &str,
    password_hash: &str,
    full_name: &str,
    phone: Option<&str>,
    role: Role,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO users (email, password_hash, full_name, phone, role)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![email, password_hash, full_name, phone, role.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_user_profile(conn: &Connection, user: &User) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET full_name = ?1, phone = ?2, address = ?3 WHERE id = ?4",
        params![user.full_name, user.phone, user.address, user.id],
    )?;
    Ok(count > 0)
}

pub fn update_user_password(conn: &Connection, id: i64, password_hash: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET password_hash = ?1 WHERE id = ?2",
        params![password_hash, id],
    )?;
    Ok(count > 0)
}

pub fn create_session(
    conn: &Connection,
    token: &str,
    user_id: i64,
    expires_at: &NaiveDateTime,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![token, user_id, fmt_dt(expires_at)],
    )?;
    Ok(())
}

pub fn session_user(conn: &Connection, token: &str) -> anyhow::Result<Option<User>> {
    let now = fmt_dt(&Utc::now().naive_utc());
    let result = conn.query_row(
        "SELECT u.id, u.email, u.password_hash, u.full_name, u.phone, u.address, u.role
         FROM sessions s JOIN users u ON u.id = s.user_id
         WHERE s.token = ?1 AND s.expires_at > ?2",
        params![token, now],
        parse_user_row,
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn delete_session(conn: &Connection, token: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(count > 0)
}

// ── Bookings ──

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    let check_in_str: String = row.get(6)?;
    let check_out_str: String = row.get(7)?;
    let method_str: Option<String> = row.get(11)?;
    let payment_status_str: String = row.get(12)?;
    let status_str: String = row.get(13)?;
    let created_at_str: String = row.get(16)?;
    let updated_at_str: String = row.get(17)?;

    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        room_id: row.get(2)?,
        guest_name: row.get(3)?,
        guest_phone: row.get(4)?,
        guest_address: row.get(5)?,
        check_in: parse_dt(&check_in_str),
        check_out: parse_dt(&check_out_str),
        adults: row.get(8)?,
        children: row.get(9)?,
        total_price: row.get(10)?,
        payment_method: method_str.as_deref().and_then(PaymentMethod::parse),
        payment_status: PaymentStatus::parse(&payment_status_str),
        status: BookingStatus::parse(&status_str),
        promotion_code: row.get(14)?,
        special_requests: row.get(15)?,
        created_at: parse_dt(&created_at_str),
        updated_at: parse_dt(&updated_at_str),
    })
}

const BOOKING_COLUMNS: &str = "id, user_id, room_id, guest_name, guest_phone, guest_address, \
     check_in, check_out, adults, children, total_price, payment_method, payment_status, \
     status, promotion_code, special_requests, created_at, updated_at";

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
        ),
        params![
            booking.id,
            booking.user_id,
            booking.room_id,
            booking.guest_name,
            booking.guest_phone,
            booking.guest_address,
            fmt_dt(&booking.check_in),
            fmt_dt(&booking.check_out),
            booking.adults,
            booking.children,
            booking.total_price,
            booking.payment_method.map(|m| m.as_str()),
            booking.payment_status.as_str(),
            booking.status.as_str(),
            booking.promotion_code,
            booking.special_requests,
            fmt_dt(&booking.created_at),
            fmt_dt(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        parse_booking_row,
    );

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// True when a non-cancelled booking on the room overlaps
/// `[check_in, check_out)`. Half-open, so back-to-back stays don't clash.
pub fn has_overlapping_booking(
    conn: &Connection,
    room_id: i64,
    check_in: &NaiveDateTime,
    check_out: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE room_id = ?1 AND status != 'cancelled'
           AND check_in < ?2 AND check_out > ?3",
        params![room_id, fmt_dt(check_out), fmt_dt(check_in)],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn bookings_for_user(conn: &Connection, user_id: i64) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = ?1 ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![user_id], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

/// Admin listing: bank transfers awaiting confirmation come first.
pub fn all_bookings_pending_first(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         ORDER BY (payment_status = 'pending') DESC, created_at DESC"
    ))?;
    let rows = stmt.query_map([], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let now = fmt_dt(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn set_payment_state(
    conn: &Connection,
    id: &str,
    method: Option<PaymentMethod>,
    payment_status: PaymentStatus,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let now = fmt_dt(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET payment_method = COALESCE(?1, payment_method),
                payment_status = ?2, status = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            method.map(|m| m.as_str()),
            payment_status.as_str(),
            status.as_str(),
            now,
            id
        ],
    )?;
    Ok(count > 0)
}

/// Confirmed stays whose checkout has passed become completed. Idempotent.
pub fn complete_elapsed_bookings(conn: &Connection, now: &NaiveDateTime) -> anyhow::Result<usize> {
    let now_str = fmt_dt(now);
    let count = conn.execute(
        "UPDATE bookings SET status = 'completed', updated_at = ?1
         WHERE status = 'confirmed' AND check_out < ?1",
        params![now_str],
    )?;
    Ok(count)
}

pub fn current_booking_for_room(
    conn: &Connection,
    room_id: i64,
    at: &NaiveDateTime,
) -> anyhow::Result<Option<Booking>> {
    let at_str = fmt_dt(at);
    let result = conn.query_row(
        &format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE room_id = ?1 AND check_in <= ?2 AND check_out > ?2
               AND status IN ('pending', 'confirmed', 'checked_in')
             LIMIT 1"
        ),
        params![room_id, at_str],
        parse_booking_row,
    );

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn upcoming_bookings_for_room(
    conn: &Connection,
    room_id: i64,
    after: &NaiveDateTime,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE room_id = ?1 AND check_in > ?2 AND status != 'cancelled'
         ORDER BY check_in LIMIT ?3"
    ))?;
    let rows = stmt.query_map(params![room_id, fmt_dt(after), limit], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

// ── Promotions ──

fn parse_promotion_row(row: &rusqlite::Row) -> rusqlite::Result<Promotion> {
    let start_str: String = row.get(7)?;
    let end_str: String = row.get(8)?;
    Ok(Promotion {
        id: row.get(0)?,
        code: row.get(1)?,
        description: row.get(2)?,
        discount_percent: row.get(3)?,
        min_amount: row.get(4)?,
        max_uses: row.get(5)?,
        current_uses: row.get(6)?,
        start_date: parse_dt(&start_str),
        end_date: parse_dt(&end_str),
        active: row.get::<_, i64>(9)? != 0,
    })
}

const PROMOTION_COLUMNS: &str = "id, code, description, discount_percent, min_amount, max_uses, \
     current_uses, start_date, end_date, active";

pub fn get_promotion_by_code(conn: &Connection, code: &str) -> anyhow::Result<Option<Promotion>> {
    let result = conn.query_row(
        &format!("SELECT {PROMOTION_COLUMNS} FROM promotions WHERE code = ?1"),
        params![code],
        parse_promotion_row,
    );

    match result {
        Ok(promotion) => Ok(Some(promotion)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_promotion(conn: &Connection, id: i64) -> anyhow::Result<Option<Promotion>> {
    let result = conn.query_row(
        &format!("SELECT {PROMOTION_COLUMNS} FROM promotions WHERE id = ?1"),
        params![id],
        parse_promotion_row,
    );

    match result {
        Ok(promotion) => Ok(Some(promotion)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_promotions(conn: &Connection) -> anyhow::Result<Vec<Promotion>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROMOTION_COLUMNS} FROM promotions ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map([], parse_promotion_row)?;

    let mut promotions = vec![];
    for row in rows {
        promotions.push(row?);
    }
    Ok(promotions)
}

/// Codes a customer could redeem right now, best discount first.
pub fn list_valid_promotions(
    conn: &Connection,
    now: &NaiveDateTime,
) -> anyhow::Result<Vec<Promotion>> {
    let now_str = fmt_dt(now);
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROMOTION_COLUMNS} FROM promotions
         WHERE active = 1 AND start_date <= ?1 AND end_date >= ?1
         ORDER BY discount_percent DESC"
    ))?;
    let rows = stmt.query_map(params![now_str], parse_promotion_row)?;

    let mut promotions = vec![];
    for row in rows {
        promotions.push(row?);
    }
    Ok(promotions)
}

pub fn create_promotion(conn: &Connection, promotion: &Promotion) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO promotions (code, description, discount_percent, min_amount, max_uses,
                current_uses, start_date, end_date, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            promotion.code,
            promotion.description,
            promotion.discount_percent,
            promotion.min_amount,
            promotion.max_uses,
            promotion.current_uses,
            fmt_dt(&promotion.start_date),
            fmt_dt(&promotion.end_date),
            promotion.active as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_promotion(conn: &Connection, promotion: &Promotion) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE promotions SET description = ?1, discount_percent = ?2, min_amount = ?3,
                max_uses = ?4, start_date = ?5, end_date = ?6
         WHERE id = ?7",
        params![
            promotion.description,
            promotion.discount_percent,
            promotion.min_amount,
            promotion.max_uses,
            fmt_dt(&promotion.start_date),
            fmt_dt(&promotion.end_date),
            promotion.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn toggle_promotion(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE promotions SET active = 1 - active WHERE id = ?1",
        params![id],
    )?;
    Ok(count > 0)
}

pub fn delete_promotion(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM promotions WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn increment_promotion_use(conn: &Connection, code: &str) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE promotions SET current_uses = current_uses + 1 WHERE code = ?1",
        params![code],
    )?;
    Ok(())
}

// ── Reviews ──

fn parse_review_row(row: &rusqlite::Row) -> rusqlite::Result<Review> {
    let status_str: String = row.get(6)?;
    let reply_at_str: Option<String> = row.get(8)?;
    let created_at_str: String = row.get(9)?;
    Ok(Review {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        room_id: row.get(2)?,
        user_id: row.get(3)?,
        rating: row.get(4)?,
        comment: row.get(5)?,
        status: ReviewStatus::parse(&status_str),
        admin_reply: row.get(7)?,
        reply_at: reply_at_str.as_deref().map(parse_dt),
        created_at: parse_dt(&created_at_str),
    })
}

const REVIEW_COLUMNS: &str =
    "id, booking_id, room_id, user_id, rating, comment, status, admin_reply, reply_at, created_at";

pub fn insert_review(conn: &Connection, review: &Review) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO reviews (booking_id, room_id, user_id, rating, comment, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            review.booking_id,
            review.room_id,
            review.user_id,
            review.rating,
            review.comment,
            review.status.as_str(),
            fmt_dt(&review.created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_review(conn: &Connection, id: i64) -> anyhow::Result<Option<Review>> {
    let result = conn.query_row(
        &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1"),
        params![id],
        parse_review_row,
    );

    match result {
        Ok(review) => Ok(Some(review)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn review_exists_for_booking(conn: &Connection, booking_id: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM reviews WHERE booking_id = ?1",
        params![booking_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn approved_reviews_for_room(conn: &Connection, room_id: i64) -> anyhow::Result<Vec<Review>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews
         WHERE room_id = ?1 AND status = 'approved'
         ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![room_id], parse_review_row)?;

    let mut reviews = vec![];
    for row in rows {
        reviews.push(row?);
    }
    Ok(reviews)
}

pub fn avg_rating_for_room(conn: &Connection, room_id: i64) -> anyhow::Result<Option<f64>> {
    let avg: Option<f64> = conn.query_row(
        "SELECT AVG(rating) FROM reviews WHERE room_id = ?1 AND status = 'approved'",
        params![room_id],
        |row| row.get(0),
    )?;
    Ok(avg)
}

/// Moderation queue ordering: pending first, newest within each group.
pub fn list_reviews_pending_first(conn: &Connection) -> anyhow::Result<Vec<Review>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews
         ORDER BY (status = 'pending') DESC, created_at DESC"
    ))?;
    let rows = stmt.query_map([], parse_review_row)?;

    let mut reviews = vec![];
    for row in rows {
        reviews.push(row?);
    }
    Ok(reviews)
}

pub fn set_review_status(conn: &Connection, id: i64, status: ReviewStatus) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE reviews SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

pub fn set_review_reply(
    conn: &Connection,
    id: i64,
    reply: &str,
    at: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE reviews SET admin_reply = ?1, reply_at = ?2 WHERE id = ?3",
        params![reply, fmt_dt(at), id],
    )?;
    Ok(count > 0)
}

pub struct ReviewStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub average_rating: f64,
}

pub fn review_stats(conn: &Connection) -> anyhow::Result<ReviewStats> {
    conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(status = 'pending'), 0),
                COALESCE(SUM(status = 'approved'), 0),
                COALESCE(AVG(rating), 0)
         FROM reviews",
        [],
        |row| {
            Ok(ReviewStats {
                total: row.get(0)?,
                pending: row.get(1)?,
                approved: row.get(2)?,
                average_rating: row.get(3)?,
            })
        },
    )
    .map_err(Into::into)
}

/// Oldest completed, not-yet-reviewed booking this user has for the room.
/// Backs the "can review" flag on the room page.
pub fn reviewable_booking(
    conn: &Connection,
    user_id: i64,
    room_id: i64,
) -> anyhow::Result<Option<String>> {
    let result = conn.query_row(
        "SELECT b.id FROM bookings b
         LEFT JOIN reviews rv ON rv.booking_id = b.id
         WHERE b.user_id = ?1 AND b.room_id = ?2 AND b.status = 'completed'
           AND rv.id IS NULL
         ORDER BY b.check_out
         LIMIT 1",
        params![user_id, room_id],
        |row| row.get(0),
    );

    match result {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Reporting ──

pub fn paid_revenue_between(
    conn: &Connection,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> anyhow::Result<f64> {
    let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(total_price), 0) FROM bookings
         WHERE payment_status = 'paid' AND created_at >= ?1 AND created_at < ?2",
        params![fmt_dt(start), fmt_dt(end)],
        |row| row.get(0),
    )?;
    Ok(total)
}

pub fn bookings_created_between(
    conn: &Connection,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE created_at >= ?1 AND created_at < ?2",
        params![fmt_dt(start), fmt_dt(end)],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn confirmed_spanning(conn: &Connection, at: &NaiveDateTime) -> anyhow::Result<i64> {
    let at_str = fmt_dt(at);
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings
         WHERE status = 'confirmed' AND check_in <= ?1 AND check_out > ?1",
        params![at_str],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn available_room_count(conn: &Connection) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM rooms WHERE status = 'available'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub struct StatusCounts {
    pub pending: i64,
    pub confirmed: i64,
    pub completed: i64,
    pub cancelled: i64,
}

pub fn booking_status_counts(conn: &Connection) -> anyhow::Result<StatusCounts> {
    conn.query_row(
        "SELECT COALESCE(SUM(status = 'pending'), 0),
                COALESCE(SUM(status = 'confirmed'), 0),
                COALESCE(SUM(status = 'completed'), 0),
                COALESCE(SUM(status = 'cancelled'), 0)
         FROM bookings",
        [],
        |row| {
            Ok(StatusCounts {
                pending: row.get(0)?,
                confirmed: row.get(1)?,
                completed: row.get(2)?,
                cancelled: row.get(3)?,
            })
        },
    )
    .map_err(Into::into)
}

pub fn paid_count_for_method(conn: &Connection, method: PaymentMethod) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE payment_method = ?1 AND payment_status = 'paid'",
        params![method.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub struct TopRoom {
    pub room_id: i64,
    pub room_number: String,
    pub room_type: String,
    pub revenue: f64,
    pub bookings_count: i64,
}

pub fn top_rooms_by_revenue(conn: &Connection, limit: i64) -> anyhow::Result<Vec<TopRoom>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.room_number, r.room_type,
                SUM(b.total_price) AS revenue, COUNT(b.id)
         FROM rooms r JOIN bookings b ON b.room_id = r.id
         WHERE b.payment_status = 'paid'
         GROUP BY r.id
         ORDER BY revenue DESC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok(TopRoom {
            room_id: row.get(0)?,
            room_number: row.get(1)?,
            room_type: row.get(2)?,
            revenue: row.get(3)?,
            bookings_count: row.get(4)?,
        })
    })?;

    let mut rooms = vec![];
    for row in rows {
        rooms.push(row?);
    }
    Ok(rooms)
}

/// Paid + completed revenue grouped by check-in month, oldest first.
pub fn monthly_revenue_since(
    conn: &Connection,
    since: &NaiveDateTime,
) -> anyhow::Result<Vec<(String, f64)>> {
    let mut stmt = conn.prepare(
        "SELECT strftime('%Y-%m', check_in) AS month, SUM(total_price)
         FROM bookings
         WHERE status = 'completed' AND payment_status = 'paid' AND check_in >= ?1
         GROUP BY month
         ORDER BY month",
    )?;
    let rows = stmt.query_map(params![fmt_dt(since)], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
    })?;

    let mut months = vec![];
    for row in rows {
        months.push(row?);
    }
    Ok(months)
}

pub fn count_users(conn: &Connection) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_rooms(conn: &Connection) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM rooms", [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_bookings(conn: &Connection) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;
    Ok(count)
}

pub fn pending_review_count(conn: &Connection) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM reviews WHERE status = 'pending'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn completed_paid_revenue(conn: &Connection) -> anyhow::Result<f64> {
    let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(total_price), 0) FROM bookings
         WHERE status = 'completed' AND payment_status = 'paid'",
        [],
        |row| row.get(0),
    )?;
    Ok(total)
}

pub struct UserBookingStats {
    pub total_bookings: i64,
    pub completed_bookings: i64,
    pub cancelled_bookings: i64,
    pub total_spent: f64,
}

pub fn user_booking_stats(conn: &Connection, user_id: i64) -> anyhow::Result<UserBookingStats> {
    conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(status = 'completed'), 0),
                COALESCE(SUM(status = 'cancelled'), 0),
                COALESCE(SUM(CASE WHEN status = 'completed' THEN total_price ELSE 0 END), 0)
         FROM bookings WHERE user_id = ?1",
        params![user_id],
        |row| {
            Ok(UserBookingStats {
                total_bookings: row.get(0)?,
                completed_bookings: row.get(1)?,
                cancelled_bookings: row.get(2)?,
                total_spent: row.get(3)?,
            })
        },
    )
    .map_err(Into::into)
}
