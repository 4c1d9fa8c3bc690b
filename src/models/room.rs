use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub hotel_id: i64,
    pub room_number: String,
    pub room_type: String,
    pub price: f64,
    pub max_people: i64,
    pub floor: i64,
    pub description: Option<String>,
    pub status: RoomStatus,
}

/// Administrative room state. Booking-derived occupancy is computed
/// separately (see `services::reports::derive_room_state`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Available,
    Occupied,
    Maintenance,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Maintenance => "maintenance",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "occupied" => RoomStatus::Occupied,
            "maintenance" => RoomStatus::Maintenance,
            _ => RoomStatus::Available,
        }
    }
}
