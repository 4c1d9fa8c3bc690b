use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub user_id: Option<i64>,
    pub room_id: i64,
    pub guest_name: String,
    pub guest_phone: String,
    pub guest_address: Option<String>,
    pub check_in: NaiveDateTime,
    pub check_out: NaiveDateTime,
    pub adults: i64,
    pub children: i64,
    pub total_price: f64,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    pub promotion_code: Option<String>,
    pub special_requests: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    /// Whole nights between the check-in and check-out calendar dates.
    pub fn nights(&self) -> i64 {
        (self.check_out.date() - self.check_in.date()).num_days()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "checked_in" => BookingStatus::CheckedIn,
            "completed" => BookingStatus::Completed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => PaymentStatus::Pending,
            "paid" => PaymentStatus::Paid,
            "failed" => PaymentStatus::Failed,
            _ => PaymentStatus::Unpaid,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Momo,
    Vnpay,
    Zalopay,
    Banking,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Momo => "momo",
            PaymentMethod::Vnpay => "vnpay",
            PaymentMethod::Zalopay => "zalopay",
            PaymentMethod::Banking => "banking",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "momo" => Some(PaymentMethod::Momo),
            "vnpay" => Some(PaymentMethod::Vnpay),
            "zalopay" => Some(PaymentMethod::Zalopay),
            "banking" => Some(PaymentMethod::Banking),
            _ => None,
        }
    }
}
