use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub id: i64,
    pub code: String,
    pub description: Option<String>,
    pub discount_percent: f64,
    pub min_amount: f64,
    pub max_uses: Option<i64>,
    pub current_uses: i64,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub active: bool,
}

impl Promotion {
    /// A code is redeemable when it is active, inside its validity window,
    /// and not exhausted (`max_uses` null means unlimited).
    pub fn is_valid(&self, now: NaiveDateTime) -> bool {
        if !self.active {
            return false;
        }
        if now < self.start_date || now > self.end_date {
            return false;
        }
        if let Some(max) = self.max_uses {
            if self.current_uses >= max {
                return false;
            }
        }
        true
    }

    pub fn exhausted(&self) -> bool {
        matches!(self.max_uses, Some(max) if self.current_uses >= max)
    }
}
