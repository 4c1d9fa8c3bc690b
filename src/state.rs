use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::payments::PaymentGateways;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub gateways: PaymentGateways,
}
