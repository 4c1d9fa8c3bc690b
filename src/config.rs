use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub session_ttl_hours: i64,
    pub sweep_interval_secs: u64,
    pub momo_endpoint: String,
    pub momo_secret: String,
    pub vnpay_endpoint: String,
    pub vnpay_secret: String,
    pub zalopay_endpoint: String,
    pub zalopay_secret: String,
    pub bank_reference_prefix: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "roombook.db".to_string()),
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(72),
            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            momo_endpoint: env::var("MOMO_ENDPOINT")
                .unwrap_or_else(|_| "https://test-payment.momo.vn/v2/gateway/pay".to_string()),
            momo_secret: env::var("MOMO_SECRET").unwrap_or_else(|_| "momo-sandbox-key".to_string()),
            vnpay_endpoint: env::var("VNPAY_ENDPOINT")
                .unwrap_or_else(|_| "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string()),
            vnpay_secret: env::var("VNPAY_SECRET")
                .unwrap_or_else(|_| "vnpay-sandbox-key".to_string()),
            zalopay_endpoint: env::var("ZALOPAY_ENDPOINT")
                .unwrap_or_else(|_| "https://sb-openapi.zalopay.vn/v2/create".to_string()),
            zalopay_secret: env::var("ZALOPAY_SECRET")
                .unwrap_or_else(|_| "zalopay-sandbox-key".to_string()),
            bank_reference_prefix: env::var("BANK_REFERENCE_PREFIX")
                .unwrap_or_else(|_| "ROOMBOOK".to_string()),
        }
    }
}
