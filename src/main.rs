use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use roombook::config::AppConfig;
use roombook::db;
use roombook::handlers;
use roombook::models::PaymentMethod;
use roombook::services::lifecycle;
use roombook::services::payments::{BankTransfer, PaymentGateways, SimulatedGateway};
use roombook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let gateways = PaymentGateways::new(vec![
        Box::new(SimulatedGateway::new(
            PaymentMethod::Momo,
            config.momo_endpoint.clone(),
            config.momo_secret.clone(),
        )),
        Box::new(SimulatedGateway::new(
            PaymentMethod::Vnpay,
            config.vnpay_endpoint.clone(),
            config.vnpay_secret.clone(),
        )),
        Box::new(SimulatedGateway::new(
            PaymentMethod::Zalopay,
            config.zalopay_endpoint.clone(),
            config.zalopay_secret.clone(),
        )),
        Box::new(BankTransfer::new(config.bank_reference_prefix.clone())),
    ]);

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        gateways,
    });

    lifecycle::spawn_sweeper(
        Arc::clone(&state),
        Duration::from_secs(config.sweep_interval_secs),
    );

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        // auth + account
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/my/account", get(handlers::auth::my_account))
        .route("/api/my/account", put(handlers::auth::update_account))
        .route("/api/my/password", post(handlers::auth::change_password))
        // browsing
        .route("/api/locations", get(handlers::rooms::list_locations))
        .route("/api/hotels", get(handlers::rooms::list_hotels))
        .route("/api/rooms/search", get(handlers::rooms::search))
        .route("/api/rooms/:id", get(handlers::rooms::room_detail))
        .route("/api/promotions", get(handlers::rooms::list_promotions))
        // bookings
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route(
            "/api/rooms/:id/quick-book",
            post(handlers::bookings::quick_book),
        )
        .route("/api/bookings/:id", get(handlers::bookings::booking_detail))
        .route("/api/my/bookings", get(handlers::bookings::my_bookings))
        .route(
            "/api/bookings/:id/cancel",
            post(handlers::bookings::cancel_booking),
        )
        // payments
        .route(
            "/api/bookings/:id/payment/:method",
            get(handlers::payments::initiate_payment),
        )
        .route(
            "/api/payments/:method/simulate/:id",
            post(handlers::payments::simulate_success),
        )
        .route(
            "/api/bookings/:id/bank-transfer",
            post(handlers::payments::record_bank_transfer),
        )
        // reviews
        .route(
            "/api/bookings/:id/review",
            post(handlers::reviews::submit_review),
        )
        // admin
        .route("/api/admin/dashboard", get(handlers::admin::dashboard))
        .route("/api/admin/bookings", get(handlers::admin::list_bookings))
        .route(
            "/api/admin/bookings/:id/confirm-payment",
            post(handlers::payments::admin_confirm_payment),
        )
        .route(
            "/api/admin/bookings/:id/reject-payment",
            post(handlers::payments::admin_reject_payment),
        )
        .route(
            "/api/admin/bookings/:id/check-in",
            post(handlers::admin::check_in_booking),
        )
        .route("/api/admin/room-map", get(handlers::admin::room_map))
        .route("/api/admin/rooms", post(handlers::admin::create_room))
        .route("/api/admin/rooms/:id", get(handlers::admin::room_detail))
        .route("/api/admin/rooms/:id", put(handlers::admin::update_room))
        .route("/api/admin/rooms/:id", delete(handlers::admin::delete_room))
        .route("/api/admin/hotels", post(handlers::admin::create_hotel))
        .route("/api/admin/hotels/:id", put(handlers::admin::update_hotel))
        .route(
            "/api/admin/hotels/:id",
            delete(handlers::admin::delete_hotel),
        )
        .route(
            "/api/admin/locations",
            post(handlers::admin::create_location),
        )
        .route(
            "/api/admin/locations/:id",
            put(handlers::admin::update_location),
        )
        .route(
            "/api/admin/locations/:id",
            delete(handlers::admin::delete_location),
        )
        .route(
            "/api/admin/promotions",
            get(handlers::admin::list_promotions),
        )
        .route(
            "/api/admin/promotions",
            post(handlers::admin::create_promotion),
        )
        .route(
            "/api/admin/promotions/:id",
            put(handlers::admin::update_promotion),
        )
        .route(
            "/api/admin/promotions/:id",
            delete(handlers::admin::delete_promotion),
        )
        .route(
            "/api/admin/promotions/:id/toggle",
            post(handlers::admin::toggle_promotion),
        )
        .route(
            "/api/admin/reviews",
            get(handlers::reviews::admin_list_reviews),
        )
        .route(
            "/api/admin/reviews/:id/approve",
            post(handlers::reviews::admin_approve_review),
        )
        .route(
            "/api/admin/reviews/:id/reject",
            post(handlers::reviews::admin_reject_review),
        )
        .route(
            "/api/admin/reviews/:id/reply",
            post(handlers::reviews::admin_reply_review),
        )
        .route("/api/admin/revenue", get(handlers::admin::revenue))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
