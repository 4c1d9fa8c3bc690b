use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{delete, get, post, put};
use axum::Router;
use chrono::{Duration, Utc};
use tower::ServiceExt;

use roombook::config::AppConfig;
use roombook::db;
use roombook::db::queries;
use roombook::handlers;
use roombook::models::{BookingStatus, Hotel, Location, PaymentMethod, Role, Room, RoomStatus};
use roombook::services::auth;
use roombook::services::payments::{BankTransfer, PaymentGateways, SimulatedGateway};
use roombook::state::AppState;

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        session_ttl_hours: 24,
        sweep_interval_secs: 300,
        momo_endpoint: "http://localhost:3000/pay/momo".to_string(),
        momo_secret: "momo-test".to_string(),
        vnpay_endpoint: "http://localhost:3000/pay/vnpay".to_string(),
        vnpay_secret: "vnpay-test".to_string(),
        zalopay_endpoint: "http://localhost:3000/pay/zalopay".to_string(),
        zalopay_secret: "zalopay-test".to_string(),
        bank_reference_prefix: "ROOMBOOK".to_string(),
    }
}

fn test_state() -> Arc<AppState> {
    let config = test_config();
    let conn = db::init_db(":memory:").unwrap();
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
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config,
        gateways,
    })
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/my/account", get(handlers::auth::my_account))
        .route("/api/my/account", put(handlers::auth::update_account))
        .route("/api/my/password", post(handlers::auth::change_password))
        .route("/api/locations", get(handlers::rooms::list_locations))
        .route("/api/hotels", get(handlers::rooms::list_hotels))
        .route("/api/rooms/search", get(handlers::rooms::search))
        .route("/api/rooms/:id", get(handlers::rooms::room_detail))
        .route("/api/promotions", get(handlers::rooms::list_promotions))
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
        .route(
            "/api/bookings/:id/review",
            post(handlers::reviews::submit_review),
        )
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
        .route(
            "/api/admin/locations",
            post(handlers::admin::create_location),
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
            delete(handlers::admin::delete_promotion),
        )
        .route(
            "/api/admin/reviews",
            get(handlers::reviews::admin_list_reviews),
        )
        .route(
            "/api/admin/reviews/:id/approve",
            post(handlers::reviews::admin_approve_review),
        )
        .route("/api/admin/revenue", get(handlers::admin::revenue))
        .with_state(state)
}

fn seed_admin(state: &AppState) -> String {
    let db = state.db.lock().unwrap();
    let user_id = queries::create_user(
        &db,
        "admin@example.com",
        &auth::hash_password("admin123").unwrap(),
        "Admin",
        None,
        Role::Admin,
    )
    .unwrap();
    auth::issue_session(&db, user_id, 24).unwrap().token
}

fn seed_customer(state: &AppState, email: &str) -> (i64, String) {
    let db = state.db.lock().unwrap();
    let user_id = queries::create_user(
        &db,
        email,
        &auth::hash_password("123456").unwrap(),
        "Customer",
        Some("+84900000010"),
        Role::Customer,
    )
    .unwrap();
    let token = auth::issue_session(&db, user_id, 24).unwrap().token;
    (user_id, token)
}

fn seed_room(state: &AppState, price: f64, max_people: i64) -> i64 {
    let db = state.db.lock().unwrap();
    let location_id = queries::create_location(
        &db,
        &Location {
            id: 0,
            name: "Hanoi".to_string(),
            city: Some("Hanoi".to_string()),
            description: None,
        },
    )
    .unwrap();
    let hotel_id = queries::create_hotel(
        &db,
        &Hotel {
            id: 0,
            location_id,
            name: "Grand Hanoi".to_string(),
            address: Some("40 Ba Trieu".to_string()),
            phone: None,
            email: None,
            description: None,
            rating: 4.5,
        },
    )
    .unwrap();
    queries::create_room(
        &db,
        &Room {
            id: 0,
            hotel_id,
            room_number: "101".to_string(),
            room_type: "Standard".to_string(),
            price,
            max_people,
            floor: 1,
            description: None,
            status: RoomStatus::Available,
        },
    )
    .unwrap()
}

fn get_req(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn future_date(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

fn booking_body(room_id: i64, check_in: &str, check_out: &str) -> serde_json::Value {
    serde_json::json!({
        "room_id": room_id,
        "guest_name": "Nguyen Van A",
        "guest_phone": "+84987654321",
        "check_in": check_in,
        "check_out": check_out,
        "adults": 2,
        "children": 0,
    })
}

// ── Health & auth guards ──

#[tokio::test]
async fn test_health() {
    let app = test_app(test_state());
    let res = app.oneshot(get_req("/health", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_requires_session() {
    let app = test_app(test_state());
    let res = app.oneshot(get_req("/api/admin/dashboard", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_rejects_customer_session() {
    let state = test_state();
    let (_, token) = seed_customer(&state, "c1@example.com");
    let app = test_app(state);

    let res = app
        .oneshot(get_req("/api/admin/dashboard", Some(&token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_revenue_open_to_partner_but_not_customer() {
    let state = test_state();
    let (partner_token, customer_token) = {
        let db = state.db.lock().unwrap();
        let partner = queries::create_user(
            &db,
            "partner@example.com",
            "hash",
            "Partner",
            None,
            Role::Partner,
        )
        .unwrap();
        let customer = queries::create_user(
            &db,
            "cust@example.com",
            "hash",
            "Customer",
            None,
            Role::Customer,
        )
        .unwrap();
        (
            auth::issue_session(&db, partner, 24).unwrap().token,
            auth::issue_session(&db, customer, 24).unwrap().token,
        )
    };
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(get_req("/api/admin/revenue", Some(&partner_token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(get_req("/api/admin/revenue", Some(&customer_token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

// ── Registration & login ──

#[tokio::test]
async fn test_register_login_account_flow() {
    let app = test_app(test_state());

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/auth/register",
            None,
            serde_json::json!({
                "email": "new@example.com",
                "password": "secret1",
                "confirm_password": "secret1",
                "full_name": "New User",
                "phone": "+84911111111",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // duplicate email
    let res = app
        .clone()
        .oneshot(post_json(
            "/api/auth/register",
            None,
            serde_json::json!({
                "email": "new@example.com",
                "password": "secret1",
                "confirm_password": "secret1",
                "full_name": "Imposter",
                "phone": "+84911111112",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            None,
            serde_json::json!({ "email": "new@example.com", "password": "secret1" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let login = body_json(res).await;
    let token = login["token"].as_str().unwrap().to_string();
    assert_eq!(login["role"], "customer");

    let res = app
        .clone()
        .oneshot(get_req("/api/my/account", Some(&token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let account = body_json(res).await;
    assert_eq!(account["email"], "new@example.com");
    assert_eq!(account["total_bookings"], 0);

    // bad password
    let res = app
        .oneshot(post_json(
            "/api/auth/login",
            None,
            serde_json::json!({ "email": "new@example.com", "password": "nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ── Booking creation ──

#[tokio::test]
async fn test_guest_booking_and_momo_payment() {
    let state = test_state();
    let room_id = seed_room(&state, 1_000_000.0, 2);
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            None,
            booking_body(room_id, &future_date(5), &future_date(7)),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let created = body_json(res).await;
    let booking_id = created["booking"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["booking"]["total_price"], 2_000_000.0);
    assert_eq!(created["booking"]["nights"], 2);
    assert_eq!(created["booking"]["status"], "pending");
    assert_eq!(created["booking"]["payment_status"], "unpaid");

    // initiate wallet payment: signed redirect URL
    let res = app
        .clone()
        .oneshot(get_req(
            &format!("/api/bookings/{booking_id}/payment/momo"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let intent = body_json(res).await;
    assert!(intent["redirect_url"]
        .as_str()
        .unwrap()
        .contains("signature="));

    // simulate success
    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/api/payments/momo/simulate/{booking_id}"),
            None,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(get_req(&format!("/api/bookings/{booking_id}"), None))
        .await
        .unwrap();
    let booking = body_json(res).await;
    assert_eq!(booking["payment_method"], "momo");
    assert_eq!(booking["payment_status"], "paid");
    assert_eq!(booking["status"], "confirmed");
}

#[tokio::test]
async fn test_booking_validation_failures() {
    let state = test_state();
    let room_id = seed_room(&state, 1_000_000.0, 2);
    let app = test_app(state);

    // check-out not after check-in
    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            None,
            booking_body(room_id, &future_date(5), &future_date(5)),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // check-in in the past
    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            None,
            booking_body(room_id, &future_date(-3), &future_date(2)),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // overcapacity: 3 adults + 1 child on a 2-person room
    let mut body = booking_body(room_id, &future_date(5), &future_date(7));
    body["adults"] = serde_json::json!(3);
    body["children"] = serde_json::json!(1);
    let res = app
        .clone()
        .oneshot(post_json("/api/bookings", None, body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // conflict on an already-booked interval
    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            None,
            booking_body(room_id, &future_date(5), &future_date(7)),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(post_json(
            "/api/bookings",
            None,
            booking_body(room_id, &future_date(6), &future_date(8)),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_back_to_back_bookings_allowed() {
    let state = test_state();
    let room_id = seed_room(&state, 1_000_000.0, 2);
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            None,
            booking_body(room_id, &future_date(5), &future_date(9)),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // checkout day of one = check-in day of the next
    let res = app
        .oneshot(post_json(
            "/api/bookings",
            None,
            booking_body(room_id, &future_date(9), &future_date(12)),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Promotions ──

#[tokio::test]
async fn test_promotion_applied_through_api() {
    let state = test_state();
    let room_id = seed_room(&state, 1_000_000.0, 2);
    let admin_token = seed_admin(&state);
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/admin/promotions",
            Some(&admin_token),
            serde_json::json!({
                "code": "WELCOME10",
                "discount_percent": 10.0,
                "min_amount": 500_000.0,
                "max_uses": 100,
                "start_date": future_date(-30),
                "end_date": future_date(30),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // visible on the public listing
    let res = app.clone().oneshot(get_req("/api/promotions", None)).await.unwrap();
    let promotions = body_json(res).await;
    assert_eq!(promotions[0]["code"], "WELCOME10");

    let mut body = booking_body(room_id, &future_date(5), &future_date(7));
    body["promotion_code"] = serde_json::json!("WELCOME10");
    let res = app
        .clone()
        .oneshot(post_json("/api/bookings", None, body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let created = body_json(res).await;
    assert_eq!(created["promotion_applied"], true);
    assert_eq!(created["booking"]["total_price"], 1_800_000.0);

    // used promotions cannot be deleted
    let promo_id = {
        let res = app
            .clone()
            .oneshot(get_req("/api/admin/promotions", Some(&admin_token)))
            .await
            .unwrap();
        let list = body_json(res).await;
        assert_eq!(list[0]["current_uses"], 1);
        list[0]["id"].as_i64().unwrap()
    };

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/admin/promotions/{promo_id}"))
        .header("Authorization", format!("Bearer {admin_token}"))
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_exhausted_promotion_degrades_to_full_price() {
    let state = test_state();
    let room_id = seed_room(&state, 1_000_000.0, 2);
    {
        let db = state.db.lock().unwrap();
        queries::create_promotion(
            &db,
            &roombook::models::Promotion {
                id: 0,
                code: "ONEUSE".to_string(),
                description: None,
                discount_percent: 10.0,
                min_amount: 0.0,
                max_uses: Some(1),
                current_uses: 1,
                start_date: Utc::now().naive_utc() - Duration::days(1),
                end_date: Utc::now().naive_utc() + Duration::days(30),
                active: true,
            },
        )
        .unwrap();
    }
    let app = test_app(state);

    let mut body = booking_body(room_id, &future_date(5), &future_date(7));
    body["promotion_code"] = serde_json::json!("ONEUSE");
    let res = app
        .oneshot(post_json("/api/bookings", None, body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let created = body_json(res).await;
    assert_eq!(created["promotion_applied"], false);
    assert!(created["promotion_message"]
        .as_str()
        .unwrap()
        .contains("no uses left"));
    assert_eq!(created["booking"]["total_price"], 2_000_000.0);
}

// ── Search ──

#[tokio::test]
async fn test_search_excludes_booked_interval() {
    let state = test_state();
    let room_a = seed_room(&state, 1_000_000.0, 2);
    let room_b = {
        let db = state.db.lock().unwrap();
        let room = queries::get_room(&db, room_a).unwrap().unwrap();
        queries::create_room(
            &db,
            &Room {
                id: 0,
                hotel_id: room.hotel_id,
                room_number: "102".to_string(),
                room_type: "Deluxe".to_string(),
                price: 1_500_000.0,
                max_people: 3,
                floor: 1,
                description: None,
                status: RoomStatus::Available,
            },
        )
        .unwrap()
    };
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            None,
            booking_body(room_a, &future_date(5), &future_date(7)),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // without dates both rooms appear
    let res = app.clone().oneshot(get_req("/api/rooms/search", None)).await.unwrap();
    let rooms = body_json(res).await;
    assert_eq!(rooms.as_array().unwrap().len(), 2);

    // the booked interval hides room A
    let uri = format!(
        "/api/rooms/search?check_in={}&check_out={}",
        future_date(5),
        future_date(7)
    );
    let res = app.clone().oneshot(get_req(&uri, None)).await.unwrap();
    let rooms = body_json(res).await;
    let ids: Vec<i64> = rooms
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![room_b]);

    // a back-to-back interval shows both again
    let uri = format!(
        "/api/rooms/search?check_in={}&check_out={}",
        future_date(7),
        future_date(9)
    );
    let res = app.oneshot(get_req(&uri, None)).await.unwrap();
    let rooms = body_json(res).await;
    assert_eq!(rooms.as_array().unwrap().len(), 2);
}

// ── Bank transfer lifecycle ──

#[tokio::test]
async fn test_bank_transfer_confirm_is_guarded() {
    let state = test_state();
    let room_id = seed_room(&state, 1_000_000.0, 2);
    let admin_token = seed_admin(&state);
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            None,
            booking_body(room_id, &future_date(5), &future_date(7)),
        ))
        .await
        .unwrap();
    let booking_id = body_json(res).await["booking"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // transfer reference available before recording
    let res = app
        .clone()
        .oneshot(get_req(
            &format!("/api/bookings/{booking_id}/payment/banking"),
            None,
        ))
        .await
        .unwrap();
    let intent = body_json(res).await;
    assert_eq!(
        intent["transfer_reference"].as_str().unwrap(),
        format!("ROOMBOOK{booking_id}")
    );

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/api/bookings/{booking_id}/bank-transfer"),
            None,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // first confirmation applies
    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/api/admin/bookings/{booking_id}/confirm-payment"),
            Some(&admin_token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    let first = body_json(res).await;
    assert_eq!(first["ok"], true);

    // second confirmation is a warning no-op
    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/api/admin/bookings/{booking_id}/confirm-payment"),
            Some(&admin_token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    let second = body_json(res).await;
    assert_eq!(second["ok"], false);
    assert!(second["warning"].as_str().is_some());

    let res = app
        .oneshot(get_req(&format!("/api/bookings/{booking_id}"), None))
        .await
        .unwrap();
    let booking = body_json(res).await;
    assert_eq!(booking["payment_status"], "paid");
    assert_eq!(booking["status"], "confirmed");
}

#[tokio::test]
async fn test_bank_transfer_reject_cancels() {
    let state = test_state();
    let room_id = seed_room(&state, 1_000_000.0, 2);
    let admin_token = seed_admin(&state);
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            None,
            booking_body(room_id, &future_date(5), &future_date(7)),
        ))
        .await
        .unwrap();
    let booking_id = body_json(res).await["booking"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    app.clone()
        .oneshot(post_json(
            &format!("/api/bookings/{booking_id}/bank-transfer"),
            None,
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/api/admin/bookings/{booking_id}/reject-payment"),
            Some(&admin_token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["ok"], true);

    let res = app
        .oneshot(get_req(&format!("/api/bookings/{booking_id}"), None))
        .await
        .unwrap();
    let booking = body_json(res).await;
    assert_eq!(booking["payment_status"], "failed");
    assert_eq!(booking["status"], "cancelled");
}

// ── Payment authorization ──

#[tokio::test]
async fn test_owned_booking_payment_requires_owner() {
    let state = test_state();
    let room_id = seed_room(&state, 1_000_000.0, 2);
    let (_, owner_token) = seed_customer(&state, "owner@example.com");
    let (_, other_token) = seed_customer(&state, "other@example.com");
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            Some(&owner_token),
            booking_body(room_id, &future_date(5), &future_date(7)),
        ))
        .await
        .unwrap();
    let booking_id = body_json(res).await["booking"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // a stranger cannot pay or even view it
    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/api/payments/vnpay/simulate/{booking_id}"),
            Some(&other_token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .clone()
        .oneshot(get_req(&format!("/api/bookings/{booking_id}"), Some(&other_token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // the owner can
    let res = app
        .oneshot(post_json(
            &format!("/api/payments/vnpay/simulate/{booking_id}"),
            Some(&owner_token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Cancellation ──

#[tokio::test]
async fn test_cancel_booking_before_check_in() {
    let state = test_state();
    let room_id = seed_room(&state, 1_000_000.0, 2);
    let (_, token) = seed_customer(&state, "cancel@example.com");
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            Some(&token),
            booking_body(room_id, &future_date(5), &future_date(7)),
        ))
        .await
        .unwrap();
    let booking_id = body_json(res).await["booking"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/api/bookings/{booking_id}/cancel"),
            Some(&token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // cancelling twice conflicts
    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/api/bookings/{booking_id}/cancel"),
            Some(&token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app
        .oneshot(get_req(&format!("/api/bookings/{booking_id}"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["status"], "cancelled");
}

// ── Reviews ──

#[tokio::test]
async fn test_review_flow_with_moderation() {
    let state = test_state();
    let room_id = seed_room(&state, 1_000_000.0, 2);
    let (_, token) = seed_customer(&state, "review@example.com");
    let admin_token = seed_admin(&state);
    let app = test_app(Arc::clone(&state));

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            Some(&token),
            booking_body(room_id, &future_date(5), &future_date(7)),
        ))
        .await
        .unwrap();
    let booking_id = body_json(res).await["booking"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // too early: the stay has not completed
    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/api/bookings/{booking_id}/review"),
            Some(&token),
            serde_json::json!({ "rating": 5, "comment": "Great" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    {
        let db = state.db.lock().unwrap();
        queries::update_booking_status(&db, &booking_id, BookingStatus::Completed).unwrap();
    }

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/api/bookings/{booking_id}/review"),
            Some(&token),
            serde_json::json!({ "rating": 5, "comment": "Great stay" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let review = body_json(res).await;
    let review_id = review["id"].as_i64().unwrap();
    assert_eq!(review["status"], "pending");

    // second review always conflicts
    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/api/bookings/{booking_id}/review"),
            Some(&token),
            serde_json::json!({ "rating": 1, "comment": "Changed my mind" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // pending reviews stay off the public room page
    let res = app
        .clone()
        .oneshot(get_req(&format!("/api/rooms/{room_id}"), None))
        .await
        .unwrap();
    let detail = body_json(res).await;
    assert_eq!(detail["reviews"].as_array().unwrap().len(), 0);

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/api/admin/reviews/{review_id}/approve"),
            Some(&admin_token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(get_req(&format!("/api/rooms/{room_id}"), None))
        .await
        .unwrap();
    let detail = body_json(res).await;
    assert_eq!(detail["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(detail["avg_rating"], 5.0);
}

// ── Admin CRUD & reporting ──

#[tokio::test]
async fn test_admin_room_crud_and_delete_guard() {
    let state = test_state();
    let admin_token = seed_admin(&state);
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/admin/locations",
            Some(&admin_token),
            serde_json::json!({ "name": "Da Nang", "city": "Da Nang" }),
        ))
        .await
        .unwrap();
    let location_id = body_json(res).await["id"].as_i64().unwrap();

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/admin/hotels",
            Some(&admin_token),
            serde_json::json!({
                "location_id": location_id,
                "name": "Beachfront",
                "rating": 4.8,
            }),
        ))
        .await
        .unwrap();
    let hotel_id = body_json(res).await["id"].as_i64().unwrap();

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/admin/rooms",
            Some(&admin_token),
            serde_json::json!({
                "hotel_id": hotel_id,
                "room_number": "501",
                "room_type": "Suite",
                "price": 2_500_000.0,
                "max_people": 4,
                "floor": 5,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let room_id = body_json(res).await["id"].as_i64().unwrap();

    // book it, then the delete guard kicks in
    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            None,
            booking_body(room_id, &future_date(5), &future_date(7)),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/admin/rooms/{room_id}"))
        .header("Authorization", format!("Bearer {admin_token}"))
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_revenue_report_counts_paid_bookings() {
    let state = test_state();
    let room_id = seed_room(&state, 1_000_000.0, 2);
    let admin_token = seed_admin(&state);
    let app = test_app(state);

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            None,
            booking_body(room_id, &future_date(5), &future_date(7)),
        ))
        .await
        .unwrap();
    let booking_id = body_json(res).await["booking"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    app.clone()
        .oneshot(post_json(
            &format!("/api/payments/zalopay/simulate/{booking_id}"),
            None,
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    let res = app
        .clone()
        .oneshot(get_req("/api/admin/revenue?period=month", Some(&admin_token)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report = body_json(res).await;
    assert_eq!(report["total_revenue"], 2_000_000.0);
    assert_eq!(report["total_bookings"], 1);
    assert_eq!(report["avg_booking_value"], 2_000_000.0);
    assert_eq!(report["payment_methods"]["zalopay"], 1);
    assert_eq!(report["top_rooms"][0]["room_id"], room_id);
    assert_eq!(report["daily_revenue"].as_array().unwrap().len(), 30);

    let res = app
        .oneshot(get_req("/api/admin/dashboard", Some(&admin_token)))
        .await
        .unwrap();
    let dashboard = body_json(res).await;
    assert_eq!(dashboard["total_bookings"], 1);
    assert_eq!(dashboard["total_rooms"], 1);
}

#[tokio::test]
async fn test_room_map_and_check_in() {
    let state = test_state();
    let room_id = seed_room(&state, 1_000_000.0, 2);
    let admin_token = seed_admin(&state);
    let app = test_app(Arc::clone(&state));

    let res = app
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            None,
            booking_body(room_id, &future_date(0), &future_date(2)),
        ))
        .await
        .unwrap();
    let booking_id = body_json(res).await["booking"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    app.clone()
        .oneshot(post_json(
            &format!("/api/payments/momo/simulate/{booking_id}"),
            None,
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    // reserved today: confirmed but not yet checked in
    let uri = format!("/api/admin/room-map?date={}", future_date(0));
    let res = app.clone().oneshot(get_req(&uri, Some(&admin_token))).await.unwrap();
    let map = body_json(res).await;
    assert_eq!(map[0]["rooms"][0]["state"], "reserved");

    let res = app
        .clone()
        .oneshot(post_json(
            &format!("/api/admin/bookings/{booking_id}/check-in"),
            Some(&admin_token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.clone().oneshot(get_req(&uri, Some(&admin_token))).await.unwrap();
    let map = body_json(res).await;
    assert_eq!(map[0]["rooms"][0]["state"], "occupied");

    // admin room detail shows the in-house booking
    let res = app
        .oneshot(get_req(&format!("/api/admin/rooms/{room_id}"), Some(&admin_token)))
        .await
        .unwrap();
    let detail = body_json(res).await;
    assert_eq!(detail["current_booking"]["id"], booking_id.as_str());
}
