//! End-to-end HTTP tests against the router with in-memory collaborators.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use farmlink_core::environment::MarketplaceStore;
use farmlink_core::{BookingStatus, MeetingProviderKind, NewSlot, ProviderError};
use farmlink_runtime::webhook::sign;
use farmlink_runtime::{ConfirmationHandle, PaymentSettings, ServiceContext, Services};
use farmlink_testing::{
    InMemoryMarketplaceStore, MockPaymentGateway, RecordingNotifier, ScriptedMeetingProvider,
    ScriptedWeatherProvider, fixtures, test_clock,
};
use farmlink_web::{AppState, CORRELATION_ID_HEADER, router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "whsec_api";

struct TestApp {
    app: Router,
    store: InMemoryMarketplaceStore,
    gateway: MockPaymentGateway,
}

fn test_app_with_weather(weather: ScriptedWeatherProvider) -> TestApp {
    let store = InMemoryMarketplaceStore::new();
    let gateway = MockPaymentGateway::new();
    let ctx = ServiceContext::builder(
        Arc::new(store.clone()),
        Arc::new(gateway.clone()),
        Arc::new(RecordingNotifier::new()),
        Arc::new(weather),
    )
    .meeting_provider(Arc::new(ScriptedMeetingProvider::new(MeetingProviderKind::Zoom)))
    .clock(Arc::new(test_clock()))
    .payment(PaymentSettings {
        currency: "INR".to_string(),
        webhook_secret: Some(SECRET.to_string()),
    })
    .build();
    let (confirmations, _rx) = ConfirmationHandle::detached();
    let app = router(AppState::new(Services::new(ctx, confirmations)));
    TestApp { app, store, gateway }
}

fn test_app() -> TestApp {
    let mut pops = vec![0.1, 0.6, 0.2];
    pops.resize(16, 0.0);
    test_app_with_weather(ScriptedWeatherProvider::with_pops(&pops))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).expect("response is JSON")
}

#[tokio::test]
async fn lists_experts_and_their_open_slots() {
    let t = test_app();
    let (expert, slot) = fixtures::seed_expert_with_slot(&t.store).await;

    let (status, body) = send(&t.app, get("/experts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_body(&body),
        json!([{"id": expert.id.get(), "name": "Meera", "specialty": "Soil health"}])
    );

    let (status, body) = send(&t.app, get(&format!("/experts/{}/availability", expert.id))).await;
    assert_eq!(status, StatusCode::OK);
    let slots = json_body(&body);
    assert_eq!(slots[0]["id"], slot.id.get());
    assert_eq!(slots[0]["start"], "2024-01-01T10:00:00Z");
    assert_eq!(slots[0]["end"], "2024-01-01T10:30:00Z");
}

#[tokio::test]
async fn unparseable_availability_bound_is_400() {
    let t = test_app();
    let (expert, _) = fixtures::seed_expert_with_slot(&t.store).await;

    let (status, body) = send(
        &t.app,
        get(&format!("/experts/{}/availability?start=yesterday", expert.id)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn booking_flow_returns_order_and_refuses_second_attempt() {
    let t = test_app();
    let (expert, slot) = fixtures::seed_expert_with_slot(&t.store).await;
    let request = json!({
        "expertId": expert.id.get(),
        "slotId": slot.id.get(),
        "farmerName": "Asha",
        "farmerEmail": "a@x.com",
        "amountInr": 500.00
    });

    let (status, body) = send(&t.app, post_json("/bookings", &request)).await;
    assert_eq!(status, StatusCode::OK);
    let receipt = json_body(&body);
    assert_eq!(receipt["amount"], 50_000);
    assert_eq!(receipt["gatewayOrderId"], "order_test_1");
    assert!(receipt["bookingId"].is_i64());

    let (status, body) = send(&t.app, post_json("/bookings", &request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["code"], "SLOT_UNAVAILABLE");
    assert_eq!(t.gateway.requests().len(), 1);
}

#[tokio::test]
async fn malformed_booking_body_is_400() {
    let t = test_app();

    let (status, body) = send(&t.app, post_json("/bookings", &json!({"expertId": "one"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn gateway_outage_is_502_without_details() {
    let t = test_app();
    t.gateway.fail_with(Some(farmlink_core::GatewayError::Request("connection refused to 10.0.0.1".into())));
    let (expert, slot) = fixtures::seed_expert_with_slot(&t.store).await;

    let (status, body) = send(
        &t.app,
        post_json(
            "/bookings",
            &json!({
                "expertId": expert.id.get(),
                "slotId": slot.id.get(),
                "farmerName": "Asha",
                "farmerEmail": "a@x.com",
                "amountInr": 500
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let text = String::from_utf8(body).unwrap();
    assert!(!text.contains("10.0.0.1"));
}

#[tokio::test]
async fn webhook_accepts_signed_capture_and_rejects_tampering() {
    let t = test_app();
    let (expert, slot) = fixtures::seed_expert_with_slot(&t.store).await;
    let reservation = t.store.reserve_slot(expert.id, slot.id).await.unwrap().unwrap();
    let booking = reservation.commit(fixtures::new_booking(&slot, "order_w")).await.unwrap();
    let body = fixtures::captured_event("order_w", "pay_w");

    let tampered = Request::builder()
        .method("POST")
        .uri("/payments/webhook")
        .header("x-signature", sign("other", body.as_bytes()))
        .body(Body::from(body.clone()))
        .unwrap();
    let (status, response_body) = send(&t.app, tampered).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response_body.is_empty());
    let stored = t.store.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Pending);

    let signed = Request::builder()
        .method("POST")
        .uri("/payments/webhook")
        .header("x-razorpay-signature", sign(SECRET, body.as_bytes()))
        .body(Body::from(body))
        .unwrap();
    let (status, response_body) = send(&t.app, signed).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response_body.is_empty());
    let stored = t.store.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Paid);
}

#[tokio::test]
async fn webhook_store_failure_is_500() {
    let t = test_app();
    t.store.set_offline(true);
    let body = fixtures::captured_event("order_x", "pay_x");

    let request = Request::builder()
        .method("POST")
        .uri("/payments/webhook")
        .header("x-signature", sign(SECRET, body.as_bytes()))
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send(&t.app, request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn weather_advice_reports_rain_risk() {
    let t = test_app();

    let (status, body) = send(&t.app, get("/weather/advice?lat=12.97&lon=77.59")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_body(&body),
        json!({
            "lat": 12.97,
            "lon": 77.59,
            "maxPop": 0.6,
            "rainRisk": true,
            "advice": "Avoid spraying today due to rain risk.",
            "source": "openweather_forecast_5day_3h",
            "threshold": 0.5
        })
    );
}

#[tokio::test]
async fn weather_advice_rejects_bad_coordinates_and_provider_failures() {
    let t = test_app();
    let (status, _) = send(&t.app, get("/weather/advice?lat=north")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let failing = test_app_with_weather(ScriptedWeatherProvider::failing(ProviderError::Http {
        provider: "OpenWeather".to_string(),
        status: 401,
    }));
    let (status, body) = send(&failing.app, get("/weather/advice?lat=1&lon=2")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = json_body(&body);
    assert_eq!(error["code"], "PROVIDER_ERROR");
    assert!(error["message"].as_str().unwrap().contains("401"));
}

#[tokio::test]
async fn qr_verify_records_scan() {
    let t = test_app();

    let (status, body) = send(&t.app, post_json("/qr/verify", &json!({"content": "abc", "farmerName": "Asha"}))).await;

    assert_eq!(status, StatusCode::OK);
    let verdict = json_body(&body);
    assert_eq!(verdict["result"], "Warning: Possible Fake");
    assert_eq!(
        verdict["sha256"],
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    let scans = t.store.scans().await;
    assert_eq!(verdict["storedId"], scans[0].id.get());
}

#[tokio::test]
async fn qr_verify_without_content_is_400() {
    let t = test_app();

    let (status, body) = send(&t.app, post_json("/qr/verify", &json!({"farmerName": "Asha"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["code"], "VALIDATION_ERROR");
    assert!(t.store.scans().await.is_empty());
}

#[tokio::test]
async fn health_ready_and_correlation_header() {
    let t = test_app();

    let response = t.app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(CORRELATION_ID_HEADER));

    let (status, _) = send(&t.app, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);

    t.store.set_offline(true);
    let (status, body) = send(&t.app, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(&body)["status"], "unavailable");
}

#[tokio::test]
async fn slot_with_later_start_is_filtered_by_end_bound() {
    let t = test_app();
    let (expert, _) = fixtures::seed_expert_with_slot(&t.store).await;
    t.store
        .insert_slot(NewSlot {
            expert_id: expert.id,
            start_utc: fixtures::slot_start() + chrono::Duration::days(1),
            end_utc: fixtures::slot_start() + chrono::Duration::days(1) + chrono::Duration::hours(1),
        })
        .await
        .unwrap();

    let (status, body) = send(
        &t.app,
        get(&format!("/experts/{}/availability?end=2024-01-01T23:59:59Z", expert.id)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body).as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn cross_origin_requests_are_allowed() {
    let t = test_app();
    let request = Request::builder()
        .uri("/experts")
        .header("origin", "https://app.farmlink.example")
        .body(Body::empty())
        .unwrap();

    let response = t.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
