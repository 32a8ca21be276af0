//! HTTP clients against a local mock server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{TimeZone, Utc};
use farmlink_core::environment::{
    MeetingLinkProvider, MeetingRequest, OrderRequest, PaymentGateway, WeatherProvider,
};
use farmlink_core::{BookingId, GatewayError, MinorUnits, ProviderError};
use farmlink_providers::{
    GoogleMeetProvider, OpenWeatherClient, RazorpayCredentials, RazorpayGateway, ZoomCredentials,
    ZoomMeetingProvider, build_client,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> reqwest::Client {
    build_client(Duration::from_secs(5)).unwrap()
}

fn meeting_request() -> MeetingRequest {
    MeetingRequest {
        booking_id: BookingId::new(7),
        topic: "FarmLink consultation".to_string(),
        start_utc: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
        end_utc: Utc.with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap(),
        expert_email: "meera@experts.farmlink.test".to_string(),
        farmer_email: "a@x.com".to_string(),
    }
}

#[tokio::test]
async fn razorpay_creates_order_in_minor_units() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(header_exists("authorization"))
        .and(body_partial_json(json!({"amount": 50000, "currency": "INR", "receipt": "slot-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "order_9A33XWu170gUtm",
            "entity": "order",
            "amount": 50000,
            "currency": "INR",
            "status": "created"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = RazorpayGateway::new(
        client(),
        &server.uri(),
        Some(RazorpayCredentials {
            key_id: "rzp_test_1".to_string(),
            key_secret: "secret".to_string(),
        }),
    );
    let order = gateway
        .create_order(OrderRequest {
            amount: MinorUnits::new(50_000),
            currency: "INR".to_string(),
            receipt: "slot-1".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(order.id, "order_9A33XWu170gUtm");
    assert_eq!(order.amount.get(), 50_000);
}

#[tokio::test]
async fn razorpay_rejection_carries_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": "BAD_REQUEST_ERROR", "description": "Authentication failed"}
        })))
        .mount(&server)
        .await;

    let gateway = RazorpayGateway::new(
        client(),
        &server.uri(),
        Some(RazorpayCredentials {
            key_id: "rzp_test_1".to_string(),
            key_secret: "wrong".to_string(),
        }),
    );
    let err = gateway
        .create_order(OrderRequest {
            amount: MinorUnits::new(100),
            currency: "INR".to_string(),
            receipt: "slot-2".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::Rejected {
            status: 400,
            message: "Authentication failed".to_string()
        }
    );
}

#[tokio::test]
async fn razorpay_without_credentials_never_calls_out() {
    let gateway = RazorpayGateway::new(client(), "http://127.0.0.1:9", None);
    let err = gateway
        .create_order(OrderRequest {
            amount: MinorUnits::new(100),
            currency: "INR".to_string(),
            receipt: "slot-3".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::NotConfigured);
}

#[tokio::test]
async fn openweather_maps_pop_and_missing_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("appid", "key123"))
        .and(query_param("lat", "12.97"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cod": "200",
            "list": [{"dt": 1, "pop": 0.2}, {"dt": 2}, {"dt": 3, "pop": 0.7}]
        })))
        .mount(&server)
        .await;

    let weather = OpenWeatherClient::new(client(), &format!("{}/forecast", server.uri()), Some("key123".to_string()));
    let buckets = weather.forecast(12.97, 77.59).await.unwrap();

    let pops: Vec<_> = buckets.iter().map(|b| b.pop).collect();
    assert_eq!(pops, vec![Some(0.2), None, Some(0.7)]);
}

#[tokio::test]
async fn openweather_error_status_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"cod": 401, "message": "Invalid API key"})))
        .mount(&server)
        .await;

    let weather = OpenWeatherClient::new(client(), &server.uri(), Some("bad".to_string()));
    let err = weather.forecast(0.0, 0.0).await.unwrap_err();

    assert_eq!(
        err,
        ProviderError::Http {
            provider: "OpenWeather".to_string(),
            status: 401
        }
    );
}

#[tokio::test]
async fn openweather_transport_error_hides_api_key() {
    let weather = OpenWeatherClient::new(
        client(),
        "http://127.0.0.1:9/forecast",
        Some("SECRETKEY123".to_string()),
    );

    let err = weather.forecast(12.0, 77.0).await.unwrap_err();

    assert!(matches!(err, ProviderError::Request { .. } | ProviderError::Timeout { .. }));
    let rendered = farmlink_core::DomainError::Provider(err).to_string();
    assert!(!rendered.contains("SECRETKEY123"), "key leaked: {rendered}");
    assert!(!rendered.contains("appid"), "query leaked: {rendered}");
}

#[tokio::test]
async fn openweather_undecodable_body_hides_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("appid", "SECRETKEY123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let weather = OpenWeatherClient::new(client(), &server.uri(), Some("SECRETKEY123".to_string()));
    let err = weather.forecast(12.0, 77.0).await.unwrap_err();

    assert!(matches!(err, ProviderError::InvalidResponse { .. }));
    assert!(!err.to_string().contains("SECRETKEY123"));
}

#[tokio::test]
async fn razorpay_transport_error_hides_request_url() {
    let gateway = RazorpayGateway::new(
        client(),
        "http://127.0.0.1:9/v1",
        Some(RazorpayCredentials {
            key_id: "rzp_test_1".to_string(),
            key_secret: "secret".to_string(),
        }),
    );

    let err = gateway
        .create_order(OrderRequest {
            amount: MinorUnits::new(100),
            currency: "INR".to_string(),
            receipt: "slot-1".to_string(),
        })
        .await
        .unwrap_err();

    match err {
        GatewayError::Request(message) => assert!(!message.contains("127.0.0.1:9/v1/orders")),
        other => assert!(matches!(other, GatewayError::Timeout), "unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn openweather_without_key_is_not_configured() {
    let weather = OpenWeatherClient::new(client(), "http://127.0.0.1:9", None);
    let err = weather.forecast(0.0, 0.0).await.unwrap_err();
    assert!(matches!(err, ProviderError::NotConfigured(_)));
}

#[tokio::test]
async fn zoom_fetches_token_once_and_returns_join_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(query_param("grant_type", "account_credentials"))
        .and(query_param("account_id", "acct"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "zoom-token",
            "token_type": "bearer",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/users/me/meetings"))
        .and(header("authorization", "Bearer zoom-token"))
        .and(body_partial_json(json!({"type": 2, "duration": 30})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 85_746_065,
            "join_url": "https://zoom.us/j/85746065"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let zoom = ZoomMeetingProvider::with_urls(
        client(),
        &format!("{}/v2", server.uri()),
        &format!("{}/oauth/token", server.uri()),
        Some(ZoomCredentials {
            account_id: "acct".to_string(),
            client_id: "cid".to_string(),
            client_secret: "csecret".to_string(),
        }),
    );

    let first = zoom.create_meeting(meeting_request()).await.unwrap();
    let second = zoom.create_meeting(meeting_request()).await.unwrap();

    assert_eq!(first, "https://zoom.us/j/85746065");
    assert_eq!(first, second);
}

#[tokio::test]
async fn google_meet_requests_conference_and_returns_hangout_link() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .and(query_param("conferenceDataVersion", "1"))
        .and(body_partial_json(json!({
            "conferenceData": {"createRequest": {
                "requestId": "farmlink-booking-7",
                "conferenceSolutionKey": {"type": "hangoutsMeet"}
            }}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt1",
            "hangoutLink": "https://meet.google.com/abc-defg-hij"
        })))
        .mount(&server)
        .await;

    let google = GoogleMeetProvider::new(client(), &server.uri(), "primary", Some("g-token".to_string()));
    let link = google.create_meeting(meeting_request()).await.unwrap();

    assert_eq!(link, "https://meet.google.com/abc-defg-hij");
}

#[tokio::test]
async fn meeting_without_link_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "evt1"})))
        .mount(&server)
        .await;

    let google = GoogleMeetProvider::new(client(), &server.uri(), "primary", Some("g-token".to_string()));
    let err = google.create_meeting(meeting_request()).await.unwrap_err();

    assert!(matches!(err, ProviderError::InvalidResponse { .. }));
}
