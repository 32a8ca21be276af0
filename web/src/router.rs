//! Route table.

use crate::handlers::{advisory, bookings, experts, health, payments, qr};
use crate::middleware::correlation_id;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the full API router.
///
/// CORS is open to any origin; the browser client is served from elsewhere.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/experts", get(experts::list_experts))
        .route("/experts/:id/availability", get(experts::list_availability))
        .route("/bookings", post(bookings::create_booking))
        .route("/payments/webhook", post(payments::payment_webhook))
        .route("/weather/advice", get(advisory::weather_advice))
        .route("/qr/verify", post(qr::verify_qr))
        .route("/health", get(health::liveness))
        .route("/ready", get(health::readiness))
        .route("/metrics", get(health::metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(correlation_id))
        .with_state(state)
}
