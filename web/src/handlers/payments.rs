//! Payment gateway webhook.

use crate::error::AppError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

/// Primary signature header.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Header the gateway itself sends; accepted when the primary is absent.
pub const GATEWAY_SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// `POST /payments/webhook`
///
/// The body is taken as raw bytes so the signature is checked over exactly
/// what was sent.
///
/// # Errors
///
/// 400 (empty body) on signature failure, 400 for a malformed verified
/// payload, 500 on store failure so the gateway redelivers.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .or_else(|| headers.get(GATEWAY_SIGNATURE_HEADER))
        .and_then(|v| v.to_str().ok());

    let outcome = state.services.webhooks.handle(&body, signature).await?;
    tracing::debug!(?outcome, "Webhook processed");
    Ok(StatusCode::OK)
}
