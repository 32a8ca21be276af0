//! Product authenticity scans.

use crate::dto::{VerifyRequest, VerifyResponse};
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use farmlink_runtime::ScanMetadata;

/// `POST /qr/verify`
///
/// # Errors
///
/// 400 when `content` is missing or empty.
pub async fn verify_qr(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let metadata = ScanMetadata {
        farmer_name: request.farmer_name,
        farmer_email: request.farmer_email,
        lat: request.lat,
        lon: request.lon,
    };
    let scan = state
        .services
        .authenticity
        .verify(request.content.unwrap_or_default(), metadata)
        .await?;

    Ok(Json(VerifyResponse {
        result: scan.result.label().to_string(),
        sha256: scan.sha256,
        stored_id: scan.id,
    }))
}
