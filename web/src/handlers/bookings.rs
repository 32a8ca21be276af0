//! Booking creation.

use crate::dto::{BookingRequest, BookingResponse};
use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;

/// `POST /bookings`
///
/// # Errors
///
/// 400 for invalid input or a taken slot, 502 when the gateway fails.
pub async fn create_booking(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let receipt = state.services.bookings.create_booking(request.into()).await?;
    Ok(Json(receipt.into()))
}
