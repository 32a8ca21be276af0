//! Spray advisory.

use crate::dto::{AdviceQuery, AdviceResponse};
use crate::error::AppError;
use crate::extract::ApiQuery;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;

/// `GET /weather/advice?lat&lon`
///
/// # Errors
///
/// 400 for missing or out-of-range coordinates and for forecast failures.
pub async fn weather_advice(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AdviceQuery>,
) -> Result<Json<AdviceResponse>, AppError> {
    let advisory = state.services.advisory.get_advice(query.lat, query.lon).await?;
    Ok(Json(advisory.into()))
}
