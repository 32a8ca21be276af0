//! Expert directory and availability.

use crate::dto::{AvailabilityQuery, ExpertSummary, SlotView};
use crate::error::AppError;
use crate::extract::{ApiPath, ApiQuery};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use farmlink_core::{ExpertId, SlotWindow};

/// `GET /experts`
///
/// # Errors
///
/// 500 when the store is unavailable.
pub async fn list_experts(State(state): State<AppState>) -> Result<Json<Vec<ExpertSummary>>, AppError> {
    let experts = state.services.availability.list_experts().await?;
    Ok(Json(experts.into_iter().map(ExpertSummary::from).collect()))
}

/// `GET /experts/{id}/availability?start&end`
///
/// # Errors
///
/// 400 when a bound is not a timestamp.
pub async fn list_availability(
    State(state): State<AppState>,
    ApiPath(expert_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<AvailabilityQuery>,
) -> Result<Json<Vec<SlotView>>, AppError> {
    let window = SlotWindow::parse(query.start.as_deref(), query.end.as_deref())?;
    let slots = state
        .services
        .availability
        .list_open_slots(ExpertId::new(expert_id), window)
        .await?;
    Ok(Json(slots.into_iter().map(SlotView::from).collect()))
}
