//! Weather-based spray advisory.

use crate::context::ServiceContext;
use crate::metrics::PeripheralMetrics;
use farmlink_core::advisory::{RAIN_RISK_THRESHOLD, validate_coordinates};
use farmlink_core::{DomainError, SprayAdvice};
use std::sync::Arc;

/// Advice for one location.
#[derive(Clone, Debug, PartialEq)]
pub struct Advisory {
    /// Latitude queried
    pub lat: f64,
    /// Longitude queried
    pub lon: f64,
    /// Assessment of the forecast
    pub assessment: SprayAdvice,
    /// Threshold the assessment was made against
    pub threshold: f64,
}

/// Fetches forecasts and turns them into spray advice.
#[derive(Clone, Debug)]
pub struct AdvisoryService {
    ctx: Arc<ServiceContext>,
}

impl AdvisoryService {
    /// Create the service.
    #[must_use]
    pub const fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Advice for the next 48 hours at `(lat, lon)`.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Validation`]: coordinates out of range
    /// - [`DomainError::Provider`]: forecast could not be fetched; never
    ///   replaced by a default advice
    #[tracing::instrument(skip(self))]
    pub async fn get_advice(&self, lat: f64, lon: f64) -> Result<Advisory, DomainError> {
        validate_coordinates(lat, lon).map_err(DomainError::Validation)?;

        let buckets = self.ctx.weather.forecast(lat, lon).await.inspect_err(|err| {
            tracing::warn!(error = %err, "Forecast unavailable");
        })?;
        let assessment = SprayAdvice::assess(&buckets);
        PeripheralMetrics::record_advice(assessment.rain_risk);

        Ok(Advisory {
            lat,
            lon,
            assessment,
            threshold: RAIN_RISK_THRESHOLD,
        })
    }
}
