//! Spray advisory computed from a short-range precipitation forecast.

use serde::{Deserialize, Serialize};

/// Number of 3-hour buckets inspected (48 hours).
pub const HORIZON_BUCKETS: usize = 16;

/// Precipitation probability above which spraying is discouraged.
pub const RAIN_RISK_THRESHOLD: f64 = 0.5;

/// Identifies the forecast product the advice is based on.
pub const FORECAST_SOURCE: &str = "openweather_forecast_5day_3h";

/// Advice given when rain is likely.
pub const ADVICE_RAIN_RISK: &str = "Avoid spraying today due to rain risk.";

/// Advice given when the window is dry.
pub const ADVICE_SPRAY_NOW: &str = "Spray now for best results.";

/// One 3-hour forecast interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastBucket {
    /// Probability of precipitation in `[0, 1]`; absent means none reported
    #[serde(default)]
    pub pop: Option<f64>,
}

impl ForecastBucket {
    /// Bucket with a known probability.
    #[must_use]
    pub const fn with_pop(pop: f64) -> Self {
        Self { pop: Some(pop) }
    }
}

/// Result of assessing a forecast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SprayAdvice {
    /// Highest precipitation probability in the horizon
    pub max_pop: f64,
    /// Whether `max_pop` exceeds [`RAIN_RISK_THRESHOLD`]
    pub rain_risk: bool,
}

impl SprayAdvice {
    /// Assess the first [`HORIZON_BUCKETS`] buckets of a time-ordered forecast.
    ///
    /// Missing or non-finite probabilities count as `0.0`. An empty forecast
    /// yields no rain risk.
    #[must_use]
    pub fn assess(buckets: &[ForecastBucket]) -> Self {
        let max_pop = buckets
            .iter()
            .take(HORIZON_BUCKETS)
            .map(|bucket| bucket.pop.filter(|p| p.is_finite()).unwrap_or(0.0))
            .fold(0.0_f64, f64::max);

        Self {
            max_pop,
            rain_risk: max_pop > RAIN_RISK_THRESHOLD,
        }
    }

    /// The fixed advice string for this assessment.
    #[must_use]
    pub const fn advice(&self) -> &'static str {
        if self.rain_risk {
            ADVICE_RAIN_RISK
        } else {
            ADVICE_SPRAY_NOW
        }
    }

    /// `max_pop` rounded to two decimals for display.
    #[must_use]
    pub fn rounded_max_pop(&self) -> f64 {
        (self.max_pop * 100.0).round() / 100.0
    }
}

/// Validate a coordinate pair.
///
/// # Errors
///
/// Returns a description when latitude is outside `[-90, 90]`, longitude is
/// outside `[-180, 180]`, or either is not finite.
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), String> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(format!("lat must be between -90 and 90, got {lat}"));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("lon must be between -180 and 180, got {lon}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast(pops: &[f64]) -> Vec<ForecastBucket> {
        pops.iter().copied().map(ForecastBucket::with_pop).collect()
    }

    #[test]
    fn wet_forecast_advises_against_spraying() {
        let mut pops = vec![0.1, 0.6, 0.2];
        pops.resize(HORIZON_BUCKETS, 0.0);
        let advice = SprayAdvice::assess(&forecast(&pops));

        assert!((advice.max_pop - 0.6).abs() < f64::EPSILON);
        assert!(advice.rain_risk);
        assert_eq!(advice.advice(), ADVICE_RAIN_RISK);
    }

    #[test]
    fn threshold_itself_is_not_rain_risk() {
        let advice = SprayAdvice::assess(&forecast(&[0.5, 0.3]));
        assert!(!advice.rain_risk);
        assert_eq!(advice.advice(), ADVICE_SPRAY_NOW);
    }

    #[test]
    fn buckets_beyond_horizon_are_ignored() {
        let mut pops = vec![0.1; HORIZON_BUCKETS];
        pops.push(0.95);
        let advice = SprayAdvice::assess(&forecast(&pops));
        assert!(!advice.rain_risk);
    }

    #[test]
    fn missing_pop_counts_as_dry() {
        let buckets = vec![ForecastBucket::default(), ForecastBucket::with_pop(0.2)];
        let advice = SprayAdvice::assess(&buckets);
        assert!((advice.max_pop - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_forecast_is_dry() {
        let advice = SprayAdvice::assess(&[]);
        assert!(advice.max_pop.abs() < f64::EPSILON);
        assert!(!advice.rain_risk);
    }

    #[test]
    fn rounding_to_two_decimals() {
        let advice = SprayAdvice::assess(&forecast(&[0.456]));
        assert!((advice.rounded_max_pop() - 0.46).abs() < 1e-9);
    }

    #[test]
    fn coordinates_out_of_range() {
        assert!(validate_coordinates(12.97, 77.59).is_ok());
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, -181.0).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }
}
