//! Prometheus metrics for the marketplace services.
//!
//! Services record through the small recorder structs below; the server
//! installs the exporter once with [`install_recorder`] and serves
//! [`PrometheusHandle::render`] on `/metrics`.
//!
//! | Metric | Labels |
//! |---|---|
//! | `farmlink_bookings_total` | `status` |
//! | `farmlink_webhooks_total` | `outcome` |
//! | `farmlink_confirmations_total` | `status` |
//! | `farmlink_qr_scans_total` | `result` |
//! | `farmlink_advice_total` | `rain_risk` |
//! | `farmlink_store_errors_total` | `operation` |
//! | `farmlink_gateway_order_duration_seconds` | |

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Install the Prometheus recorder and register metric descriptions.
///
/// # Errors
///
/// Returns [`MetricsError`] if the exporter cannot be built or a recorder is
/// already installed in this process.
pub fn install_recorder() -> Result<PrometheusHandle, MetricsError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )
        .map_err(|e| MetricsError::Build(e.to_string()))?
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    register_metrics();
    Ok(handle)
}

fn register_metrics() {
    describe_counter!(
        "farmlink_bookings_total",
        "Booking attempts by outcome (created, slot_unavailable, gateway_failed, store_failed)"
    );
    describe_counter!(
        "farmlink_webhooks_total",
        "Payment webhooks by outcome (rejected, malformed, ignored, unknown_order, duplicate, transitioned)"
    );
    describe_counter!(
        "farmlink_confirmations_total",
        "Confirmation pipeline runs by status (confirmed, notify_failed, skipped, failed)"
    );
    describe_counter!("farmlink_qr_scans_total", "QR verifications by result");
    describe_counter!("farmlink_advice_total", "Spray advisories by rain risk");
    describe_counter!("farmlink_store_errors_total", "Failed store operations by operation name");
    describe_histogram!(
        "farmlink_gateway_order_duration_seconds",
        "Time taken by the payment gateway to create an order"
    );
}

/// Booking metrics recorder.
pub struct BookingMetrics;

impl BookingMetrics {
    /// Record the outcome of a booking attempt.
    pub fn record(status: &'static str) {
        counter!("farmlink_bookings_total", "status" => status).increment(1);
    }

    /// Record gateway order latency.
    pub fn record_gateway_latency(duration: Duration) {
        histogram!("farmlink_gateway_order_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Webhook metrics recorder.
pub struct WebhookMetrics;

impl WebhookMetrics {
    /// Record the outcome of a webhook delivery.
    pub fn record(outcome: &'static str) {
        counter!("farmlink_webhooks_total", "outcome" => outcome).increment(1);
    }
}

/// Confirmation metrics recorder.
pub struct ConfirmationMetrics;

impl ConfirmationMetrics {
    /// Record the outcome of a pipeline run.
    pub fn record(status: &'static str) {
        counter!("farmlink_confirmations_total", "status" => status).increment(1);
    }
}

/// Advisory and authenticity metrics recorder.
pub struct PeripheralMetrics;

impl PeripheralMetrics {
    /// Record a QR verification.
    pub fn record_scan(result: &'static str) {
        counter!("farmlink_qr_scans_total", "result" => result).increment(1);
    }

    /// Record a spray advisory.
    pub fn record_advice(rain_risk: bool) {
        let label = if rain_risk { "true" } else { "false" };
        counter!("farmlink_advice_total", "rain_risk" => label).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_render_with_labels() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            BookingMetrics::record("created");
            WebhookMetrics::record("duplicate");
            PeripheralMetrics::record_advice(true);
        });

        let rendered = handle.render();
        assert!(rendered.contains("farmlink_bookings_total{status=\"created\"} 1"));
        assert!(rendered.contains("farmlink_webhooks_total{outcome=\"duplicate\"} 1"));
        assert!(rendered.contains("farmlink_advice_total{rain_risk=\"true\"} 1"));
    }
}
