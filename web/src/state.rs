//! Application state shared across handlers.

use farmlink_runtime::Services;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// State handed to every handler.
///
/// Cheap to clone: both fields are reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Marketplace services
    pub services: Arc<Services>,
    /// Renders `/metrics`; `None` when no recorder is installed (tests)
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// State without a metrics exporter.
    #[must_use]
    pub fn new(services: Services) -> Self {
        Self {
            services: Arc::new(services),
            metrics: None,
        }
    }

    /// Serve `handle` on `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
