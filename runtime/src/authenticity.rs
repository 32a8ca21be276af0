//! QR product verification.

use crate::context::ServiceContext;
use crate::metrics::PeripheralMetrics;
use farmlink_core::{DomainError, NewQrScan, QrScan, content_digest};
use std::sync::Arc;

/// Optional caller details stored with a scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanMetadata {
    /// Farmer name
    pub farmer_name: Option<String>,
    /// Farmer email
    pub farmer_email: Option<String>,
    /// Scan latitude
    pub lat: Option<f64>,
    /// Scan longitude
    pub lon: Option<f64>,
}

/// Hashes scanned content, classifies it and records the scan.
#[derive(Clone, Debug)]
pub struct AuthenticityService {
    ctx: Arc<ServiceContext>,
}

impl AuthenticityService {
    /// Create the service.
    #[must_use]
    pub const fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Verify `content` and persist the scan whatever the result.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Validation`]: empty content
    /// - [`DomainError::Store`]: the scan could not be recorded
    #[tracing::instrument(skip_all, fields(content_len = content.len()))]
    pub async fn verify(&self, content: String, metadata: ScanMetadata) -> Result<QrScan, DomainError> {
        if content.is_empty() {
            return Err(DomainError::Validation("content is required".to_string()));
        }

        let sha256 = content_digest(&content);
        let result = self.ctx.classifier.classify(&sha256);

        let scan = self
            .ctx
            .store
            .insert_scan(NewQrScan {
                content,
                sha256,
                result,
                farmer_name: metadata.farmer_name,
                farmer_email: metadata.farmer_email,
                lat: metadata.lat,
                lon: metadata.lon,
                created_at: self.ctx.clock.now(),
            })
            .await?;

        PeripheralMetrics::record_scan(result.as_str());
        tracing::info!(scan_id = %scan.id, result = result.as_str(), "QR scan recorded");
        Ok(scan)
    }
}
