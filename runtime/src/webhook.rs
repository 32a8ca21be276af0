//! Payment webhook handler.
//!
//! A delivery is trusted only after its HMAC-SHA256 signature checks out.
//! Captured payments move the matching booking `pending → paid` with a
//! compare-and-swap write, so a replayed or concurrent delivery of the same
//! event makes exactly one transition and dispatches exactly one
//! confirmation.

use crate::confirmation::ConfirmationHandle;
use crate::context::ServiceContext;
use crate::metrics::WebhookMetrics;
use farmlink_core::{
    BookingAction, BookingEffect, BookingId, BookingLifecycle, BookingStatus, DomainError,
};
use ring::hmac;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Event name for a captured payment.
pub const PAYMENT_CAPTURED: &str = "payment.captured";

/// Lower-case hex HMAC-SHA256 of `body` under `secret`.
#[must_use]
pub fn sign(secret: &str, body: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hex::encode(hmac::sign(&key, body).as_ref())
}

/// Check `signature` against the body in constant time.
///
/// A missing or empty secret, or a missing signature, never verifies.
#[must_use]
pub fn verify_signature(secret: Option<&str>, body: &[u8], signature: Option<&str>) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return false;
    };
    let Some(signature) = signature.map(str::trim).filter(|s| !s.is_empty()) else {
        return false;
    };
    let expected = sign(secret, body);
    constant_time_eq::constant_time_eq(expected.as_bytes(), signature.as_bytes())
}

#[derive(Debug, Deserialize)]
struct Envelope {
    // Missing means "not a capture", which is acknowledged like any other event.
    #[serde(default)]
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CapturedPayload {
    payment: PaymentWrapper,
}

#[derive(Debug, Deserialize)]
struct PaymentWrapper {
    entity: PaymentEntity,
}

#[derive(Debug, Deserialize)]
struct PaymentEntity {
    id: String,
    order_id: String,
}

/// What a verified delivery did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Booking moved to `paid` and confirmation was dispatched.
    Transitioned(BookingId),
    /// Booking was already past `pending`; nothing changed.
    Duplicate(BookingId),
    /// No booking references the order; nothing changed.
    UnknownOrder,
    /// Event type not handled; acknowledged without changes.
    Ignored(String),
}

/// Authenticates and applies payment gateway notifications.
#[derive(Clone, Debug)]
pub struct WebhookHandler {
    ctx: Arc<ServiceContext>,
    confirmations: ConfirmationHandle,
    lifecycle: BookingLifecycle,
}

impl WebhookHandler {
    /// Create the handler. Captured payments are handed to `confirmations`.
    #[must_use]
    pub const fn new(ctx: Arc<ServiceContext>, confirmations: ConfirmationHandle) -> Self {
        Self {
            ctx,
            confirmations,
            lifecycle: BookingLifecycle::new(),
        }
    }

    /// Process one delivery.
    ///
    /// # Errors
    ///
    /// - [`DomainError::SignatureMismatch`]: signature missing, wrong, or no
    ///   secret configured; the body is not parsed
    /// - [`DomainError::Validation`]: verified body is not a well-formed event
    /// - [`DomainError::Store`]: lookup or update failed (safe to redeliver)
    #[tracing::instrument(skip_all, fields(body_len = raw_body.len()))]
    pub async fn handle(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, DomainError> {
        if !verify_signature(self.ctx.payment.webhook_secret.as_deref(), raw_body, signature) {
            WebhookMetrics::record("rejected");
            warn!("Webhook signature rejected");
            return Err(DomainError::SignatureMismatch);
        }

        let envelope: Envelope = serde_json::from_slice(raw_body).map_err(|e| {
            WebhookMetrics::record("malformed");
            DomainError::Validation(format!("invalid webhook body: {e}"))
        })?;

        if envelope.event != PAYMENT_CAPTURED {
            WebhookMetrics::record("ignored");
            info!(event = %envelope.event, "Webhook event ignored");
            return Ok(WebhookOutcome::Ignored(envelope.event));
        }

        let payload: CapturedPayload = serde_json::from_value(envelope.payload).map_err(|e| {
            WebhookMetrics::record("malformed");
            DomainError::Validation(format!("invalid payment.captured payload: {e}"))
        })?;
        let PaymentEntity {
            id: payment_id,
            order_id,
        } = payload.payment.entity;

        self.capture(&order_id, payment_id).await
    }

    async fn capture(&self, order_id: &str, payment_id: String) -> Result<WebhookOutcome, DomainError> {
        let Some(mut booking) = self.ctx.store.find_booking_by_order(order_id).await? else {
            WebhookMetrics::record("unknown_order");
            info!(gateway_order_id = %order_id, "No booking for captured order");
            return Ok(WebhookOutcome::UnknownOrder);
        };
        let booking_id = booking.id;

        let effects = match self
            .lifecycle
            .apply(&mut booking, BookingAction::PaymentCaptured { payment_id })
        {
            Ok(effects) => effects,
            Err(err) => {
                WebhookMetrics::record("duplicate");
                info!(booking_id = %booking_id, reason = %err, "Capture already processed");
                return Ok(WebhookOutcome::Duplicate(booking_id));
            }
        };

        if !self
            .ctx
            .store
            .update_booking(&booking, BookingStatus::Pending)
            .await?
        {
            WebhookMetrics::record("duplicate");
            info!(booking_id = %booking_id, "Concurrent delivery won the transition");
            return Ok(WebhookOutcome::Duplicate(booking_id));
        }

        for effect in effects {
            if let BookingEffect::DispatchConfirmation(id) = effect {
                self.confirmations.dispatch(id);
            }
        }

        WebhookMetrics::record("transitioned");
        info!(booking_id = %booking_id, gateway_order_id = %order_id, "Booking paid");
        Ok(WebhookOutcome::Transitioned(booking_id))
    }
}
