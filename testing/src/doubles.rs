//! Test doubles for the external collaborators.
//!
//! - [`MockPaymentGateway`]: sequential order ids, optional scripted failure
//! - [`RecordingNotifier`]: captures every email
//! - [`ScriptedMeetingProvider`]: fails a set number of times, then issues links
//! - [`ScriptedWeatherProvider`]: returns a fixed forecast or error

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use farmlink_core::environment::{
    BoxFuture, EmailMessage, GatewayOrder, MeetingLinkProvider, MeetingRequest, Notifier,
    OrderRequest, PaymentGateway, WeatherProvider,
};
use farmlink_core::{ForecastBucket, GatewayError, MeetingProviderKind, ProviderError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Payment gateway that creates orders `order_test_1`, `order_test_2`, ...
#[derive(Clone, Debug, Default)]
pub struct MockPaymentGateway {
    requests: Arc<Mutex<Vec<OrderRequest>>>,
    failure: Arc<Mutex<Option<GatewayError>>>,
}

impl MockPaymentGateway {
    /// Gateway that accepts every order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway that rejects every order with `error`.
    #[must_use]
    pub fn failing(error: GatewayError) -> Self {
        let gateway = Self::default();
        gateway.fail_with(Some(error));
        gateway
    }

    /// Change the scripted failure (`None` accepts orders again).
    pub fn fail_with(&self, error: Option<GatewayError>) {
        *self.failure.lock().unwrap() = error;
    }

    /// Every order request received, including failed ones.
    #[must_use]
    pub fn requests(&self) -> Vec<OrderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl PaymentGateway for MockPaymentGateway {
    fn create_order(&self, request: OrderRequest) -> BoxFuture<'_, Result<GatewayOrder, GatewayError>> {
        Box::pin(async move {
            let order_number = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(request.clone());
                requests.len()
            };
            if let Some(error) = self.failure.lock().unwrap().clone() {
                return Err(error);
            }
            Ok(GatewayOrder {
                id: format!("order_test_{order_number}"),
                amount: request.amount,
                currency: request.currency,
            })
        })
    }
}

/// Notifier that records messages instead of sending them.
#[derive(Clone, Debug, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingNotifier {
    /// Notifier that accepts every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    /// Messages delivered so far.
    #[must_use]
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Messages delivered to `address`.
    #[must_use]
    pub fn sent_to(&self, address: &str) -> Vec<EmailMessage> {
        self.sent()
            .into_iter()
            .filter(|message| message.to == address)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, message: EmailMessage) -> BoxFuture<'_, Result<(), ProviderError>> {
        Box::pin(async move {
            if *self.failing.lock().unwrap() {
                return Err(ProviderError::Email(format!("refused mail to {}", message.to)));
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        })
    }
}

/// Meeting provider that fails a configured number of times before issuing
/// `https://<host>/j/<booking id>` links.
#[derive(Clone, Debug)]
pub struct ScriptedMeetingProvider {
    kind: MeetingProviderKind,
    failures_left: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedMeetingProvider {
    /// Provider that always succeeds.
    #[must_use]
    pub fn new(kind: MeetingProviderKind) -> Self {
        Self::failing_times(kind, 0)
    }

    /// Provider that fails the first `failures` calls.
    #[must_use]
    pub fn failing_times(kind: MeetingProviderKind, failures: usize) -> Self {
        Self {
            kind,
            failures_left: Arc::new(AtomicUsize::new(failures)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `create_meeting` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    const fn host(&self) -> &'static str {
        match self.kind {
            MeetingProviderKind::Zoom => "zoom.us",
            MeetingProviderKind::Google => "meet.google.com",
        }
    }
}

impl MeetingLinkProvider for ScriptedMeetingProvider {
    fn kind(&self) -> MeetingProviderKind {
        self.kind
    }

    fn create_meeting(&self, request: MeetingRequest) -> BoxFuture<'_, Result<String, ProviderError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if failing {
                return Err(ProviderError::Http {
                    provider: self.kind.to_string(),
                    status: 503,
                });
            }
            Ok(format!("https://{}/j/{}", self.host(), request.booking_id))
        })
    }
}

/// Weather provider returning a fixed answer.
#[derive(Clone, Debug)]
pub struct ScriptedWeatherProvider {
    response: Result<Vec<ForecastBucket>, ProviderError>,
}

impl ScriptedWeatherProvider {
    /// Provider returning buckets with the given probabilities.
    #[must_use]
    pub fn with_pops(pops: &[f64]) -> Self {
        Self {
            response: Ok(pops.iter().copied().map(ForecastBucket::with_pop).collect()),
        }
    }

    /// Provider failing with `error`.
    #[must_use]
    pub const fn failing(error: ProviderError) -> Self {
        Self { response: Err(error) }
    }
}

impl WeatherProvider for ScriptedWeatherProvider {
    fn forecast(&self, _lat: f64, _lon: f64) -> BoxFuture<'_, Result<Vec<ForecastBucket>, ProviderError>> {
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmlink_core::{BookingId, MinorUnits};

    #[tokio::test]
    async fn gateway_numbers_orders() {
        let gateway = MockPaymentGateway::new();
        let request = OrderRequest {
            amount: MinorUnits::new(50_000),
            currency: "INR".to_string(),
            receipt: "slot-1".to_string(),
        };
        let first = gateway.create_order(request.clone()).await.unwrap();
        let second = gateway.create_order(request).await.unwrap();

        assert_eq!(first.id, "order_test_1");
        assert_eq!(second.id, "order_test_2");
        assert_eq!(gateway.requests().len(), 2);
    }

    #[tokio::test]
    async fn meeting_provider_recovers_after_scripted_failures() {
        let provider = ScriptedMeetingProvider::failing_times(MeetingProviderKind::Zoom, 2);
        let request = MeetingRequest {
            booking_id: BookingId::new(9),
            topic: "Consultation".to_string(),
            start_utc: crate::test_clock().time(),
            end_utc: crate::test_clock().time(),
            expert_email: "e@x.com".to_string(),
            farmer_email: "a@x.com".to_string(),
        };

        assert!(provider.create_meeting(request.clone()).await.is_err());
        assert!(provider.create_meeting(request.clone()).await.is_err());
        assert_eq!(
            provider.create_meeting(request).await.unwrap(),
            "https://zoom.us/j/9"
        );
        assert_eq!(provider.calls(), 3);
    }
}
