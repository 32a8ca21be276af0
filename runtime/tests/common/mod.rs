//! Shared wiring for runtime integration tests.

#![allow(dead_code)]

use farmlink_core::MeetingProviderKind;
use farmlink_runtime::{PaymentSettings, ServiceContext};
use farmlink_testing::{
    InMemoryMarketplaceStore, MockPaymentGateway, RecordingNotifier, ScriptedMeetingProvider,
    ScriptedWeatherProvider, test_clock,
};
use std::sync::Arc;

pub const WEBHOOK_SECRET: &str = "whsec_test";

/// Context plus direct handles on every double.
pub struct Harness {
    pub ctx: Arc<ServiceContext>,
    pub store: InMemoryMarketplaceStore,
    pub gateway: MockPaymentGateway,
    pub notifier: RecordingNotifier,
    pub zoom: ScriptedMeetingProvider,
    pub google: ScriptedMeetingProvider,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_zoom(ScriptedMeetingProvider::new(MeetingProviderKind::Zoom))
    }

    pub fn with_zoom(zoom: ScriptedMeetingProvider) -> Self {
        Self::build(
            MockPaymentGateway::new(),
            zoom,
            ScriptedWeatherProvider::with_pops(&[0.1]),
        )
    }

    pub fn with_gateway(gateway: MockPaymentGateway) -> Self {
        Self::build(
            gateway,
            ScriptedMeetingProvider::new(MeetingProviderKind::Zoom),
            ScriptedWeatherProvider::with_pops(&[0.1]),
        )
    }

    pub fn with_weather(weather: ScriptedWeatherProvider) -> Self {
        Self::build(
            MockPaymentGateway::new(),
            ScriptedMeetingProvider::new(MeetingProviderKind::Zoom),
            weather,
        )
    }

    fn build(
        gateway: MockPaymentGateway,
        zoom: ScriptedMeetingProvider,
        weather: ScriptedWeatherProvider,
    ) -> Self {
        let store = InMemoryMarketplaceStore::new();
        let notifier = RecordingNotifier::new();
        let google = ScriptedMeetingProvider::new(MeetingProviderKind::Google);

        let ctx = ServiceContext::builder(
            Arc::new(store.clone()),
            Arc::new(gateway.clone()),
            Arc::new(notifier.clone()),
            Arc::new(weather),
        )
        .meeting_provider(Arc::new(zoom.clone()))
        .meeting_provider(Arc::new(google.clone()))
        .clock(Arc::new(test_clock()))
        .payment(PaymentSettings {
            currency: "INR".to_string(),
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        })
        .build();

        Self {
            ctx,
            store,
            gateway,
            notifier,
            zoom,
            google,
        }
    }
}
