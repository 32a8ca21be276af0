//! Explicitly constructed service context.
//!
//! Everything a service talks to is held here behind a trait object and
//! handed to each service at construction. There are no process-wide
//! singletons besides the metrics recorder.

use farmlink_core::environment::{
    ClassificationStrategy, Clock, MarketplaceStore, MeetingLinkProvider, Notifier, PaymentGateway,
    SystemClock, WeatherProvider,
};
use farmlink_core::{LastNibbleParity, MeetingProviderKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Payment settings the orchestrator and webhook handler need.
#[derive(Clone)]
pub struct PaymentSettings {
    /// ISO 4217 currency code for new orders
    pub currency: String,
    /// Shared secret for webhook signatures; `None` rejects every webhook
    pub webhook_secret: Option<String>,
}

impl fmt::Debug for PaymentSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentSettings")
            .field("currency", &self.currency)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            currency: "INR".to_string(),
            webhook_secret: None,
        }
    }
}

/// Meeting providers keyed by the preference stored on each expert.
#[derive(Clone, Default)]
pub struct MeetingProviders {
    providers: HashMap<MeetingProviderKind, Arc<dyn MeetingLinkProvider>>,
}

impl MeetingProviders {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under its own [`MeetingLinkProvider::kind`].
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn MeetingLinkProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    /// Provider for `kind`, if one is configured.
    #[must_use]
    pub fn get(&self, kind: MeetingProviderKind) -> Option<Arc<dyn MeetingLinkProvider>> {
        self.providers.get(&kind).cloned()
    }
}

impl fmt::Debug for MeetingProviders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.providers.keys()).finish()
    }
}

/// Store handle, external clients and settings shared by all services.
#[derive(Clone)]
pub struct ServiceContext {
    /// Persistence
    pub store: Arc<dyn MarketplaceStore>,
    /// Payment gateway client
    pub gateway: Arc<dyn PaymentGateway>,
    /// Outbound email
    pub notifier: Arc<dyn Notifier>,
    /// Meeting link providers
    pub meetings: MeetingProviders,
    /// Forecast source
    pub weather: Arc<dyn WeatherProvider>,
    /// QR authenticity rule
    pub classifier: Arc<dyn ClassificationStrategy>,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Payment settings
    pub payment: PaymentSettings,
}

impl ServiceContext {
    /// Start building a context around the required collaborators.
    #[must_use]
    pub fn builder(
        store: Arc<dyn MarketplaceStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        weather: Arc<dyn WeatherProvider>,
    ) -> ServiceContextBuilder {
        ServiceContextBuilder {
            context: Self {
                store,
                gateway,
                notifier,
                meetings: MeetingProviders::new(),
                weather,
                classifier: Arc::new(LastNibbleParity),
                clock: Arc::new(SystemClock),
                payment: PaymentSettings::default(),
            },
        }
    }
}

impl fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContext")
            .field("meetings", &self.meetings)
            .field("payment", &self.payment)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ServiceContext`].
pub struct ServiceContextBuilder {
    context: ServiceContext,
}

impl ServiceContextBuilder {
    /// Register a meeting provider.
    #[must_use]
    pub fn meeting_provider(mut self, provider: Arc<dyn MeetingLinkProvider>) -> Self {
        self.context.meetings = self.context.meetings.with(provider);
        self
    }

    /// Replace the QR classification rule.
    #[must_use]
    pub fn classifier(mut self, classifier: Arc<dyn ClassificationStrategy>) -> Self {
        self.context.classifier = classifier;
        self
    }

    /// Replace the clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.context.clock = clock;
        self
    }

    /// Set payment settings.
    #[must_use]
    pub fn payment(mut self, payment: PaymentSettings) -> Self {
        self.context.payment = payment;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Arc<ServiceContext> {
        Arc::new(self.context)
    }
}
