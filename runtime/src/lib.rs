//! # FarmLink Runtime
//!
//! Service layer for the FarmLink marketplace.
//!
//! Every service is constructed from a shared [`ServiceContext`] that holds
//! the store handle, external clients and settings. Services are cheap to
//! clone and safe to share between request handlers.
//!
//! ## Core Components
//!
//! - **Booking Orchestrator**: reserves a slot, creates the gateway order and
//!   records the pending booking as one unit
//! - **Webhook Handler**: authenticates payment notifications and moves
//!   bookings `pending → paid`
//! - **Confirmation Pipeline / Dispatcher**: background `paid → confirmed`
//!   with meeting link and emails, retried with backoff and a periodic sweep
//! - **Availability / Advisory / Authenticity**: read and compute services
//!
//! ## Example
//!
//! ```ignore
//! let ctx = ServiceContext::builder(store, gateway, notifier, weather)
//!     .meeting_provider(zoom)
//!     .build();
//! let dispatcher = ConfirmationDispatcher::spawn(
//!     ConfirmationPipeline::new(Arc::clone(&ctx), RetryPolicy::default()),
//!     Duration::from_secs(60),
//! );
//! let services = Services::new(ctx, dispatcher.handle());
//! ```

use std::sync::Arc;

/// Expert and slot queries
pub mod availability;

/// Booking orchestrator
pub mod booking;

/// Confirmation pipeline and dispatcher
pub mod confirmation;

/// Service context construction
pub mod context;

/// Weather spray advisory
pub mod advisory;

/// QR verification
pub mod authenticity;

/// Prometheus metrics for observability
pub mod metrics;

/// Retry logic with exponential backoff
pub mod retry;

/// Payment webhook handling
pub mod webhook;

pub use advisory::{Advisory, AdvisoryService};
pub use authenticity::{AuthenticityService, ScanMetadata};
pub use availability::AvailabilityService;
pub use booking::{BookingOrchestrator, BookingReceipt, CreateBooking};
pub use confirmation::{
    ConfirmationDispatcher, ConfirmationHandle, ConfirmationOutcome, ConfirmationPipeline,
};
pub use context::{MeetingProviders, PaymentSettings, ServiceContext, ServiceContextBuilder};
pub use retry::RetryPolicy;
pub use webhook::{WebhookHandler, WebhookOutcome};

/// All request-facing services, built from one context.
#[derive(Clone, Debug)]
pub struct Services {
    /// Shared context (store handle used by readiness checks)
    pub context: Arc<ServiceContext>,
    /// Expert and slot queries
    pub availability: AvailabilityService,
    /// Booking creation
    pub bookings: BookingOrchestrator,
    /// Payment webhooks
    pub webhooks: WebhookHandler,
    /// Spray advisory
    pub advisory: AdvisoryService,
    /// QR verification
    pub authenticity: AuthenticityService,
}

impl Services {
    /// Build every service around `context`. Paid bookings are queued on
    /// `confirmations`.
    #[must_use]
    pub fn new(context: Arc<ServiceContext>, confirmations: ConfirmationHandle) -> Self {
        Self {
            availability: AvailabilityService::new(Arc::clone(&context)),
            bookings: BookingOrchestrator::new(Arc::clone(&context)),
            webhooks: WebhookHandler::new(Arc::clone(&context), confirmations),
            advisory: AdvisoryService::new(Arc::clone(&context)),
            authenticity: AuthenticityService::new(Arc::clone(&context)),
            context,
        }
    }
}
