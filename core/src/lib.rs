//! # FarmLink Core
//!
//! Domain types and pure business rules for the FarmLink expert-booking
//! marketplace.
//!
//! This crate contains no I/O. Everything that talks to the outside world
//! (database, payment gateway, email, meeting and weather providers) is
//! described here as a trait in [`environment`] and implemented elsewhere.
//!
//! ## Core Concepts
//!
//! - **Expert / Slot / Booking / QR scan**: the persisted entities ([`types`])
//! - **Booking lifecycle**: the `pending → paid → confirmed` state machine
//!   expressed as a pure function returning follow-up effects ([`lifecycle`])
//! - **Environment**: injected dependencies via traits ([`environment`])
//! - **Advisory / Authenticity**: stateless computations over provider data
//!   and scanned content ([`advisory`], [`authenticity`])
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Explicit effects (the lifecycle never performs I/O itself)
//! - Dependency injection via an explicitly constructed service context

#![forbid(unsafe_code)]

pub mod advisory;
pub mod authenticity;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod types;
pub mod window;

// Re-export commonly used types
pub use advisory::{ForecastBucket, SprayAdvice};
pub use authenticity::{ClassificationStrategy, LastNibbleParity, content_digest};
pub use chrono::{DateTime, Utc};
pub use environment::{
    BoxFuture, Clock, EmailMessage, GatewayOrder, MarketplaceStore, MeetingLinkProvider,
    MeetingRequest, Notifier, OrderRequest, PaymentGateway, SlotReservation, SystemClock,
    WeatherProvider,
};
pub use error::{DomainError, GatewayError, ProviderError, StoreError};
pub use lifecycle::{BookingAction, BookingEffect, BookingLifecycle, TransitionError};
pub use money::MinorUnits;
pub use smallvec::SmallVec;
pub use types::{
    AvailabilitySlot, Booking, BookingId, BookingStatus, Expert, ExpertId, MeetingProviderKind,
    NewBooking, NewExpert, NewQrScan, NewSlot, QrScan, ScanId, ScanResult, SlotId,
};
pub use window::SlotWindow;
