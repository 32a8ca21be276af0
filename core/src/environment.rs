//! Environment traits for dependency injection.
//!
//! Services never construct their collaborators. They receive implementations
//! of these traits at construction time: production implementations live in
//! `farmlink-postgres` and `farmlink-providers`, test doubles in
//! `farmlink-testing`.
//!
//! # Dyn Compatibility
//!
//! Async methods return [`BoxFuture`] instead of using `async fn` so every
//! trait here can be held as `Arc<dyn Trait>` inside the service context.

use crate::advisory::ForecastBucket;
use crate::error::{GatewayError, ProviderError, StoreError};
use crate::money::MinorUnits;
use crate::types::{
    AvailabilitySlot, Booking, BookingId, BookingStatus, Expert, ExpertId, MeetingProviderKind,
    NewBooking, NewExpert, NewQrScan, NewSlot, QrScan, SlotId,
};
use crate::window::SlotWindow;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;

pub use crate::authenticity::ClassificationStrategy;

/// Boxed, sendable future returned by environment traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ============================================================================
// Clock
// ============================================================================

/// Source of the current time.
///
/// ```ignore
/// // Production
/// let clock = SystemClock;
/// // Tests
/// let clock = FixedClock::new(test_time());
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ============================================================================
// Store
// ============================================================================

/// Persistence for experts, slots, bookings and scans.
///
/// The store is the only owner of entity state. Callers re-read what they
/// need on every operation rather than caching rows.
pub trait MarketplaceStore: Send + Sync {
    /// All experts, ordered by id.
    fn list_experts(&self) -> BoxFuture<'_, Result<Vec<Expert>, StoreError>>;

    /// A single expert.
    fn get_expert(&self, id: ExpertId) -> BoxFuture<'_, Result<Option<Expert>, StoreError>>;

    /// Unbooked slots of `expert_id` within `window`, ordered by start time.
    fn list_open_slots(
        &self,
        expert_id: ExpertId,
        window: SlotWindow,
    ) -> BoxFuture<'_, Result<Vec<AvailabilitySlot>, StoreError>>;

    /// Take exclusive hold of an open slot.
    ///
    /// Returns `None` when the slot does not exist, belongs to a different
    /// expert or is already booked. While the returned handle is alive no
    /// other caller can reserve the same slot; once it is released, a waiting
    /// caller re-checks the slot and observes it booked if the holder
    /// committed.
    fn reserve_slot(
        &self,
        expert_id: ExpertId,
        slot_id: SlotId,
    ) -> BoxFuture<'_, Result<Option<Box<dyn SlotReservation>>, StoreError>>;

    /// A booking by id.
    fn find_booking(&self, id: BookingId) -> BoxFuture<'_, Result<Option<Booking>, StoreError>>;

    /// A booking by its payment gateway order id.
    fn find_booking_by_order<'a>(
        &'a self,
        gateway_order_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Booking>, StoreError>>;

    /// Persist a booking's status, payment id and meeting link if, and only
    /// if, its stored status is still `expected`.
    ///
    /// Returns `false` when another writer moved the booking first.
    fn update_booking<'a>(
        &'a self,
        booking: &'a Booking,
        expected: BookingStatus,
    ) -> BoxFuture<'a, Result<bool, StoreError>>;

    /// Bookings currently in `status`, oldest first.
    fn list_bookings_with_status(
        &self,
        status: BookingStatus,
    ) -> BoxFuture<'_, Result<Vec<Booking>, StoreError>>;

    /// Register an expert.
    fn insert_expert(&self, expert: NewExpert) -> BoxFuture<'_, Result<Expert, StoreError>>;

    /// Publish an open slot. The owning expert must exist.
    fn insert_slot(&self, slot: NewSlot) -> BoxFuture<'_, Result<AvailabilitySlot, StoreError>>;

    /// Record a QR scan.
    fn insert_scan(&self, scan: NewQrScan) -> BoxFuture<'_, Result<QrScan, StoreError>>;

    /// Check the store is reachable.
    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// Exclusive hold on an open slot.
///
/// Dropping the handle without calling [`SlotReservation::commit`] releases
/// the slot unchanged.
pub trait SlotReservation: Send {
    /// The reserved slot as read under the hold.
    fn slot(&self) -> &AvailabilitySlot;

    /// Insert `booking` in `pending` status and mark the slot booked,
    /// atomically, then release the hold.
    fn commit(self: Box<Self>, booking: NewBooking) -> BoxFuture<'static, Result<Booking, StoreError>>;
}

// ============================================================================
// Payment gateway
// ============================================================================

/// Order creation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderRequest {
    /// Amount in minor units
    pub amount: MinorUnits,
    /// ISO 4217 currency code
    pub currency: String,
    /// Merchant reference shown on the gateway dashboard
    pub receipt: String,
}

/// An order created on the payment gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayOrder {
    /// Gateway order id
    pub id: String,
    /// Amount in minor units, as echoed by the gateway
    pub amount: MinorUnits,
    /// Currency, as echoed by the gateway
    pub currency: String,
}

/// External payment gateway.
pub trait PaymentGateway: Send + Sync {
    /// Create an order to collect `request.amount`.
    fn create_order(&self, request: OrderRequest) -> BoxFuture<'_, Result<GatewayOrder, GatewayError>>;
}

// ============================================================================
// Notifications and meetings
// ============================================================================

/// A plain-text email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Outbound email delivery.
pub trait Notifier: Send + Sync {
    /// Deliver one message.
    fn send(&self, message: EmailMessage) -> BoxFuture<'_, Result<(), ProviderError>>;
}

/// Details used to create a meeting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeetingRequest {
    /// Booking the meeting belongs to
    pub booking_id: BookingId,
    /// Meeting title
    pub topic: String,
    /// Scheduled start
    pub start_utc: DateTime<Utc>,
    /// Scheduled end
    pub end_utc: DateTime<Utc>,
    /// Expert email (host / attendee)
    pub expert_email: String,
    /// Farmer email (attendee)
    pub farmer_email: String,
}

/// Video-conferencing provider that issues meeting links.
pub trait MeetingLinkProvider: Send + Sync {
    /// Which provider this is.
    fn kind(&self) -> MeetingProviderKind;

    /// Create a meeting and return its join URL.
    fn create_meeting(&self, request: MeetingRequest) -> BoxFuture<'_, Result<String, ProviderError>>;
}

// ============================================================================
// Weather
// ============================================================================

/// Short-range forecast source.
pub trait WeatherProvider: Send + Sync {
    /// Time-ordered 3-hour buckets for the location.
    fn forecast(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<Vec<ForecastBucket>, ProviderError>>;
}
