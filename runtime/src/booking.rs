//! Booking orchestrator.
//!
//! Creating a booking is one unit of work:
//!
//! 1. take an exclusive hold on the slot (re-checking it is open),
//! 2. create the gateway order while the hold is kept,
//! 3. insert the `pending` booking and mark the slot booked in the same
//!    commit that releases the hold.
//!
//! If step 2 fails the hold is dropped and nothing is written. If step 3
//! fails the order already exists on the gateway; it is logged so it can be
//! reconciled, and it expires unpaid.

use crate::context::ServiceContext;
use crate::metrics::BookingMetrics;
use farmlink_core::environment::OrderRequest;
use farmlink_core::{BookingId, DomainError, ExpertId, MinorUnits, NewBooking, SlotId};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Validated input for [`BookingOrchestrator::create_booking`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateBooking {
    /// Expert to book
    pub expert_id: ExpertId,
    /// Slot to reserve
    pub slot_id: SlotId,
    /// Farmer display name
    pub farmer_name: String,
    /// Farmer contact email
    pub farmer_email: String,
    /// Amount in major currency units
    pub amount: Decimal,
    /// Opaque commission code
    pub commission_code: Option<String>,
}

impl CreateBooking {
    fn validate(&self) -> Result<(), DomainError> {
        if self.farmer_name.trim().is_empty() {
            return Err(DomainError::Validation("farmerName is required".to_string()));
        }
        let email = self.farmer_email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::Validation(
                "farmerEmail must be a valid email address".to_string(),
            ));
        }
        Ok(())
    }
}

/// What the caller needs to start the payment flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingReceipt {
    /// New booking
    pub booking_id: BookingId,
    /// Gateway order the farmer pays against
    pub gateway_order_id: String,
    /// Order amount in minor units, as echoed by the gateway
    pub amount: MinorUnits,
}

/// Reserves slots and records pending bookings against gateway orders.
#[derive(Clone, Debug)]
pub struct BookingOrchestrator {
    ctx: Arc<ServiceContext>,
}

impl BookingOrchestrator {
    /// Create the orchestrator.
    #[must_use]
    pub const fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Book `request.slot_id` for the farmer.
    ///
    /// Of any number of concurrent calls for the same slot at most one
    /// succeeds; the others return [`DomainError::SlotUnavailable`].
    ///
    /// # Errors
    ///
    /// - [`DomainError::Validation`]: bad farmer details or amount
    /// - [`DomainError::SlotUnavailable`]: slot missing, foreign or taken
    /// - [`DomainError::PaymentGateway`]: order creation failed, nothing written
    /// - [`DomainError::Store`]: persistence failed
    #[tracing::instrument(
        skip(self, request),
        fields(expert_id = %request.expert_id, slot_id = %request.slot_id)
    )]
    pub async fn create_booking(&self, request: CreateBooking) -> Result<BookingReceipt, DomainError> {
        request.validate()?;
        let amount = MinorUnits::from_major(request.amount)?;

        let Some(reservation) = self
            .ctx
            .store
            .reserve_slot(request.expert_id, request.slot_id)
            .await?
        else {
            BookingMetrics::record("slot_unavailable");
            info!("Slot not available");
            return Err(DomainError::SlotUnavailable);
        };
        let slot = reservation.slot().clone();

        let started = Instant::now();
        let order = match self
            .ctx
            .gateway
            .create_order(OrderRequest {
                amount,
                currency: self.ctx.payment.currency.clone(),
                receipt: format!("slot-{}", slot.id),
            })
            .await
        {
            Ok(order) => order,
            Err(err) => {
                BookingMetrics::record("gateway_failed");
                warn!(error = %err, "Gateway order creation failed, releasing slot");
                return Err(err.into());
            }
        };
        BookingMetrics::record_gateway_latency(started.elapsed());

        let new_booking = NewBooking {
            expert_id: request.expert_id,
            farmer_name: request.farmer_name.trim().to_string(),
            farmer_email: request.farmer_email.trim().to_string(),
            slot_start_utc: slot.start_utc,
            slot_end_utc: slot.end_utc,
            gateway_order_id: order.id.clone(),
            created_at: self.ctx.clock.now(),
            commission_code: request.commission_code,
        };

        let booking = match reservation.commit(new_booking).await {
            Ok(booking) => booking,
            Err(err) => {
                BookingMetrics::record("store_failed");
                error!(
                    gateway_order_id = %order.id,
                    error = %err,
                    "Booking not recorded after gateway order was created; order is orphaned"
                );
                return Err(err.into());
            }
        };

        BookingMetrics::record("created");
        info!(
            booking_id = %booking.id,
            gateway_order_id = %order.id,
            amount = order.amount.get(),
            "Booking created"
        );

        Ok(BookingReceipt {
            booking_id: booking.id,
            gateway_order_id: order.id,
            amount: order.amount,
        })
    }
}
