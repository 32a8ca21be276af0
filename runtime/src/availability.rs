//! Expert directory and open-slot queries.

use crate::context::ServiceContext;
use farmlink_core::{AvailabilitySlot, DomainError, Expert, ExpertId, SlotWindow};
use std::sync::Arc;

/// Read-only queries over experts and their calendars.
#[derive(Clone, Debug)]
pub struct AvailabilityService {
    ctx: Arc<ServiceContext>,
}

impl AvailabilityService {
    /// Create the service.
    #[must_use]
    pub const fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// All experts.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Store`] when the store fails.
    pub async fn list_experts(&self) -> Result<Vec<Expert>, DomainError> {
        Ok(self.ctx.store.list_experts().await?)
    }

    /// Unbooked slots of `expert_id` inside `window`, earliest first.
    ///
    /// An unknown expert simply has no slots.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Store`] when the store fails.
    #[tracing::instrument(skip(self), fields(expert_id = %expert_id))]
    pub async fn list_open_slots(
        &self,
        expert_id: ExpertId,
        window: SlotWindow,
    ) -> Result<Vec<AvailabilitySlot>, DomainError> {
        let slots = self.ctx.store.list_open_slots(expert_id, window).await?;
        tracing::debug!(count = slots.len(), "Listed open slots");
        Ok(slots)
    }
}
