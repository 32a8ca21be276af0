//! In-memory marketplace store.
//!
//! All state lives behind one async mutex. A slot reservation holds the
//! owned guard until it commits or is dropped, so concurrent reservations of
//! any slot are serialised. That is coarser than the row lock the Postgres
//! store takes, but it gives the same observable exclusivity.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity

use farmlink_core::environment::{BoxFuture, MarketplaceStore, SlotReservation};
use farmlink_core::{
    AvailabilitySlot, Booking, BookingId, BookingStatus, Expert, ExpertId, NewBooking, NewExpert,
    NewQrScan, NewSlot, QrScan, ScanId, SlotId, SlotWindow, StoreError,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
struct State {
    experts: BTreeMap<ExpertId, Expert>,
    slots: BTreeMap<SlotId, AvailabilitySlot>,
    bookings: BTreeMap<BookingId, Booking>,
    scans: Vec<QrScan>,
    last_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// In-memory [`MarketplaceStore`] for fast, deterministic tests.
///
/// ```
/// use farmlink_testing::InMemoryMarketplaceStore;
/// use farmlink_core::environment::MarketplaceStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryMarketplaceStore::new();
/// assert!(store.list_experts().await?.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryMarketplaceStore {
    state: Arc<Mutex<State>>,
    offline: Arc<AtomicBool>,
    fail_commits: Arc<AtomicBool>,
}

impl InMemoryMarketplaceStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with a database error until reset.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make reservation commits fail until reset.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of a slot, including booked ones.
    pub async fn slot(&self, id: SlotId) -> Option<AvailabilitySlot> {
        self.state.lock().await.slots.get(&id).cloned()
    }

    /// Snapshot of every booking.
    pub async fn bookings(&self) -> Vec<Booking> {
        self.state.lock().await.bookings.values().cloned().collect()
    }

    /// Snapshot of every recorded scan.
    pub async fn scans(&self) -> Vec<QrScan> {
        self.state.lock().await.scans.clone()
    }

    /// Overwrite a booking directly, bypassing status checks.
    pub async fn put_booking(&self, booking: Booking) {
        self.state.lock().await.bookings.insert(booking.id, booking);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Database("store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl MarketplaceStore for InMemoryMarketplaceStore {
    fn list_experts(&self) -> BoxFuture<'_, Result<Vec<Expert>, StoreError>> {
        Box::pin(async move {
            self.check_online()?;
            Ok(self.state.lock().await.experts.values().cloned().collect())
        })
    }

    fn get_expert(&self, id: ExpertId) -> BoxFuture<'_, Result<Option<Expert>, StoreError>> {
        Box::pin(async move {
            self.check_online()?;
            Ok(self.state.lock().await.experts.get(&id).cloned())
        })
    }

    fn list_open_slots(
        &self,
        expert_id: ExpertId,
        window: SlotWindow,
    ) -> BoxFuture<'_, Result<Vec<AvailabilitySlot>, StoreError>> {
        Box::pin(async move {
            self.check_online()?;
            let state = self.state.lock().await;
            let mut slots: Vec<AvailabilitySlot> = state
                .slots
                .values()
                .filter(|slot| slot.expert_id == expert_id && !slot.is_booked && window.contains(slot))
                .cloned()
                .collect();
            slots.sort_by_key(|slot| (slot.start_utc, slot.id));
            Ok(slots)
        })
    }

    fn reserve_slot(
        &self,
        expert_id: ExpertId,
        slot_id: SlotId,
    ) -> BoxFuture<'_, Result<Option<Box<dyn SlotReservation>>, StoreError>> {
        Box::pin(async move {
            self.check_online()?;
            let guard = Arc::clone(&self.state).lock_owned().await;
            let slot = match guard.slots.get(&slot_id) {
                Some(slot) if slot.expert_id == expert_id && !slot.is_booked => slot.clone(),
                _ => return Ok(None),
            };
            let reservation: Box<dyn SlotReservation> = Box::new(InMemoryReservation {
                guard,
                slot,
                fail_commit: self.fail_commits.load(Ordering::SeqCst),
            });
            Ok(Some(reservation))
        })
    }

    fn find_booking(&self, id: BookingId) -> BoxFuture<'_, Result<Option<Booking>, StoreError>> {
        Box::pin(async move {
            self.check_online()?;
            Ok(self.state.lock().await.bookings.get(&id).cloned())
        })
    }

    fn find_booking_by_order<'a>(
        &'a self,
        gateway_order_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Booking>, StoreError>> {
        Box::pin(async move {
            self.check_online()?;
            Ok(self
                .state
                .lock()
                .await
                .bookings
                .values()
                .find(|booking| booking.gateway_order_id == gateway_order_id)
                .cloned())
        })
    }

    fn update_booking<'a>(
        &'a self,
        booking: &'a Booking,
        expected: BookingStatus,
    ) -> BoxFuture<'a, Result<bool, StoreError>> {
        Box::pin(async move {
            self.check_online()?;
            let mut state = self.state.lock().await;
            match state.bookings.get_mut(&booking.id) {
                Some(stored) if stored.status == expected => {
                    stored.status = booking.status;
                    stored.gateway_payment_id.clone_from(&booking.gateway_payment_id);
                    stored.meeting_link.clone_from(&booking.meeting_link);
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    fn list_bookings_with_status(
        &self,
        status: BookingStatus,
    ) -> BoxFuture<'_, Result<Vec<Booking>, StoreError>> {
        Box::pin(async move {
            self.check_online()?;
            let state = self.state.lock().await;
            let mut bookings: Vec<Booking> = state
                .bookings
                .values()
                .filter(|booking| booking.status == status)
                .cloned()
                .collect();
            bookings.sort_by_key(|booking| (booking.created_at, booking.id));
            Ok(bookings)
        })
    }

    fn insert_expert(&self, expert: NewExpert) -> BoxFuture<'_, Result<Expert, StoreError>> {
        Box::pin(async move {
            self.check_online()?;
            let mut state = self.state.lock().await;
            let expert = Expert {
                id: ExpertId::new(state.next_id()),
                name: expert.name,
                specialty: expert.specialty,
                email: expert.email,
                meeting_provider: expert.meeting_provider,
            };
            state.experts.insert(expert.id, expert.clone());
            Ok(expert)
        })
    }

    fn insert_slot(&self, slot: NewSlot) -> BoxFuture<'_, Result<AvailabilitySlot, StoreError>> {
        Box::pin(async move {
            self.check_online()?;
            slot.validate().map_err(StoreError::Constraint)?;
            let mut state = self.state.lock().await;
            if !state.experts.contains_key(&slot.expert_id) {
                return Err(StoreError::Constraint(format!(
                    "expert {} does not exist",
                    slot.expert_id
                )));
            }
            let slot = AvailabilitySlot {
                id: SlotId::new(state.next_id()),
                expert_id: slot.expert_id,
                start_utc: slot.start_utc,
                end_utc: slot.end_utc,
                is_booked: false,
            };
            state.slots.insert(slot.id, slot.clone());
            Ok(slot)
        })
    }

    fn insert_scan(&self, scan: NewQrScan) -> BoxFuture<'_, Result<QrScan, StoreError>> {
        Box::pin(async move {
            self.check_online()?;
            let mut state = self.state.lock().await;
            let scan = QrScan {
                id: ScanId::new(state.next_id()),
                content: scan.content,
                sha256: scan.sha256,
                result: scan.result,
                farmer_name: scan.farmer_name,
                farmer_email: scan.farmer_email,
                lat: scan.lat,
                lon: scan.lon,
                created_at: scan.created_at,
            };
            state.scans.push(scan.clone());
            Ok(scan)
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move { self.check_online() })
    }
}

struct InMemoryReservation {
    guard: OwnedMutexGuard<State>,
    slot: AvailabilitySlot,
    fail_commit: bool,
}

impl SlotReservation for InMemoryReservation {
    fn slot(&self) -> &AvailabilitySlot {
        &self.slot
    }

    fn commit(self: Box<Self>, booking: NewBooking) -> BoxFuture<'static, Result<Booking, StoreError>> {
        Box::pin(async move {
            let Self {
                mut guard,
                slot,
                fail_commit,
            } = *self;
            if fail_commit {
                return Err(StoreError::Database("commit failed".to_string()));
            }

            let booking = Booking {
                id: BookingId::new(guard.next_id()),
                expert_id: booking.expert_id,
                farmer_name: booking.farmer_name,
                farmer_email: booking.farmer_email,
                slot_start_utc: booking.slot_start_utc,
                slot_end_utc: booking.slot_end_utc,
                status: BookingStatus::Pending,
                gateway_order_id: booking.gateway_order_id,
                gateway_payment_id: None,
                meeting_link: None,
                created_at: booking.created_at,
                commission_code: booking.commission_code,
            };
            if let Some(stored) = guard.slots.get_mut(&slot.id) {
                stored.is_booked = true;
            }
            guard.bookings.insert(booking.id, booking.clone());
            Ok(booking)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn dropped_reservation_leaves_slot_open() {
        let store = InMemoryMarketplaceStore::new();
        let (expert, slot) = fixtures::seed_expert_with_slot(&store).await;

        let reservation = store.reserve_slot(expert.id, slot.id).await.unwrap();
        assert!(reservation.is_some());
        drop(reservation);

        assert!(!store.slot(slot.id).await.unwrap().is_booked);
        assert!(store.reserve_slot(expert.id, slot.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn committed_reservation_books_slot() {
        let store = InMemoryMarketplaceStore::new();
        let (expert, slot) = fixtures::seed_expert_with_slot(&store).await;

        let reservation = store.reserve_slot(expert.id, slot.id).await.unwrap().unwrap();
        let booking = reservation
            .commit(fixtures::new_booking(&slot, "order_1"))
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(store.slot(slot.id).await.unwrap().is_booked);
        assert!(store.reserve_slot(expert.id, slot.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn slot_of_other_expert_cannot_be_reserved() {
        let store = InMemoryMarketplaceStore::new();
        let (_, slot) = fixtures::seed_expert_with_slot(&store).await;
        let other = store.insert_expert(fixtures::new_expert("Ravi")).await.unwrap();

        assert!(store.reserve_slot(other.id, slot.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_is_compare_and_swap() {
        let store = InMemoryMarketplaceStore::new();
        let (expert, slot) = fixtures::seed_expert_with_slot(&store).await;
        let reservation = store.reserve_slot(expert.id, slot.id).await.unwrap().unwrap();
        let mut booking = reservation
            .commit(fixtures::new_booking(&slot, "order_1"))
            .await
            .unwrap();

        booking.status = BookingStatus::Paid;
        assert!(store.update_booking(&booking, BookingStatus::Pending).await.unwrap());
        assert!(!store.update_booking(&booking, BookingStatus::Pending).await.unwrap());
    }
}
