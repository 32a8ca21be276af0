//! Canonical test data.
//!
//! The reference slot is `[2024-01-01T10:00Z, 10:30Z)`.

#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use farmlink_core::environment::MarketplaceStore;
use farmlink_core::{
    AvailabilitySlot, Expert, MeetingProviderKind, NewBooking, NewExpert, NewSlot,
};

/// Start of the reference slot.
#[must_use]
pub fn slot_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
}

/// An expert preferring Zoom.
#[must_use]
pub fn new_expert(name: &str) -> NewExpert {
    NewExpert {
        name: name.to_string(),
        specialty: Some("Soil health".to_string()),
        email: format!("{}@experts.farmlink.test", name.to_lowercase()),
        meeting_provider: MeetingProviderKind::Zoom,
    }
}

/// Insert an expert with one 30-minute slot starting at [`slot_start`].
pub async fn seed_expert_with_slot<S>(store: &S) -> (Expert, AvailabilitySlot)
where
    S: MarketplaceStore + ?Sized,
{
    let expert = store.insert_expert(new_expert("Meera")).await.unwrap();
    let slot = store
        .insert_slot(NewSlot {
            expert_id: expert.id,
            start_utc: slot_start(),
            end_utc: slot_start() + Duration::minutes(30),
        })
        .await
        .unwrap();
    (expert, slot)
}

/// Booking data for `slot` tied to `gateway_order_id`.
#[must_use]
pub fn new_booking(slot: &AvailabilitySlot, gateway_order_id: &str) -> NewBooking {
    NewBooking {
        expert_id: slot.expert_id,
        farmer_name: "Asha".to_string(),
        farmer_email: "a@x.com".to_string(),
        slot_start_utc: slot.start_utc,
        slot_end_utc: slot.end_utc,
        gateway_order_id: gateway_order_id.to_string(),
        created_at: crate::test_clock().time(),
        commission_code: None,
    }
}

/// A `payment.captured` webhook body in the gateway's format.
#[must_use]
pub fn captured_event(order_id: &str, payment_id: &str) -> String {
    serde_json::json!({
        "entity": "event",
        "event": "payment.captured",
        "payload": {
            "payment": {
                "entity": {
                    "id": payment_id,
                    "order_id": order_id,
                    "status": "captured"
                }
            }
        }
    })
    .to_string()
}
