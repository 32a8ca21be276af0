//! Booking lifecycle state machine.
//!
//! The lifecycle is a pure function `(Booking, BookingAction) → Effects`.
//! It updates the booking in place and describes what the imperative shell
//! must do next; it never performs I/O itself.
//!
//! ```text
//!   Pending ──PaymentCaptured──▶ Paid ──MeetingScheduled──▶ Confirmed
//! ```
//!
//! No transition skips a state and no transition reverses. Cancellation and
//! refunds are not modelled.

use crate::types::{Booking, BookingId, BookingStatus};
use smallvec::{SmallVec, smallvec};
use thiserror::Error;

/// Inputs that drive a booking forward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookingAction {
    /// The gateway reported funds captured for the booking's order.
    PaymentCaptured {
        /// Gateway payment id
        payment_id: String,
    },
    /// A meeting link was issued for the consultation.
    MeetingScheduled {
        /// Join URL
        link: String,
    },
}

impl BookingAction {
    /// Status the booking must be in for this action to apply.
    #[must_use]
    pub const fn required_status(&self) -> BookingStatus {
        match self {
            Self::PaymentCaptured { .. } => BookingStatus::Pending,
            Self::MeetingScheduled { .. } => BookingStatus::Paid,
        }
    }

    /// Status the booking moves to when this action applies.
    #[must_use]
    pub const fn target_status(&self) -> BookingStatus {
        match self {
            Self::PaymentCaptured { .. } => BookingStatus::Paid,
            Self::MeetingScheduled { .. } => BookingStatus::Confirmed,
        }
    }
}

/// Follow-up work produced by a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookingEffect {
    /// Hand the booking to the confirmation pipeline.
    DispatchConfirmation(BookingId),
    /// Email both participants the meeting details.
    NotifyParticipants(BookingId),
}

/// A transition that the lifecycle refuses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The booking is not in the status the action requires.
    #[error("cannot apply {action} to booking in {actual} state (expected {expected})")]
    WrongState {
        /// Action name
        action: &'static str,
        /// Required status
        expected: BookingStatus,
        /// Current status
        actual: BookingStatus,
    },

    /// The action carried an empty identifier or link.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

/// The booking state machine.
#[derive(Clone, Copy, Debug, Default)]
pub struct BookingLifecycle;

impl BookingLifecycle {
    /// Create the lifecycle.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Apply an action to a booking.
    ///
    /// On success the booking is updated in place and the effects to execute
    /// are returned. On failure the booking is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the booking is not in the status the
    /// action requires, or the action payload is empty.
    pub fn apply(
        &self,
        booking: &mut Booking,
        action: BookingAction,
    ) -> Result<SmallVec<[BookingEffect; 2]>, TransitionError> {
        let expected = action.required_status();
        if booking.status != expected {
            return Err(TransitionError::WrongState {
                action: action_name(&action),
                expected,
                actual: booking.status,
            });
        }

        match action {
            BookingAction::PaymentCaptured { payment_id } => {
                if payment_id.trim().is_empty() {
                    return Err(TransitionError::EmptyField("payment id"));
                }
                booking.status = BookingStatus::Paid;
                booking.gateway_payment_id = Some(payment_id);
                Ok(smallvec![BookingEffect::DispatchConfirmation(booking.id)])
            }
            BookingAction::MeetingScheduled { link } => {
                if link.trim().is_empty() {
                    return Err(TransitionError::EmptyField("meeting link"));
                }
                booking.status = BookingStatus::Confirmed;
                booking.meeting_link = Some(link);
                Ok(smallvec![BookingEffect::NotifyParticipants(booking.id)])
            }
        }
    }
}

const fn action_name(action: &BookingAction) -> &'static str {
    match action {
        BookingAction::PaymentCaptured { .. } => "PaymentCaptured",
        BookingAction::MeetingScheduled { .. } => "MeetingScheduled",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ExpertId;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn pending_booking() -> Booking {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        Booking {
            id: BookingId::new(1),
            expert_id: ExpertId::new(1),
            farmer_name: "Asha".to_string(),
            farmer_email: "a@x.com".to_string(),
            slot_start_utc: start,
            slot_end_utc: start + chrono::Duration::minutes(30),
            status: BookingStatus::Pending,
            gateway_order_id: "order_1".to_string(),
            gateway_payment_id: None,
            meeting_link: None,
            created_at: start,
            commission_code: None,
        }
    }

    fn captured() -> BookingAction {
        BookingAction::PaymentCaptured {
            payment_id: "pay_1".to_string(),
        }
    }

    fn scheduled() -> BookingAction {
        BookingAction::MeetingScheduled {
            link: "https://zoom.us/j/1".to_string(),
        }
    }

    #[test]
    fn capture_moves_pending_to_paid() {
        let mut booking = pending_booking();
        let effects = BookingLifecycle::new().apply(&mut booking, captured()).unwrap();

        assert_eq!(booking.status, BookingStatus::Paid);
        assert_eq!(booking.gateway_payment_id.as_deref(), Some("pay_1"));
        assert_eq!(effects.as_slice(), &[BookingEffect::DispatchConfirmation(booking.id)]);
    }

    #[test]
    fn meeting_moves_paid_to_confirmed() {
        let mut booking = pending_booking();
        let lifecycle = BookingLifecycle::new();
        lifecycle.apply(&mut booking, captured()).unwrap();
        let effects = lifecycle.apply(&mut booking, scheduled()).unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.meeting_link.as_deref(), Some("https://zoom.us/j/1"));
        assert_eq!(effects.as_slice(), &[BookingEffect::NotifyParticipants(booking.id)]);
    }

    #[test]
    fn cannot_skip_paid() {
        let mut booking = pending_booking();
        let err = BookingLifecycle::new().apply(&mut booking, scheduled()).unwrap_err();

        assert!(matches!(err, TransitionError::WrongState { actual: BookingStatus::Pending, .. }));
        assert_eq!(booking, pending_booking());
    }

    #[test]
    fn replayed_capture_is_refused() {
        let mut booking = pending_booking();
        let lifecycle = BookingLifecycle::new();
        lifecycle.apply(&mut booking, captured()).unwrap();

        let err = lifecycle
            .apply(
                &mut booking,
                BookingAction::PaymentCaptured {
                    payment_id: "pay_2".to_string(),
                },
            )
            .unwrap_err();

        assert!(matches!(err, TransitionError::WrongState { .. }));
        assert_eq!(booking.gateway_payment_id.as_deref(), Some("pay_1"));
    }

    #[test]
    fn empty_link_is_refused() {
        let mut booking = pending_booking();
        let lifecycle = BookingLifecycle::new();
        lifecycle.apply(&mut booking, captured()).unwrap();

        let err = lifecycle
            .apply(&mut booking, BookingAction::MeetingScheduled { link: "  ".to_string() })
            .unwrap_err();

        assert_eq!(err, TransitionError::EmptyField("meeting link"));
        assert_eq!(booking.status, BookingStatus::Paid);
    }

    fn rank(status: BookingStatus) -> u8 {
        match status {
            BookingStatus::Pending => 0,
            BookingStatus::Paid => 1,
            BookingStatus::Confirmed => 2,
        }
    }

    proptest! {
        #[test]
        fn status_only_ever_advances_one_step(actions in proptest::collection::vec(any::<bool>(), 0..12)) {
            let mut booking = pending_booking();
            let lifecycle = BookingLifecycle::new();

            for capture in actions {
                let before = rank(booking.status);
                let action = if capture { captured() } else { scheduled() };
                let applied = lifecycle.apply(&mut booking, action).is_ok();
                let after = rank(booking.status);

                if applied {
                    prop_assert_eq!(after, before + 1);
                } else {
                    prop_assert_eq!(after, before);
                }
            }
        }
    }
}
