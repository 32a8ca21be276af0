//! Domain types for the FarmLink marketplace.
//!
//! Entities mirror the persisted rows: [`Expert`], [`AvailabilitySlot`],
//! [`Booking`] and [`QrScan`]. Identifiers are store-assigned integers wrapped
//! in newtypes so they cannot be mixed up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw store identifier.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the raw store identifier.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for an expert
    ExpertId
);
entity_id!(
    /// Unique identifier for an availability slot
    SlotId
);
entity_id!(
    /// Unique identifier for a booking
    BookingId
);
entity_id!(
    /// Unique identifier for a recorded QR scan
    ScanId
);

// ============================================================================
// Expert
// ============================================================================

/// Video-conferencing provider an expert prefers for consultations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingProviderKind {
    /// Zoom meetings
    #[default]
    Zoom,
    /// Google Meet (via Google Calendar)
    Google,
}

impl MeetingProviderKind {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Zoom => "zoom",
            Self::Google => "google",
        }
    }
}

impl FromStr for MeetingProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zoom" => Ok(Self::Zoom),
            "google" => Ok(Self::Google),
            other => Err(format!("unknown meeting provider: {other}")),
        }
    }
}

impl fmt::Display for MeetingProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An agronomy expert farmers can book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expert {
    /// Expert identifier
    pub id: ExpertId,
    /// Display name
    pub name: String,
    /// Area of expertise (crop, soil, pest management, ...)
    pub specialty: Option<String>,
    /// Contact email for booking notifications
    pub email: String,
    /// Preferred meeting provider
    pub meeting_provider: MeetingProviderKind,
}

/// Data required to register an expert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpert {
    /// Display name
    pub name: String,
    /// Area of expertise
    pub specialty: Option<String>,
    /// Contact email
    pub email: String,
    /// Preferred meeting provider
    #[serde(default)]
    pub meeting_provider: MeetingProviderKind,
}

// ============================================================================
// Availability
// ============================================================================

/// A bookable interval on an expert's calendar.
///
/// `is_booked` flips `false → true` exactly once, in the same transaction
/// that records the booking referencing this slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    /// Slot identifier
    pub id: SlotId,
    /// Owning expert
    pub expert_id: ExpertId,
    /// Start of the interval (UTC, inclusive)
    pub start_utc: DateTime<Utc>,
    /// End of the interval (UTC, exclusive)
    pub end_utc: DateTime<Utc>,
    /// Whether a booking already holds this slot
    pub is_booked: bool,
}

/// Data required to publish a slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSlot {
    /// Owning expert
    pub expert_id: ExpertId,
    /// Start of the interval
    pub start_utc: DateTime<Utc>,
    /// End of the interval
    pub end_utc: DateTime<Utc>,
}

impl NewSlot {
    /// Check the interval is well-formed (`start < end`).
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the interval is empty or inverted.
    pub fn validate(&self) -> Result<(), String> {
        if self.start_utc < self.end_utc {
            Ok(())
        } else {
            Err(format!(
                "slot start {} must be before end {}",
                self.start_utc, self.end_utc
            ))
        }
    }
}

// ============================================================================
// Booking
// ============================================================================

/// Booking status.
///
/// Moves strictly forward: `Pending → Paid → Confirmed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Slot reserved, gateway order created, awaiting payment capture
    Pending,
    /// Payment captured, awaiting meeting link
    Paid,
    /// Meeting link issued and participants notified
    Confirmed,
}

impl BookingStatus {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Confirmed => "confirmed",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "confirmed" => Ok(Self::Confirmed),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A farmer's paid consultation with an expert.
///
/// Slot times are copied at booking time, so later changes to the slot row
/// never alter an existing booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking identifier
    pub id: BookingId,
    /// Booked expert
    pub expert_id: ExpertId,
    /// Farmer display name
    pub farmer_name: String,
    /// Farmer contact email
    pub farmer_email: String,
    /// Snapshot of the slot start
    pub slot_start_utc: DateTime<Utc>,
    /// Snapshot of the slot end
    pub slot_end_utc: DateTime<Utc>,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Payment gateway order id
    pub gateway_order_id: String,
    /// Payment gateway payment id (set on capture)
    pub gateway_payment_id: Option<String>,
    /// Meeting link (set on confirmation)
    pub meeting_link: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Opaque commission/referral code passed through from the client
    pub commission_code: Option<String>,
}

/// Data persisted when a slot reservation is committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewBooking {
    /// Booked expert
    pub expert_id: ExpertId,
    /// Farmer display name
    pub farmer_name: String,
    /// Farmer contact email
    pub farmer_email: String,
    /// Snapshot of the slot start
    pub slot_start_utc: DateTime<Utc>,
    /// Snapshot of the slot end
    pub slot_end_utc: DateTime<Utc>,
    /// Payment gateway order id
    pub gateway_order_id: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Opaque commission code
    pub commission_code: Option<String>,
}

// ============================================================================
// QR scans
// ============================================================================

/// Outcome of an authenticity check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanResult {
    /// Product looks genuine
    Genuine,
    /// Product may be counterfeit
    Warning,
}

impl ScanResult {
    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Genuine => "genuine",
            Self::Warning => "warning",
        }
    }

    /// Message shown to the farmer.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Genuine => "Genuine Product",
            Self::Warning => "Warning: Possible Fake",
        }
    }
}

impl FromStr for ScanResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "genuine" => Ok(Self::Genuine),
            "warning" => Ok(Self::Warning),
            other => Err(format!("unknown scan result: {other}")),
        }
    }
}

/// A recorded product verification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QrScan {
    /// Scan identifier
    pub id: ScanId,
    /// Raw scanned content
    pub content: String,
    /// Lower-case hex SHA-256 of `content`
    pub sha256: String,
    /// Classification result
    pub result: ScanResult,
    /// Farmer name, if supplied
    pub farmer_name: Option<String>,
    /// Farmer email, if supplied
    pub farmer_email: Option<String>,
    /// Scan latitude, if supplied
    pub lat: Option<f64>,
    /// Scan longitude, if supplied
    pub lon: Option<f64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Data persisted for a new scan.
#[derive(Clone, Debug, PartialEq)]
pub struct NewQrScan {
    /// Raw scanned content
    pub content: String,
    /// Lower-case hex SHA-256 of `content`
    pub sha256: String,
    /// Classification result
    pub result: ScanResult,
    /// Farmer name, if supplied
    pub farmer_name: Option<String>,
    /// Farmer email, if supplied
    pub farmer_email: Option<String>,
    /// Scan latitude, if supplied
    pub lat: Option<f64>,
    /// Scan longitude, if supplied
    pub lon: Option<f64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
