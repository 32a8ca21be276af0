//! Request and response bodies.
//!
//! Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use farmlink_core::{AvailabilitySlot, BookingId, Expert, ExpertId, ScanId, SlotId};
use farmlink_runtime::{Advisory, BookingReceipt, CreateBooking};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `GET /experts` item.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpertSummary {
    /// Expert id
    pub id: ExpertId,
    /// Display name
    pub name: String,
    /// Area of expertise
    pub specialty: Option<String>,
}

impl From<Expert> for ExpertSummary {
    fn from(expert: Expert) -> Self {
        Self {
            id: expert.id,
            name: expert.name,
            specialty: expert.specialty,
        }
    }
}

/// `GET /experts/{id}/availability` query.
#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityQuery {
    /// Earliest slot start (ISO-8601)
    pub start: Option<String>,
    /// Latest slot end (ISO-8601)
    pub end: Option<String>,
}

/// `GET /experts/{id}/availability` item.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotView {
    /// Slot id
    pub id: SlotId,
    /// Slot start
    pub start: DateTime<Utc>,
    /// Slot end
    pub end: DateTime<Utc>,
}

impl From<AvailabilitySlot> for SlotView {
    fn from(slot: AvailabilitySlot) -> Self {
        Self {
            id: slot.id,
            start: slot.start_utc,
            end: slot.end_utc,
        }
    }
}

/// `POST /bookings` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    /// Expert to book
    pub expert_id: ExpertId,
    /// Slot to book
    pub slot_id: SlotId,
    /// Farmer display name
    pub farmer_name: String,
    /// Farmer contact email
    pub farmer_email: String,
    /// Price in rupees
    pub amount_inr: Decimal,
    /// Optional referral code
    #[serde(default)]
    pub commission_code: Option<String>,
}

impl From<BookingRequest> for CreateBooking {
    fn from(req: BookingRequest) -> Self {
        Self {
            expert_id: req.expert_id,
            slot_id: req.slot_id,
            farmer_name: req.farmer_name,
            farmer_email: req.farmer_email,
            amount: req.amount_inr,
            commission_code: req.commission_code,
        }
    }
}

/// `POST /bookings` response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    /// New booking id
    pub booking_id: BookingId,
    /// Gateway order the client pays against
    pub gateway_order_id: String,
    /// Amount in paise
    pub amount: i64,
}

impl From<BookingReceipt> for BookingResponse {
    fn from(receipt: BookingReceipt) -> Self {
        Self {
            booking_id: receipt.booking_id,
            gateway_order_id: receipt.gateway_order_id,
            amount: receipt.amount.get(),
        }
    }
}

/// `GET /weather/advice` query.
#[derive(Debug, Deserialize)]
pub struct AdviceQuery {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

/// `GET /weather/advice` response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdviceResponse {
    /// Echoed latitude
    pub lat: f64,
    /// Echoed longitude
    pub lon: f64,
    /// Highest precipitation probability in the horizon, 2 decimals
    pub max_pop: f64,
    /// Whether `max_pop` exceeds the threshold
    pub rain_risk: bool,
    /// Advice text
    pub advice: String,
    /// Forecast source tag
    pub source: String,
    /// Rain risk threshold
    pub threshold: f64,
}

impl From<Advisory> for AdviceResponse {
    fn from(advisory: Advisory) -> Self {
        Self {
            lat: advisory.lat,
            lon: advisory.lon,
            max_pop: advisory.assessment.rounded_max_pop(),
            rain_risk: advisory.assessment.rain_risk,
            advice: advisory.assessment.advice().to_string(),
            source: farmlink_core::advisory::FORECAST_SOURCE.to_string(),
            threshold: advisory.threshold,
        }
    }
}

/// `POST /qr/verify` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// Scanned payload
    #[serde(default)]
    pub content: Option<String>,
    /// Farmer name
    #[serde(default)]
    pub farmer_name: Option<String>,
    /// Farmer email
    #[serde(default)]
    pub farmer_email: Option<String>,
    /// Scan latitude
    #[serde(default)]
    pub lat: Option<f64>,
    /// Scan longitude
    #[serde(default)]
    pub lon: Option<f64>,
}

/// `POST /qr/verify` response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// Human-readable classification
    pub result: String,
    /// Hex SHA-256 of the content
    pub sha256: String,
    /// Id of the recorded scan
    pub stored_id: ScanId,
}

/// `GET /health` response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// `ok` or `unavailable`
    pub status: String,
    /// Crate version
    pub version: String,
}
