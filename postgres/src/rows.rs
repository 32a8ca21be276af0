//! Row to domain mapping.

use chrono::{DateTime, Utc};
use farmlink_core::{
    AvailabilitySlot, Booking, BookingId, BookingStatus, Expert, ExpertId, MeetingProviderKind,
    QrScan, ScanId, ScanResult, SlotId, StoreError,
};
use sqlx::Row;
use sqlx::postgres::PgRow;

pub(crate) const EXPERT_COLUMNS: &str = "id, name, specialty, email, meeting_provider";

pub(crate) const SLOT_COLUMNS: &str = "id, expert_id, start_utc, end_utc, is_booked";

pub(crate) const BOOKING_COLUMNS: &str = "id, expert_id, farmer_name, farmer_email, \
     slot_start_utc, slot_end_utc, status, gateway_order_id, gateway_payment_id, \
     meeting_link, created_at, commission_code";

pub(crate) const SCAN_COLUMNS: &str =
    "id, content, sha256, result, farmer_name, farmer_email, lat, lon, created_at";

fn corrupt(table: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{table}: {e}"))
}

pub(crate) fn expert(row: &PgRow) -> Result<Expert, StoreError> {
    let provider: String = row.try_get("meeting_provider").map_err(|e| corrupt("expert", e))?;
    Ok(Expert {
        id: ExpertId::new(row.try_get("id").map_err(|e| corrupt("expert", e))?),
        name: row.try_get("name").map_err(|e| corrupt("expert", e))?,
        specialty: row.try_get("specialty").map_err(|e| corrupt("expert", e))?,
        email: row.try_get("email").map_err(|e| corrupt("expert", e))?,
        meeting_provider: provider
            .parse::<MeetingProviderKind>()
            .map_err(|e| corrupt("expert", e))?,
    })
}

pub(crate) fn slot(row: &PgRow) -> Result<AvailabilitySlot, StoreError> {
    Ok(AvailabilitySlot {
        id: SlotId::new(row.try_get("id").map_err(|e| corrupt("availability", e))?),
        expert_id: ExpertId::new(
            row.try_get("expert_id")
                .map_err(|e| corrupt("availability", e))?,
        ),
        start_utc: row.try_get("start_utc").map_err(|e| corrupt("availability", e))?,
        end_utc: row.try_get("end_utc").map_err(|e| corrupt("availability", e))?,
        is_booked: row.try_get("is_booked").map_err(|e| corrupt("availability", e))?,
    })
}

pub(crate) fn booking(row: &PgRow) -> Result<Booking, StoreError> {
    let status: String = row.try_get("status").map_err(|e| corrupt("booking", e))?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(|e| corrupt("booking", e))?;
    Ok(Booking {
        id: BookingId::new(row.try_get("id").map_err(|e| corrupt("booking", e))?),
        expert_id: ExpertId::new(row.try_get("expert_id").map_err(|e| corrupt("booking", e))?),
        farmer_name: row.try_get("farmer_name").map_err(|e| corrupt("booking", e))?,
        farmer_email: row.try_get("farmer_email").map_err(|e| corrupt("booking", e))?,
        slot_start_utc: row.try_get("slot_start_utc").map_err(|e| corrupt("booking", e))?,
        slot_end_utc: row.try_get("slot_end_utc").map_err(|e| corrupt("booking", e))?,
        status: status.parse::<BookingStatus>().map_err(|e| corrupt("booking", e))?,
        gateway_order_id: row.try_get("gateway_order_id").map_err(|e| corrupt("booking", e))?,
        gateway_payment_id: row
            .try_get("gateway_payment_id")
            .map_err(|e| corrupt("booking", e))?,
        meeting_link: row.try_get("meeting_link").map_err(|e| corrupt("booking", e))?,
        created_at,
        commission_code: row.try_get("commission_code").map_err(|e| corrupt("booking", e))?,
    })
}

pub(crate) fn scan(row: &PgRow) -> Result<QrScan, StoreError> {
    let result: String = row.try_get("result").map_err(|e| corrupt("qr_scan", e))?;
    Ok(QrScan {
        id: ScanId::new(row.try_get("id").map_err(|e| corrupt("qr_scan", e))?),
        content: row.try_get("content").map_err(|e| corrupt("qr_scan", e))?,
        sha256: row.try_get("sha256").map_err(|e| corrupt("qr_scan", e))?,
        result: result.parse::<ScanResult>().map_err(|e| corrupt("qr_scan", e))?,
        farmer_name: row.try_get("farmer_name").map_err(|e| corrupt("qr_scan", e))?,
        farmer_email: row.try_get("farmer_email").map_err(|e| corrupt("qr_scan", e))?,
        lat: row.try_get("lat").map_err(|e| corrupt("qr_scan", e))?,
        lon: row.try_get("lon").map_err(|e| corrupt("qr_scan", e))?,
        created_at: row.try_get("created_at").map_err(|e| corrupt("qr_scan", e))?,
    })
}
