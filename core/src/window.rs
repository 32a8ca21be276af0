//! Optional time bounds for availability queries.

use crate::error::DomainError;
use crate::types::AvailabilitySlot;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Inclusive time bounds applied to open slots.
///
/// A slot matches when `start_utc >= start` and `end_utc <= end`; either
/// bound may be absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotWindow {
    /// Earliest allowed slot start
    pub start: Option<DateTime<Utc>>,
    /// Latest allowed slot end
    pub end: Option<DateTime<Utc>>,
}

impl SlotWindow {
    /// Window with no bounds.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Parse optional ISO-8601 bounds from query parameters.
    ///
    /// Empty strings are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] naming the offending parameter when
    /// a bound cannot be parsed.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, DomainError> {
        Ok(Self {
            start: parse_bound("start", start)?,
            end: parse_bound("end", end)?,
        })
    }

    /// Whether `slot` lies within the window.
    #[must_use]
    pub fn contains(&self, slot: &AvailabilitySlot) -> bool {
        self.start.is_none_or(|start| slot.start_utc >= start)
            && self.end.is_none_or(|end| slot.end_utc <= end)
    }
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, DomainError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    parse_timestamp(raw)
        .map(Some)
        .ok_or_else(|| DomainError::Validation(format!("invalid {name} timestamp: {raw}")))
}

/// Accepts RFC 3339 with an offset, naive date-times (taken as UTC) and bare
/// dates (midnight UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
