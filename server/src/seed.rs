//! Sample experts and slots for local development.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use farmlink_core::environment::MarketplaceStore;
use farmlink_core::{MeetingProviderKind, NewExpert, NewSlot};
use tracing::info;

/// Consultation start times, UTC (10:00, 14:00 and 17:30 IST).
const SLOT_TIMES: [(u32, u32); 3] = [(4, 30), (8, 30), (12, 0)];

const SLOT_MINUTES: i64 = 45;

fn sample_experts() -> Vec<NewExpert> {
    vec![
        NewExpert {
            name: "Dr. Meera Iyer".to_string(),
            specialty: Some("Soil health and nutrient management".to_string()),
            email: "meera.iyer@experts.farmlink.example".to_string(),
            meeting_provider: MeetingProviderKind::Zoom,
        },
        NewExpert {
            name: "Rajesh Patil".to_string(),
            specialty: Some("Integrated pest management for cotton".to_string()),
            email: "rajesh.patil@experts.farmlink.example".to_string(),
            meeting_provider: MeetingProviderKind::Google,
        },
        NewExpert {
            name: "Lakshmi Reddy".to_string(),
            specialty: Some("Drip irrigation and water budgeting".to_string()),
            email: "lakshmi.reddy@experts.farmlink.example".to_string(),
            meeting_provider: MeetingProviderKind::Zoom,
        },
    ]
}

/// Slots for the `days` days following `now`.
fn slot_starts(now: DateTime<Utc>, days: u32) -> Result<Vec<DateTime<Utc>>> {
    let mut starts = Vec::new();
    for day in 1..=i64::from(days) {
        let date = (now + Duration::days(day)).date_naive();
        for (hour, minute) in SLOT_TIMES {
            let time = NaiveTime::from_hms_opt(hour, minute, 0)
                .with_context(|| format!("invalid slot time {hour}:{minute}"))?;
            starts.push(date.and_time(time).and_utc());
        }
    }
    Ok(starts)
}

/// Insert the sample experts, each with open slots for the next `days` days.
///
/// Running it twice adds a second set; the store has no natural key for experts.
///
/// # Errors
///
/// Returns an error if any insert fails.
pub async fn seed(store: &dyn MarketplaceStore, days: u32) -> Result<()> {
    let starts = slot_starts(Utc::now(), days)?;

    for new_expert in sample_experts() {
        let expert = store
            .insert_expert(new_expert)
            .await
            .context("failed to insert expert")?;

        for start in &starts {
            store
                .insert_slot(NewSlot {
                    expert_id: expert.id,
                    start_utc: *start,
                    end_utc: *start + Duration::minutes(SLOT_MINUTES),
                })
                .await
                .with_context(|| format!("failed to insert slot for expert {}", expert.id))?;
        }

        info!(
            expert_id = %expert.id,
            name = %expert.name,
            slots = starts.len(),
            "Seeded expert"
        );
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use farmlink_core::SlotWindow;
    use farmlink_testing::InMemoryMarketplaceStore;

    #[test]
    fn slots_start_tomorrow_and_never_overlap() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 22, 0, 0).unwrap();

        let starts = slot_starts(now, 2).unwrap();

        assert_eq!(starts.len(), 6);
        assert_eq!(starts[0], Utc.with_ymd_and_hms(2024, 3, 11, 4, 30, 0).unwrap());
        assert!(starts.iter().all(|s| *s > now));
        for pair in starts.windows(2) {
            assert!(pair[0] + Duration::minutes(SLOT_MINUTES) <= pair[1]);
        }
    }

    #[tokio::test]
    async fn seeds_every_expert_with_open_slots() {
        let store = InMemoryMarketplaceStore::new();

        seed(&store, 2).await.unwrap();

        let experts = store.list_experts().await.unwrap();
        assert_eq!(experts.len(), 3);
        for expert in experts {
            let slots = store.list_open_slots(expert.id, SlotWindow::unbounded()).await.unwrap();
            assert_eq!(slots.len(), 6);
        }
    }

    #[test]
    fn zero_days_seeds_no_slots() {
        assert!(slot_starts(Utc::now(), 0).unwrap().is_empty());
    }
}
