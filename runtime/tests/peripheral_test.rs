//! Availability, advisory and authenticity services.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

mod common;

use chrono::Duration;
use common::Harness;
use farmlink_core::advisory::{ADVICE_RAIN_RISK, HORIZON_BUCKETS};
use farmlink_core::environment::MarketplaceStore;
use farmlink_core::{DomainError, NewSlot, ProviderError, ScanResult, SlotWindow};
use farmlink_runtime::{AdvisoryService, AuthenticityService, AvailabilityService, ScanMetadata};
use farmlink_testing::{ScriptedWeatherProvider, fixtures};
use std::sync::Arc;

#[tokio::test]
async fn open_slots_are_filtered_and_ordered() {
    let harness = Harness::new();
    let (expert, first) = fixtures::seed_expert_with_slot(&harness.store).await;
    let later = harness
        .store
        .insert_slot(NewSlot {
            expert_id: expert.id,
            start_utc: fixtures::slot_start() + Duration::hours(2),
            end_utc: fixtures::slot_start() + Duration::hours(3),
        })
        .await
        .unwrap();
    let earlier = harness
        .store
        .insert_slot(NewSlot {
            expert_id: expert.id,
            start_utc: fixtures::slot_start() - Duration::hours(2),
            end_utc: fixtures::slot_start() - Duration::hours(1),
        })
        .await
        .unwrap();
    let reservation = harness.store.reserve_slot(expert.id, first.id).await.unwrap().unwrap();
    reservation.commit(fixtures::new_booking(&first, "order_x")).await.unwrap();

    let service = AvailabilityService::new(Arc::clone(&harness.ctx));
    let all = service.list_open_slots(expert.id, SlotWindow::unbounded()).await.unwrap();
    let ids: Vec<_> = all.iter().map(|slot| slot.id).collect();
    assert_eq!(ids, vec![earlier.id, later.id]);

    let window = SlotWindow::parse(Some("2024-01-01T10:00:00Z"), None).unwrap();
    let bounded = service.list_open_slots(expert.id, window).await.unwrap();
    assert_eq!(bounded.len(), 1);
    assert_eq!(bounded[0].id, later.id);
}

#[tokio::test]
async fn wet_forecast_advises_against_spraying() {
    let mut pops = vec![0.1, 0.6, 0.2];
    pops.resize(HORIZON_BUCKETS, 0.05);
    let harness = Harness::with_weather(ScriptedWeatherProvider::with_pops(&pops));
    let service = AdvisoryService::new(Arc::clone(&harness.ctx));

    let advisory = service.get_advice(12.97, 77.59).await.unwrap();

    assert!((advisory.assessment.rounded_max_pop() - 0.6).abs() < 1e-9);
    assert!(advisory.assessment.rain_risk);
    assert_eq!(advisory.assessment.advice(), ADVICE_RAIN_RISK);
    assert!((advisory.threshold - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn provider_failure_is_surfaced_not_defaulted() {
    let harness = Harness::with_weather(ScriptedWeatherProvider::failing(ProviderError::NotConfigured(
        "OPENWEATHER_API_KEY".to_string(),
    )));
    let service = AdvisoryService::new(Arc::clone(&harness.ctx));

    let err = service.get_advice(12.97, 77.59).await.unwrap_err();

    assert!(matches!(err, DomainError::Provider(ProviderError::NotConfigured(_))));
}

#[tokio::test]
async fn out_of_range_coordinates_are_rejected() {
    let harness = Harness::new();
    let service = AdvisoryService::new(Arc::clone(&harness.ctx));

    let err = service.get_advice(123.0, 0.0).await.unwrap_err();

    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn scans_are_deterministic_and_recorded() {
    let harness = Harness::new();
    let service = AuthenticityService::new(Arc::clone(&harness.ctx));
    let metadata = ScanMetadata {
        farmer_name: Some("Asha".to_string()),
        lat: Some(12.9),
        ..ScanMetadata::default()
    };

    let first = service.verify("BATCH-2024-0001".to_string(), metadata.clone()).await.unwrap();
    let second = service.verify("BATCH-2024-0001".to_string(), metadata).await.unwrap();

    assert_eq!(first.sha256, second.sha256);
    assert_eq!(first.result, second.result);
    assert_eq!(first.sha256.len(), 64);
    assert_ne!(first.id, second.id);
    assert_eq!(harness.store.scans().await.len(), 2);
    assert_eq!(first.farmer_name.as_deref(), Some("Asha"));
}

#[tokio::test]
async fn classification_follows_last_nibble() {
    let harness = Harness::new();
    let service = AuthenticityService::new(Arc::clone(&harness.ctx));

    // sha256("abc") ends in 'd'
    let scan = service.verify("abc".to_string(), ScanMetadata::default()).await.unwrap();
    assert!(scan.sha256.ends_with('d'));
    assert_eq!(scan.result, ScanResult::Warning);
}

#[tokio::test]
async fn empty_content_is_rejected() {
    let harness = Harness::new();
    let service = AuthenticityService::new(Arc::clone(&harness.ctx));

    let err = service.verify(String::new(), ScanMetadata::default()).await.unwrap_err();

    assert!(matches!(err, DomainError::Validation(_)));
    assert!(harness.store.scans().await.is_empty());
}
