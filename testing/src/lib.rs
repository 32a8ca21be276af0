//! # FarmLink Testing
//!
//! Testing utilities for the FarmLink marketplace.
//!
//! This crate provides:
//! - An in-memory implementation of the store port
//! - Test doubles for the payment gateway, notifier, meeting and weather providers
//! - A fixed clock and canonical fixtures
//!
//! ## Example
//!
//! ```ignore
//! use farmlink_testing::{InMemoryMarketplaceStore, fixtures};
//!
//! #[tokio::test]
//! async fn books_reference_slot() {
//!     let store = InMemoryMarketplaceStore::new();
//!     let (expert, slot) = fixtures::seed_expert_with_slot(&store).await;
//!     // ...
//! }
//! ```

pub mod doubles;
pub mod fixtures;
pub mod store;

/// Mock implementations of environment traits.
pub mod mocks {
    use chrono::{DateTime, Utc};
    use farmlink_core::environment::Clock;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use farmlink_testing::mocks::FixedClock;
    /// use farmlink_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// The fixed time
        #[must_use]
        pub const fn time(&self) -> DateTime<Utc> {
            self.time
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2023-12-31 12:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2023-12-31T12:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use doubles::{
    MockPaymentGateway, RecordingNotifier, ScriptedMeetingProvider, ScriptedWeatherProvider,
};
pub use mocks::{FixedClock, test_clock};
pub use store::InMemoryMarketplaceStore;
