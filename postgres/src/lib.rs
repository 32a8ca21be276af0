//! `PostgreSQL` marketplace store for FarmLink.
//!
//! Implements [`MarketplaceStore`](farmlink_core::environment::MarketplaceStore)
//! on a sqlx connection pool. Slot reservations are row locks
//! (`SELECT ... FOR UPDATE`) held by an open transaction, so concurrent
//! bookings of the same slot serialise in the database rather than in the
//! process.
//!
//! # Example
//!
//! ```no_run
//! use farmlink_postgres::PostgresMarketplaceStore;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresMarketplaceStore::connect(
//!     "postgres://localhost/farmlink",
//!     10,
//!     Duration::from_secs(30),
//! )
//! .await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod rows;
mod store;

pub use store::PostgresMarketplaceStore;
