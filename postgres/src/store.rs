//! [`MarketplaceStore`] backed by a `PostgreSQL` pool.

use crate::rows::{self, BOOKING_COLUMNS, EXPERT_COLUMNS, SCAN_COLUMNS, SLOT_COLUMNS};
use farmlink_core::environment::{BoxFuture, MarketplaceStore, SlotReservation};
use farmlink_core::{
    AvailabilitySlot, Booking, BookingId, BookingStatus, Expert, ExpertId, NewBooking, NewExpert,
    NewQrScan, NewSlot, QrScan, SlotId, SlotWindow, StoreError,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;

/// Map a sqlx failure, recording it against `operation`.
///
/// Unique and foreign-key violations become [`StoreError::Constraint`];
/// everything else is a [`StoreError::Database`].
fn store_error(operation: &'static str, e: sqlx::Error) -> StoreError {
    metrics::counter!("farmlink_store_errors_total", "operation" => operation).increment(1);
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() || db_err.is_foreign_key_violation() || db_err.is_check_violation() {
            return StoreError::Constraint(format!("{operation}: {db_err}"));
        }
    }
    tracing::warn!(operation, error = %e, "Database operation failed");
    StoreError::Database(format!("{operation}: {e}"))
}

/// `PostgreSQL` implementation of [`MarketplaceStore`].
///
/// Cloning is cheap: clones share the connection pool.
#[derive(Clone, Debug)]
pub struct PostgresMarketplaceStore {
    pool: PgPool,
}

impl PostgresMarketplaceStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool of at most `max_connections` against `database_url`,
    /// waiting up to `connect_timeout` for each connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database is unreachable.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(format!("connect failed: {e}")))?;
        Ok(Self::new(pool))
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl MarketplaceStore for PostgresMarketplaceStore {
    fn list_experts(&self) -> BoxFuture<'_, Result<Vec<Expert>, StoreError>> {
        Box::pin(async move {
            let sql = format!("SELECT {EXPERT_COLUMNS} FROM expert ORDER BY id");
            let rows = sqlx::query(&sql)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| store_error("list_experts", e))?;
            rows.iter().map(rows::expert).collect()
        })
    }

    fn get_expert(&self, id: ExpertId) -> BoxFuture<'_, Result<Option<Expert>, StoreError>> {
        Box::pin(async move {
            let sql = format!("SELECT {EXPERT_COLUMNS} FROM expert WHERE id = $1");
            let row = sqlx::query(&sql)
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| store_error("get_expert", e))?;
            row.as_ref().map(rows::expert).transpose()
        })
    }

    fn list_open_slots(
        &self,
        expert_id: ExpertId,
        window: SlotWindow,
    ) -> BoxFuture<'_, Result<Vec<AvailabilitySlot>, StoreError>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {SLOT_COLUMNS} FROM availability \
                 WHERE expert_id = $1 AND NOT is_booked \
                   AND ($2::timestamptz IS NULL OR start_utc >= $2) \
                   AND ($3::timestamptz IS NULL OR end_utc <= $3) \
                 ORDER BY start_utc, id"
            );
            let rows = sqlx::query(&sql)
                .bind(expert_id.get())
                .bind(window.start)
                .bind(window.end)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| store_error("list_open_slots", e))?;
            rows.iter().map(rows::slot).collect()
        })
    }

    fn reserve_slot(
        &self,
        expert_id: ExpertId,
        slot_id: SlotId,
    ) -> BoxFuture<'_, Result<Option<Box<dyn SlotReservation>>, StoreError>> {
        Box::pin(async move {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| store_error("reserve_slot", e))?;

            // Blocks behind any other holder; re-reads the row once it commits.
            let sql = format!("SELECT {SLOT_COLUMNS} FROM availability WHERE id = $1 FOR UPDATE");
            let row = sqlx::query(&sql)
                .bind(slot_id.get())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| store_error("reserve_slot", e))?;

            let slot = match row.as_ref().map(rows::slot).transpose()? {
                Some(slot) if slot.expert_id == expert_id && !slot.is_booked => slot,
                _ => {
                    tx.rollback()
                        .await
                        .map_err(|e| store_error("reserve_slot", e))?;
                    return Ok(None);
                }
            };

            tracing::debug!(slot_id = %slot.id, "Slot row locked");
            let reservation: Box<dyn SlotReservation> = Box::new(PgSlotReservation { tx, slot });
            Ok(Some(reservation))
        })
    }

    fn find_booking(&self, id: BookingId) -> BoxFuture<'_, Result<Option<Booking>, StoreError>> {
        Box::pin(async move {
            let sql = format!("SELECT {BOOKING_COLUMNS} FROM booking WHERE id = $1");
            let row = sqlx::query(&sql)
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| store_error("find_booking", e))?;
            row.as_ref().map(rows::booking).transpose()
        })
    }

    fn find_booking_by_order<'a>(
        &'a self,
        gateway_order_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Booking>, StoreError>> {
        Box::pin(async move {
            let sql = format!("SELECT {BOOKING_COLUMNS} FROM booking WHERE gateway_order_id = $1");
            let row = sqlx::query(&sql)
                .bind(gateway_order_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| store_error("find_booking_by_order", e))?;
            row.as_ref().map(rows::booking).transpose()
        })
    }

    fn update_booking<'a>(
        &'a self,
        booking: &'a Booking,
        expected: BookingStatus,
    ) -> BoxFuture<'a, Result<bool, StoreError>> {
        Box::pin(async move {
            let result = sqlx::query(
                r"
                UPDATE booking
                SET status = $1, gateway_payment_id = $2, meeting_link = $3
                WHERE id = $4 AND status = $5
                ",
            )
            .bind(booking.status.as_str())
            .bind(booking.gateway_payment_id.as_deref())
            .bind(booking.meeting_link.as_deref())
            .bind(booking.id.get())
            .bind(expected.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("update_booking", e))?;
            Ok(result.rows_affected() == 1)
        })
    }

    fn list_bookings_with_status(
        &self,
        status: BookingStatus,
    ) -> BoxFuture<'_, Result<Vec<Booking>, StoreError>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {BOOKING_COLUMNS} FROM booking WHERE status = $1 ORDER BY created_at, id"
            );
            let rows = sqlx::query(&sql)
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| store_error("list_bookings_with_status", e))?;
            rows.iter().map(rows::booking).collect()
        })
    }

    fn insert_expert(&self, expert: NewExpert) -> BoxFuture<'_, Result<Expert, StoreError>> {
        Box::pin(async move {
            let sql = format!(
                "INSERT INTO expert (name, specialty, email, meeting_provider) \
                 VALUES ($1, $2, $3, $4) RETURNING {EXPERT_COLUMNS}"
            );
            let row = sqlx::query(&sql)
                .bind(&expert.name)
                .bind(expert.specialty.as_deref())
                .bind(&expert.email)
                .bind(expert.meeting_provider.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| store_error("insert_expert", e))?;
            rows::expert(&row)
        })
    }

    fn insert_slot(&self, slot: NewSlot) -> BoxFuture<'_, Result<AvailabilitySlot, StoreError>> {
        Box::pin(async move {
            slot.validate().map_err(StoreError::Constraint)?;
            let sql = format!(
                "INSERT INTO availability (expert_id, start_utc, end_utc) \
                 VALUES ($1, $2, $3) RETURNING {SLOT_COLUMNS}"
            );
            let row = sqlx::query(&sql)
                .bind(slot.expert_id.get())
                .bind(slot.start_utc)
                .bind(slot.end_utc)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| store_error("insert_slot", e))?;
            rows::slot(&row)
        })
    }

    fn insert_scan(&self, scan: NewQrScan) -> BoxFuture<'_, Result<QrScan, StoreError>> {
        Box::pin(async move {
            let sql = format!(
                "INSERT INTO qr_scan \
                     (content, sha256, result, farmer_name, farmer_email, lat, lon, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {SCAN_COLUMNS}"
            );
            let row = sqlx::query(&sql)
                .bind(&scan.content)
                .bind(&scan.sha256)
                .bind(scan.result.as_str())
                .bind(scan.farmer_name.as_deref())
                .bind(scan.farmer_email.as_deref())
                .bind(scan.lat)
                .bind(scan.lon)
                .bind(scan.created_at)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| store_error("insert_scan", e))?;
            rows::scan(&row)
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(|e| store_error("ping", e))?;
            Ok(())
        })
    }
}

/// Row lock on an availability slot, held by an open transaction.
///
/// Dropping it returns the connection to the pool, which rolls the
/// transaction back and releases the lock.
struct PgSlotReservation {
    tx: Transaction<'static, Postgres>,
    slot: AvailabilitySlot,
}

impl SlotReservation for PgSlotReservation {
    fn slot(&self) -> &AvailabilitySlot {
        &self.slot
    }

    fn commit(self: Box<Self>, booking: NewBooking) -> BoxFuture<'static, Result<Booking, StoreError>> {
        let Self { mut tx, slot } = *self;
        Box::pin(async move {
            let sql = format!(
                "INSERT INTO booking \
                     (expert_id, farmer_name, farmer_email, slot_start_utc, slot_end_utc, \
                      status, gateway_order_id, created_at, commission_code) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {BOOKING_COLUMNS}"
            );
            let row = sqlx::query(&sql)
                .bind(booking.expert_id.get())
                .bind(&booking.farmer_name)
                .bind(&booking.farmer_email)
                .bind(booking.slot_start_utc)
                .bind(booking.slot_end_utc)
                .bind(BookingStatus::Pending.as_str())
                .bind(&booking.gateway_order_id)
                .bind(booking.created_at)
                .bind(booking.commission_code.as_deref())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| store_error("commit_booking", e))?;
            let stored = rows::booking(&row)?;

            sqlx::query("UPDATE availability SET is_booked = TRUE WHERE id = $1")
                .bind(slot.id.get())
                .execute(&mut *tx)
                .await
                .map_err(|e| store_error("commit_booking", e))?;

            tx.commit()
                .await
                .map_err(|e| store_error("commit_booking", e))?;
            Ok(stored)
        })
    }
}
