//! # Shift Repository
//!
//! Database operations for shifts and the window aggregates behind
//! shift reconciliation.
//!
//! ## Window Queries
//! Every aggregate filters bills by `closed_at >= start AND closed_at
//! <= end` - a closed, inclusive window. Adjacent shifts share a
//! boundary instant at most in theory (end of one = start of the next
//! only if a bill lands on the exact microsecond), and the inclusive
//! window guarantees a boundary bill is never dropped.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use cue_core::{ProductBreakdown, ResourceBreakdown, Shift, ShiftTotals};

/// Repository for shift database operations.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

const SHIFT_COLUMNS: &str = "id, operator_id, opening_cash_cents, closing_cash_cents, \
                             start_time, end_time, is_active";

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Gets a shift by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    /// The currently active shift, if any. At most one exists.
    pub async fn active(&self) -> DbResult<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE is_active = 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Lists shifts, most recent first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Shift>> {
        let shifts = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts ORDER BY start_time DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(shifts)
    }

    /// Inserts a new shift row.
    ///
    /// A concurrent open trips the partial unique index on is_active;
    /// the caller maps that to "shift already active".
    pub async fn insert(&self, shift: &Shift) -> DbResult<()> {
        debug!(id = %shift.id, operator_id = %shift.operator_id, "Inserting shift");

        sqlx::query(
            r#"
            INSERT INTO shifts (
                id, operator_id, opening_cash_cents, closing_cash_cents,
                start_time, end_time, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&shift.id)
        .bind(&shift.operator_id)
        .bind(shift.opening_cash_cents)
        .bind(shift.closing_cash_cents)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Raw aggregates over a shift window.
    pub async fn totals_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<ShiftTotals> {
        let mut conn = self.pool.acquire().await?;
        totals_in_window(&mut conn, start, end).await
    }

    /// Per-product analytics rows over a shift window.
    pub async fn product_breakdown(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<ProductBreakdown>> {
        let rows: Vec<(String, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT p.name,
                   COALESCE(SUM(si.quantity), 0),
                   COALESCE(SUM(si.quantity * COALESCE(si.price_at_order_cents, 0)), 0),
                   COALESCE(SUM(si.quantity * COALESCE(p.cost_cents, 0)), 0)
            FROM session_items si
            INNER JOIN bills b ON b.session_id = si.session_id
            INNER JOIN products p ON p.id = si.product_id
            WHERE b.closed_at >= ?1 AND b.closed_at <= ?2
            GROUP BY p.id, p.name
            ORDER BY 3 DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, quantity, revenue, cost)| ProductBreakdown {
                name,
                quantity,
                revenue_cents: revenue,
                cost_cents: cost,
                profit_cents: revenue - cost,
            })
            .collect())
    }

    /// Per-resource earnings over a shift window.
    pub async fn resource_breakdown(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<ResourceBreakdown>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT r.name, COALESCE(SUM(b.total_cents), 0)
            FROM bills b
            INNER JOIN sessions s ON s.id = b.session_id
            INNER JOIN resources r ON r.id = s.resource_id
            WHERE b.closed_at >= ?1 AND b.closed_at <= ?2
            GROUP BY r.id, r.name
            ORDER BY 2 DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, revenue)| ResourceBreakdown {
                name,
                revenue_cents: revenue,
            })
            .collect())
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// The active shift, fetched inside an open transaction.
pub(crate) async fn active(conn: &mut SqliteConnection) -> DbResult<Option<Shift>> {
    let shift =
        sqlx::query_as::<_, Shift>(&format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE is_active = 1"))
            .fetch_optional(&mut *conn)
            .await?;

    Ok(shift)
}

/// Fetches a shift by id inside an open transaction.
pub(crate) async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Shift>> {
    let shift =
        sqlx::query_as::<_, Shift>(&format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(shift)
}

/// Closes an active shift: stamps the end time and the counted cash.
///
/// Returns 0 rows if the shift was not active; nothing changes then.
pub(crate) async fn close(
    conn: &mut SqliteConnection,
    id: &str,
    end_time: DateTime<Utc>,
    counted_cash_cents: i64,
) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE shifts
        SET end_time = ?2, closing_cash_cents = ?3, is_active = 0
        WHERE id = ?1 AND is_active = 1
        "#,
    )
    .bind(id)
    .bind(end_time)
    .bind(counted_cash_cents)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Raw aggregates over a window, usable inside or outside a transaction.
pub(crate) async fn totals_in_window(
    conn: &mut SqliteConnection,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> DbResult<ShiftTotals> {
    // Sum of bill totals closed in the window
    let total_revenue: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(total_cents), 0) FROM bills \
         WHERE closed_at >= ?1 AND closed_at <= ?2",
    )
    .bind(start)
    .bind(end)
    .fetch_one(&mut *conn)
    .await?;

    // Bar aggregates over items whose parent session billed in the window
    let (items_count, bar_revenue, bar_cost): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(si.quantity), 0),
               COALESCE(SUM(si.quantity * COALESCE(si.price_at_order_cents, 0)), 0),
               COALESCE(SUM(si.quantity * COALESCE(p.cost_cents, 0)), 0)
        FROM session_items si
        INNER JOIN bills b ON b.session_id = si.session_id
        INNER JOIN products p ON p.id = si.product_id
        WHERE b.closed_at >= ?1 AND b.closed_at <= ?2
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_one(&mut *conn)
    .await?;

    Ok(ShiftTotals {
        total_revenue_cents: total_revenue,
        bar_revenue_cents: bar_revenue,
        bar_cost_cents: bar_cost,
        items_count,
    })
}
