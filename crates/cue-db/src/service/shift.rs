//! # Shift Operations
//!
//! Cash custody: open the drawer with a float, aggregate every bill
//! closed during the window, reconcile the physical count at the end.
//!
//! ## Reconciliation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  open_shift(float)                                                      │
//! │       │          ┌────────────────────────────────────┐                │
//! │       ▼          │ sessions start, bill, close ...    │                │
//! │  ┌─────────┐     │ shift_report() any time: window =  │                │
//! │  │ ACTIVE  │◄────│ [start, now], discrepancy = None   │                │
//! │  └────┬────┘     └────────────────────────────────────┘                │
//! │       │ close_shift(counted)                                           │
//! │       │   ├── any session still active? → Conflict, nothing changes    │
//! │       │   ├── stamp end, record count, deactivate (one transaction)    │
//! │       │   └── discrepancy = counted − (float + revenue), signed        │
//! │       ▼                                                                 │
//! │  ┌─────────┐                                                            │
//! │  │ CLOSED  │  report stays reproducible forever: the window is fixed   │
//! │  └─────────┘                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::{generate_id, session as session_repo, shift as shift_repo};
use crate::service::ServiceResult;
use cue_core::{validation, CoreError, Shift, ShiftReport};

// =============================================================================
// Open
// =============================================================================

/// Opens a shift with a declared cash float, stamped with the current clock.
pub async fn open_shift(
    db: &Database,
    operator_id: &str,
    opening_cash_cents: i64,
) -> ServiceResult<Shift> {
    open_shift_at(db, operator_id, opening_cash_cents, Utc::now()).await
}

/// Opens a shift with an explicit clock reading.
///
/// Rejected unconditionally while any shift is active - there is no
/// override. The partial unique index on `shifts.is_active` settles
/// simultaneous opens from two terminals: one wins, one gets Conflict.
pub async fn open_shift_at(
    db: &Database,
    operator_id: &str,
    opening_cash_cents: i64,
    now: DateTime<Utc>,
) -> ServiceResult<Shift> {
    debug!(operator_id = %operator_id, opening_cash = %opening_cash_cents, "open_shift");

    validation::validate_cash_cents(opening_cash_cents).map_err(CoreError::from)?;

    let shift = Shift {
        id: generate_id(),
        operator_id: operator_id.to_string(),
        opening_cash_cents,
        closing_cash_cents: None,
        start_time: now,
        end_time: None,
        is_active: true,
    };

    match db.shifts().insert(&shift).await {
        Ok(()) => {}
        Err(DbError::UniqueViolation { .. }) => {
            return Err(CoreError::ShiftAlreadyActive.into());
        }
        Err(err) => return Err(err.into()),
    }

    info!(shift_id = %shift.id, operator = %operator_id, "Shift opened");
    Ok(shift)
}

/// The currently active shift, if any.
pub async fn active_shift(db: &Database) -> ServiceResult<Option<Shift>> {
    Ok(db.shifts().active().await?)
}

// =============================================================================
// Report
// =============================================================================

/// Reports a shift's finances, using the current clock for an open window.
pub async fn shift_report(db: &Database, shift_id: &str) -> ServiceResult<ShiftReport> {
    shift_report_at(db, shift_id, Utc::now()).await
}

/// Reports a shift's finances with an explicit clock reading.
///
/// Callable any time: an open shift reports provisionally against
/// `[start, now]`; a closed shift always reports the same fixed window
/// and carries its recorded discrepancy.
pub async fn shift_report_at(
    db: &Database,
    shift_id: &str,
    now: DateTime<Utc>,
) -> ServiceResult<ShiftReport> {
    let shift = db
        .shifts()
        .get_by_id(shift_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Shift", shift_id))?;

    let (start, end) = shift.window(now);

    let totals = db.shifts().totals_in_window(start, end).await?;
    let products = db.shifts().product_breakdown(start, end).await?;
    let resources = db.shifts().resource_breakdown(start, end).await?;

    Ok(ShiftReport::assemble(
        &shift.id,
        start,
        end,
        shift.opening_cash_cents,
        totals,
        shift.closing_cash_cents,
        products,
        resources,
    ))
}

// =============================================================================
// Close
// =============================================================================

/// Closes the shift against a physically counted drawer, stamped with
/// the current clock.
pub async fn close_shift(
    db: &Database,
    shift_id: &str,
    counted_cash_cents: i64,
) -> ServiceResult<ShiftReport> {
    close_shift_at(db, shift_id, counted_cash_cents, Utc::now()).await
}

/// Closes the shift with an explicit clock reading.
///
/// Hard-blocked while any session is active: every table must be
/// settled before the drawer can be reconciled. On success the shift is
/// deactivated in the same transaction that checked the block, and the
/// returned report carries the signed discrepancy.
pub async fn close_shift_at(
    db: &Database,
    shift_id: &str,
    counted_cash_cents: i64,
    now: DateTime<Utc>,
) -> ServiceResult<ShiftReport> {
    debug!(shift_id = %shift_id, counted = %counted_cash_cents, "close_shift");

    validation::validate_cash_cents(counted_cash_cents).map_err(CoreError::from)?;

    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    let shift = shift_repo::get(&mut tx, shift_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Shift", shift_id))?;

    let open_sessions = session_repo::count_active(&mut tx).await?;
    if open_sessions > 0 {
        return Err(CoreError::OpenSessionsRemain {
            count: open_sessions,
        }
        .into());
    }

    let rows = shift_repo::close(&mut tx, shift_id, now, counted_cash_cents).await?;
    if rows == 0 {
        return Err(CoreError::ShiftNotActive {
            shift: shift_id.to_string(),
        }
        .into());
    }

    // Fix the aggregates inside the same transaction that fixed the window
    let totals = shift_repo::totals_in_window(&mut tx, shift.start_time, now).await?;

    tx.commit().await.map_err(DbError::from)?;

    let products = db.shifts().product_breakdown(shift.start_time, now).await?;
    let resources = db
        .shifts()
        .resource_breakdown(shift.start_time, now)
        .await?;

    let report = ShiftReport::assemble(
        shift_id,
        shift.start_time,
        now,
        shift.opening_cash_cents,
        totals,
        Some(counted_cash_cents),
        products,
        resources,
    );

    info!(
        shift_id = %shift_id,
        revenue = report.total_revenue_cents,
        discrepancy = ?report.discrepancy_cents,
        "Shift closed"
    );

    Ok(report)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::session::{
        add_item, close_session_at, start_session_at, StartSession,
    };
    use crate::service::ErrorCode;
    use crate::testutil::{seed_product, seed_resource, test_db};
    use chrono::Duration;
    use cue_core::{BillingMode, NullPrinter};

    fn open_input(resource_id: &str) -> StartSession {
        StartSession {
            resource_id: resource_id.to_string(),
            operator_id: "op-1".to_string(),
            mode: BillingMode::Open,
            prepaid_minutes: None,
        }
    }

    #[tokio::test]
    async fn test_only_one_active_shift() {
        let db = test_db().await;
        open_shift(&db, "op-1", 100_000).await.unwrap();

        let err = open_shift(&db, "op-2", 50_000).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_open_shift_validates_cash() {
        let db = test_db().await;
        let err = open_shift(&db, "op-1", -1).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    // Float 1000.00; two bills totaling 250.00; counted 1250.00 → 0,
    // counted 1200.00 → -50.00
    #[tokio::test]
    async fn test_drawer_reconciliation() {
        let db = test_db().await;
        let t0 = Utc::now();
        let shift = open_shift_at(&db, "op-1", 100_000, t0).await.unwrap();

        let table_a = seed_resource(&db, "Table A", 60_000).await;
        let table_b = seed_resource(&db, "Table B", 60_000).await;

        // 15 min on A → 150.00, 10 min on B → 100.00
        let s1 = start_session_at(&db, open_input(&table_a.id), t0).await.unwrap();
        close_session_at(&db, &NullPrinter, &s1.id, false, t0 + Duration::minutes(15))
            .await
            .unwrap();
        let s2 = start_session_at(&db, open_input(&table_b.id), t0).await.unwrap();
        close_session_at(&db, &NullPrinter, &s2.id, false, t0 + Duration::minutes(10))
            .await
            .unwrap();

        let report = close_shift_at(&db, &shift.id, 125_000, t0 + Duration::hours(8))
            .await
            .unwrap();

        assert_eq!(report.total_revenue_cents, 25_000);
        assert_eq!(report.expected_cash_cents, 125_000);
        assert_eq!(report.discrepancy_cents, Some(0));
    }

    #[tokio::test]
    async fn test_drawer_short_is_signed() {
        let db = test_db().await;
        let t0 = Utc::now();
        let shift = open_shift_at(&db, "op-1", 100_000, t0).await.unwrap();

        let table = seed_resource(&db, "Table A", 60_000).await;
        let s1 = start_session_at(&db, open_input(&table.id), t0).await.unwrap();
        close_session_at(&db, &NullPrinter, &s1.id, false, t0 + Duration::minutes(25))
            .await
            .unwrap();

        // Revenue 250.00, counted 1200.00 → 50.00 short
        let report = close_shift_at(&db, &shift.id, 120_000, t0 + Duration::hours(8))
            .await
            .unwrap();
        assert_eq!(report.discrepancy_cents, Some(-5_000));
    }

    // Closing while a session is active is a hard blocker; the shift
    // must come out untouched
    #[tokio::test]
    async fn test_close_blocked_by_active_session() {
        let db = test_db().await;
        let t0 = Utc::now();
        let shift = open_shift_at(&db, "op-1", 100_000, t0).await.unwrap();

        let table = seed_resource(&db, "Table A", 60_000).await;
        start_session_at(&db, open_input(&table.id), t0).await.unwrap();

        let err = close_shift_at(&db, &shift.id, 100_000, t0 + Duration::hours(1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);

        let still_active = db.shifts().get_by_id(&shift.id).await.unwrap().unwrap();
        assert!(still_active.is_active);
        assert!(still_active.end_time.is_none());
        assert!(still_active.closing_cash_cents.is_none());
    }

    #[tokio::test]
    async fn test_double_close_rejected() {
        let db = test_db().await;
        let t0 = Utc::now();
        let shift = open_shift_at(&db, "op-1", 100_000, t0).await.unwrap();

        close_shift_at(&db, &shift.id, 100_000, t0 + Duration::hours(8))
            .await
            .unwrap();
        let err = close_shift_at(&db, &shift.id, 100_000, t0 + Duration::hours(9))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_mid_shift_report_is_provisional() {
        let db = test_db().await;
        let t0 = Utc::now();
        let shift = open_shift_at(&db, "op-1", 100_000, t0).await.unwrap();

        let table = seed_resource(&db, "Table A", 60_000).await;
        let cola = seed_product(&db, "Cola", 250, Some(120), Some(10)).await;

        let s1 = start_session_at(&db, open_input(&table.id), t0).await.unwrap();
        add_item(&db, &s1.id, &cola.id).await.unwrap();
        add_item(&db, &s1.id, &cola.id).await.unwrap();
        close_session_at(&db, &NullPrinter, &s1.id, false, t0 + Duration::minutes(30))
            .await
            .unwrap();

        let report = shift_report_at(&db, &shift.id, t0 + Duration::hours(1))
            .await
            .unwrap();

        // 30 min table = 300.00 + 2 colas = 5.00
        assert_eq!(report.total_revenue_cents, 30_500);
        assert_eq!(report.bar_revenue_cents, 500);
        assert_eq!(report.bar_cost_cents, 240);
        assert_eq!(report.bar_profit_cents, 260);
        assert_eq!(report.time_revenue_cents, 30_000);
        assert_eq!(report.items_count, 2);
        assert_eq!(report.discrepancy_cents, None); // drawer not counted yet

        // Breakdown rows restored from the admin analytics
        assert_eq!(report.products.len(), 1);
        assert_eq!(report.products[0].name, "Cola");
        assert_eq!(report.products[0].quantity, 2);
        assert_eq!(report.products[0].profit_cents, 260);
        assert_eq!(report.resources.len(), 1);
        assert_eq!(report.resources[0].name, "Table A");
        assert_eq!(report.resources[0].revenue_cents, 30_500);
    }

    // Bills partition exactly across adjacent shift windows: nothing
    // double-counted, nothing dropped
    #[tokio::test]
    async fn test_adjacent_shifts_partition_bills() {
        let db = test_db().await;
        let table = seed_resource(&db, "Table A", 60_000).await;
        let t0 = Utc::now();

        // Shift 1: one bill of 150.00, closed at t0+8h
        let shift1 = open_shift_at(&db, "op-1", 100_000, t0).await.unwrap();
        let s1 = start_session_at(&db, open_input(&table.id), t0).await.unwrap();
        close_session_at(&db, &NullPrinter, &s1.id, false, t0 + Duration::minutes(15))
            .await
            .unwrap();
        let report1 = close_shift_at(&db, &shift1.id, 115_000, t0 + Duration::hours(8))
            .await
            .unwrap();

        // Shift 2 starts later; its bill lands outside shift 1's window
        let t1 = t0 + Duration::hours(9);
        let shift2 = open_shift_at(&db, "op-2", 50_000, t1).await.unwrap();
        let s2 = start_session_at(&db, open_input(&table.id), t1).await.unwrap();
        close_session_at(&db, &NullPrinter, &s2.id, false, t1 + Duration::minutes(30))
            .await
            .unwrap();
        let report2 = close_shift_at(&db, &shift2.id, 80_000, t1 + Duration::hours(8))
            .await
            .unwrap();

        assert_eq!(report1.total_revenue_cents, 15_000);
        assert_eq!(report2.total_revenue_cents, 30_000);

        // Re-reading shift 1 after shift 2 existed changes nothing
        let report1_again = shift_report(&db, &shift1.id).await.unwrap();
        assert_eq!(report1_again.total_revenue_cents, 15_000);
        assert_eq!(report1_again.discrepancy_cents, Some(0));
    }

    #[tokio::test]
    async fn test_new_shift_can_open_after_close() {
        let db = test_db().await;
        let t0 = Utc::now();
        let shift1 = open_shift_at(&db, "op-1", 100_000, t0).await.unwrap();
        close_shift_at(&db, &shift1.id, 100_000, t0 + Duration::hours(8))
            .await
            .unwrap();

        let shift2 = open_shift_at(&db, "op-2", 50_000, t0 + Duration::hours(9))
            .await
            .unwrap();
        assert!(shift2.is_active);

        let active = active_shift(&db).await.unwrap().unwrap();
        assert_eq!(active.id, shift2.id);
    }
}
