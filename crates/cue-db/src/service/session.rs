//! # Session Operations
//!
//! The session lifecycle: start → (items, extensions) → close.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Session Lifecycle                                  │
//! │                                                                         │
//! │   start_session                close_session                            │
//! │        │                            │                                   │
//! │        ▼                            ▼                                   │
//! │   ┌─────────┐   add_item       ┌─────────┐                             │
//! │   │ ACTIVE  │   remove_one     │ CLOSED  │  terminal - no reopening    │
//! │   │         │◄──extend_prepaid─│  + Bill │                             │
//! │   └─────────┘   (loops)        └─────────┘                             │
//! │                                                                         │
//! │  Close is the single commit point: end time, billed minutes,           │
//! │  bill row - all in one transaction, all or nothing. A second           │
//! │  close finds the session inactive and is rejected; the UNIQUE          │
//! │  bill constraint backstops the race.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::{
    generate_id, product as product_repo, resource as resource_repo, session as session_repo,
    shift as shift_repo,
};
use crate::service::ServiceResult;
use cue_core::{
    cart, pricing, validation, Bill, BillingMode, CoreError, Quote, ReceiptPrinter,
    ReceiptSnapshot, Session, SessionItem, Settlement, ValidationError,
};

// =============================================================================
// Inputs & Results
// =============================================================================

/// Input for starting a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSession {
    pub resource_id: String,
    pub operator_id: String,
    pub mode: BillingMode,
    /// Required (positive) for PREPAID, forbidden for OPEN.
    pub prepaid_minutes: Option<i64>,
}

/// Live view of a running (or settled) session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub session: Session,
    pub resource_name: String,
    pub items: Vec<SessionItem>,
    pub quote: Quote,
}

/// Everything produced by the close commit point.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedSession {
    pub session: Session,
    pub bill: Bill,
    pub settlement: Settlement,
    pub receipt: ReceiptSnapshot,
}

/// A settled bill with its time/bar split, for the summary screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillSummary {
    pub bill: Bill,
    pub session: Session,
    pub duration_minutes: i64,
    pub time_cost_cents: i64,
    pub bar_total_cents: i64,
}

// =============================================================================
// Start
// =============================================================================

/// Starts a session on a free resource, stamped with the current clock.
pub async fn start_session(db: &Database, input: StartSession) -> ServiceResult<Session> {
    start_session_at(db, input, Utc::now()).await
}

/// Starts a session with an explicit clock reading (deterministic tests,
/// backfill tooling).
///
/// ## Preconditions
/// - the resource exists and is active
/// - no other active session holds the resource (the partial unique
///   index settles concurrent starts: exactly one wins)
/// - a shift is active - sessions cannot exist outside one
/// - PREPAID requires positive prepaid minutes; OPEN forbids them
pub async fn start_session_at(
    db: &Database,
    input: StartSession,
    now: DateTime<Utc>,
) -> ServiceResult<Session> {
    debug!(resource_id = %input.resource_id, mode = ?input.mode, "start_session");

    match (input.mode, input.prepaid_minutes) {
        (BillingMode::Prepaid, Some(minutes)) => {
            validation::validate_prepaid_minutes(minutes).map_err(CoreError::from)?
        }
        (BillingMode::Prepaid, None) => {
            return Err(CoreError::from(ValidationError::Required {
                field: "prepaid minutes".to_string(),
            })
            .into())
        }
        (BillingMode::Open, Some(_)) => {
            return Err(CoreError::from(ValidationError::NotAllowed {
                field: "prepaid minutes".to_string(),
                reason: "open sessions bill actual time".to_string(),
            })
            .into())
        }
        (BillingMode::Open, None) => {}
    }

    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    let resource = resource_repo::get(&mut tx, &input.resource_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Resource", &input.resource_id))?;

    if !resource.is_active {
        return Err(CoreError::from(ValidationError::NotAllowed {
            field: "resource".to_string(),
            reason: "resource is retired".to_string(),
        })
        .into());
    }

    if let Some(existing) = current_active(&mut tx, &resource.id).await? {
        debug!(session_id = %existing.id, "resource already occupied");
        return Err(CoreError::ResourceOccupied {
            resource: resource.name,
        }
        .into());
    }

    let shift = shift_repo::active(&mut tx)
        .await?
        .ok_or(CoreError::NoActiveShift)?;

    let session = Session {
        id: generate_id(),
        resource_id: input.resource_id,
        shift_id: shift.id,
        operator_id: input.operator_id,
        mode: input.mode,
        prepaid_minutes: input.prepaid_minutes,
        start_time: now,
        end_time: None,
        is_active: true,
    };

    // The pre-check above can still race with another terminal; the
    // partial unique index is the authority.
    match session_repo::insert(&mut tx, &session).await {
        Ok(()) => {}
        Err(DbError::UniqueViolation { .. }) => {
            return Err(CoreError::ResourceOccupied {
                resource: resource.name,
            }
            .into())
        }
        Err(err) => return Err(err.into()),
    }

    tx.commit().await.map_err(DbError::from)?;

    info!(session_id = %session.id, resource = %resource.name, mode = ?session.mode, "Session started");
    Ok(session)
}

async fn current_active(
    conn: &mut sqlx::SqliteConnection,
    resource_id: &str,
) -> Result<Option<Session>, DbError> {
    let session = sqlx::query_as::<_, Session>(
        "SELECT id, resource_id, shift_id, operator_id, mode, prepaid_minutes, \
         start_time, end_time, is_active \
         FROM sessions WHERE resource_id = ?1 AND is_active = 1",
    )
    .bind(resource_id)
    .fetch_optional(conn)
    .await?;

    Ok(session)
}

// =============================================================================
// Extend
// =============================================================================

/// Adds minutes to an active prepaid session in place.
///
/// Extension is allowed even when the session is already in overtime:
/// the operator settles the real difference at close via
/// `charge_overtime`, so nothing can be hidden this way.
pub async fn extend_prepaid(
    db: &Database,
    session_id: &str,
    extra_minutes: i64,
) -> ServiceResult<Session> {
    debug!(session_id = %session_id, extra_minutes = %extra_minutes, "extend_prepaid");

    if extra_minutes <= 0 {
        return Err(CoreError::from(ValidationError::MustBePositive {
            field: "extension minutes".to_string(),
        })
        .into());
    }

    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    let mut session = session_repo::get(&mut tx, session_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Session", session_id))?;

    if !session.is_active {
        return Err(CoreError::SessionClosed {
            session: session_id.to_string(),
        }
        .into());
    }

    if session.mode != BillingMode::Prepaid {
        return Err(CoreError::NotPrepaid {
            session: session_id.to_string(),
        }
        .into());
    }

    let current = session.prepaid_minutes.unwrap_or(0);
    validation::validate_prepaid_minutes(current + extra_minutes).map_err(CoreError::from)?;

    session_repo::extend_prepaid(&mut tx, session_id, extra_minutes).await?;

    tx.commit().await.map_err(DbError::from)?;

    session.prepaid_minutes = Some(current + extra_minutes);
    info!(session_id = %session_id, total_minutes = current + extra_minutes, "Prepaid time extended");
    Ok(session)
}

// =============================================================================
// Cart
// =============================================================================

/// Adds one unit of a product to a session's cart.
///
/// First add snapshots the current sale price; repeats increment the
/// line. Tracked stock is taken with a guarded update so two carts
/// racing for the last unit resolve to one winner and one rejection.
pub async fn add_item(
    db: &Database,
    session_id: &str,
    product_id: &str,
) -> ServiceResult<SessionItem> {
    debug!(session_id = %session_id, product_id = %product_id, "add_item");

    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    let session = session_repo::get(&mut tx, session_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Session", session_id))?;

    if !session.is_active {
        return Err(CoreError::SessionClosed {
            session: session_id.to_string(),
        }
        .into());
    }

    let product = product_repo::get(&mut tx, product_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Product", product_id))?;

    if !product.is_active {
        return Err(CoreError::from(ValidationError::NotAllowed {
            field: "product".to_string(),
            reason: "product is retired".to_string(),
        })
        .into());
    }

    if product.tracks_stock() && !product_repo::try_take_one(&mut tx, &product.id).await? {
        return Err(CoreError::OutOfStock {
            product: product.name,
        }
        .into());
    }

    let item = session_repo::upsert_item_add(&mut tx, session_id, &product, Utc::now()).await?;

    tx.commit().await.map_err(DbError::from)?;

    info!(session_id = %session_id, product = %product.name, quantity = item.quantity, "Item added");
    Ok(item)
}

/// Removes one unit from a cart line; the line disappears at zero.
///
/// Exactly one unit of stock goes back per removal - but only for
/// stock-tracked products, mirroring what the add path took.
pub async fn remove_one_unit(
    db: &Database,
    session_id: &str,
    item_id: &str,
) -> ServiceResult<()> {
    debug!(session_id = %session_id, item_id = %item_id, "remove_one_unit");

    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    let session = session_repo::get(&mut tx, session_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Session", session_id))?;

    if !session.is_active {
        return Err(CoreError::SessionClosed {
            session: session_id.to_string(),
        }
        .into());
    }

    let item = session_repo::get_item(&mut tx, item_id)
        .await?
        .filter(|item| item.session_id == session_id)
        .ok_or_else(|| CoreError::not_found("SessionItem", item_id))?;

    session_repo::remove_one_from_item(&mut tx, &item).await?;
    // No-op for untracked products: crediting them would invent stock
    product_repo::give_back_one(&mut tx, &item.product_id).await?;

    tx.commit().await.map_err(DbError::from)?;

    info!(session_id = %session_id, item_id = %item_id, "One unit removed");
    Ok(())
}

// =============================================================================
// Status
// =============================================================================

/// Live view of a session: elapsed time, provisional cost, countdown.
pub async fn session_status(db: &Database, session_id: &str) -> ServiceResult<SessionStatus> {
    session_status_at(db, session_id, Utc::now()).await
}

/// Live view with an explicit clock reading.
pub async fn session_status_at(
    db: &Database,
    session_id: &str,
    now: DateTime<Utc>,
) -> ServiceResult<SessionStatus> {
    let session = db
        .sessions()
        .get_by_id(session_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Session", session_id))?;

    let resource = db
        .resources()
        .get_by_id(&session.resource_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Resource", &session.resource_id))?;

    let items = db.sessions().items(session_id).await?;

    // A settled session is quoted as of its own end, not the wall clock
    let as_of = session.end_time.unwrap_or(now);
    let quote = pricing::quote(&session, &resource, &items, as_of);

    Ok(SessionStatus {
        session,
        resource_name: resource.name,
        items,
        quote,
    })
}

// =============================================================================
// Close
// =============================================================================

/// Closes a session and settles its bill, stamped with the current clock.
pub async fn close_session(
    db: &Database,
    printer: &dyn ReceiptPrinter,
    session_id: &str,
    charge_overtime: bool,
) -> ServiceResult<ClosedSession> {
    close_session_at(db, printer, session_id, charge_overtime, Utc::now()).await
}

/// The single commit point of the session lifecycle.
///
/// Atomically: stamps the end time, deactivates the session, settles
/// billed minutes per the decision table, and inserts the bill. Either
/// all of it lands or none of it does. A second close is rejected
/// cleanly - the guard update finds no active row.
///
/// The receipt is handed to the printer after commit; a printing
/// failure is logged and changes nothing.
pub async fn close_session_at(
    db: &Database,
    printer: &dyn ReceiptPrinter,
    session_id: &str,
    charge_overtime: bool,
    now: DateTime<Utc>,
) -> ServiceResult<ClosedSession> {
    debug!(session_id = %session_id, charge_overtime = %charge_overtime, "close_session");

    let mut tx = db.pool().begin().await.map_err(DbError::from)?;

    let rows = session_repo::deactivate(&mut tx, session_id, now).await?;
    if rows == 0 {
        // Distinguish "never existed" from "already closed"
        return match session_repo::get(&mut tx, session_id).await? {
            Some(_) => Err(CoreError::SessionClosed {
                session: session_id.to_string(),
            }
            .into()),
            None => Err(CoreError::not_found("Session", session_id).into()),
        };
    }

    let session = session_repo::get(&mut tx, session_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Session", session_id))?;

    let resource = resource_repo::get(&mut tx, &session.resource_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Resource", &session.resource_id))?;

    let items = session_repo::items(&mut tx, session_id).await?;
    let names = session_repo::item_names(&mut tx, session_id).await?;

    let settlement = pricing::settle(&session, &resource, &items, now, charge_overtime);

    let bill = Bill {
        id: generate_id(),
        session_id: session_id.to_string(),
        total_cents: settlement.grand_total_cents,
        closed_at: now,
    };

    match session_repo::insert_bill(&mut tx, &bill).await {
        Ok(()) => {}
        Err(DbError::UniqueViolation { .. }) => {
            return Err(CoreError::AlreadyBilled {
                session: session_id.to_string(),
            }
            .into())
        }
        Err(err) => return Err(err.into()),
    }

    tx.commit().await.map_err(DbError::from)?;

    let receipt = ReceiptSnapshot::capture(
        &session,
        &resource,
        &items,
        &names,
        settlement.grand_total_cents,
        now,
    );

    // Print failures must never block or roll back the close
    if let Err(err) = printer.print(&receipt) {
        warn!(session_id = %session.id, error = %err, "Receipt printing failed");
    }

    info!(
        session_id = %session.id,
        resource = %resource.name,
        billed_seconds = settlement.billed_seconds,
        total = %settlement.grand_total(),
        "Session closed"
    );

    Ok(ClosedSession {
        session,
        bill,
        settlement,
        receipt,
    })
}

// =============================================================================
// Bill Summary
// =============================================================================

/// The settled bill of a closed session, with its time/bar split.
///
/// The time component is whatever is left after subtracting the bar
/// from the persisted total - the bill itself stays the single source
/// of truth.
pub async fn bill_summary(db: &Database, session_id: &str) -> ServiceResult<BillSummary> {
    let bill = db
        .sessions()
        .bill_for_session(session_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Bill", session_id))?;

    let session = db
        .sessions()
        .get_by_id(session_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Session", session_id))?;

    let items = db.sessions().items(session_id).await?;
    let bar_total_cents = cart::bar_total(&items).cents();

    let duration_minutes = match session.end_time {
        Some(end) => (end - session.start_time).num_seconds().max(0) / 60,
        None => 0,
    };

    Ok(BillSummary {
        duration_minutes,
        time_cost_cents: bill.total_cents - bar_total_cents,
        bar_total_cents,
        bill,
        session,
    })
}

// =============================================================================
// Tests
// =============================================================================
