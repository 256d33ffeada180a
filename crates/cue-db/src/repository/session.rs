//! # Session Repository
//!
//! Database operations for sessions, their cart items, and bills.
//!
//! ## Close Is One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Session Close                                     │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    └── deactivate()      UPDATE ... WHERE id = ? AND is_active = 1     │
//! │         │                rows = 0 → session was already closed:        │
//! │         │                the double-close simply loses the race        │
//! │         ▼                                                               │
//! │    └── (service computes the settlement via cue-core)                  │
//! │         ▼                                                               │
//! │    └── insert_bill()     UNIQUE (session_id) backstops one-bill        │
//! │  COMMIT ── all of it or none of it                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::generate_id;
use cue_core::{Bill, Product, Session, SessionItem};

/// Repository for session database operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

const SESSION_COLUMNS: &str = "id, resource_id, shift_id, operator_id, mode, prepaid_minutes, \
                               start_time, end_time, is_active";

const ITEM_COLUMNS: &str =
    "id, session_id, product_id, quantity, price_at_order_cents, created_at";

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Gets a session by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Lists all currently active sessions.
    pub async fn list_active(&self) -> DbResult<Vec<Session>> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE is_active = 1 ORDER BY start_time"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Counts currently active sessions. Shift close blocks while this
    /// is nonzero.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Gets the cart items of a session, in add order.
    pub async fn items(&self, session_id: &str) -> DbResult<Vec<SessionItem>> {
        let items = sqlx::query_as::<_, SessionItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM session_items WHERE session_id = ?1 ORDER BY created_at, id"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets one cart item by its ID.
    pub async fn get_item(&self, item_id: &str) -> DbResult<Option<SessionItem>> {
        let item = sqlx::query_as::<_, SessionItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM session_items WHERE id = ?1"
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets the bill settled for a session, if it has closed.
    pub async fn bill_for_session(&self, session_id: &str) -> DbResult<Option<Bill>> {
        let bill = sqlx::query_as::<_, Bill>(
            "SELECT id, session_id, total_cents, closed_at FROM bills WHERE session_id = ?1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bill)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Fetches a session inside an open transaction.
pub(crate) async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(&format!(
        "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(session)
}

/// Inserts a new session row.
///
/// A concurrent start on the same resource trips the partial unique
/// index here; the caller maps that to "resource occupied".
pub(crate) async fn insert(conn: &mut SqliteConnection, session: &Session) -> DbResult<()> {
    debug!(id = %session.id, resource_id = %session.resource_id, "Inserting session");

    sqlx::query(
        r#"
        INSERT INTO sessions (
            id, resource_id, shift_id, operator_id, mode, prepaid_minutes,
            start_time, end_time, is_active
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&session.id)
    .bind(&session.resource_id)
    .bind(&session.shift_id)
    .bind(&session.operator_id)
    .bind(session.mode)
    .bind(session.prepaid_minutes)
    .bind(session.start_time)
    .bind(session.end_time)
    .bind(session.is_active)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Flips an active session to closed, stamping its end time.
///
/// Returns the number of rows updated: 0 means the session was not
/// active (already closed, or never existed) and nothing changed.
pub(crate) async fn deactivate(
    conn: &mut SqliteConnection,
    id: &str,
    end_time: DateTime<Utc>,
) -> DbResult<u64> {
    let result = sqlx::query(
        "UPDATE sessions SET end_time = ?2, is_active = 0 WHERE id = ?1 AND is_active = 1",
    )
    .bind(id)
    .bind(end_time)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Adds minutes to an active prepaid session in place.
///
/// Returns 0 rows when the session is missing, closed, or not prepaid;
/// the caller distinguishes those cases for its error message.
pub(crate) async fn extend_prepaid(
    conn: &mut SqliteConnection,
    id: &str,
    extra_minutes: i64,
) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE sessions
        SET prepaid_minutes = prepaid_minutes + ?2
        WHERE id = ?1 AND is_active = 1 AND mode = 'prepaid'
        "#,
    )
    .bind(id)
    .bind(extra_minutes)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Lists a session's items inside an open transaction.
pub(crate) async fn items(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> DbResult<Vec<SessionItem>> {
    let items = sqlx::query_as::<_, SessionItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM session_items WHERE session_id = ?1 ORDER BY created_at, id"
    ))
    .bind(session_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Fetches one cart item inside an open transaction.
pub(crate) async fn get_item(
    conn: &mut SqliteConnection,
    item_id: &str,
) -> DbResult<Option<SessionItem>> {
    let item = sqlx::query_as::<_, SessionItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM session_items WHERE id = ?1"
    ))
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(item)
}

/// Adds one unit of a product to a session's cart.
///
/// First add creates the line with quantity 1 and snapshots the sale
/// price; repeats increment quantity. The COALESCE keeps an already
/// captured snapshot over the incoming price, and also repairs legacy
/// rows that predate the snapshot column.
pub(crate) async fn upsert_item_add(
    conn: &mut SqliteConnection,
    session_id: &str,
    product: &Product,
    now: DateTime<Utc>,
) -> DbResult<SessionItem> {
    debug!(session_id = %session_id, product_id = %product.id, "Adding cart item");

    let id = generate_id();

    sqlx::query(
        r#"
        INSERT INTO session_items (
            id, session_id, product_id, quantity, price_at_order_cents, created_at
        ) VALUES (?1, ?2, ?3, 1, ?4, ?5)
        ON CONFLICT (session_id, product_id) DO UPDATE SET
            quantity = quantity + 1,
            price_at_order_cents = COALESCE(session_items.price_at_order_cents, excluded.price_at_order_cents)
        "#,
    )
    .bind(&id)
    .bind(session_id)
    .bind(&product.id)
    .bind(product.price_cents)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let item = sqlx::query_as::<_, SessionItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM session_items WHERE session_id = ?1 AND product_id = ?2"
    ))
    .bind(session_id)
    .bind(&product.id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(item)
}

/// Removes one unit from a cart line.
///
/// At quantity 1 the row is deleted outright; zero-quantity rows never
/// exist (the schema also forbids them).
pub(crate) async fn remove_one_from_item(
    conn: &mut SqliteConnection,
    item: &SessionItem,
) -> DbResult<()> {
    debug!(item_id = %item.id, quantity = %item.quantity, "Removing one unit");

    if item.quantity <= 1 {
        sqlx::query("DELETE FROM session_items WHERE id = ?1")
            .bind(&item.id)
            .execute(&mut *conn)
            .await?;
    } else {
        sqlx::query("UPDATE session_items SET quantity = quantity - 1 WHERE id = ?1")
            .bind(&item.id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Product display names for a session's items, in the same order as
/// [`items`]. Used when freezing a receipt snapshot.
pub(crate) async fn item_names(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> DbResult<Vec<String>> {
    let names: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT p.name
        FROM session_items si
        INNER JOIN products p ON p.id = si.product_id
        WHERE si.session_id = ?1
        ORDER BY si.created_at, si.id
        "#,
    )
    .bind(session_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(names.into_iter().map(|(name,)| name).collect())
}

/// Inserts the bill settling a closed session.
///
/// The UNIQUE constraint on session_id makes a second bill for the same
/// session impossible at the storage layer, whatever the caller does.
pub(crate) async fn insert_bill(conn: &mut SqliteConnection, bill: &Bill) -> DbResult<()> {
    debug!(session_id = %bill.session_id, total = %bill.total_cents, "Inserting bill");

    sqlx::query(
        "INSERT INTO bills (id, session_id, total_cents, closed_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(&bill.id)
    .bind(&bill.session_id)
    .bind(bill.total_cents)
    .bind(bill.closed_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Counts active sessions inside an open transaction (shift-close guard).
pub(crate) async fn count_active(conn: &mut SqliteConnection) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE is_active = 1")
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}
