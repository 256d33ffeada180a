//! # Domain Types
//!
//! Core domain types used throughout Cue POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Resource     │   │     Session     │   │      Shift      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  category       │   │  resource_id    │   │  operator_id    │       │
//! │  │  rate/hour      │   │  mode           │   │  opening_cash   │       │
//! │  │  is_active      │   │  prepaid_mins   │   │  closing_cash   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   SessionItem   │   │      Bill       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  price_cents    │   │  quantity       │   │  session_id 1:1 │       │
//! │  │  cost_cents     │   │  price_at_order │   │  total_cents    │       │
//! │  │  stock (null =  │   │  (snapshot)     │   │  closed_at      │       │
//! │  │   untracked)    │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! `SessionItem.price_at_order_cents` is copied from the product at first
//! add and never re-read. Historical bills stay stable against later
//! catalog edits.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Resource Category
// =============================================================================

/// The kind of billable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    /// A billiard table.
    Billiard,
    /// A game-console station.
    Console,
}

// =============================================================================
// Billing Mode
// =============================================================================

/// How a session's time is billed.
///
/// This is one axis of the billing decision table; the other is the
/// `charge_overtime` flag supplied once, at close (see [`crate::pricing`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    /// Pay for actual elapsed time at close.
    Open,
    /// A fixed number of minutes purchased up front.
    Prepaid,
}

impl Default for BillingMode {
    fn default() -> Self {
        BillingMode::Open
    }
}

// =============================================================================
// Resource
// =============================================================================

/// A billable, occupiable unit (billiard table, console station).
///
/// At most one active [`Session`] may reference a resource at any time;
/// the persistence layer enforces this with a partial unique index.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Resource {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the operator ("Table 3", "PS5 #1").
    pub name: String,

    /// Category tag.
    pub category: ResourceCategory,

    /// Hourly rate in cents. Validated positive at save time.
    pub rate_cents_per_hour: i64,

    /// Whether the resource can host new sessions (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Returns the hourly rate as a Money type.
    #[inline]
    pub fn rate(&self) -> Money {
        Money::from_cents(self.rate_cents_per_hour)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A retail item sold at the bar (drinks, snacks).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the operator and on receipts.
    pub name: String,

    /// Sale price in cents.
    pub price_cents: i64,

    /// Cost basis in cents, for margin reporting. None = unknown.
    pub cost_cents: Option<i64>,

    /// Stock count. None = untracked (never blocks a sale).
    pub stock: Option<i64>,

    /// Whether the product is available for sale (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the sale price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether stock is tracked for this product.
    #[inline]
    pub fn tracks_stock(&self) -> bool {
        self.stock.is_some()
    }

    /// Checks if one unit can be sold right now.
    ///
    /// Untracked stock never blocks a sale.
    pub fn can_sell_one(&self) -> bool {
        match self.stock {
            Some(count) => count >= 1,
            None => true,
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// One occupancy episode of a [`Resource`].
///
/// ## Invariants
/// - `end_time` is set if and only if `is_active` is false
/// - `prepaid_minutes` is set if and only if `mode == Prepaid`
/// - exactly one [`Bill`] is ever produced, at close
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Session {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The occupied resource.
    pub resource_id: String,

    /// The shift this session belongs to. A session cannot exist
    /// outside an active shift.
    pub shift_id: String,

    /// The operator who started the session.
    pub operator_id: String,

    /// Billing mode, fixed at start.
    pub mode: BillingMode,

    /// Purchased minutes. Set iff mode is Prepaid; grows via extension.
    pub prepaid_minutes: Option<i64>,

    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,

    /// Set exactly once, at close.
    #[ts(as = "Option<String>")]
    pub end_time: Option<DateTime<Utc>>,

    pub is_active: bool,
}

impl Session {
    /// Whole seconds elapsed since start, measured against the given clock
    /// reading. Never negative.
    ///
    /// Elapsed time is always recomputed from the stored start time at
    /// read time; nothing in the system pushes a clock.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start_time).num_seconds().max(0)
    }

    /// Whole minutes elapsed, for display.
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        self.elapsed_seconds(now) / 60
    }

    /// The instant the prepaid allowance runs out, if this is a prepaid
    /// session.
    pub fn prepaid_limit(&self) -> Option<DateTime<Utc>> {
        match (self.mode, self.prepaid_minutes) {
            (BillingMode::Prepaid, Some(mins)) => {
                Some(self.start_time + Duration::minutes(mins))
            }
            _ => None,
        }
    }
}

// =============================================================================
// Session Item
// =============================================================================

/// One retail line within a session's cart.
///
/// Quantity is at least 1 while the row exists; the row is deleted
/// rather than kept at zero.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SessionItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning session (cascade-deleted with it).
    pub session_id: String,

    /// The product sold. Products are protected from deletion while
    /// referenced here.
    pub product_id: String,

    /// Units in this line. Always >= 1.
    pub quantity: i64,

    /// Sale price in cents captured at first add. Never re-read from the
    /// catalog. Nullable to keep historical rows from before the snapshot
    /// column displayable.
    pub price_at_order_cents: Option<i64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SessionItem {
    /// The captured unit price, treating a missing snapshot as zero so
    /// that incomplete historical rows stay displayable.
    #[inline]
    pub fn price_at_order(&self) -> Money {
        Money::from_cents(self.price_at_order_cents.unwrap_or(0))
    }

    /// Line total: quantity × price-at-order.
    #[inline]
    pub fn total_price(&self) -> Money {
        self.price_at_order().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Bill
// =============================================================================

/// The immutable financial settlement of one closed [`Session`].
///
/// Created exactly once, only after the session closes; a UNIQUE
/// constraint on `session_id` backstops the one-to-one invariant.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Bill {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The settled session (one-to-one).
    pub session_id: String,

    /// Final amount: time cost + bar subtotal, rounded to whole cents.
    pub total_cents: i64,

    #[ts(as = "String")]
    pub closed_at: DateTime<Utc>,
}

impl Bill {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Shift
// =============================================================================

/// One operator work period bounding cash custody.
///
/// At most one shift system-wide is active at a time; the persistence
/// layer enforces this with a partial unique index.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shift {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The operator holding the drawer.
    pub operator_id: String,

    /// Cash float declared at open.
    pub opening_cash_cents: i64,

    /// Physically counted cash entered at close.
    pub closing_cash_cents: Option<i64>,

    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub end_time: Option<DateTime<Utc>>,

    pub is_active: bool,
}

impl Shift {
    /// Returns the opening cash as Money.
    #[inline]
    pub fn opening_cash(&self) -> Money {
        Money::from_cents(self.opening_cash_cents)
    }

    /// The aggregation window for this shift: closed shifts use their
    /// recorded end, open shifts use the provided clock reading as the
    /// provisional end boundary.
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start_time, self.end_time.unwrap_or(now))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn session_at(start: DateTime<Utc>, mode: BillingMode, prepaid: Option<i64>) -> Session {
        Session {
            id: "s1".to_string(),
            resource_id: "r1".to_string(),
            shift_id: "w1".to_string(),
            operator_id: "op".to_string(),
            mode,
            prepaid_minutes: prepaid,
            start_time: start,
            end_time: None,
            is_active: true,
        }
    }

    #[test]
    fn test_elapsed_never_negative() {
        let start = Utc::now();
        let session = session_at(start, BillingMode::Open, None);
        // A clock reading before start must not produce negative time
        assert_eq!(session.elapsed_seconds(start - Duration::seconds(30)), 0);
    }

    #[test]
    fn test_prepaid_limit() {
        let start = Utc::now();
        let session = session_at(start, BillingMode::Prepaid, Some(30));
        assert_eq!(session.prepaid_limit(), Some(start + Duration::minutes(30)));

        let open = session_at(start, BillingMode::Open, None);
        assert_eq!(open.prepaid_limit(), None);
    }

    #[test]
    fn test_item_total_price() {
        let item = SessionItem {
            id: "i1".to_string(),
            session_id: "s1".to_string(),
            product_id: "p1".to_string(),
            quantity: 3,
            price_at_order_cents: Some(250),
            created_at: Utc::now(),
        };
        assert_eq!(item.total_price().cents(), 750);
    }

    #[test]
    fn test_item_missing_snapshot_is_zero() {
        let item = SessionItem {
            id: "i1".to_string(),
            session_id: "s1".to_string(),
            product_id: "p1".to_string(),
            quantity: 5,
            price_at_order_cents: None,
            created_at: Utc::now(),
        };
        assert_eq!(item.total_price().cents(), 0);
    }

    #[test]
    fn test_product_can_sell_one() {
        let mut product = Product {
            id: "p1".to_string(),
            name: "Cola".to_string(),
            price_cents: 250,
            cost_cents: Some(120),
            stock: Some(1),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(product.can_sell_one());

        product.stock = Some(0);
        assert!(!product.can_sell_one());

        product.stock = None; // untracked never blocks
        assert!(product.can_sell_one());
    }

    #[test]
    fn test_shift_window_open_uses_now() {
        let start = Utc::now();
        let now = start + Duration::hours(3);
        let shift = Shift {
            id: "w1".to_string(),
            operator_id: "op".to_string(),
            opening_cash_cents: 100_000,
            closing_cash_cents: None,
            start_time: start,
            end_time: None,
            is_active: true,
        };
        assert_eq!(shift.window(now), (start, now));
    }
}
