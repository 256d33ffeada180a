//! # Pricing Engine
//!
//! Pure functions converting (hourly rate, elapsed time, billing mode)
//! into a monetary time cost. No side effects, no clock access: every
//! function takes an explicit clock reading.
//!
//! ## The Billing Decision Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              What time does a session pay for?                          │
//! │                                                                         │
//! │  mode     │ while ACTIVE (quote)      │ at CLOSE (settlement)          │
//! │  ─────────┼───────────────────────────┼─────────────────────────────── │
//! │  OPEN     │ actual elapsed seconds    │ actual elapsed seconds         │
//! │  PREPAID  │ purchased minutes, frozen │ charge_overtime = false:       │
//! │           │ (overtime shown, not      │   purchased minutes            │
//! │           │  charged)                 │ charge_overtime = true:        │
//! │           │                           │   actual elapsed seconds       │
//! │                                                                         │
//! │  charge_overtime is supplied exactly once, at close, and is            │
//! │  irreversible. It exists for the guest who bought 30 minutes and       │
//! │  stayed 45.                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Precision
//! Time cost is `rate × seconds ÷ 3600` computed in i128 and rounded
//! half-up to whole cents exactly once. Billing by the second means a
//! session open for 30 seconds already shows a nonzero cost instead of
//! rounding down to nothing.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{BillingMode, Resource, Session, SessionItem};
use chrono::{DateTime, Utc};

/// Seconds per billing hour.
const SECONDS_PER_HOUR: i64 = 3600;

// =============================================================================
// Time Cost
// =============================================================================

/// Seconds a session pays for, per the decision table above.
///
/// `prepaid_minutes` is only consulted for PREPAID mode; a missing value
/// (which the lifecycle layer prevents) bills zero seconds rather than
/// guessing.
pub fn billed_seconds(
    mode: BillingMode,
    elapsed_seconds: i64,
    prepaid_minutes: Option<i64>,
    charge_overtime: bool,
) -> i64 {
    match (mode, charge_overtime) {
        (BillingMode::Open, _) => elapsed_seconds,
        (BillingMode::Prepaid, true) => elapsed_seconds,
        (BillingMode::Prepaid, false) => prepaid_minutes.unwrap_or(0) * 60,
    }
}

/// Converts billed seconds at an hourly rate into a cost.
///
/// ## Precision
/// `rate_cents_per_hour × seconds` can exceed i64 for pathological
/// inputs, so the product is taken in i128. The `+ 1800` term rounds
/// half-up on the division by 3600; this is the single rounding step
/// in a bill's time component.
///
/// ## Example
/// ```rust
/// use cue_core::pricing::time_cost;
///
/// // 600.00/hour for 90 seconds → 15.00
/// assert_eq!(time_cost(60_000, 90).cents(), 1_500);
///
/// // 600.00/hour for 30 seconds → 5.00 (nonzero!)
/// assert_eq!(time_cost(60_000, 30).cents(), 500);
/// ```
///
/// Assumes validated inputs: rates are checked positive at resource
/// save time, so there is no fallible path here.
pub fn time_cost(rate_cents_per_hour: i64, billed_seconds: i64) -> Money {
    let cents = (rate_cents_per_hour as i128 * billed_seconds as i128 + 1800) / 3600;
    Money::from_cents(cents as i64)
}

// =============================================================================
// Prepaid Status
// =============================================================================

/// Derived countdown state of a prepaid session, for dashboards and
/// alerting. Never affects the price while the session is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PrepaidStatus {
    /// Seconds until the purchased allowance runs out (0 once past it).
    pub remaining_seconds: i64,

    /// Whether the wall clock is past the purchased allowance.
    pub is_overtime: bool,

    /// Whole minutes past the allowance (0 while within it).
    pub overtime_minutes: i64,
}

/// Computes the countdown state for a session at the given clock
/// reading. Returns None for OPEN sessions, which have no limit.
pub fn prepaid_status(session: &Session, now: DateTime<Utc>) -> Option<PrepaidStatus> {
    let limit = session.prepaid_limit()?;
    let prepaid_minutes = session.prepaid_minutes.unwrap_or(0);
    let remaining_seconds = (limit - now).num_seconds().max(0);
    let is_overtime = now >= limit;
    let overtime_minutes = (session.elapsed_minutes(now) - prepaid_minutes).max(0);

    Some(PrepaidStatus {
        remaining_seconds,
        is_overtime,
        overtime_minutes,
    })
}

// =============================================================================
// Quote (live, provisional)
// =============================================================================

/// A provisional price for a session that is still running.
///
/// Recomputed freshly from stored state and the wall clock on every
/// read; nothing is persisted until close.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Whole elapsed minutes, for display.
    pub duration_minutes: i64,

    /// Provisional time component.
    pub time_cost_cents: i64,

    /// Bar subtotal over current items.
    pub bar_total_cents: i64,

    /// time + bar.
    pub grand_total_cents: i64,

    /// Countdown state for PREPAID sessions.
    pub prepaid: Option<PrepaidStatus>,
}

/// Prices a running session at the given clock reading.
///
/// OPEN sessions accrue by the second; PREPAID sessions stay frozen at
/// the purchased quantity no matter how long the guest has stayed.
pub fn quote(
    session: &Session,
    resource: &Resource,
    items: &[SessionItem],
    now: DateTime<Utc>,
) -> Quote {
    let elapsed = session.elapsed_seconds(now);
    // A running quote never charges overtime; that choice only exists at close.
    let seconds = billed_seconds(session.mode, elapsed, session.prepaid_minutes, false);
    let time = time_cost(resource.rate_cents_per_hour, seconds);
    let bar = crate::cart::bar_total(items);

    Quote {
        duration_minutes: session.elapsed_minutes(now),
        time_cost_cents: time.cents(),
        bar_total_cents: bar.cents(),
        grand_total_cents: (time + bar).cents(),
        prepaid: prepaid_status(session, now),
    }
}

// =============================================================================
// Settlement (at close)
// =============================================================================

/// The final, immutable pricing outcome of a session close.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    /// Seconds actually billed, per the decision table.
    pub billed_seconds: i64,

    /// Time component of the bill.
    pub time_cost_cents: i64,

    /// Bar subtotal over the session's items.
    pub bar_total_cents: i64,

    /// The bill total: time + bar.
    pub grand_total_cents: i64,
}

impl Settlement {
    /// Returns the grand total as Money.
    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }
}

/// Settles a session at close time.
///
/// `charge_overtime` is the operator's one-shot choice for PREPAID
/// sessions (ignored for OPEN); `closed_at` is the instant being
/// stamped as the session's end.
pub fn settle(
    session: &Session,
    resource: &Resource,
    items: &[SessionItem],
    closed_at: DateTime<Utc>,
    charge_overtime: bool,
) -> Settlement {
    let elapsed = session.elapsed_seconds(closed_at);
    let seconds = billed_seconds(
        session.mode,
        elapsed,
        session.prepaid_minutes,
        charge_overtime,
    );
    let time = time_cost(resource.rate_cents_per_hour, seconds);
    let bar = crate::cart::bar_total(items);

    Settlement {
        billed_seconds: seconds,
        time_cost_cents: time.cents(),
        bar_total_cents: bar.cents(),
        grand_total_cents: (time + bar).cents(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceCategory;
    use chrono::Duration;

    fn resource(rate_cents: i64) -> Resource {
        Resource {
            id: "r1".to_string(),
            name: "Table 1".to_string(),
            category: ResourceCategory::Billiard,
            rate_cents_per_hour: rate_cents,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn session(mode: BillingMode, prepaid: Option<i64>, start: DateTime<Utc>) -> Session {
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

    fn item(qty: i64, price_cents: i64) -> SessionItem {
        SessionItem {
            id: "i1".to_string(),
            session_id: "s1".to_string(),
            product_id: "p1".to_string(),
            quantity: qty,
            price_at_order_cents: Some(price_cents),
            created_at: Utc::now(),
        }
    }

    // Scenario: rate 600.00/hour, OPEN, closed after 90 seconds, no items.
    #[test]
    fn test_open_session_sub_minute_precision() {
        let start = Utc::now();
        let s = session(BillingMode::Open, None, start);
        let settlement = settle(
            &s,
            &resource(60_000),
            &[],
            start + Duration::seconds(90),
            false,
        );

        assert_eq!(settlement.billed_seconds, 90);
        assert_eq!(settlement.time_cost_cents, 1_500); // 15.00
        assert_eq!(settlement.grand_total_cents, 1_500);
    }

    #[test]
    fn test_open_thirty_seconds_is_nonzero() {
        assert_eq!(time_cost(60_000, 30).cents(), 500);
        // Even a single second bills something at this rate
        assert_eq!(time_cost(60_000, 1).cents(), 17); // 16.67 rounds up
    }

    // Scenario: PREPAID 30 min at 600.00/hour, closed at 45 min elapsed,
    // charge_overtime = false → billed 30 min → 300.00.
    #[test]
    fn test_prepaid_close_without_overtime_charge() {
        let start = Utc::now();
        let s = session(BillingMode::Prepaid, Some(30), start);
        let settlement = settle(
            &s,
            &resource(60_000),
            &[],
            start + Duration::minutes(45),
            false,
        );

        assert_eq!(settlement.billed_seconds, 30 * 60);
        assert_eq!(settlement.time_cost_cents, 30_000); // 300.00
    }

    // Scenario: same session, charge_overtime = true → billed 45 min → 450.00.
    #[test]
    fn test_prepaid_close_charging_overtime() {
        let start = Utc::now();
        let s = session(BillingMode::Prepaid, Some(30), start);
        let settlement = settle(
            &s,
            &resource(60_000),
            &[],
            start + Duration::minutes(45),
            true,
        );

        assert_eq!(settlement.billed_seconds, 45 * 60);
        assert_eq!(settlement.time_cost_cents, 45_000); // 450.00
    }

    #[test]
    fn test_settlement_includes_bar_total() {
        let start = Utc::now();
        let s = session(BillingMode::Open, None, start);
        let items = [item(2, 250), item(1, 1_000)];
        let settlement = settle(
            &s,
            &resource(60_000),
            &items,
            start + Duration::minutes(60),
            false,
        );

        assert_eq!(settlement.time_cost_cents, 60_000);
        assert_eq!(settlement.bar_total_cents, 1_500);
        assert_eq!(settlement.grand_total_cents, 61_500);
    }

    #[test]
    fn test_quote_prepaid_stays_frozen_past_limit() {
        let start = Utc::now();
        let s = session(BillingMode::Prepaid, Some(30), start);
        // 45 minutes in: the quote still bills exactly the purchased 30
        let q = quote(&s, &resource(60_000), &[], start + Duration::minutes(45));

        assert_eq!(q.time_cost_cents, 30_000);
        let prepaid = q.prepaid.expect("prepaid session has countdown state");
        assert!(prepaid.is_overtime);
        assert_eq!(prepaid.remaining_seconds, 0);
        assert_eq!(prepaid.overtime_minutes, 15);
    }

    #[test]
    fn test_quote_prepaid_countdown_within_limit() {
        let start = Utc::now();
        let s = session(BillingMode::Prepaid, Some(30), start);
        let q = quote(&s, &resource(60_000), &[], start + Duration::minutes(10));

        let prepaid = q.prepaid.unwrap();
        assert!(!prepaid.is_overtime);
        assert_eq!(prepaid.remaining_seconds, 20 * 60);
        assert_eq!(prepaid.overtime_minutes, 0);
    }

    #[test]
    fn test_quote_open_has_no_countdown() {
        let start = Utc::now();
        let s = session(BillingMode::Open, None, start);
        let q = quote(&s, &resource(60_000), &[], start + Duration::minutes(10));

        assert!(q.prepaid.is_none());
        assert_eq!(q.duration_minutes, 10);
        assert_eq!(q.time_cost_cents, 10_000);
    }

    #[test]
    fn test_decision_table_exhaustive() {
        // OPEN ignores the flag entirely
        assert_eq!(billed_seconds(BillingMode::Open, 100, None, false), 100);
        assert_eq!(billed_seconds(BillingMode::Open, 100, Some(30), true), 100);
        // PREPAID honors the flag
        assert_eq!(
            billed_seconds(BillingMode::Prepaid, 2700, Some(30), false),
            1800
        );
        assert_eq!(
            billed_seconds(BillingMode::Prepaid, 2700, Some(30), true),
            2700
        );
    }

    #[test]
    fn test_rounding_happens_once() {
        // 100.01/hour for 59 seconds: 10001 * 59 / 3600 = 163.90...
        // A per-minute pre-round would give 10001/60 = 166.68 → 167 * ... drift.
        assert_eq!(time_cost(10_001, 59).cents(), 164);
    }

    #[test]
    fn test_zero_rate_zero_seconds() {
        assert_eq!(time_cost(60_000, 0).cents(), 0);
        assert_eq!(time_cost(0, 3600).cents(), 0);
    }
}
