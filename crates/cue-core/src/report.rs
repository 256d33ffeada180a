//! # Shift Report
//!
//! Derivations for shift reconciliation. The persistence layer supplies
//! raw sums over the shift window; everything money-derived happens here
//! where it can be unit-tested without a database.
//!
//! ## The Reconciliation Identity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total_revenue  = Σ Bill.total         (bills closed in the window)    │
//! │  bar_revenue    = Σ qty × price_at_order  (items of those bills)       │
//! │  bar_cost       = Σ qty × cost_basis      (missing cost → 0)           │
//! │                                                                         │
//! │  bar_profit     = bar_revenue − bar_cost                               │
//! │  time_revenue   = total_revenue − bar_revenue                          │
//! │  expected_cash  = opening_cash + total_revenue                         │
//! │  discrepancy    = counted_cash − expected_cash   (signed, unclamped:   │
//! │                   positive = drawer over, negative = short)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The window is closed and inclusive on both ends so a bill closed at
//! the exact shift boundary is counted exactly once across adjacent
//! shifts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Raw Aggregates
// =============================================================================

/// Sums the persistence layer extracts over a shift window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTotals {
    /// Sum of Bill.total over bills closed in the window.
    pub total_revenue_cents: i64,

    /// Sum of quantity × price_at_order over items of those bills.
    pub bar_revenue_cents: i64,

    /// Sum of quantity × product cost basis (missing cost counts as 0).
    pub bar_cost_cents: i64,

    /// Sum of item quantities.
    pub items_count: i64,
}

// =============================================================================
// Breakdown Rows
// =============================================================================

/// Per-product line of the shift analytics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductBreakdown {
    pub name: String,
    pub quantity: i64,
    pub revenue_cents: i64,
    pub cost_cents: i64,
    /// revenue − cost for this product.
    pub profit_cents: i64,
}

/// Per-resource line: how much each table/console earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ResourceBreakdown {
    pub name: String,
    pub revenue_cents: i64,
}

// =============================================================================
// Shift Report
// =============================================================================

/// The financial report of one shift window.
///
/// Callable mid-shift (provisional end = now, no discrepancy yet) or at
/// close (recorded end, counted cash, signed discrepancy).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftReport {
    pub shift_id: String,

    #[ts(as = "String")]
    pub window_start: DateTime<Utc>,

    #[ts(as = "String")]
    pub window_end: DateTime<Utc>,

    pub opening_cash_cents: i64,

    pub total_revenue_cents: i64,
    pub bar_revenue_cents: i64,
    pub bar_cost_cents: i64,
    pub items_count: i64,

    /// bar_revenue − bar_cost.
    pub bar_profit_cents: i64,

    /// total_revenue − bar_revenue: everything not attributable to
    /// retail is attributed to occupancy time.
    pub time_revenue_cents: i64,

    /// opening_cash + total_revenue.
    pub expected_cash_cents: i64,

    /// Counted cash at close. None while the shift is still open.
    pub counted_cash_cents: Option<i64>,

    /// counted − expected. Signed, never clamped. None until counted.
    pub discrepancy_cents: Option<i64>,

    pub products: Vec<ProductBreakdown>,
    pub resources: Vec<ResourceBreakdown>,
}

impl ShiftReport {
    /// Assembles a report from raw aggregates.
    ///
    /// `counted_cash_cents` is the operator's physical count; pass None
    /// for a mid-shift (provisional) report.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        shift_id: impl Into<String>,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        opening_cash_cents: i64,
        totals: ShiftTotals,
        counted_cash_cents: Option<i64>,
        products: Vec<ProductBreakdown>,
        resources: Vec<ResourceBreakdown>,
    ) -> Self {
        let expected = opening_cash_cents + totals.total_revenue_cents;

        ShiftReport {
            shift_id: shift_id.into(),
            window_start,
            window_end,
            opening_cash_cents,
            total_revenue_cents: totals.total_revenue_cents,
            bar_revenue_cents: totals.bar_revenue_cents,
            bar_cost_cents: totals.bar_cost_cents,
            items_count: totals.items_count,
            bar_profit_cents: totals.bar_revenue_cents - totals.bar_cost_cents,
            time_revenue_cents: totals.total_revenue_cents - totals.bar_revenue_cents,
            expected_cash_cents: expected,
            counted_cash_cents,
            discrepancy_cents: counted_cash_cents.map(|counted| counted - expected),
            products,
            resources,
        }
    }

    /// Returns the discrepancy as Money, if the drawer has been counted.
    pub fn discrepancy(&self) -> Option<Money> {
        self.discrepancy_cents.map(Money::from_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(total: i64, bar_rev: i64, bar_cost: i64, count: i64) -> ShiftTotals {
        ShiftTotals {
            total_revenue_cents: total,
            bar_revenue_cents: bar_rev,
            bar_cost_cents: bar_cost,
            items_count: count,
        }
    }

    // Scenario: opened with 1000.00; bills totaling 250.00 closed in the
    // window; operator counts 1250.00 → discrepancy 0; counts 1200.00 → -50.00.
    #[test]
    fn test_drawer_reconciliation() {
        let now = Utc::now();
        let exact = ShiftReport::assemble(
            "w1",
            now,
            now,
            100_000,
            totals(25_000, 0, 0, 0),
            Some(125_000),
            vec![],
            vec![],
        );
        assert_eq!(exact.expected_cash_cents, 125_000);
        assert_eq!(exact.discrepancy_cents, Some(0));

        let short = ShiftReport::assemble(
            "w1",
            now,
            now,
            100_000,
            totals(25_000, 0, 0, 0),
            Some(120_000),
            vec![],
            vec![],
        );
        assert_eq!(short.discrepancy_cents, Some(-5_000)); // drawer short
        assert!(short.discrepancy().unwrap().is_negative());
    }

    #[test]
    fn test_revenue_split_and_margin() {
        let now = Utc::now();
        let report = ShiftReport::assemble(
            "w1",
            now,
            now,
            50_000,
            totals(80_000, 30_000, 12_000, 14),
            None,
            vec![],
            vec![],
        );

        assert_eq!(report.bar_profit_cents, 18_000);
        assert_eq!(report.time_revenue_cents, 50_000);
        assert_eq!(report.expected_cash_cents, 130_000);
        // Mid-shift report: drawer not counted yet
        assert_eq!(report.counted_cash_cents, None);
        assert_eq!(report.discrepancy_cents, None);
    }

    #[test]
    fn test_empty_window() {
        let now = Utc::now();
        let report = ShiftReport::assemble(
            "w1",
            now,
            now,
            100_000,
            ShiftTotals::default(),
            Some(100_000),
            vec![],
            vec![],
        );
        assert_eq!(report.expected_cash_cents, 100_000);
        assert_eq!(report.discrepancy_cents, Some(0));
    }
}
