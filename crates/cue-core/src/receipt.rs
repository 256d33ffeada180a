//! # Receipt Snapshot
//!
//! The immutable hand-off to the receipt-printing collaborator.
//!
//! The core gives the printer a frozen copy of everything a 58mm ticket
//! needs and then forgets about it: a print failure is the printer's
//! problem and must never block or roll back a session close or bill
//! creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::types::{Resource, Session, SessionItem};

// =============================================================================
// Snapshot
// =============================================================================

/// One printable line: a retail item on the ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub line_total_cents: i64,
}

/// Everything the printing collaborator gets. Built once, at hand-off;
/// later catalog or session edits cannot reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSnapshot {
    pub resource_name: String,

    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,

    /// None for a provisional (pre-close) ticket.
    #[ts(as = "Option<String>")]
    pub end_time: Option<DateTime<Utc>>,

    pub lines: Vec<ReceiptLine>,

    pub grand_total_cents: i64,

    pub duration_minutes: i64,
}

impl ReceiptSnapshot {
    /// Captures a snapshot for a session.
    ///
    /// `product_names` pairs positionally with `items` (the persistence
    /// layer resolves names; items only carry product ids).
    pub fn capture(
        session: &Session,
        resource: &Resource,
        items: &[SessionItem],
        product_names: &[String],
        grand_total_cents: i64,
        as_of: DateTime<Utc>,
    ) -> Self {
        let lines = items
            .iter()
            .zip(product_names.iter())
            .map(|(item, name)| ReceiptLine {
                name: name.clone(),
                quantity: item.quantity,
                line_total_cents: item.total_price().cents(),
            })
            .collect();

        let end = session.end_time;
        let duration_minutes = match end {
            Some(end) => (end - session.start_time).num_seconds().max(0) / 60,
            None => session.elapsed_minutes(as_of),
        };

        ReceiptSnapshot {
            resource_name: resource.name.clone(),
            start_time: session.start_time,
            end_time: end,
            lines,
            grand_total_cents,
            duration_minutes,
        }
    }

    /// Whether this ticket is provisional (session still running).
    pub fn is_provisional(&self) -> bool {
        self.end_time.is_none()
    }

    /// Bar portion of the ticket, recomputed from the frozen lines.
    pub fn lines_total_cents(&self) -> i64 {
        self.lines.iter().map(|line| line.line_total_cents).sum()
    }
}

// =============================================================================
// Printer Boundary
// =============================================================================

/// Printing failed. Carried back for logging only; callers never treat
/// this as fatal.
#[derive(Debug, Error)]
#[error("receipt printing failed: {0}")]
pub struct PrintError(pub String);

/// The printing collaborator's seam.
///
/// Implementations talk ESC/POS over the network or hand the ticket to
/// a native spooler; the core does not care which, or whether it worked.
pub trait ReceiptPrinter: Send + Sync {
    fn print(&self, receipt: &ReceiptSnapshot) -> Result<(), PrintError>;
}

/// A printer that prints nothing. Default for tests and headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPrinter;

impl ReceiptPrinter for NullPrinter {
    fn print(&self, _receipt: &ReceiptSnapshot) -> Result<(), PrintError> {
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BillingMode, ResourceCategory};
    use chrono::Duration;

    fn fixtures() -> (Session, Resource, Vec<SessionItem>, Vec<String>) {
        let start = Utc::now();
        let session = Session {
            id: "s1".to_string(),
            resource_id: "r1".to_string(),
            shift_id: "w1".to_string(),
            operator_id: "op".to_string(),
            mode: BillingMode::Open,
            prepaid_minutes: None,
            start_time: start,
            end_time: Some(start + Duration::minutes(90)),
            is_active: false,
        };
        let resource = Resource {
            id: "r1".to_string(),
            name: "Table 2".to_string(),
            category: ResourceCategory::Billiard,
            rate_cents_per_hour: 60_000,
            is_active: true,
            created_at: start,
            updated_at: start,
        };
        let items = vec![SessionItem {
            id: "i1".to_string(),
            session_id: "s1".to_string(),
            product_id: "p1".to_string(),
            quantity: 2,
            price_at_order_cents: Some(250),
            created_at: start,
        }];
        (session, resource, items, vec!["Cola".to_string()])
    }

    #[test]
    fn test_capture_closed_session() {
        let (session, resource, items, names) = fixtures();
        let snapshot =
            ReceiptSnapshot::capture(&session, &resource, &items, &names, 90_500, Utc::now());

        assert_eq!(snapshot.resource_name, "Table 2");
        assert_eq!(snapshot.duration_minutes, 90);
        assert!(!snapshot.is_provisional());
        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines[0].name, "Cola");
        assert_eq!(snapshot.lines[0].line_total_cents, 500);
        assert_eq!(snapshot.lines_total_cents(), 500);
        assert_eq!(snapshot.grand_total_cents, 90_500);
    }

    #[test]
    fn test_capture_running_session_is_provisional() {
        let (mut session, resource, items, names) = fixtures();
        session.end_time = None;
        session.is_active = true;

        let as_of = session.start_time + Duration::minutes(12);
        let snapshot = ReceiptSnapshot::capture(&session, &resource, &items, &names, 500, as_of);

        assert!(snapshot.is_provisional());
        assert_eq!(snapshot.duration_minutes, 12);
    }

    #[test]
    fn test_null_printer_always_succeeds() {
        let (session, resource, items, names) = fixtures();
        let snapshot =
            ReceiptSnapshot::capture(&session, &resource, &items, &names, 1_000, Utc::now());
        assert!(NullPrinter.print(&snapshot).is_ok());
    }
}
