//! # Cart Math
//!
//! Pure arithmetic over a session's retail lines.
//!
//! The stateful half of the cart — snapshotting prices, guarding stock,
//! deleting zero-quantity rows — lives in the persistence layer where it
//! can be transactional. This module only ever reads.

use crate::money::Money;
use crate::types::SessionItem;

/// Bar subtotal: sum of line totals over the session's items.
///
/// Missing price snapshots count as zero (see
/// [`SessionItem::total_price`]), so a cart with incomplete historical
/// rows still totals instead of failing.
pub fn bar_total(items: &[SessionItem]) -> Money {
    items
        .iter()
        .fold(Money::zero(), |acc, item| acc + item.total_price())
}

/// Total units across all lines.
pub fn total_quantity(items: &[SessionItem]) -> i64 {
    items.iter().map(|item| item.quantity).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(qty: i64, price_cents: Option<i64>) -> SessionItem {
        SessionItem {
            id: "i".to_string(),
            session_id: "s".to_string(),
            product_id: "p".to_string(),
            quantity: qty,
            price_at_order_cents: price_cents,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_bar_total() {
        let items = [item(2, Some(250)), item(1, Some(1_000))];
        assert_eq!(bar_total(&items).cents(), 1_500);
        assert_eq!(total_quantity(&items), 3);
    }

    #[test]
    fn test_empty_cart() {
        assert_eq!(bar_total(&[]).cents(), 0);
        assert_eq!(total_quantity(&[]), 0);
    }

    #[test]
    fn test_missing_snapshot_counts_as_zero() {
        let items = [item(4, None), item(1, Some(300))];
        assert_eq!(bar_total(&items).cents(), 300);
        assert_eq!(total_quantity(&items), 5);
    }
}
