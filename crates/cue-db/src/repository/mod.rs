//! # Repository Layer
//!
//! One repository per aggregate, each owning its table's SQL.
//!
//! Pool-bound repository structs cover reads and standalone writes.
//! The multi-statement billing flows (add item, close session, close
//! shift) are built by the service layer from the `pub(crate)`
//! transaction helpers each module also exposes, so that every
//! check-then-write runs inside one SQLite write transaction.

pub mod product;
pub mod resource;
pub mod session;
pub mod shift;

use uuid::Uuid;

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
