//! # Service Layer
//!
//! The operation surface of Cue POS: every operator action is one
//! async function here, returning a plain result value or a typed
//! failure reason. This is the boundary external callers (terminal
//! UI, admin screens) talk to; nothing above it touches SQL, nothing
//! below it formats text for humans.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  session::start_session      occupy a free resource (needs a shift)    │
//! │  session::extend_prepaid     top up purchased minutes in place         │
//! │  session::add_item           cart add, stock-guarded, price snapshot   │
//! │  session::remove_one_unit    cart remove, stock restore if tracked     │
//! │  session::session_status     live quote: elapsed, cost, countdown      │
//! │  session::close_session      THE commit point: bill + receipt          │
//! │  session::bill_summary       settled bill with time/bar breakdown      │
//! │                                                                         │
//! │  shift::open_shift           declare a float, take the drawer          │
//! │  shift::shift_report         window aggregates, mid-shift or final     │
//! │  shift::close_shift          reconcile the drawer, signed discrepancy  │
//! │                                                                         │
//! │  catalog::*                  resource/product CRUD + dashboard         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod session;
pub mod shift;

use serde::Serialize;
use thiserror::Error;

use crate::error::DbError;
use cue_core::{CoreError, ErrorKind};

// =============================================================================
// Service Error
// =============================================================================

/// Failure reason returned by every service operation.
///
/// Domain failures arrive as [`CoreError`] (already classified into the
/// four-kind taxonomy); infrastructure failures as [`DbError`]. Both
/// serialize to the same `{code, message}` payload for the caller.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A business rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The database itself failed (not a rule violation).
    #[error("database error: {0}")]
    Db(DbError),
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            // A missing row is a domain outcome, not an infrastructure one
            DbError::NotFound { entity, id } => {
                ServiceError::Core(CoreError::NotFound { entity, id })
            }
            other => ServiceError::Db(other),
        }
    }
}

/// Machine-readable error codes for the presentation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Reference to a nonexistent entity (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// An invariant would be violated (409)
    Conflict,

    /// Insufficient inventory
    OutOfStock,

    /// Database operation failed (500)
    DatabaseError,
}

impl ServiceError {
    /// The machine-readable code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Core(err) => match err.kind() {
                ErrorKind::Validation => ErrorCode::ValidationError,
                ErrorKind::Conflict => ErrorCode::Conflict,
                ErrorKind::NotFound => ErrorCode::NotFound,
                ErrorKind::Stock => ErrorCode::OutOfStock,
            },
            ServiceError::Db(_) => ErrorCode::DatabaseError,
        }
    }

    /// Serializable payload for the caller.
    pub fn to_payload(&self) -> ErrorPayload {
        let message = match self {
            // Infrastructure detail goes to the log, not the operator
            ServiceError::Db(err) => {
                tracing::error!("database failure: {err}");
                "database operation failed".to_string()
            }
            other => other.to_string(),
        };

        ErrorPayload {
            code: self.code(),
            message,
        }
    }
}

/// What the presentation collaborator receives when an operation fails.
///
/// ```json
/// { "code": "CONFLICT", "message": "resource r-17 already has an active session" }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = ServiceError::Core(CoreError::ShiftAlreadyActive);
        assert_eq!(err.code(), ErrorCode::Conflict);

        let err = ServiceError::Core(CoreError::OutOfStock {
            product: "Cola".to_string(),
        });
        assert_eq!(err.code(), ErrorCode::OutOfStock);

        let err: ServiceError = DbError::not_found("Resource", "r1").into();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let err: ServiceError = DbError::PoolExhausted.into();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
    }

    #[test]
    fn test_db_payload_hides_detail() {
        let err: ServiceError = DbError::QueryFailed("syntax error near SELECT".to_string()).into();
        let payload = err.to_payload();
        assert_eq!(payload.message, "database operation failed");
    }
}
