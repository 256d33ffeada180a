//! # Error Types
//!
//! Domain-specific error types for cue-core.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Taxonomy                                  │
//! │                                                                         │
//! │  Every core failure is one of four operator-correctable kinds:         │
//! │                                                                         │
//! │  Validation  - malformed input        → "enter a valid number"         │
//! │  Conflict    - invariant would break  → "pick a different table"       │
//! │  NotFound    - dangling reference     → "that product is gone"         │
//! │  Stock       - insufficient inventory → "out of stock"                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → presentation       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (entity, id)
//! 3. Errors are enum variants, never String
//! 4. Nothing is swallowed: every kind reaches the caller

use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// The four-way classification every core error folds into. The
/// presentation collaborator switches on this to phrase operator
/// messages; the variants below carry the detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Stock,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent invariant protections and domain rule violations.
/// Each maps to an operator-facing message upstream.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Reference to an entity that does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Tracked stock is exhausted.
    ///
    /// Only raised for stock-tracked products; untracked stock never
    /// blocks a sale.
    #[error("{product} is out of stock")]
    OutOfStock { product: String },

    /// The resource already has an active session.
    #[error("resource {resource} already has an active session")]
    ResourceOccupied { resource: String },

    /// Mutation attempted on a session that is no longer active.
    ///
    /// Covers item adds/removes, prepaid extension, and double-close:
    /// a second close finds the session inactive and lands here, which
    /// is what keeps Session↔Bill one-to-one.
    #[error("session {session} is closed")]
    SessionClosed { session: String },

    /// A shift is already active system-wide.
    #[error("a shift is already active")]
    ShiftAlreadyActive,

    /// No shift is active; sessions cannot exist outside one.
    #[error("no active shift")]
    NoActiveShift,

    /// The shift is already closed.
    #[error("shift {shift} is not active")]
    ShiftNotActive { shift: String },

    /// Open sessions block drawer reconciliation.
    #[error("{count} session(s) still active; close all sessions before closing the shift")]
    OpenSessionsRemain { count: i64 },

    /// A bill already exists for this session.
    #[error("session {session} is already billed")]
    AlreadyBilled { session: String },

    /// The operation only applies to prepaid sessions.
    #[error("session {session} is not prepaid")]
    NotPrepaid { session: String },

    /// Catalog entry is referenced by history and cannot be deleted.
    #[error("{entity} {id} is referenced by existing sessions")]
    ReferencedByHistory { entity: String, id: String },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Folds this error into the four-way taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::OutOfStock { .. } => ErrorKind::Stock,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::ResourceOccupied { .. }
            | CoreError::SessionClosed { .. }
            | CoreError::ShiftAlreadyActive
            | CoreError::NoActiveShift
            | CoreError::ShiftNotActive { .. }
            | CoreError::OpenSessionsRemain { .. }
            | CoreError::AlreadyBilled { .. }
            | CoreError::NotPrepaid { .. }
            | CoreError::ReferencedByHistory { .. } => ErrorKind::Conflict,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when operator input doesn't meet requirements, before
/// any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Field is not allowed in this context (e.g. prepaid minutes on an
    /// open-mode session).
    #[error("{field} is not allowed: {reason}")]
    NotAllowed { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::OutOfStock {
            product: "Cola 0.5l".to_string(),
        };
        assert_eq!(err.to_string(), "Cola 0.5l is out of stock");

        let err = CoreError::OpenSessionsRemain { count: 3 };
        assert_eq!(
            err.to_string(),
            "3 session(s) still active; close all sessions before closing the shift"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            CoreError::not_found("Resource", "r1").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::OutOfStock {
                product: "x".to_string()
            }
            .kind(),
            ErrorKind::Stock
        );
        assert_eq!(CoreError::ShiftAlreadyActive.kind(), ErrorKind::Conflict);
        assert_eq!(
            CoreError::Validation(ValidationError::MustBePositive {
                field: "prepaid minutes".to_string()
            })
            .kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
