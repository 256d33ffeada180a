//! # cue-core: Pure Billing Logic for Cue POS
//!
//! This crate is the **heart** of Cue POS, a point-of-sale for a venue
//! renting timed resources (billiard tables, console stations) with an
//! attached retail till. It contains the billing and reconciliation
//! logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cue POS Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Operator Terminal (external collaborator)          │   │
//! │  │    Dashboard ──► Session view ──► Close dialog ──► Receipt      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cue-db (services + SQLite)                   │   │
//! │  │    start_session, add_item, close_session, close_shift, ...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cue-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  pricing  │  │  report   │  │  receipt  │  │   │
//! │  │   │  Session  │  │ decision  │  │  drawer   │  │  snapshot │  │   │
//! │  │   │   Shift   │  │  table    │  │  math     │  │  hand-off │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK ACCESS • PURE FUNCTIONS      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Resource, Session, Shift, Bill, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - The billing decision table and time-cost math
//! - [`cart`] - Pure arithmetic over a session's retail lines
//! - [`report`] - Shift reconciliation derivations
//! - [`receipt`] - Immutable snapshot handed to the printer collaborator
//! - [`error`] - Domain error types (four-kind taxonomy)
//! - [`validation`] - Save-time input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic - same input = same output
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **No Clock Access**: every time-dependent function takes an explicit
//!    clock reading, so any bill is reproducible after the fact
//! 4. **Integer Money**: all monetary values are cents (i64); rounding
//!    happens once, at the final persisted total
//!
//! ## Example Usage
//!
//! ```rust
//! use cue_core::pricing::{billed_seconds, time_cost};
//! use cue_core::types::BillingMode;
//!
//! // A guest prepaid 30 minutes on a 600.00/hour table and stayed 45.
//! // The operator decides at close whether the overtime is charged:
//! let lenient = billed_seconds(BillingMode::Prepaid, 45 * 60, Some(30), false);
//! assert_eq!(time_cost(60_000, lenient).cents(), 30_000); // 300.00
//!
//! let strict = billed_seconds(BillingMode::Prepaid, 45 * 60, Some(30), true);
//! assert_eq!(time_cost(60_000, strict).cents(), 45_000); // 450.00
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod receipt;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use cue_core::Money` instead of
// `use cue_core::money::Money`

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use pricing::{PrepaidStatus, Quote, Settlement};
pub use receipt::{NullPrinter, ReceiptPrinter, ReceiptSnapshot};
pub use report::{ProductBreakdown, ResourceBreakdown, ShiftReport, ShiftTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum prepaid minutes a session may hold, extensions included.
///
/// ## Business Reason
/// Catches typos (3000 instead of 30) before they freeze a table for
/// two days. One full day is far beyond any real prepaid purchase.
pub const MAX_PREPAID_MINUTES: i64 = 24 * 60;
