//! # cue-db: Database Layer + Operation Surface for Cue POS
//!
//! This crate provides persistence and the operator-facing operations
//! for the Cue POS system. It uses SQLite for local storage with sqlx
//! for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cue POS Data Flow                                │
//! │                                                                         │
//! │  External caller (terminal UI / admin screen)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      cue-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   service     │    │  repository   │    │  Migrations  │  │   │
//! │  │   │ (operations)  │───►│ (SQL per      │    │  (embedded)  │  │   │
//! │  │   │ start, close, │    │  aggregate)   │    │ 001_init.sql │  │   │
//! │  │   │ reconcile ... │    │               │    │              │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           │ billing math       │ SqlitePool                   │   │
//! │  │           ▼                    ▼                               │   │
//! │  │        cue-core            SQLite (WAL)                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (resource, product, session, shift)
//! - [`service`] - The operation surface: every operator action as one function
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cue_db::{Database, DbConfig};
//! use cue_db::service::{catalog, session, shift};
//! use cue_core::NullPrinter;
//!
//! let db = Database::new(DbConfig::new("path/to/cue.db")).await?;
//!
//! let opened = shift::open_shift(&db, "operator-1", 100_000).await?;
//! let started = session::start_session(&db, input).await?;
//! let closed = session::close_session(&db, &NullPrinter, &started.id, false).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};
pub use service::{ErrorCode, ErrorPayload, ServiceError, ServiceResult};

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::resource::ResourceRepository;
pub use repository::session::SessionRepository;
pub use repository::shift::ShiftRepository;
