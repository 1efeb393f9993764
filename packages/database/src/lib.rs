#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report storage for alert-front.
//!
//! The [`ReportStore`] trait is the seam the HTTP server, the mass-alert
//! dispatcher and the cleanup sweep talk to. Two implementations ship:
//!
//! - [`DatabaseReportStore`] over `switchy_database` (`PostgreSQL` or
//!   `SQLite`), using raw SQL via `query_raw_params()`.
//! - [`MemoryReportStore`], a `BTreeMap` behind a `tokio` lock, used for
//!   tests and throwaway local runs.
//!
//! Both delegate status changes to
//! [`Report::apply_status`](alert_front_report_models::Report::apply_status),
//! so the forward-only lifecycle is enforced at the store layer regardless
//! of backend.

pub mod cleanup;
pub mod db;
pub mod memory;
pub mod queries;
pub mod schema;
pub mod store;

use std::sync::Arc;

use alert_front_report_models::InvalidTransitionError;

pub use memory::MemoryReportStore;
pub use store::{DatabaseReportStore, ReportFilter, ReportStore};

/// `DATABASE_URL` value selecting the in-memory store.
pub const MEMORY_URL: &str = "memory";

/// Default `DATABASE_URL` when none is configured.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/alert_front.db";

/// Errors that can occur during report store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Opening the database failed.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of what went wrong.
        message: String,
    },

    /// A stored row could not be turned into a report.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// No report with the given id.
    #[error("Report not found: {id}")]
    NotFound {
        /// The requested id.
        id: String,
    },

    /// The requested status change would move the report backwards.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransitionError),

    /// The report changed between read and write.
    #[error("Report {id} was modified concurrently")]
    Conflict {
        /// The contended id.
        id: String,
    },

    /// Filesystem error while preparing a `SQLite` path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opens the report store selected by `url`.
///
/// `memory` selects [`MemoryReportStore`]; anything else is handed to
/// [`db::connect`] and wrapped in a [`DatabaseReportStore`] after the
/// schema has been ensured.
///
/// # Errors
///
/// Returns [`StoreError`] if the connection or schema creation fails.
pub async fn open_store(url: &str) -> Result<Arc<dyn ReportStore>, StoreError> {
    if url.eq_ignore_ascii_case(MEMORY_URL) {
        log::warn!("Using in-memory report store; reports will not survive a restart");
        return Ok(Arc::new(MemoryReportStore::new()));
    }

    let db = db::connect(url).await?;
    schema::ensure_schema(db.as_ref()).await?;
    log::info!("Report schema ready");

    Ok(Arc::new(DatabaseReportStore::new(Arc::from(db))))
}

/// Opens the report store named by the `DATABASE_URL` environment
/// variable, falling back to [`DEFAULT_DATABASE_URL`].
///
/// # Errors
///
/// Returns [`StoreError`] if the connection or schema creation fails.
pub async fn open_store_from_env() -> Result<Arc<dyn ReportStore>, StoreError> {
    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    open_store(&url).await
}
