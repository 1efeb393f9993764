//! The [`ReportStore`] trait and its `switchy_database` implementation.

use std::sync::Arc;

use alert_front_report_models::{NewReport, Report, ReportStatus};
use chrono::{DateTime, SubsecRound as _, Utc};
use switchy_database::Database;

use crate::{StoreError, queries};

/// Default page size for [`ReportStore::list`].
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Largest page size [`ReportStore::list`] will honour.
pub const MAX_LIST_LIMIT: u32 = 500;

/// Parameters for listing reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportFilter {
    /// Only return reports in this status.
    pub status: Option<ReportStatus>,
    /// Maximum number of results (clamped to [`MAX_LIST_LIMIT`]).
    pub limit: u32,
    /// Number of results to skip.
    pub offset: u32,
}

impl Default for ReportFilter {
    fn default() -> Self {
        Self {
            status: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl ReportFilter {
    /// Returns a copy with `limit` clamped to `1..=MAX_LIST_LIMIT`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            limit: self.limit.clamp(1, MAX_LIST_LIMIT),
            ..self
        }
    }
}

/// Persistent storage for hazard reports.
#[async_trait::async_trait]
pub trait ReportStore: Send + Sync {
    /// Assigns an id and timestamps to a validated submission and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    async fn insert(&self, report: NewReport) -> Result<Report, StoreError>;

    /// Returns every report with `latitude` in `[min_lat, max_lat]`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn query_by_latitude_range(
        &self,
        min_lat: f64,
        max_lat: f64,
    ) -> Result<Vec<Report>, StoreError>;

    /// Fetches one report.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn get(&self, id: &str) -> Result<Option<Report>, StoreError>;

    /// Lists reports, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn list(&self, filter: ReportFilter) -> Result<Vec<Report>, StoreError>;

    /// Moves a report to `status`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id and
    /// [`StoreError::InvalidTransition`] for a backward move.
    async fn update_status(&self, id: &str, status: ReportStatus) -> Result<Report, StoreError>;

    /// Deletes reports resolved strictly before `cutoff`, returning how many
    /// were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete fails.
    async fn delete_resolved_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Generates a fresh report id.
#[must_use]
pub fn new_report_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time at the microsecond precision timestamps are stored with.
fn stored_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// [`ReportStore`] backed by a `switchy_database` connection.
pub struct DatabaseReportStore {
    db: Arc<dyn Database>,
}

impl DatabaseReportStore {
    /// Wraps an open connection. The schema must already exist.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl ReportStore for DatabaseReportStore {
    async fn insert(&self, report: NewReport) -> Result<Report, StoreError> {
        let report = Report::from_new(new_report_id(), report, stored_now());
        queries::insert_report(self.db.as_ref(), &report).await?;
        log::debug!("Inserted report {}", report.id);
        Ok(report)
    }

    async fn query_by_latitude_range(
        &self,
        min_lat: f64,
        max_lat: f64,
    ) -> Result<Vec<Report>, StoreError> {
        queries::query_by_latitude_range(self.db.as_ref(), min_lat, max_lat).await
    }

    async fn get(&self, id: &str) -> Result<Option<Report>, StoreError> {
        queries::get_report(self.db.as_ref(), id).await
    }

    async fn list(&self, filter: ReportFilter) -> Result<Vec<Report>, StoreError> {
        queries::list_reports(self.db.as_ref(), &filter.clamped()).await
    }

    async fn update_status(&self, id: &str, status: ReportStatus) -> Result<Report, StoreError> {
        let mut report = queries::get_report(self.db.as_ref(), id)
            .await?
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        let previous = report.status;
        report.apply_status(status, stored_now())?;
        if report.status == previous {
            return Ok(report);
        }

        if !queries::update_report_status(self.db.as_ref(), &report, previous).await? {
            return Err(StoreError::Conflict { id: id.to_string() });
        }

        log::info!("Report {id} moved from {previous} to {status}");
        Ok(report)
    }

    async fn delete_resolved_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        queries::delete_resolved_before(self.db.as_ref(), cutoff).await
    }
}
