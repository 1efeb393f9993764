//! In-memory [`ReportStore`].

use std::collections::BTreeMap;

use alert_front_report_models::{NewReport, Report, ReportStatus};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::store::new_report_id;
use crate::{ReportFilter, ReportStore, StoreError};

/// Report store held entirely in process memory.
#[derive(Default)]
pub struct MemoryReportStore {
    reports: RwLock<BTreeMap<String, Report>>,
}

impl MemoryReportStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `report` as-is, replacing any report with the same id.
    ///
    /// Lets callers seed fixtures with chosen ids and timestamps.
    pub async fn put(&self, report: Report) {
        self.reports.write().await.insert(report.id.clone(), report);
    }

    /// Number of stored reports.
    pub async fn len(&self) -> usize {
        self.reports.read().await.len()
    }

    /// Whether the store holds no reports.
    pub async fn is_empty(&self) -> bool {
        self.reports.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl ReportStore for MemoryReportStore {
    async fn insert(&self, report: NewReport) -> Result<Report, StoreError> {
        let report = Report::from_new(new_report_id(), report, Utc::now());
        self.put(report.clone()).await;
        Ok(report)
    }

    async fn query_by_latitude_range(
        &self,
        min_lat: f64,
        max_lat: f64,
    ) -> Result<Vec<Report>, StoreError> {
        Ok(self
            .reports
            .read()
            .await
            .values()
            .filter(|r| (min_lat..=max_lat).contains(&r.latitude))
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Report>, StoreError> {
        Ok(self.reports.read().await.get(id).cloned())
    }

    async fn list(&self, filter: ReportFilter) -> Result<Vec<Report>, StoreError> {
        let filter = filter.clamped();
        let reports = self.reports.read().await;

        let mut matching: Vec<&Report> = reports
            .values()
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matching
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: &str, status: ReportStatus) -> Result<Report, StoreError> {
        let mut reports = self.reports.write().await;
        let report = reports
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        report.apply_status(status, Utc::now())?;
        Ok(report.clone())
    }

    async fn delete_resolved_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut reports = self.reports.write().await;
        let before = reports.len();
        reports.retain(|_, r| !r.resolved_before(cutoff));
        Ok((before - reports.len()) as u64)
    }
}
