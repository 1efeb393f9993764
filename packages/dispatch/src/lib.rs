#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geofenced mass-alert dispatch.
//!
//! When a high-urgency report is filed, [`MassAlertDispatcher`] runs a
//! one-shot pipeline:
//!
//! 1. compute a bounding box of `radius_km` around the report
//!    ([`alert_front_geofence::bounding_box`]);
//! 2. fetch previously stored reports inside the box ([`nearby`]);
//! 3. collect their reporters into a deduplicated recipient set
//!    ([`recipients::dedupe_recipients`]);
//! 4. send one notification per recipient, concurrently, and wait for all
//!    of them to settle ([`recipients::dispatch`]).
//!
//! Alerting is best effort. A failed lookup counts as zero recipients and a
//! failed send is logged and counted; neither is surfaced to the caller,
//! and neither can undo the already persisted report.

pub mod nearby;
pub mod recipients;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use alert_front_database::{ReportStore, StoreError};
use alert_front_geofence::bounding_box;
use alert_front_notify::{AlertMessage, NotificationSender};
use alert_front_report_models::Report;
use thiserror::Error;

pub use recipients::DispatchSummary;

/// Default search radius around a high-urgency report.
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Errors raised inside the dispatch pipeline.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The nearby-report lookup failed.
    #[error("Nearby report query failed: {0}")]
    Query(#[from] StoreError),

    /// Invalid dispatcher configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

/// Dispatcher settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchConfig {
    /// Radius of the alert area, in kilometers.
    pub radius_km: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
        }
    }
}

impl DispatchConfig {
    /// Creates a config, rejecting radii that are not positive and finite.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Config`] for an unusable radius.
    pub fn new(radius_km: f64) -> Result<Self, DispatchError> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(DispatchError::Config {
                message: format!("alert radius must be a positive number of km (got {radius_km})"),
            });
        }
        Ok(Self { radius_km })
    }

    /// Reads `ALERT_RADIUS_KM`, defaulting to [`DEFAULT_RADIUS_KM`].
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Config`] if the variable is set but is not a
    /// positive number.
    pub fn from_env() -> Result<Self, DispatchError> {
        match std::env::var("ALERT_RADIUS_KM") {
            Ok(raw) => {
                let radius_km = raw.trim().parse::<f64>().map_err(|e| DispatchError::Config {
                    message: format!("ALERT_RADIUS_KM '{raw}' is not a number: {e}"),
                })?;
                Self::new(radius_km)
            }
            Err(_) => Ok(Self::default()),
        }
    }
}

/// Sends mass alerts to reporters near a new high-urgency report.
///
/// Holds the report store (read only) and the notification sender it was
/// constructed with.
pub struct MassAlertDispatcher {
    store: Arc<dyn ReportStore>,
    sender: Arc<dyn NotificationSender>,
    config: DispatchConfig,
}

impl MassAlertDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        store: Arc<dyn ReportStore>,
        sender: Arc<dyn NotificationSender>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            store,
            sender,
            config,
        }
    }

    /// Runs the mass-alert pipeline for a freshly persisted report.
    ///
    /// Returns `None` without touching the store or the sender unless the
    /// report's urgency triggers a mass alert. Otherwise returns the summary
    /// of the settled batch. Never fails: a lookup error is logged and
    /// treated as no recipients.
    pub async fn handle_new_report(&self, report: &Report) -> Option<DispatchSummary> {
        if !report.urgency.triggers_mass_alert() {
            log::debug!(
                "Report {} has {} urgency; no mass alert",
                report.id,
                report.urgency
            );
            return None;
        }

        let bbox = bounding_box(report.latitude, report.longitude, self.config.radius_km);
        log::info!(
            "Mass alert for report {} within {} km: lat [{:.5}, {:.5}], lon [{:.5}, {:.5}]",
            report.id,
            self.config.radius_km,
            bbox.min_lat,
            bbox.max_lat,
            bbox.min_lon,
            bbox.max_lon
        );

        let candidates = match nearby::find_nearby_reports(self.store.as_ref(), &bbox).await {
            Ok(reports) => reports
                .into_iter()
                .filter(|r| r.id != report.id)
                .collect::<Vec<_>>(),
            Err(e) => {
                log::error!(
                    "Mass alert for report {} found no recipients: {e}",
                    report.id
                );
                Vec::new()
            }
        };

        let recipients =
            recipients::dedupe_recipients(candidates.iter().map(|r| r.reported_by.as_str()));
        let message = AlertMessage::from_report(report);

        let mut summary = recipients::dispatch(self.sender.as_ref(), &recipients, &message).await;
        summary.candidates = candidates.len();

        log::info!(
            "Mass alert for report {} settled: {} candidate(s), {} recipient(s), {} delivered, {} failed, {} skipped",
            report.id,
            summary.candidates,
            summary.recipients,
            summary.delivered,
            summary.failed,
            summary.skipped
        );

        Some(summary)
    }
}

#[cfg(test)]
mod tests {
    use alert_front_database::MemoryReportStore;
    use alert_front_report_models::Urgency;

    use super::*;
    use crate::testing::{FailingStore, RecordingSender, report_at};

    const NYC: (f64, f64) = (40.7128, -74.0060);

    fn dispatcher(
        store: Arc<dyn ReportStore>,
        sender: Arc<RecordingSender>,
    ) -> MassAlertDispatcher {
        MassAlertDispatcher::new(store, sender, DispatchConfig::default())
    }

    #[test]
    fn config_rejects_unusable_radius() {
        assert!(DispatchConfig::new(0.0).is_err());
        assert!(DispatchConfig::new(-3.0).is_err());
        assert!(DispatchConfig::new(f64::INFINITY).is_err());
        assert_eq!(DispatchConfig::new(2.5).unwrap().radius_km, 2.5);
    }

    #[tokio::test]
    async fn low_and_moderate_urgency_never_dispatch() {
        let store = Arc::new(FailingStore::default());
        let sender = Arc::new(RecordingSender::default());
        let dispatcher = dispatcher(store.clone(), sender.clone());

        for urgency in [Urgency::Low, Urgency::Moderate] {
            let report = report_at("new", NYC.0, NYC.1, "me", urgency);
            assert!(dispatcher.handle_new_report(&report).await.is_none());
        }

        assert!(sender.sent().is_empty());
        assert_eq!(store.queries(), 0);
    }

    #[tokio::test]
    async fn high_urgency_with_empty_store_sends_nothing() {
        let store = Arc::new(MemoryReportStore::new());
        let sender = Arc::new(RecordingSender::default());

        let report = report_at("new", NYC.0, NYC.1, "me", Urgency::High);
        let summary = dispatcher(store, sender.clone())
            .handle_new_report(&report)
            .await
            .unwrap();

        assert_eq!(summary, DispatchSummary::default());
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn shared_reporter_gets_one_alert() {
        let store = Arc::new(MemoryReportStore::new());
        store
            .put(report_at("a", 40.7130, -74.0050, "+15551234567", Urgency::Low))
            .await;
        store
            .put(report_at("b", 40.7200, -74.0100, "+15551234567", Urgency::Moderate))
            .await;
        let sender = Arc::new(RecordingSender::default());

        let report = report_at("new", NYC.0, NYC.1, "reporter", Urgency::High);
        let summary = dispatcher(store, sender.clone())
            .handle_new_report(&report)
            .await
            .unwrap();

        assert_eq!(summary.candidates, 2);
        assert_eq!(summary.recipients, 1);
        assert_eq!(summary.delivered, 1);
        assert_eq!(sender.sent(), vec!["+15551234567".to_string()]);
    }

    #[tokio::test]
    async fn only_reports_inside_the_box_are_alerted() {
        let store = Arc::new(MemoryReportStore::new());
        // ~1 km east: inside.
        store
            .put(report_at("near", 40.7128, -73.9940, "near", Urgency::Low))
            .await;
        // Same latitude, ~50 km east: passes the latitude range, fails longitude.
        store
            .put(report_at("east", 40.7128, -73.4100, "east", Urgency::Low))
            .await;
        // ~55 km north: fails the latitude range.
        store
            .put(report_at("north", 41.2100, -74.0060, "north", Urgency::Low))
            .await;
        let sender = Arc::new(RecordingSender::default());

        let report = report_at("new", NYC.0, NYC.1, "reporter", Urgency::High);
        let summary = dispatcher(store, sender.clone())
            .handle_new_report(&report)
            .await
            .unwrap();

        assert_eq!(summary.candidates, 1);
        assert_eq!(sender.sent(), vec!["near".to_string()]);
    }

    #[tokio::test]
    async fn triggering_report_is_not_its_own_candidate() {
        let store = Arc::new(MemoryReportStore::new());
        let report = report_at("new", NYC.0, NYC.1, "reporter", Urgency::High);
        store.put(report.clone()).await;
        let sender = Arc::new(RecordingSender::default());

        let summary = dispatcher(store, sender.clone())
            .handle_new_report(&report)
            .await
            .unwrap();

        assert_eq!(summary.candidates, 0);
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn query_failure_is_treated_as_no_recipients() {
        let store = Arc::new(FailingStore::default());
        let sender = Arc::new(RecordingSender::default());

        let report = report_at("new", NYC.0, NYC.1, "reporter", Urgency::High);
        let summary = dispatcher(store.clone(), sender.clone())
            .handle_new_report(&report)
            .await
            .unwrap();

        assert_eq!(store.queries(), 1);
        assert_eq!(summary, DispatchSummary::default());
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn failed_sends_do_not_stop_the_batch() {
        let store = Arc::new(MemoryReportStore::new());
        for (id, who) in [("a", "alice"), ("b", "bob"), ("c", "carol")] {
            store
                .put(report_at(id, 40.7130, -74.0061, who, Urgency::Low))
                .await;
        }
        let sender = Arc::new(RecordingSender::failing_for(&["bob"]));

        let report = report_at("new", NYC.0, NYC.1, "reporter", Urgency::High);
        let summary = dispatcher(store, sender.clone())
            .handle_new_report(&report)
            .await
            .unwrap();

        assert_eq!(summary.recipients, 3);
        assert_eq!(summary.delivered, 2);
        assert_eq!(summary.failed, 1);
        let mut attempted = sender.attempted();
        attempted.sort();
        assert_eq!(attempted, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn alert_carries_the_triggering_description() {
        let store = Arc::new(MemoryReportStore::new());
        store
            .put(report_at("a", 40.7130, -74.0061, "alice", Urgency::Low))
            .await;
        let sender = Arc::new(RecordingSender::default());

        let mut report = report_at("new", NYC.0, NYC.1, "reporter", Urgency::High);
        report.description = "Chemical spill near the river walk".to_string();
        dispatcher(store, sender.clone())
            .handle_new_report(&report)
            .await
            .unwrap();

        let messages = sender.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].description, "Chemical spill near the river walk");
        assert_eq!(messages[0].urgency, Urgency::High);
    }
}
