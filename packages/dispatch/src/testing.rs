//! Test doubles shared by the dispatch tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use alert_front_database::{ReportFilter, ReportStore, StoreError};
use alert_front_notify::{AlertMessage, DeliveryReceipt, NotificationSender, NotifyError};
use alert_front_report_models::{NewReport, Report, ReportStatus, Urgency};
use chrono::{DateTime, Utc};

pub fn report_at(id: &str, lat: f64, lon: f64, reporter: &str, urgency: Urgency) -> Report {
    Report::from_new(
        id.to_string(),
        NewReport {
            description: "Test hazard description".to_string(),
            urgency,
            latitude: lat,
            longitude: lon,
            image_url: None,
            reported_by: reporter.to_string(),
        },
        Utc::now(),
    )
}

/// Records every send; optionally fails for chosen recipients or sleeps.
#[derive(Default)]
pub struct RecordingSender {
    attempted: Mutex<Vec<String>>,
    sent: Mutex<Vec<String>>,
    messages: Mutex<Vec<AlertMessage>>,
    failing: Vec<String>,
    delay: Option<Duration>,
}

impl RecordingSender {
    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            failing: recipients.iter().map(|r| (*r).to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn attempted(&self) -> Vec<String> {
        self.attempted.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<AlertMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl NotificationSender for RecordingSender {
    async fn send(
        &self,
        recipient: &str,
        message: &AlertMessage,
    ) -> Result<DeliveryReceipt, NotifyError> {
        self.attempted.lock().unwrap().push(recipient.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.iter().any(|r| r == recipient) {
            return Err(NotifyError::Provider {
                status: 400,
                message: format!("invalid recipient {recipient}"),
            });
        }

        self.sent.lock().unwrap().push(recipient.to_string());
        self.messages.lock().unwrap().push(message.clone());
        Ok(DeliveryReceipt {
            recipient: recipient.to_string(),
            message_id: format!("SM-{recipient}"),
            status: "queued".to_string(),
        })
    }
}

/// Store whose reads always fail; counts latitude queries.
#[derive(Default)]
pub struct FailingStore {
    queries: AtomicUsize,
}

impl FailingStore {
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn unavailable() -> StoreError {
        StoreError::Connection {
            message: "store unavailable".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ReportStore for FailingStore {
    async fn insert(&self, _report: NewReport) -> Result<Report, StoreError> {
        Err(Self::unavailable())
    }

    async fn query_by_latitude_range(
        &self,
        _min_lat: f64,
        _max_lat: f64,
    ) -> Result<Vec<Report>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Err(Self::unavailable())
    }

    async fn get(&self, _id: &str) -> Result<Option<Report>, StoreError> {
        Err(Self::unavailable())
    }

    async fn list(&self, _filter: ReportFilter) -> Result<Vec<Report>, StoreError> {
        Err(Self::unavailable())
    }

    async fn update_status(&self, _id: &str, _status: ReportStatus) -> Result<Report, StoreError> {
        Err(Self::unavailable())
    }

    async fn delete_resolved_before(&self, _cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        Err(Self::unavailable())
    }
}
