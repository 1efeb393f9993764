#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the alert-front server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the stored [`Report`] so the API contract can evolve on its own.

use alert_front_report_models::{NewReport, Report, ReportStatus, Urgency};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A hazard report as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReport {
    /// Report id.
    pub id: String,
    /// Hazard description.
    pub description: String,
    /// Urgency level.
    pub urgency: Urgency,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Triage status.
    pub status: ReportStatus,
    /// Photo URL, if one was attached.
    pub image_url: Option<String>,
    /// Reporter contact.
    pub reported_by: String,
    /// Submission time (ISO 8601).
    pub created_at: DateTime<Utc>,
    /// Last modification time (ISO 8601).
    pub updated_at: DateTime<Utc>,
    /// Resolution time (ISO 8601), when resolved.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<Report> for ApiReport {
    fn from(report: Report) -> Self {
        Self {
            id: report.id,
            description: report.description,
            urgency: report.urgency,
            latitude: report.latitude,
            longitude: report.longitude,
            status: report.status,
            image_url: report.image_url,
            reported_by: report.reported_by,
            created_at: report.created_at,
            updated_at: report.updated_at,
            resolved_at: report.resolved_at,
        }
    }
}

/// Body of `POST /api/reports`.
///
/// `urgency` is taken as a string so that it can be matched
/// case-insensitively.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    /// Hazard description (10–500 characters).
    pub description: String,
    /// `Low`, `Moderate` or `High`.
    pub urgency: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Optional photo URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Reporter contact.
    pub reported_by: String,
}

impl CreateReportRequest {
    /// Converts the request into a submission.
    ///
    /// # Errors
    ///
    /// Returns a message if `urgency` is not a known level.
    pub fn into_new_report(self) -> Result<NewReport, String> {
        let urgency = self
            .urgency
            .trim()
            .parse::<Urgency>()
            .map_err(|_| format!("Unknown urgency: {}", self.urgency))?;

        Ok(NewReport {
            description: self.description,
            urgency,
            latitude: self.latitude,
            longitude: self.longitude,
            image_url: self.image_url.filter(|u| !u.trim().is_empty()),
            reported_by: self.reported_by,
        })
    }
}

/// Response of `POST /api/reports`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportResponse {
    /// Id of the persisted report.
    pub id: String,
}

/// Query parameters for `GET /api/reports`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListParams {
    /// Status name to filter on.
    pub status: Option<String>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
}

/// Body of `PATCH /api/reports/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// `New`, `InProgress` or `Resolved`.
    pub status: String,
}

/// Response of `POST /api/cron/cleanup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    /// Number of deleted reports.
    pub deleted: u64,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable reason.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
