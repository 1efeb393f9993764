#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hazard report types shared across the alert-front system.
//!
//! Defines the [`Report`] entity as persisted by the report store, the
//! [`NewReport`] submission shape with its validation rules, and the
//! [`Urgency`] and [`ReportStatus`] enums. Status changes go through
//! [`Report::apply_status`] so that every store enforces the same
//! forward-only lifecycle and keeps `resolved_at` in sync with the status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Minimum description length, in characters, after trimming.
pub const MIN_DESCRIPTION_LENGTH: usize = 10;

/// Maximum description length, in characters, after trimming.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// How urgent the reporter considers a hazard.
///
/// Only [`Urgency::High`] reports trigger a mass alert.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Urgency {
    /// Minor hazard, no immediate danger.
    Low,
    /// Hazard that should be looked at soon.
    Moderate,
    /// Immediate danger to people nearby.
    High,
}

impl Urgency {
    /// Whether a report with this urgency triggers a mass alert.
    #[must_use]
    pub const fn triggers_mass_alert(self) -> bool {
        matches!(self, Self::High)
    }
}

/// Triage status of a report.
///
/// Variants are declared in lifecycle order so that the derived [`Ord`]
/// matches the allowed direction of travel.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum ReportStatus {
    /// Submitted, not yet picked up by a responder.
    New,
    /// A responder is working on it.
    InProgress,
    /// Handled. Eligible for the cleanup sweep after the retention period.
    Resolved,
}

impl ReportStatus {
    /// Whether a report currently in `self` may move to `next`.
    ///
    /// Forward moves (including skipping `InProgress`) and re-applying the
    /// current status are allowed. Backward moves are not.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        next >= self
    }
}

/// Rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move report from {from} back to {to}")]
pub struct InvalidTransitionError {
    /// Status the report was in.
    pub from: ReportStatus,
    /// Status that was requested.
    pub to: ReportStatus,
}

/// A hazard report as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Opaque unique identifier.
    pub id: String,
    /// Free-text description of the hazard.
    pub description: String,
    /// Reporter-assigned urgency.
    pub urgency: Urgency,
    /// Latitude (WGS84 degrees).
    pub latitude: f64,
    /// Longitude (WGS84 degrees).
    pub longitude: f64,
    /// Triage status.
    pub status: ReportStatus,
    /// Optional photo of the hazard.
    pub image_url: Option<String>,
    /// Contact identifier of the reporter.
    pub reported_by: String,
    /// When the report was submitted.
    pub created_at: DateTime<Utc>,
    /// When the report was last modified.
    pub updated_at: DateTime<Utc>,
    /// When the report was resolved. Set iff `status` is `Resolved`.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Report {
    /// Builds a freshly submitted report from a validated submission.
    #[must_use]
    pub fn from_new(id: String, new: NewReport, now: DateTime<Utc>) -> Self {
        Self {
            id,
            description: new.description.trim().to_string(),
            urgency: new.urgency,
            latitude: new.latitude,
            longitude: new.longitude,
            status: ReportStatus::New,
            image_url: new.image_url,
            reported_by: new.reported_by.trim().to_string(),
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    /// Moves the report to `next`, stamping `updated_at` and keeping
    /// `resolved_at` consistent with the new status.
    ///
    /// Re-applying the current status leaves the report untouched.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransitionError`] if `next` is behind the current
    /// status.
    pub fn apply_status(
        &mut self,
        next: ReportStatus,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidTransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransitionError {
                from: self.status,
                to: next,
            });
        }
        if self.status == next {
            return Ok(());
        }

        self.status = next;
        self.updated_at = now;
        self.resolved_at = (next == ReportStatus::Resolved).then_some(now);
        Ok(())
    }

    /// Whether this report was resolved strictly before `cutoff`.
    #[must_use]
    pub fn resolved_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.status == ReportStatus::Resolved && self.resolved_at.is_some_and(|at| at < cutoff)
    }
}

/// A report submission, before it has been assigned an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    /// Free-text description of the hazard.
    pub description: String,
    /// Reporter-assigned urgency.
    pub urgency: Urgency,
    /// Latitude (WGS84 degrees).
    pub latitude: f64,
    /// Longitude (WGS84 degrees).
    pub longitude: f64,
    /// Optional photo of the hazard.
    pub image_url: Option<String>,
    /// Contact identifier of the reporter.
    pub reported_by: String,
}

/// Why a submission was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Description too short or too long.
    #[error(
        "description must be between {MIN_DESCRIPTION_LENGTH} and {MAX_DESCRIPTION_LENGTH} characters (got {len})"
    )]
    DescriptionLength {
        /// Trimmed length in characters.
        len: usize,
    },

    /// Latitude outside `[-90, 90]` or not finite.
    #[error("latitude must be between -90 and 90 (got {value})")]
    LatitudeOutOfRange {
        /// The rejected value.
        value: f64,
    },

    /// Longitude outside `[-180, 180]` or not finite.
    #[error("longitude must be between -180 and 180 (got {value})")]
    LongitudeOutOfRange {
        /// The rejected value.
        value: f64,
    },

    /// No contact identifier given.
    #[error("reportedBy is required")]
    MissingReporter,

    /// Image URL is not an http(s) URL.
    #[error("imageUrl must be an http or https URL")]
    InvalidImageUrl,
}

impl NewReport {
    /// Checks the submission against the report invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.description.trim().chars().count();
        if !(MIN_DESCRIPTION_LENGTH..=MAX_DESCRIPTION_LENGTH).contains(&len) {
            return Err(ValidationError::DescriptionLength { len });
        }

        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ValidationError::LatitudeOutOfRange {
                value: self.latitude,
            });
        }

        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError::LongitudeOutOfRange {
                value: self.longitude,
            });
        }

        if self.reported_by.trim().is_empty() {
            return Err(ValidationError::MissingReporter);
        }

        let bad_url = self
            .image_url
            .as_deref()
            .is_some_and(|url| !(url.starts_with("https://") || url.starts_with("http://")));
        if bad_url {
            return Err(ValidationError::InvalidImageUrl);
        }

        Ok(())
    }
}
