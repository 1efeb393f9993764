//! Raw SQL queries against the `reports` table.
//!
//! All statements use `$n` placeholders through `query_raw_params()` /
//! `exec_raw_params()` so the same text runs on `PostgreSQL` and `SQLite`.

use std::fmt::Write as _;

use alert_front_report_models::{Report, ReportStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::{ReportFilter, StoreError};

const REPORT_COLUMNS: &str = "id, description, urgency, latitude, longitude, status, image_url, \
                              reported_by, created_at, updated_at, resolved_at";

/// Formats a timestamp the way it is stored: RFC 3339, microseconds, `Z`.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Conversion {
            message: format!("Invalid {column} timestamp '{value}': {e}"),
        })
}

fn opt_string(value: Option<&str>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, |s| DatabaseValue::String(s.to_string()))
}

fn required_string(row: &switchy_database::Row, column: &str) -> Result<String, StoreError> {
    row.to_value::<String>(column)
        .map_err(|e| StoreError::Conversion {
            message: format!("Failed to read column {column}: {e}"),
        })
}

fn required_f64(row: &switchy_database::Row, column: &str) -> Result<f64, StoreError> {
    row.to_value::<f64>(column).map_err(|e| StoreError::Conversion {
        message: format!("Failed to read column {column}: {e}"),
    })
}

/// Converts a database row into a [`Report`].
fn row_to_report(row: &switchy_database::Row) -> Result<Report, StoreError> {
    let urgency = required_string(row, "urgency")?;
    let status = required_string(row, "status")?;
    let created_at = required_string(row, "created_at")?;
    let updated_at = required_string(row, "updated_at")?;
    let resolved_at: Option<String> = row.to_value("resolved_at").unwrap_or(None);

    Ok(Report {
        id: required_string(row, "id")?,
        description: required_string(row, "description")?,
        urgency: urgency.parse().map_err(|_| StoreError::Conversion {
            message: format!("Unknown urgency: {urgency}"),
        })?,
        latitude: required_f64(row, "latitude")?,
        longitude: required_f64(row, "longitude")?,
        status: status.parse().map_err(|_| StoreError::Conversion {
            message: format!("Unknown status: {status}"),
        })?,
        image_url: row.to_value("image_url").unwrap_or(None),
        reported_by: required_string(row, "reported_by")?,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
        resolved_at: resolved_at
            .as_deref()
            .map(|s| parse_timestamp("resolved_at", s))
            .transpose()?,
    })
}

fn rows_to_reports(rows: &[switchy_database::Row]) -> Result<Vec<Report>, StoreError> {
    rows.iter().map(row_to_report).collect()
}

/// Inserts a fully populated report.
///
/// # Errors
///
/// Returns [`StoreError`] if the database operation fails.
pub async fn insert_report(db: &dyn Database, report: &Report) -> Result<(), StoreError> {
    db.exec_raw_params(
        "INSERT INTO reports (
            id, description, urgency, latitude, longitude, status, image_url,
            reported_by, created_at, updated_at, resolved_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        &[
            DatabaseValue::String(report.id.clone()),
            DatabaseValue::String(report.description.clone()),
            DatabaseValue::String(report.urgency.as_ref().to_string()),
            DatabaseValue::Real64(report.latitude),
            DatabaseValue::Real64(report.longitude),
            DatabaseValue::String(report.status.as_ref().to_string()),
            opt_string(report.image_url.as_deref()),
            DatabaseValue::String(report.reported_by.clone()),
            DatabaseValue::String(format_timestamp(report.created_at)),
            DatabaseValue::String(format_timestamp(report.updated_at)),
            opt_string(report.resolved_at.map(format_timestamp).as_deref()),
        ],
    )
    .await?;

    Ok(())
}

/// Fetches a single report by id.
///
/// # Errors
///
/// Returns [`StoreError`] if the database operation or row conversion fails.
pub async fn get_report(db: &dyn Database, id: &str) -> Result<Option<Report>, StoreError> {
    let rows = db
        .query_raw_params(
            &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1"),
            &[DatabaseValue::String(id.to_string())],
        )
        .await?;

    rows.first().map(row_to_report).transpose()
}

/// Returns reports whose latitude lies in `[min_lat, max_lat]`.
///
/// This is a single-column range filter backed by `idx_reports_latitude`;
/// longitude is filtered by the caller.
///
/// # Errors
///
/// Returns [`StoreError`] if the database operation or row conversion fails.
pub async fn query_by_latitude_range(
    db: &dyn Database,
    min_lat: f64,
    max_lat: f64,
) -> Result<Vec<Report>, StoreError> {
    let rows = db
        .query_raw_params(
            &format!(
                "SELECT {REPORT_COLUMNS} FROM reports
                 WHERE latitude >= $1 AND latitude <= $2"
            ),
            &[DatabaseValue::Real64(min_lat), DatabaseValue::Real64(max_lat)],
        )
        .await?;

    rows_to_reports(&rows)
}

/// Lists reports, newest first.
///
/// # Errors
///
/// Returns [`StoreError`] if the database operation or row conversion fails.
pub async fn list_reports(
    db: &dyn Database,
    filter: &ReportFilter,
) -> Result<Vec<Report>, StoreError> {
    let mut sql = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE 1=1");
    let mut params: Vec<DatabaseValue> = Vec::new();
    let mut param_idx = 1u32;

    if let Some(status) = filter.status {
        write!(sql, " AND status = ${param_idx}").unwrap();
        params.push(DatabaseValue::String(status.as_ref().to_string()));
        param_idx += 1;
    }

    write!(
        sql,
        " ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
        param_idx,
        param_idx + 1
    )
    .unwrap();
    params.push(DatabaseValue::Int64(i64::from(filter.limit)));
    params.push(DatabaseValue::Int64(i64::from(filter.offset)));

    let rows = db.query_raw_params(&sql, &params).await?;
    rows_to_reports(&rows)
}

/// Writes a status change, guarded on the status the caller read.
///
/// Returns `false` if no row matched (the report is gone or its status
/// changed since it was read).
///
/// # Errors
///
/// Returns [`StoreError`] if the database operation fails.
pub async fn update_report_status(
    db: &dyn Database,
    report: &Report,
    previous: ReportStatus,
) -> Result<bool, StoreError> {
    let updated = db
        .exec_raw_params(
            "UPDATE reports SET status = $1, updated_at = $2, resolved_at = $3
             WHERE id = $4 AND status = $5",
            &[
                DatabaseValue::String(report.status.as_ref().to_string()),
                DatabaseValue::String(format_timestamp(report.updated_at)),
                opt_string(report.resolved_at.map(format_timestamp).as_deref()),
                DatabaseValue::String(report.id.clone()),
                DatabaseValue::String(previous.as_ref().to_string()),
            ],
        )
        .await?;

    Ok(updated > 0)
}

/// Deletes resolved reports whose `resolved_at` is before `cutoff`.
///
/// # Errors
///
/// Returns [`StoreError`] if the database operation fails.
pub async fn delete_resolved_before(
    db: &dyn Database,
    cutoff: DateTime<Utc>,
) -> Result<u64, StoreError> {
    let deleted = db
        .exec_raw_params(
            "DELETE FROM reports
             WHERE status = $1 AND resolved_at IS NOT NULL AND resolved_at < $2",
            &[
                DatabaseValue::String(ReportStatus::Resolved.as_ref().to_string()),
                DatabaseValue::String(format_timestamp(cutoff)),
            ],
        )
        .await?;

    Ok(deleted)
}
