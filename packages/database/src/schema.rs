//! Report table DDL.
//!
//! Column types are chosen to be valid in both `PostgreSQL` and `SQLite`.
//! Timestamps are stored as fixed-width RFC 3339 UTC text so that string
//! comparison orders them chronologically.

use switchy_database::Database;

use crate::StoreError;

const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS reports (
        id           TEXT PRIMARY KEY,
        description  TEXT NOT NULL,
        urgency      TEXT NOT NULL,
        latitude     DOUBLE PRECISION NOT NULL,
        longitude    DOUBLE PRECISION NOT NULL,
        status       TEXT NOT NULL,
        image_url    TEXT,
        reported_by  TEXT NOT NULL,
        created_at   TEXT NOT NULL,
        updated_at   TEXT NOT NULL,
        resolved_at  TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_reports_latitude ON reports (latitude)",
    "CREATE INDEX IF NOT EXISTS idx_reports_created ON reports (created_at)",
    "CREATE INDEX IF NOT EXISTS idx_reports_status_resolved ON reports (status, resolved_at)",
];

/// Creates the `reports` table and its indexes if they don't already exist.
///
/// # Errors
///
/// Returns [`StoreError`] if any DDL statement fails.
pub async fn ensure_schema(db: &dyn Database) -> Result<(), StoreError> {
    for statement in STATEMENTS {
        db.exec_raw(statement).await?;
    }
    Ok(())
}
