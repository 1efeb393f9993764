//! Retention sweep for resolved reports.
//!
//! Resolved reports are kept for a retention period (30 days by default)
//! and then deleted. The sweep is triggered externally, either by the
//! `/api/cron/cleanup` endpoint or the `cleanup` CLI command.

use chrono::{DateTime, Duration, Utc};

use crate::{ReportStore, StoreError};

/// Default number of days a resolved report is kept.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

/// Deletes reports resolved more than `retention_days` before `now`.
///
/// Returns the number of deleted reports. A retention reaching past the
/// earliest representable time keeps everything.
///
/// # Errors
///
/// Returns [`StoreError`] if the delete fails.
pub async fn sweep(
    store: &dyn ReportStore,
    retention_days: u32,
    now: DateTime<Utc>,
) -> Result<u64, StoreError> {
    let cutoff = Duration::try_days(i64::from(retention_days))
        .and_then(|retention| now.checked_sub_signed(retention))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let deleted = store.delete_resolved_before(cutoff).await?;
    log::info!("Cleanup sweep removed {deleted} report(s) resolved before {cutoff}");
    Ok(deleted)
}
