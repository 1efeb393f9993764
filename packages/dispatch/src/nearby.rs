//! Nearby-report lookup.
//!
//! The store can only range-filter one column efficiently, so the lookup
//! is two steps: a latitude range query in the store, then a longitude
//! filter here to complete the rectangle test.

use alert_front_database::ReportStore;
use alert_front_geofence::BoundingBox;
use alert_front_report_models::Report;

use crate::DispatchError;

/// Returns the stored reports that fall inside `bbox` (edges inclusive).
///
/// # Errors
///
/// Returns [`DispatchError::Query`] if the store query fails.
pub async fn find_nearby_reports(
    store: &dyn ReportStore,
    bbox: &BoundingBox,
) -> Result<Vec<Report>, DispatchError> {
    let candidates = store
        .query_by_latitude_range(bbox.min_lat, bbox.max_lat)
        .await?;
    let fetched = candidates.len();

    let inside: Vec<Report> = candidates
        .into_iter()
        .filter(|r| bbox.contains_longitude(r.longitude))
        .collect();

    log::debug!(
        "Nearby lookup: {fetched} report(s) in latitude band, {} inside box",
        inside.len()
    );

    Ok(inside)
}
