#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Bounding-box geofence math.
//!
//! Converts a center point and a radius in kilometers into an axis-aligned
//! latitude/longitude rectangle that over-approximates the circular search
//! area. The report store has no native radius query, so nearby lookups
//! filter on this rectangle instead.
//!
//! The conversion is an equirectangular approximation: accurate for radii
//! of a few tens of kilometers away from the poles. As the center latitude
//! approaches ±90° the longitude delta grows without bound (the cosine in
//! the denominator goes to zero). Callers must not rely on the box near the
//! poles; the value is returned as computed, not clamped.

/// Kilometers spanned by one degree of latitude.
pub const KM_PER_DEGREE_LATITUDE: f64 = 111.132;

/// Kilometers spanned by one degree of longitude at the equator.
pub const KM_PER_DEGREE_LONGITUDE_AT_EQUATOR: f64 = 111.320;

/// An axis-aligned rectangle in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Southern latitude boundary.
    pub min_lat: f64,
    /// Northern latitude boundary.
    pub max_lat: f64,
    /// Western longitude boundary.
    pub min_lon: f64,
    /// Eastern longitude boundary.
    pub max_lon: f64,
}

impl BoundingBox {
    /// Inclusive point-in-rectangle test.
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        self.contains_latitude(latitude) && self.contains_longitude(longitude)
    }

    /// Inclusive test on the latitude axis only.
    #[must_use]
    pub fn contains_latitude(&self, latitude: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&latitude)
    }

    /// Inclusive test on the longitude axis only.
    ///
    /// Used to finish the rectangle test after a latitude-only range query.
    #[must_use]
    pub fn contains_longitude(&self, longitude: f64) -> bool {
        (self.min_lon..=self.max_lon).contains(&longitude)
    }
}

/// Computes the bounding box of radius `radius_km` around a center point.
///
/// Never fails. Degenerate input (zero radius, a pole) yields a degenerate
/// or unbounded box rather than an error.
#[must_use]
pub fn bounding_box(latitude: f64, longitude: f64, radius_km: f64) -> BoundingBox {
    let lat_rad = latitude.to_radians();
    let lat_delta = radius_km / KM_PER_DEGREE_LATITUDE;
    let lon_delta = radius_km / (KM_PER_DEGREE_LONGITUDE_AT_EQUATOR * lat_rad.cos());

    BoundingBox {
        min_lat: latitude - lat_delta,
        max_lat: latitude + lat_delta,
        min_lon: longitude - lon_delta,
        max_lon: longitude + lon_delta,
    }
}
