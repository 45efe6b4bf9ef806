//! Geographic primitives for route playback.

use std::fmt;

/// A latitude/longitude pair.
///
/// No range validation is applied beyond what the mapping widget enforces;
/// the engine treats points as opaque waypoints. The wire form is a
/// two-element `[lat, lon]` array.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "(f64, f64)", into = "(f64, f64)"))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a point at `(lat, lon)`.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

impl From<GeoPoint> for (f64, f64) {
    fn from(point: GeoPoint) -> Self {
        (point.lat, point.lon)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}

/// Default start marker (Washington, DC area).
pub const DEFAULT_GEO_START: GeoPoint = GeoPoint::new(38.8951, -77.0364);
/// Default end marker (Washington, DC area).
pub const DEFAULT_GEO_END: GeoPoint = GeoPoint::new(38.9072, -77.0369);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_conversions_round_trip() {
        let point = GeoPoint::new(38.8951, -77.0364);
        let tuple: (f64, f64) = point.into();
        assert_eq!(GeoPoint::from(tuple), point);
    }

    #[test]
    fn defaults_are_distinct() {
        assert_ne!(DEFAULT_GEO_START, DEFAULT_GEO_END);
    }

    #[test]
    fn display_uses_four_decimals() {
        assert_eq!(DEFAULT_GEO_START.to_string(), "(38.8951, -77.0364)");
    }
}
