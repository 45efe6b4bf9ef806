//! Wire-adjacent compute request and response shapes.
//!
//! Grid traffic flows over a persistent bidirectional channel, so grid
//! requests carry the issuing panel's generation in-band and well-behaved
//! responders echo it back. The geographic interface is request/response:
//! the transport itself pairs replies with requests, so the generation rides
//! along as local metadata and never reaches the wire.

use crate::algorithm::Algorithm;
use crate::geo::GeoPoint;
use crate::grid::Cell;

/// A grid search request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridComputeRequest {
    pub algorithm: Algorithm,
    pub rows: u16,
    pub cols: u16,
    pub start: Cell,
    pub end: Cell,
    pub obstacles: Vec<Cell>,
    pub generation: u64,
}

/// A grid search response.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridComputeResponse {
    pub path: Vec<Cell>,
    pub visited: Vec<Cell>,
    /// Server-side computation time, already clamped to at least 1 ms.
    pub time_ms: u64,
    /// Echo of the request's generation. `None` from responders that predate
    /// the field; such responses are treated as latest-authoritative.
    #[cfg_attr(feature = "serde", serde(default))]
    pub generation: Option<u64>,
}

impl GridComputeResponse {
    /// The clamp responders apply to a measured duration: at least 1 ms,
    /// rounded to the nearest whole millisecond.
    #[must_use]
    pub fn clamp_time_ms(elapsed_ms: f64) -> u64 {
        elapsed_ms.round().max(1.0) as u64
    }
}

/// A geographic route request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteComputeRequest {
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub algorithm: Algorithm,
    /// Correlation metadata for the transport; not part of the request body.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub generation: u64,
}
