//! Computation results and the per-panel result buffer.
//!
//! Results are immutable once constructed. A panel installs the latest
//! arrival as its [`ResultBuffer`]; playback shares the same `Arc`, so a
//! newer arrival replaces the buffer without invalidating a replay that is
//! already holding the previous snapshot.

use std::sync::Arc;

use crate::geo::GeoPoint;
use crate::grid::Cell;

/// Output of one grid search: explored cells in expansion order plus the
/// final path.
///
/// `visited` may contain duplicate cells when the producing algorithm
/// revisits; playback tolerates duplicates and must not dedupe. An empty
/// `path` means no path exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchResult {
    pub visited: Vec<Cell>,
    pub path: Vec<Cell>,
}

impl SearchResult {
    #[must_use]
    pub fn new(visited: Vec<Cell>, path: Vec<Cell>) -> Self {
        Self { visited, path }
    }

    /// A search with no visited cells has nothing to replay.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        !self.visited.is_empty()
    }

    #[must_use]
    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }
}

/// Output of one geographic route computation.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteResult {
    pub route: Vec<GeoPoint>,
}

impl RouteResult {
    /// Routes shorter than this are treated as "no route".
    pub const MIN_POINTS: usize = 2;

    #[must_use]
    pub fn new(route: Vec<GeoPoint>) -> Self {
        Self { route }
    }

    #[must_use]
    pub fn is_playable(&self) -> bool {
        self.route.len() >= Self::MIN_POINTS
    }
}

/// The most recently received computation output for a panel, awaiting or
/// undergoing playback.
#[derive(Debug, Clone)]
pub enum ResultBuffer {
    Search(Arc<SearchResult>),
    Route(Arc<RouteResult>),
}

impl ResultBuffer {
    /// Whether the engine would accept this buffer for playback.
    #[must_use]
    pub fn is_playable(&self) -> bool {
        match self {
            Self::Search(result) => result.is_playable(),
            Self::Route(result) => result.is_playable(),
        }
    }
}

impl From<SearchResult> for ResultBuffer {
    fn from(result: SearchResult) -> Self {
        Self::Search(Arc::new(result))
    }
}

impl From<RouteResult> for ResultBuffer {
    fn from(result: RouteResult) -> Self {
        Self::Route(Arc::new(result))
    }
}
