//! The closed catalog of pathfinding algorithms the engine can request.
//!
//! The engine never executes these; it only names them on the wire and
//! replays whatever the compute collaborator returns for them.

use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// A selectable pathfinding algorithm.
///
/// Wire names are the lowercase strings of [`as_str`](Algorithm::as_str);
/// parsing is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Algorithm {
    #[default]
    Dijkstra,
    AStar,
    Bfs,
    Dfs,
    Greedy,
}

impl Algorithm {
    /// Every algorithm, in UI presentation order.
    pub const ALL: [Self; 5] = [
        Self::Dijkstra,
        Self::AStar,
        Self::Bfs,
        Self::Dfs,
        Self::Greedy,
    ];

    /// The wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dijkstra => "dijkstra",
            Self::AStar => "astar",
            Self::Bfs => "bfs",
            Self::Dfs => "dfs",
            Self::Greedy => "greedy",
        }
    }

    /// Human-facing label for selectors.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dijkstra => "Dijkstra",
            Self::AStar => "A*",
            Self::Bfs => "BFS",
            Self::Dfs => "DFS",
            Self::Greedy => "Greedy Best-First",
        }
    }

    /// One-sentence description for UI display.
    #[must_use]
    pub const fn blurb(self) -> &'static str {
        match self {
            Self::Dijkstra => {
                "Expands uniformly by cumulative cost and guarantees the shortest path."
            }
            Self::AStar => {
                "Dijkstra plus a goal-distance heuristic; usually explores far fewer cells."
            }
            Self::Bfs => "Expands in rings of equal hop count; shortest path on unweighted grids.",
            Self::Dfs => "Dives deep before backtracking; finds a path, rarely the shortest one.",
            Self::Greedy => "Chases the heuristic alone; fast, but easily led astray.",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str() == lowered)
            .ok_or_else(|| ParseAlgorithmError(s.to_owned()))
    }
}

/// The input named no known algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAlgorithmError(pub String);

impl fmt::Display for ParseAlgorithmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown algorithm {:?}", self.0)
    }
}

impl Error for ParseAlgorithmError {}
