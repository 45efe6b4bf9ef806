//! Grid model: cells, endpoints, and the editable obstacle field.
//!
//! # Invariants
//! - The obstacle set never contains the current start or end cell.
//! - `start != end` at all times.
//! - Every stored cell lies within `rows x cols`.
//!
//! Edits that would violate an invariant are rejected silently: the grid is
//! left untouched and the operation reports `false`. This matches the
//! forgiving click-editing surface the model backs, where a misplaced click
//! must never produce an error dialog.

use std::collections::HashSet;
use std::fmt;

/// Default grid dimensions.
pub const DEFAULT_ROWS: u16 = 10;
/// Default grid dimensions.
pub const DEFAULT_COLS: u16 = 10;

/// A grid coordinate as `(row, col)`, zero-based from the top-left corner.
///
/// Equality is structural. The wire form is a two-element `[row, col]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "(u16, u16)", into = "(u16, u16)"))]
pub struct Cell {
    pub row: u16,
    pub col: u16,
}

impl Cell {
    /// Creates a cell at `(row, col)`.
    #[must_use]
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

impl From<(u16, u16)> for Cell {
    fn from((row, col): (u16, u16)) -> Self {
        Self { row, col }
    }
}

impl From<Cell> for (u16, u16) {
    fn from(cell: Cell) -> Self {
        (cell.row, cell.col)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Which endpoint a [`GridState::move_endpoint`] call addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Start,
    End,
}

/// The editable search field: dimensions, endpoints, and obstacles.
///
/// All mutation goes through [`toggle_obstacle`](GridState::toggle_obstacle),
/// [`move_endpoint`](GridState::move_endpoint), and
/// [`reset`](GridState::reset); each reports whether it changed anything so
/// the caller knows when a re-render is due.
#[derive(Debug, Clone)]
pub struct GridState {
    rows: u16,
    cols: u16,
    start: Cell,
    end: Cell,
    obstacles: HashSet<Cell>,
}

impl GridState {
    /// Creates a grid with start at the top-left corner and end at the
    /// bottom-right. Dimensions are clamped so the two default endpoints
    /// are distinct cells.
    #[must_use]
    pub fn new(rows: u16, cols: u16) -> Self {
        let rows = rows.max(1);
        let cols = if rows == 1 { cols.max(2) } else { cols.max(1) };
        Self {
            rows,
            cols,
            start: Cell::new(0, 0),
            end: Cell::new(rows - 1, cols - 1),
            obstacles: HashSet::new(),
        }
    }

    #[must_use]
    pub const fn rows(&self) -> u16 {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> u16 {
        self.cols
    }

    #[must_use]
    pub const fn start(&self) -> Cell {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> Cell {
        self.end
    }

    #[must_use]
    pub const fn endpoint(&self, which: EndpointKind) -> Cell {
        match which {
            EndpointKind::Start => self.start,
            EndpointKind::End => self.end,
        }
    }

    /// Whether `cell` lies within the grid bounds.
    #[must_use]
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    #[must_use]
    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.obstacles.contains(&cell)
    }

    #[must_use]
    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    /// Obstacles in row-major order. Sorted so wire payloads and recorded
    /// requests are deterministic.
    #[must_use]
    pub fn obstacle_list(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.obstacles.iter().copied().collect();
        cells.sort_unstable();
        cells
    }

    /// Flips obstacle membership for `cell`.
    ///
    /// Rejected (returns `false`, grid unchanged) when `cell` is out of
    /// bounds or is the current start or end.
    pub fn toggle_obstacle(&mut self, cell: Cell) -> bool {
        if !self.contains(cell) || cell == self.start || cell == self.end {
            return false;
        }
        if !self.obstacles.insert(cell) {
            self.obstacles.remove(&cell);
        }
        true
    }

    /// Relocates one endpoint, leaving the obstacle set unchanged.
    ///
    /// Rejected (returns `false`, grid unchanged) when `cell` is out of
    /// bounds, equals the other endpoint, is an obstacle, or is already the
    /// endpoint's current position.
    pub fn move_endpoint(&mut self, which: EndpointKind, cell: Cell) -> bool {
        if !self.contains(cell) || self.is_obstacle(cell) {
            return false;
        }
        let (target, other) = match which {
            EndpointKind::Start => (&mut self.start, self.end),
            EndpointKind::End => (&mut self.end, self.start),
        };
        if cell == other || cell == *target {
            return false;
        }
        *target = cell;
        true
    }

    /// Clears all obstacles and restores the default endpoints: start at
    /// `(0, 0)`, end at `(rows - 1, cols - 1)`.
    pub fn reset(&mut self) {
        self.obstacles.clear();
        self.start = Cell::new(0, 0);
        self.end = Cell::new(self.rows - 1, self.cols - 1);
    }

    /// Checks the structural invariants. Intended for tests and debug
    /// assertions; library code upholds these by construction.
    #[must_use]
    pub fn invariant_holds(&self) -> bool {
        self.start != self.end
            && self.contains(self.start)
            && self.contains(self.end)
            && !self.obstacles.contains(&self.start)
            && !self.obstacles.contains(&self.end)
            && self.obstacles.iter().all(|&c| self.contains(c))
    }
}

impl Default for GridState {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}
