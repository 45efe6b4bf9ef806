//! The rendering collaborator contract.
//!
//! Playback emits synchronous, side-effect-only render instructions through
//! [`RenderSink`]. The engine never retains sink state and never calls back
//! into itself from a sink method, so implementations may be as dumb as a
//! canvas repaint or as stateful as a map widget.
//!
//! [`RecordingSink`] captures every call for inspection; tests count its
//! events instead of mocking timers.

use wayviz_core::geo::GeoPoint;
use wayviz_core::grid::Cell;

use crate::panel::PanelId;

/// One grid frame, borrowing the engine's per-run scratch state.
///
/// `revealed` is the obstacle-filtered visited prefix in expansion order,
/// frontier included. On the settle frame `frontier` is `None` and `path`
/// carries the obstacle-filtered final path; during the run `path` is empty.
#[derive(Debug, Clone, Copy)]
pub struct GridFrame<'a> {
    pub revealed: &'a [Cell],
    /// The cell revealed by this tick, when paintable. `None` when the
    /// tick's cell is currently an obstacle and on the settle frame.
    pub frontier: Option<Cell>,
    pub path: &'a [Cell],
    /// Current obstacles, sorted. Included so sinks stay stateless.
    pub obstacles: &'a [Cell],
}

/// User-visible status line updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// Route playback began.
    Animating,
    /// Route playback settled.
    Complete,
    /// Geographic reply carried no usable route.
    NoRoute,
    /// Grid search found no path. The visited replay still runs.
    NoPath,
    /// Grid result arrived; responder-side numbers for display.
    SearchStats {
        path_len: usize,
        visited_len: usize,
        time_ms: u64,
    },
    /// Compute collaborator failure, message verbatim.
    ComputeFailed(String),
}

impl StatusUpdate {
    /// Display text matching the visualizer's status line.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Animating => "Animating route...".to_owned(),
            Self::Complete => "Route animation complete!".to_owned(),
            Self::NoRoute => "No route found".to_owned(),
            Self::NoPath => "No path found!".to_owned(),
            Self::SearchStats {
                path_len,
                visited_len,
                time_ms,
            } => {
                format!("Path: {path_len} cells, visited: {visited_len}, computed in {time_ms} ms")
            }
            Self::ComputeFailed(message) => format!("Error: {message}"),
        }
    }
}

/// Synchronous rendering collaborator.
///
/// Grid panels receive [`grid_frame`](RenderSink::grid_frame) (a full
/// repaint); geographic panels receive the polyline pair. Every exit from a
/// running animation is bracketed by [`clear_transient`](RenderSink::clear_transient);
/// replacing or resetting a settled panel is preceded by
/// [`clear_final`](RenderSink::clear_final).
pub trait RenderSink {
    fn grid_frame(&mut self, panel: PanelId, frame: GridFrame<'_>);
    fn route_progress(&mut self, panel: PanelId, points: &[GeoPoint]);
    fn route_final(&mut self, panel: PanelId, points: &[GeoPoint]);
    fn clear_transient(&mut self, panel: PanelId);
    fn clear_final(&mut self, panel: PanelId);
    fn celebrate(&mut self, panel: PanelId);
    fn status(&mut self, panel: PanelId, update: StatusUpdate);
}

/// Owned copy of one sink call, as recorded by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    GridFrame {
        panel: PanelId,
        revealed: Vec<Cell>,
        frontier: Option<Cell>,
        path: Vec<Cell>,
        obstacles: Vec<Cell>,
    },
    RouteProgress {
        panel: PanelId,
        points: Vec<GeoPoint>,
    },
    RouteFinal {
        panel: PanelId,
        points: Vec<GeoPoint>,
    },
    ClearTransient(PanelId),
    ClearFinal(PanelId),
    Celebrate(PanelId),
    Status {
        panel: PanelId,
        update: StatusUpdate,
    },
}

impl SinkEvent {
    /// The panel the call addressed.
    #[must_use]
    pub fn panel(&self) -> PanelId {
        match self {
            Self::GridFrame { panel, .. }
            | Self::RouteProgress { panel, .. }
            | Self::RouteFinal { panel, .. }
            | Self::Status { panel, .. } => *panel,
            Self::ClearTransient(panel) | Self::ClearFinal(panel) | Self::Celebrate(panel) => {
                *panel
            }
        }
    }
}

/// A sink that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events addressed to `panel`, in emission order.
    pub fn events_for(&self, panel: PanelId) -> impl DoubleEndedIterator<Item = &SinkEvent> {
        self.events.iter().filter(move |e| e.panel() == panel)
    }

    #[must_use]
    pub fn grid_frame_count(&self, panel: PanelId) -> usize {
        self.events_for(panel)
            .filter(|e| matches!(e, SinkEvent::GridFrame { .. }))
            .count()
    }

    #[must_use]
    pub fn route_progress_count(&self, panel: PanelId) -> usize {
        self.events_for(panel)
            .filter(|e| matches!(e, SinkEvent::RouteProgress { .. }))
            .count()
    }

    #[must_use]
    pub fn clear_transient_count(&self, panel: PanelId) -> usize {
        self.events_for(panel)
            .filter(|e| matches!(e, SinkEvent::ClearTransient(_)))
            .count()
    }

    #[must_use]
    pub fn celebrate_count(&self, panel: PanelId) -> usize {
        self.events_for(panel)
            .filter(|e| matches!(e, SinkEvent::Celebrate(_)))
            .count()
    }

    /// The last grid frame emitted for `panel`, if any.
    #[must_use]
    pub fn last_grid_frame(&self, panel: PanelId) -> Option<&SinkEvent> {
        self.events_for(panel)
            .filter(|e| matches!(e, SinkEvent::GridFrame { .. }))
            .next_back()
    }

    /// Status updates for `panel`, in emission order.
    #[must_use]
    pub fn statuses(&self, panel: PanelId) -> Vec<&StatusUpdate> {
        self.events_for(panel)
            .filter_map(|e| match e {
                SinkEvent::Status { update, .. } => Some(update),
                _ => None,
            })
            .collect()
    }
}

impl RenderSink for RecordingSink {
    fn grid_frame(&mut self, panel: PanelId, frame: GridFrame<'_>) {
        self.events.push(SinkEvent::GridFrame {
            panel,
            revealed: frame.revealed.to_vec(),
            frontier: frame.frontier,
            path: frame.path.to_vec(),
            obstacles: frame.obstacles.to_vec(),
        });
    }

    fn route_progress(&mut self, panel: PanelId, points: &[GeoPoint]) {
        self.events.push(SinkEvent::RouteProgress {
            panel,
            points: points.to_vec(),
        });
    }

    fn route_final(&mut self, panel: PanelId, points: &[GeoPoint]) {
        self.events.push(SinkEvent::RouteFinal {
            panel,
            points: points.to_vec(),
        });
    }

    fn clear_transient(&mut self, panel: PanelId) {
        self.events.push(SinkEvent::ClearTransient(panel));
    }

    fn clear_final(&mut self, panel: PanelId) {
        self.events.push(SinkEvent::ClearFinal(panel));
    }

    fn celebrate(&mut self, panel: PanelId) {
        self.events.push(SinkEvent::Celebrate(panel));
    }

    fn status(&mut self, panel: PanelId, update: StatusUpdate) {
        self.events.push(SinkEvent::Status { panel, update });
    }
}
