//! Per-panel playback: the Idle / Running / Settled state machine.
//!
//! A run replays one immutable result snapshot, one element per tick. Grid
//! runs reveal visited cells at a fixed interval; route runs grow a polyline
//! at `duration / points` so every route finishes in the same wall-clock
//! time regardless of length. The first frame is emitted synchronously by
//! `start`, and each tick reports when the next one is due; the scheduler
//! owns the actual deadlines.
//!
//! # Invariants
//! - At most one run is ever live per [`Playback`]: `start` while `Running`
//!   cancels the old run first.
//! - The transient overlay token lives inside the `Running` state, so every
//!   exit from `Running` (settle, cancel, reset) releases it through the
//!   sink exactly once.
//! - The generation counter bumps on every start and cancel; a tick or
//!   compute response carrying an older generation is dropped by the caller.
//!
//! # Failure Modes
//! - Results that cannot animate (empty visited, route below two points)
//!   are rejected by `start` without disturbing the current state.

use std::error::Error;
use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};
use wayviz_core::grid::{Cell, GridState};
use wayviz_core::result::{ResultBuffer, RouteResult, SearchResult};

use crate::panel::PanelId;
use crate::render::{GridFrame, RenderSink, StatusUpdate};

// ---------------------------------------------------------------------------
// Generation fencing
// ---------------------------------------------------------------------------

/// Per-panel stale-response fence, bumped on every start and cancel.
///
/// Outstanding compute requests and scheduled ticks carry the generation
/// current at issue time; anything arriving with an older value is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    fn bump(&mut self) {
        self.0 += 1;
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Overlay token
// ---------------------------------------------------------------------------

/// Token for the in-progress drawing surface.
///
/// Acquired when a run begins and owned by the `Running` state; the only way
/// out of `Running` moves the token through [`release`](Self::release),
/// which tells the sink to drop the overlay.
#[derive(Debug)]
#[must_use = "an acquired overlay must be released through the sink"]
struct TransientOverlay(());

impl TransientOverlay {
    const fn acquire() -> Self {
        Self(())
    }

    fn release<S: RenderSink>(self, panel: PanelId, sink: &mut S) {
        sink.clear_transient(panel);
    }
}

// ---------------------------------------------------------------------------
// Active runs
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct SearchRun {
    result: Arc<SearchResult>,
    /// Next visited index to reveal; the run is exhausted at `visited.len()`.
    index: usize,
    started_at: Duration,
    interval: Duration,
    overlay: TransientOverlay,
    /// Paintable prefix revealed so far, in expansion order.
    revealed: Vec<Cell>,
    /// Whether `visited[i]` is paintable, precomputed at start. Obstacles
    /// cannot change mid-run (edits are rejected while running).
    paintable: Vec<bool>,
    /// Final path with obstacle cells filtered out.
    final_path: Vec<Cell>,
    /// Obstacle snapshot for stateless sinks, sorted.
    obstacles: Vec<Cell>,
}

impl SearchRun {
    fn reveal_next<S: RenderSink>(&mut self, panel: PanelId, sink: &mut S) {
        let cell = self.result.visited[self.index];
        let frontier = if self.paintable[self.index] {
            self.revealed.push(cell);
            Some(cell)
        } else {
            None
        };
        self.index += 1;
        trace!(panel = %panel, index = self.index, "grid reveal tick");
        sink.grid_frame(
            panel,
            GridFrame {
                revealed: &self.revealed,
                frontier,
                path: &[],
                obstacles: &self.obstacles,
            },
        );
    }
}

#[derive(Debug)]
struct RouteRun {
    result: Arc<RouteResult>,
    /// Number of points currently shown; the run is exhausted at
    /// `route.len()`.
    index: usize,
    started_at: Duration,
    interval: Duration,
    overlay: TransientOverlay,
}

impl RouteRun {
    fn grow_next<S: RenderSink>(&mut self, panel: PanelId, sink: &mut S) {
        self.index += 1;
        trace!(panel = %panel, shown = self.index, "route grow tick");
        sink.route_progress(panel, &self.result.route[..self.index]);
    }
}

#[derive(Debug)]
enum RunKind {
    Search(SearchRun),
    Route(RouteRun),
}

/// The live portion of a `Running` state.
///
/// Construction and advancement are internal; embedders observe position
/// through the accessors.
#[derive(Debug)]
pub struct ActiveRun {
    run: RunKind,
}

impl ActiveRun {
    /// Elements emitted so far.
    #[must_use]
    pub fn index(&self) -> usize {
        match &self.run {
            RunKind::Search(run) => run.index,
            RunKind::Route(run) => run.index,
        }
    }

    /// Engine time at which this run started.
    #[must_use]
    pub fn started_at(&self) -> Duration {
        match &self.run {
            RunKind::Search(run) => run.started_at,
            RunKind::Route(run) => run.started_at,
        }
    }

    /// Interval between ticks, fixed for the lifetime of the run.
    #[must_use]
    pub fn interval(&self) -> Duration {
        match &self.run {
            RunKind::Search(run) => run.interval,
            RunKind::Route(run) => run.interval,
        }
    }

    fn is_exhausted(&self) -> bool {
        match &self.run {
            RunKind::Search(run) => run.index >= run.result.visited.len(),
            RunKind::Route(run) => run.index >= run.result.route.len(),
        }
    }

    fn advance<S: RenderSink>(&mut self, panel: PanelId, sink: &mut S) -> Duration {
        match &mut self.run {
            RunKind::Search(run) => {
                run.reveal_next(panel, sink);
                run.interval
            }
            RunKind::Route(run) => {
                run.grow_next(panel, sink);
                run.interval
            }
        }
    }

    fn into_overlay(self) -> TransientOverlay {
        match self.run {
            RunKind::Search(run) => run.overlay,
            RunKind::Route(run) => run.overlay,
        }
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Playback phase of one panel. Owned exclusively by that panel.
#[derive(Debug)]
pub enum PlaybackState {
    /// No result installed or the last run was cancelled.
    Idle,
    /// A run is live; the transient overlay token is held inside.
    Running(ActiveRun),
    /// The terminal phase: transient visuals replaced by a final overlay.
    Settled(ResultBuffer),
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::Idle
    }
}

/// What a fired tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was emitted; the next tick is due after `next_in`.
    Continue { next_in: Duration },
    /// The run settled; no further ticks.
    Settled,
    /// No run was active; nothing happened.
    Ignored,
}

/// A result that cannot be animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    /// Grid result with no visited cells.
    EmptyVisited,
    /// Route below the minimum number of points.
    RouteTooShort { len: usize },
    /// Result kind does not match the panel kind. Unreachable through the
    /// orchestrator, which fences kinds at delivery.
    MismatchedBuffer,
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyVisited => write!(f, "search result has no visited cells"),
            Self::RouteTooShort { len } => {
                write!(
                    f,
                    "route has {len} points, need at least {}",
                    RouteResult::MIN_POINTS
                )
            }
            Self::MismatchedBuffer => write!(f, "result kind does not match the panel kind"),
        }
    }
}

impl Error for StartError {}

/// One panel's playback engine.
#[derive(Debug, Default)]
pub struct Playback {
    state: PlaybackState,
    generation: Generation,
}

impl Playback {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self.state, PlaybackState::Idle)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, PlaybackState::Running(_))
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self.state, PlaybackState::Settled(_))
    }

    /// The settled result, when in the terminal phase.
    #[must_use]
    pub fn settled_buffer(&self) -> Option<&ResultBuffer> {
        match &self.state {
            PlaybackState::Settled(buffer) => Some(buffer),
            _ => None,
        }
    }

    /// Starts replaying a grid search at a fixed `interval` per cell.
    ///
    /// Emits the first reveal synchronously and returns the interval after
    /// which the next tick is due. A running animation is implicitly
    /// cancelled first; a previous settled overlay is cleared. Rejection
    /// leaves the current state untouched.
    pub fn start_search<S: RenderSink>(
        &mut self,
        panel: PanelId,
        result: Arc<SearchResult>,
        grid: &GridState,
        interval: Duration,
        now: Duration,
        sink: &mut S,
    ) -> Result<Duration, StartError> {
        if result.visited.is_empty() {
            debug!(panel = %panel, "rejected search result with no visited cells");
            return Err(StartError::EmptyVisited);
        }
        self.clear_previous(panel, sink);

        let paintable: Vec<bool> = result
            .visited
            .iter()
            .map(|cell| !grid.is_obstacle(*cell))
            .collect();
        let final_path: Vec<Cell> = result
            .path
            .iter()
            .copied()
            .filter(|cell| !grid.is_obstacle(*cell))
            .collect();
        let mut run = SearchRun {
            revealed: Vec::with_capacity(result.visited.len()),
            result,
            index: 0,
            started_at: now,
            interval,
            overlay: TransientOverlay::acquire(),
            paintable,
            final_path,
            obstacles: grid.obstacle_list(),
        };
        run.reveal_next(panel, sink);
        self.generation.bump();
        debug!(
            panel = %panel,
            generation = self.generation.value(),
            cells = run.result.visited.len(),
            interval_ms = interval.as_millis() as u64,
            "search playback started"
        );
        self.state = PlaybackState::Running(ActiveRun {
            run: RunKind::Search(run),
        });
        Ok(interval)
    }

    /// Starts replaying a route over `duration` total wall-clock time.
    ///
    /// The tick interval is `duration / points`, recomputed here on every
    /// start so panels with different configured durations stay
    /// proportional. Emits the one-point polyline seed synchronously.
    pub fn start_route<S: RenderSink>(
        &mut self,
        panel: PanelId,
        result: Arc<RouteResult>,
        duration: Duration,
        now: Duration,
        sink: &mut S,
    ) -> Result<Duration, StartError> {
        let points = result.route.len();
        if points < RouteResult::MIN_POINTS {
            debug!(panel = %panel, points, "rejected route below the minimum length");
            return Err(StartError::RouteTooShort { len: points });
        }
        self.clear_previous(panel, sink);

        let steps = u32::try_from(points).unwrap_or(u32::MAX);
        let interval = duration / steps;
        sink.status(panel, StatusUpdate::Animating);
        let mut run = RouteRun {
            result,
            index: 0,
            started_at: now,
            interval,
            overlay: TransientOverlay::acquire(),
        };
        run.grow_next(panel, sink);
        self.generation.bump();
        debug!(
            panel = %panel,
            generation = self.generation.value(),
            points,
            interval_ms = interval.as_millis() as u64,
            "route playback started"
        );
        self.state = PlaybackState::Running(ActiveRun {
            run: RunKind::Route(run),
        });
        Ok(interval)
    }

    /// Cancels a running animation: releases the transient overlay, discards
    /// the in-progress position, bumps the generation. Idempotent; from
    /// `Idle` or `Settled` this is a silent no-op with no sink effects.
    ///
    /// Returns whether a run was actually cancelled.
    pub fn cancel<S: RenderSink>(&mut self, panel: PanelId, sink: &mut S) -> bool {
        match mem::replace(&mut self.state, PlaybackState::Idle) {
            PlaybackState::Running(active) => {
                active.into_overlay().release(panel, sink);
                self.generation.bump();
                debug!(
                    panel = %panel,
                    generation = self.generation.value(),
                    "playback cancelled"
                );
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Advances the run by one element, or settles it when exhausted.
    pub fn on_tick<S: RenderSink>(
        &mut self,
        panel: PanelId,
        now: Duration,
        sink: &mut S,
    ) -> TickOutcome {
        let PlaybackState::Running(active) = &mut self.state else {
            trace!(panel = %panel, "tick ignored outside of a run");
            return TickOutcome::Ignored;
        };
        if !active.is_exhausted() {
            let next_in = active.advance(panel, sink);
            return TickOutcome::Continue { next_in };
        }
        self.settle(panel, now, sink);
        TickOutcome::Settled
    }

    /// Returns to `Idle` from any phase, releasing whatever visuals exist.
    ///
    /// Always bumps the generation, so responses to requests issued before
    /// the reset are fenced even when nothing was running.
    pub fn reset<S: RenderSink>(&mut self, panel: PanelId, sink: &mut S) {
        if !self.cancel(panel, sink) {
            if matches!(self.state, PlaybackState::Settled(_)) {
                sink.clear_final(panel);
                self.state = PlaybackState::Idle;
            }
            self.generation.bump();
        }
        debug!(
            panel = %panel,
            generation = self.generation.value(),
            "playback reset"
        );
    }

    /// Repaints the current static view after a grid edit: blank when no
    /// result is settled, the full filtered result otherwise. Running panels
    /// never reach this; edits are rejected mid-run.
    pub fn repaint<S: RenderSink>(&self, panel: PanelId, grid: &GridState, sink: &mut S) {
        let obstacles = grid.obstacle_list();
        match &self.state {
            PlaybackState::Settled(ResultBuffer::Search(result)) => {
                let revealed: Vec<Cell> = result
                    .visited
                    .iter()
                    .copied()
                    .filter(|cell| !grid.is_obstacle(*cell))
                    .collect();
                let path: Vec<Cell> = result
                    .path
                    .iter()
                    .copied()
                    .filter(|cell| !grid.is_obstacle(*cell))
                    .collect();
                sink.grid_frame(
                    panel,
                    GridFrame {
                        revealed: &revealed,
                        frontier: None,
                        path: &path,
                        obstacles: &obstacles,
                    },
                );
            }
            PlaybackState::Running(_) => {}
            _ => {
                sink.grid_frame(
                    panel,
                    GridFrame {
                        revealed: &[],
                        frontier: None,
                        path: &[],
                        obstacles: &obstacles,
                    },
                );
            }
        }
    }

    // Transition out of `Running` into `Settled`: release the transient
    // overlay, install the final overlay, fire the one-shot effect for grid
    // runs with a non-empty path.
    fn settle<S: RenderSink>(&mut self, panel: PanelId, now: Duration, sink: &mut S) {
        let PlaybackState::Running(active) = mem::replace(&mut self.state, PlaybackState::Idle)
        else {
            return;
        };
        let elapsed = now.saturating_sub(active.started_at());
        match active.run {
            RunKind::Search(run) => {
                let SearchRun {
                    result,
                    overlay,
                    revealed,
                    final_path,
                    obstacles,
                    ..
                } = run;
                overlay.release(panel, sink);
                sink.grid_frame(
                    panel,
                    GridFrame {
                        revealed: &revealed,
                        frontier: None,
                        path: &final_path,
                        obstacles: &obstacles,
                    },
                );
                if !final_path.is_empty() {
                    sink.celebrate(panel);
                }
                debug!(
                    panel = %panel,
                    elapsed_ms = elapsed.as_millis() as u64,
                    path = final_path.len(),
                    "search playback settled"
                );
                self.state = PlaybackState::Settled(ResultBuffer::Search(result));
            }
            RunKind::Route(run) => {
                let RouteRun {
                    result, overlay, ..
                } = run;
                overlay.release(panel, sink);
                sink.route_final(panel, &result.route);
                sink.status(panel, StatusUpdate::Complete);
                debug!(
                    panel = %panel,
                    elapsed_ms = elapsed.as_millis() as u64,
                    points = result.route.len(),
                    "route playback settled"
                );
                self.state = PlaybackState::Settled(ResultBuffer::Route(result));
            }
        }
    }

    fn clear_previous<S: RenderSink>(&mut self, panel: PanelId, sink: &mut S) {
        if self.cancel(panel, sink) {
            return;
        }
        if matches!(self.state, PlaybackState::Settled(_)) {
            sink.clear_final(panel);
            self.state = PlaybackState::Idle;
        }
    }
}
