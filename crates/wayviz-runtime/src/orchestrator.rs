//! The engine façade: registration, edits, compute dispatch, result
//! delivery, and the tick loop.
//!
//! [`Orchestrator`] owns the render sink, the compute bridge, the panel
//! registry, and the shared tick queue. Everything here runs on the
//! embedder's single thread: compute requests leave through the bridge,
//! responses come back through the `deliver_*` methods, and due ticks fire
//! when the embedder calls [`advance`](Orchestrator::advance) with the
//! current engine time.
//!
//! # Staleness
//! Every request and scheduled tick is stamped with the issuing panel's
//! generation. Cancelling, restarting, or resetting a panel bumps the
//! generation, so deliveries and ticks stamped earlier are dropped here
//! without touching playback.

use std::time::Duration;

use tracing::{debug, trace};
use wayviz_core::algorithm::Algorithm;
use wayviz_core::compute::{GridComputeRequest, GridComputeResponse, RouteComputeRequest};
use wayviz_core::geo::{DEFAULT_GEO_END, DEFAULT_GEO_START, GeoPoint};
use wayviz_core::grid::{Cell, DEFAULT_COLS, DEFAULT_ROWS, EndpointKind, GridState};
use wayviz_core::result::{ResultBuffer, RouteResult, SearchResult};

use crate::compute::ComputeBridge;
use crate::panel::{EngineError, Panel, PanelField, PanelId, PanelKind, PanelRegistry};
use crate::playback::TickOutcome;
use crate::render::{RenderSink, StatusUpdate};
use crate::scheduler::TickQueue;

/// Interval between grid reveal ticks.
pub const DEFAULT_GRID_TICK: Duration = Duration::from_millis(50);
/// Total wall-clock time a route animation takes, regardless of length.
pub const DEFAULT_ROUTE_DURATION: Duration = Duration::from_millis(3000);

/// Engine-wide defaults applied at panel registration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorConfig {
    pub grid_tick: Duration,
    pub route_duration: Duration,
    pub grid_rows: u16,
    pub grid_cols: u16,
    pub geo_start: GeoPoint,
    pub geo_end: GeoPoint,
}

impl OrchestratorConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            grid_tick: DEFAULT_GRID_TICK,
            route_duration: DEFAULT_ROUTE_DURATION,
            grid_rows: DEFAULT_ROWS,
            grid_cols: DEFAULT_COLS,
            geo_start: DEFAULT_GEO_START,
            geo_end: DEFAULT_GEO_END,
        }
    }

    #[must_use]
    pub const fn with_grid_tick(mut self, tick: Duration) -> Self {
        self.grid_tick = tick;
        self
    }

    #[must_use]
    pub const fn with_route_duration(mut self, duration: Duration) -> Self {
        self.route_duration = duration;
        self
    }

    #[must_use]
    pub const fn with_grid_size(mut self, rows: u16, cols: u16) -> Self {
        self.grid_rows = rows;
        self.grid_cols = cols;
        self
    }

    #[must_use]
    pub const fn with_geo_endpoints(mut self, start: GeoPoint, end: GeoPoint) -> Self {
        self.geo_start = start;
        self.geo_end = end;
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// The playback engine behind a set of visualization panels.
#[derive(Debug)]
pub struct Orchestrator<S, B> {
    config: OrchestratorConfig,
    panels: PanelRegistry,
    queue: TickQueue,
    sink: S,
    bridge: B,
}

impl<S: RenderSink, B: ComputeBridge> Orchestrator<S, B> {
    #[must_use]
    pub fn new(sink: S, bridge: B) -> Self {
        Self::with_config(OrchestratorConfig::new(), sink, bridge)
    }

    #[must_use]
    pub fn with_config(config: OrchestratorConfig, sink: S, bridge: B) -> Self {
        Self {
            config,
            panels: PanelRegistry::new(),
            queue: TickQueue::new(),
            sink,
            bridge,
        }
    }

    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[must_use]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    #[must_use]
    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    #[must_use]
    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    pub fn panel(&self, id: PanelId) -> Result<&Panel, EngineError> {
        self.panels.get(id)
    }

    /// Registered panel ids in ascending order.
    #[must_use]
    pub fn panel_ids(&self) -> Vec<PanelId> {
        self.panels.ids()
    }

    /// Registers a grid panel sized per the config.
    pub fn register_grid_panel(&mut self, id: PanelId) -> Result<(), EngineError> {
        let grid = GridState::new(self.config.grid_rows, self.config.grid_cols);
        self.panels.register(Panel::new_grid(id, grid))
    }

    /// Registers a geographic panel with the config's default endpoints and
    /// route duration.
    pub fn register_geo_panel(&mut self, id: PanelId) -> Result<(), EngineError> {
        self.panels.register(Panel::new_geographic(
            id,
            self.config.geo_start,
            self.config.geo_end,
            self.config.route_duration,
        ))
    }

    /// Registers a geographic panel with its own animation duration.
    pub fn register_geo_panel_with_duration(
        &mut self,
        id: PanelId,
        route_duration: Duration,
    ) -> Result<(), EngineError> {
        self.panels.register(Panel::new_geographic(
            id,
            self.config.geo_start,
            self.config.geo_end,
            route_duration,
        ))
    }

    pub fn toggle_obstacle(&mut self, id: PanelId, cell: Cell) -> Result<bool, EngineError> {
        let panel = self.panels.get_mut(id)?;
        panel.toggle_obstacle(cell, &mut self.sink)
    }

    pub fn move_grid_endpoint(
        &mut self,
        id: PanelId,
        which: EndpointKind,
        cell: Cell,
    ) -> Result<bool, EngineError> {
        let panel = self.panels.get_mut(id)?;
        panel.move_grid_endpoint(which, cell, &mut self.sink)
    }

    pub fn move_geo_endpoint(
        &mut self,
        id: PanelId,
        which: EndpointKind,
        point: GeoPoint,
    ) -> Result<(), EngineError> {
        self.panels.get_mut(id)?.move_geo_endpoint(which, point)
    }

    /// Sets the wall-clock duration of the panel's route animations.
    ///
    /// Takes effect on the next start; a run already in flight keeps the
    /// interval it was started with.
    pub fn set_route_duration(
        &mut self,
        id: PanelId,
        duration: Duration,
    ) -> Result<(), EngineError> {
        let panel = self.panels.get_mut(id)?;
        if panel.kind() != PanelKind::Geographic {
            return Err(EngineError::KindMismatch {
                panel: id,
                expected: PanelKind::Geographic,
                actual: panel.kind(),
            });
        }
        panel.set_route_duration(duration);
        debug!(
            panel = %id,
            duration_ms = duration.as_millis() as u64,
            "route duration set"
        );
        Ok(())
    }

    /// Cancels the panel's running animation, if any.
    pub fn cancel(&mut self, id: PanelId) -> Result<bool, EngineError> {
        let panel = self.panels.get_mut(id)?;
        Ok(panel.cancel(&mut self.sink))
    }

    /// Returns the panel to its registered defaults: playback cleared, grid
    /// field restored, installed result dropped. In-flight responses for the
    /// panel are fenced by the generation bump.
    pub fn reset(&mut self, id: PanelId) -> Result<(), EngineError> {
        let panel = self.panels.get_mut(id)?;
        panel.reset(&mut self.sink);
        Ok(())
    }

    /// Selects the panel's algorithm.
    ///
    /// Mid-run this cancels the animation and immediately re-requests with
    /// the panel's current field and the new algorithm, so the fresh result
    /// restarts playback on delivery. Outside a run the selection is only
    /// stored; nothing is issued until the next explicit run.
    pub fn select_algorithm(
        &mut self,
        id: PanelId,
        algorithm: Algorithm,
    ) -> Result<(), EngineError> {
        let panel = self.panels.get_mut(id)?;
        if panel.algorithm() == algorithm {
            return Ok(());
        }
        panel.set_algorithm(algorithm);
        let was_running = panel.cancel(&mut self.sink);
        debug!(
            panel = %id,
            algorithm = %algorithm,
            mid_run = was_running,
            "algorithm selected"
        );
        if was_running {
            self.request_compute(id)?;
        }
        Ok(())
    }

    /// Issues a compute request for the panel's current field and algorithm.
    ///
    /// On a grid panel this is ignored while an animation is running; the
    /// field is frozen and a duplicate request would only race the current
    /// replay. Geographic panels may re-run at any time: the response
    /// supersedes the running animation through the usual implicit cancel.
    pub fn run(&mut self, id: PanelId) -> Result<(), EngineError> {
        let panel = self.panels.get(id)?;
        if panel.kind() == PanelKind::Grid && panel.is_running() {
            debug!(panel = %id, "run ignored while the grid animation is in flight");
            return Ok(());
        }
        self.request_compute(id)
    }

    /// Replays the panel's installed result from the beginning. A panel with
    /// no installed result ignores this.
    pub fn replay(&mut self, id: PanelId, now: Duration) -> Result<(), EngineError> {
        let panel = self.panels.get(id)?;
        let Some(buffer) = panel.buffer().cloned() else {
            debug!(panel = %id, "replay ignored, no result installed");
            return Ok(());
        };
        self.start_playback(id, &buffer, now)
    }

    /// Delivers a grid compute response to `id`.
    ///
    /// Responses echoing a stale generation are dropped. Responses without
    /// an echo are treated as latest-authoritative and accepted. A playable
    /// result is installed and starts animating immediately; the status line
    /// gets the responder's numbers either way.
    pub fn deliver_grid_result(
        &mut self,
        id: PanelId,
        response: GridComputeResponse,
        now: Duration,
    ) -> Result<(), EngineError> {
        let panel = self.panels.get_mut(id)?;
        if panel.kind() != PanelKind::Grid {
            return Err(EngineError::KindMismatch {
                panel: id,
                expected: PanelKind::Grid,
                actual: panel.kind(),
            });
        }
        if let Some(echoed) = response.generation {
            let current = panel.generation().value();
            if echoed != current {
                trace!(panel = %id, echoed, current, "stale grid result dropped");
                return Ok(());
            }
        }

        let result = SearchResult::new(response.visited, response.path);
        if result.has_path() {
            self.sink.status(
                id,
                StatusUpdate::SearchStats {
                    path_len: result.path.len(),
                    visited_len: result.visited.len(),
                    time_ms: response.time_ms,
                },
            );
        } else {
            self.sink.status(id, StatusUpdate::NoPath);
        }
        if !result.is_playable() {
            debug!(panel = %id, "grid result has nothing to animate, dropped");
            return Ok(());
        }

        debug!(
            panel = %id,
            visited = result.visited.len(),
            path = result.path.len(),
            time_ms = response.time_ms,
            "grid result delivered"
        );
        let buffer = ResultBuffer::from(result);
        self.panels.get_mut(id)?.install_buffer(buffer.clone());
        self.start_playback(id, &buffer, now)
    }

    /// Delivers a geographic route to `id`. `generation` is the value
    /// captured when the request was submitted; a stale one drops the reply.
    pub fn deliver_route_result(
        &mut self,
        id: PanelId,
        generation: u64,
        route: Vec<GeoPoint>,
        now: Duration,
    ) -> Result<(), EngineError> {
        let panel = self.panels.get_mut(id)?;
        if panel.kind() != PanelKind::Geographic {
            return Err(EngineError::KindMismatch {
                panel: id,
                expected: PanelKind::Geographic,
                actual: panel.kind(),
            });
        }
        let current = panel.generation().value();
        if generation != current {
            trace!(panel = %id, stale = generation, current, "stale route dropped");
            return Ok(());
        }

        let result = RouteResult::new(route);
        if !result.is_playable() {
            debug!(panel = %id, points = result.route.len(), "route too short to animate");
            self.sink.status(id, StatusUpdate::NoRoute);
            return Ok(());
        }

        debug!(panel = %id, points = result.route.len(), "route delivered");
        let buffer = ResultBuffer::from(result);
        panel.install_buffer(buffer.clone());
        self.start_playback(id, &buffer, now)
    }

    /// Delivers a geographic compute failure: surfaced on the status line,
    /// unless the panel has moved on to a newer generation.
    pub fn deliver_route_error(
        &mut self,
        id: PanelId,
        generation: u64,
        message: &str,
    ) -> Result<(), EngineError> {
        let panel = self.panels.get_mut(id)?;
        if panel.kind() != PanelKind::Geographic {
            return Err(EngineError::KindMismatch {
                panel: id,
                expected: PanelKind::Geographic,
                actual: panel.kind(),
            });
        }
        let current = panel.generation().value();
        if generation != current {
            trace!(panel = %id, stale = generation, current, "stale route error dropped");
            return Ok(());
        }
        debug!(panel = %id, message, "route compute failed");
        self.sink.status(id, StatusUpdate::ComputeFailed(message.to_owned()));
        Ok(())
    }

    /// Fires every tick due at or before `now`. Returns the number of ticks
    /// that reached a live run.
    ///
    /// Each continuing run is rescheduled at `due + interval`, not
    /// `now + interval`, so a late `advance` call does not stretch the
    /// animation.
    pub fn advance(&mut self, now: Duration) -> usize {
        let mut fired = 0;
        while let Some(entry) = self.queue.pop_due(now) {
            let Ok(panel) = self.panels.get_mut(entry.panel) else {
                continue;
            };
            if !panel.is_running() || panel.generation() != entry.generation {
                trace!(panel = %entry.panel, "stale tick dropped");
                continue;
            }
            match panel.tick(now, &mut self.sink) {
                TickOutcome::Continue { next_in } => {
                    let generation = panel.generation();
                    self.queue.schedule(entry.due + next_in, entry.panel, generation);
                    fired += 1;
                }
                TickOutcome::Settled => {
                    fired += 1;
                }
                TickOutcome::Ignored => {}
            }
        }
        fired
    }

    /// Earliest pending tick deadline; `None` when nothing is scheduled.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.next_deadline()
    }

    /// Pending tick entries, stale ones included.
    #[must_use]
    pub fn pending_ticks(&self) -> usize {
        self.queue.len()
    }

    fn start_playback(
        &mut self,
        id: PanelId,
        buffer: &ResultBuffer,
        now: Duration,
    ) -> Result<(), EngineError> {
        let grid_tick = self.config.grid_tick;
        let panel = self.panels.get_mut(id)?;
        match panel.begin(buffer, grid_tick, now, &mut self.sink) {
            Ok(interval) => {
                let generation = panel.generation();
                self.queue.schedule(now + interval, id, generation);
                Ok(())
            }
            Err(error) => {
                debug!(panel = %id, %error, "playback not started");
                Ok(())
            }
        }
    }

    fn request_compute(&mut self, id: PanelId) -> Result<(), EngineError> {
        let panel = self.panels.get(id)?;
        let generation = panel.generation().value();
        let algorithm = panel.algorithm();
        match panel.field() {
            PanelField::Grid(grid) => {
                let request = GridComputeRequest {
                    algorithm,
                    rows: grid.rows(),
                    cols: grid.cols(),
                    start: grid.start(),
                    end: grid.end(),
                    obstacles: grid.obstacle_list(),
                    generation,
                };
                debug!(panel = %id, algorithm = %algorithm, generation, "grid compute requested");
                self.bridge.submit_grid(id, request);
            }
            PanelField::Geographic { start, end } => {
                let request = RouteComputeRequest {
                    start: *start,
                    end: *end,
                    algorithm,
                    generation,
                };
                debug!(panel = %id, algorithm = %algorithm, generation, "route compute requested");
                self.bridge.submit_route(id, request);
            }
        }
        Ok(())
    }
}
