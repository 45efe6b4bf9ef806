//! Panel identity, per-panel state, and the registry.
//!
//! Each registered panel owns its field model, its [`Playback`] engine, its
//! installed result buffer, and its selected algorithm. Panels never share
//! state; an operation addressed to one panel cannot observe or disturb
//! another.
//!
//! The panel kind is fixed at registration. Grid operations on a geographic
//! panel (and vice versa) fail with [`EngineError::KindMismatch`] rather
//! than being coerced.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use wayviz_core::algorithm::Algorithm;
use wayviz_core::geo::GeoPoint;
use wayviz_core::grid::{Cell, EndpointKind, GridState};
use wayviz_core::result::ResultBuffer;

use crate::playback::{Generation, Playback, PlaybackState, StartError, TickOutcome};
use crate::render::RenderSink;

/// Opaque panel handle. Allocated by the embedder at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(u32);

impl PanelId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a panel visualizes, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    /// Cell-by-cell search replay over an editable grid.
    Grid,
    /// Growing polyline over geographic coordinates.
    Geographic,
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid => f.write_str("grid"),
            Self::Geographic => f.write_str("geographic"),
        }
    }
}

/// The editable field a panel runs searches over.
#[derive(Debug, Clone)]
pub enum PanelField {
    Grid(GridState),
    Geographic { start: GeoPoint, end: GeoPoint },
}

impl PanelField {
    #[must_use]
    pub fn kind(&self) -> PanelKind {
        match self {
            Self::Grid(_) => PanelKind::Grid,
            Self::Geographic { .. } => PanelKind::Geographic,
        }
    }
}

/// Engine-level failures surfaced to the embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Operation addressed a panel that was never registered.
    PanelNotFound(PanelId),
    /// Registration reused an existing id.
    DuplicatePanel(PanelId),
    /// Operation kind does not match the panel kind.
    KindMismatch {
        panel: PanelId,
        expected: PanelKind,
        actual: PanelKind,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PanelNotFound(id) => write!(f, "unknown panel {id}"),
            Self::DuplicatePanel(id) => write!(f, "panel {id} is already registered"),
            Self::KindMismatch {
                panel,
                expected,
                actual,
            } => {
                write!(f, "panel {panel} is {actual}, operation requires {expected}")
            }
        }
    }
}

impl Error for EngineError {}

/// One registered visualization surface.
///
/// Construction fixes the kind. Everything else (field edits, algorithm
/// selection, buffer installs, playback) mutates in place through the
/// methods below.
#[derive(Debug)]
pub struct Panel {
    id: PanelId,
    field: PanelField,
    playback: Playback,
    buffer: Option<ResultBuffer>,
    algorithm: Algorithm,
    route_duration: Duration,
    /// Registration-time endpoints restored on reset; geographic only.
    geo_home: Option<(GeoPoint, GeoPoint)>,
}

impl Panel {
    /// A grid panel over `grid`. Route duration is irrelevant for grids and
    /// kept at zero.
    #[must_use]
    pub fn new_grid(id: PanelId, grid: GridState) -> Self {
        Self {
            id,
            field: PanelField::Grid(grid),
            playback: Playback::new(),
            buffer: None,
            algorithm: Algorithm::default(),
            route_duration: Duration::ZERO,
            geo_home: None,
        }
    }

    /// A geographic panel with its own total animation duration.
    #[must_use]
    pub fn new_geographic(
        id: PanelId,
        start: GeoPoint,
        end: GeoPoint,
        route_duration: Duration,
    ) -> Self {
        Self {
            id,
            field: PanelField::Geographic { start, end },
            playback: Playback::new(),
            buffer: None,
            algorithm: Algorithm::default(),
            route_duration,
            geo_home: Some((start, end)),
        }
    }

    #[must_use]
    pub fn id(&self) -> PanelId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> PanelKind {
        self.field.kind()
    }

    #[must_use]
    pub fn field(&self) -> &PanelField {
        &self.field
    }

    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
    }

    #[must_use]
    pub fn route_duration(&self) -> Duration {
        self.route_duration
    }

    pub fn set_route_duration(&mut self, duration: Duration) {
        self.route_duration = duration;
    }

    /// The most recently installed result, if any.
    #[must_use]
    pub fn buffer(&self) -> Option<&ResultBuffer> {
        self.buffer.as_ref()
    }

    pub fn install_buffer(&mut self, buffer: ResultBuffer) {
        self.buffer = Some(buffer);
    }

    #[must_use]
    pub fn playback_state(&self) -> &PlaybackState {
        self.playback.state()
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.playback.generation()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.playback.is_idle()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.playback.is_running()
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.playback.is_settled()
    }

    /// The grid model, when this is a grid panel.
    #[must_use]
    pub fn grid(&self) -> Option<&GridState> {
        match &self.field {
            PanelField::Grid(grid) => Some(grid),
            PanelField::Geographic { .. } => None,
        }
    }

    /// Current geographic endpoints, when this is a geographic panel.
    #[must_use]
    pub fn geo_endpoints(&self) -> Option<(GeoPoint, GeoPoint)> {
        match &self.field {
            PanelField::Geographic { start, end } => Some((*start, *end)),
            PanelField::Grid(_) => None,
        }
    }

    /// Flips obstacle membership at `cell` and repaints the static view.
    ///
    /// Rejected silently while an animation is running (returns
    /// `Ok(false)`); the field is frozen for the duration of a run. Illegal
    /// cells are likewise reported as unchanged.
    pub fn toggle_obstacle<S: RenderSink>(
        &mut self,
        cell: Cell,
        sink: &mut S,
    ) -> Result<bool, EngineError> {
        if self.playback.is_running() {
            debug!(panel = %self.id, cell = %cell, "obstacle edit ignored while running");
            return Ok(false);
        }
        let id = self.id;
        let PanelField::Grid(grid) = &mut self.field else {
            return Err(EngineError::KindMismatch {
                panel: id,
                expected: PanelKind::Grid,
                actual: PanelKind::Geographic,
            });
        };
        let changed = grid.toggle_obstacle(cell);
        if changed {
            self.playback.repaint(id, grid, sink);
        }
        Ok(changed)
    }

    /// Relocates a grid endpoint and repaints. Same running-freeze rules as
    /// [`toggle_obstacle`](Self::toggle_obstacle).
    pub fn move_grid_endpoint<S: RenderSink>(
        &mut self,
        which: EndpointKind,
        cell: Cell,
        sink: &mut S,
    ) -> Result<bool, EngineError> {
        if self.playback.is_running() {
            debug!(panel = %self.id, cell = %cell, "endpoint move ignored while running");
            return Ok(false);
        }
        let id = self.id;
        let PanelField::Grid(grid) = &mut self.field else {
            return Err(EngineError::KindMismatch {
                panel: id,
                expected: PanelKind::Grid,
                actual: PanelKind::Geographic,
            });
        };
        let changed = grid.move_endpoint(which, cell);
        if changed {
            self.playback.repaint(id, grid, sink);
        }
        Ok(changed)
    }

    /// Repositions a geographic endpoint. Allowed at any time, running
    /// included; the new position takes effect on the next request.
    pub fn move_geo_endpoint(
        &mut self,
        which: EndpointKind,
        point: GeoPoint,
    ) -> Result<(), EngineError> {
        let id = self.id;
        let PanelField::Geographic { start, end } = &mut self.field else {
            return Err(EngineError::KindMismatch {
                panel: id,
                expected: PanelKind::Geographic,
                actual: PanelKind::Grid,
            });
        };
        match which {
            EndpointKind::Start => *start = point,
            EndpointKind::End => *end = point,
        }
        debug!(panel = %id, point = %point, "geographic endpoint moved");
        Ok(())
    }

    /// Starts playback of `buffer` on this panel's field.
    ///
    /// Grid panels replay search results at `grid_tick` per cell;
    /// geographic panels replay routes over the panel's configured
    /// duration. Returns the tick interval on success.
    pub fn begin<S: RenderSink>(
        &mut self,
        buffer: &ResultBuffer,
        grid_tick: Duration,
        now: Duration,
        sink: &mut S,
    ) -> Result<Duration, StartError> {
        match (buffer, &self.field) {
            (ResultBuffer::Search(result), PanelField::Grid(grid)) => {
                self.playback
                    .start_search(self.id, Arc::clone(result), grid, grid_tick, now, sink)
            }
            (ResultBuffer::Route(result), PanelField::Geographic { .. }) => self
                .playback
                .start_route(self.id, Arc::clone(result), self.route_duration, now, sink),
            _ => Err(StartError::MismatchedBuffer),
        }
    }

    /// Forwards a due tick to the playback engine.
    pub fn tick<S: RenderSink>(&mut self, now: Duration, sink: &mut S) -> TickOutcome {
        self.playback.on_tick(self.id, now, sink)
    }

    /// Cancels a running animation. Idempotent.
    pub fn cancel<S: RenderSink>(&mut self, sink: &mut S) -> bool {
        self.playback.cancel(self.id, sink)
    }

    /// Clears playback and restores the field to its registered shape:
    /// grids drop their obstacles and return the endpoints to the corners,
    /// geographic panels return to their registration endpoints.
    ///
    /// The installed buffer is dropped; a later replay has nothing to run
    /// until a new result arrives.
    pub fn reset<S: RenderSink>(&mut self, sink: &mut S) {
        self.playback.reset(self.id, sink);
        self.buffer = None;
        let id = self.id;
        match &mut self.field {
            PanelField::Grid(grid) => {
                grid.reset();
                self.playback.repaint(id, grid, sink);
            }
            PanelField::Geographic { start, end } => {
                if let Some((home_start, home_end)) = self.geo_home {
                    *start = home_start;
                    *end = home_end;
                }
            }
        }
    }
}

/// Id-to-panel map; the unit of isolation.
#[derive(Debug, Default)]
pub struct PanelRegistry {
    panels: HashMap<PanelId, Panel>,
}

impl PanelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.panels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: PanelId) -> bool {
        self.panels.contains_key(&id)
    }

    /// Registered ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<PanelId> {
        let mut ids: Vec<PanelId> = self.panels.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn register(&mut self, panel: Panel) -> Result<(), EngineError> {
        let id = panel.id();
        if self.panels.contains_key(&id) {
            return Err(EngineError::DuplicatePanel(id));
        }
        debug!(panel = %id, kind = %panel.kind(), "panel registered");
        self.panels.insert(id, panel);
        Ok(())
    }

    pub fn get(&self, id: PanelId) -> Result<&Panel, EngineError> {
        self.panels.get(&id).ok_or(EngineError::PanelNotFound(id))
    }

    pub fn get_mut(&mut self, id: PanelId) -> Result<&mut Panel, EngineError> {
        self.panels
            .get_mut(&id)
            .ok_or(EngineError::PanelNotFound(id))
    }
}
