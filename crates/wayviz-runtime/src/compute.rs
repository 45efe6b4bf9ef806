//! The outbound port to the external compute collaborator.
//!
//! Submission is fire-and-forget: the engine hands a request to the bridge
//! and moves on. Responses come back later through the orchestrator's
//! `deliver_*` entry points, carrying the generation the transport copied
//! from the request so stale replies can be fenced.
//!
//! The panel id is transport addressing, not payload: it tells the
//! embedder where the eventual reply belongs and never crosses the wire.

use wayviz_core::compute::{GridComputeRequest, RouteComputeRequest};

use crate::panel::PanelId;

/// Transport seam for compute requests.
///
/// Implementations typically queue or transmit the request; they must not
/// call back into the engine synchronously.
pub trait ComputeBridge {
    fn submit_grid(&mut self, panel: PanelId, request: GridComputeRequest);
    fn submit_route(&mut self, panel: PanelId, request: RouteComputeRequest);
}

/// One submitted request together with the panel it answers to.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission<R> {
    pub panel: PanelId,
    pub request: R,
}

/// A bridge that records submissions instead of transmitting them.
///
/// Tests and loopback embedders drain the vectors, compute answers out of
/// band, and feed them back through the orchestrator.
#[derive(Debug, Default)]
pub struct RecordingBridge {
    pub grid_requests: Vec<Submission<GridComputeRequest>>,
    pub route_requests: Vec<Submission<RouteComputeRequest>>,
}

impl RecordingBridge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total submissions of both kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.grid_requests.len() + self.route_requests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ComputeBridge for RecordingBridge {
    fn submit_grid(&mut self, panel: PanelId, request: GridComputeRequest) {
        self.grid_requests.push(Submission { panel, request });
    }

    fn submit_route(&mut self, panel: PanelId, request: RouteComputeRequest) {
        self.route_requests.push(Submission { panel, request });
    }
}
