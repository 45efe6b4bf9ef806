//! Wire transport for the demo: requests leave as the JSON the codec
//! produces, exactly as they would toward a real compute service.
//!
//! The panel id and, for routes, the generation ride alongside the encoded
//! body. That mirrors the real transports: the channel multiplexer knows
//! which panel it serves, and a request/response client pairs each reply
//! with the call that caused it.

use tracing::error;
use wayviz_core::compute::{GridComputeRequest, RouteComputeRequest};
use wayviz_core::protocol::{self, ChannelMessage};
use wayviz_runtime::{ComputeBridge, PanelId};

/// One encoded request waiting for the fake service to pick it up.
#[derive(Debug)]
pub enum Outbound {
    /// A grid channel envelope.
    Channel { panel: PanelId, raw: String },
    /// A geographic request body plus its out-of-band correlation data.
    RouteCall {
        panel: PanelId,
        generation: u64,
        raw: String,
    },
}

/// Encodes engine submissions to wire JSON and queues them for pickup.
#[derive(Debug, Default)]
pub struct JsonBridge {
    outbox: Vec<Outbound>,
}

impl JsonBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes everything queued since the last drain.
    pub fn drain(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    pub fn is_empty(&self) -> bool {
        self.outbox.is_empty()
    }
}

impl ComputeBridge for JsonBridge {
    fn submit_grid(&mut self, panel: PanelId, request: GridComputeRequest) {
        match protocol::encode_channel(&ChannelMessage::RunPathfinding(request)) {
            Ok(raw) => self.outbox.push(Outbound::Channel { panel, raw }),
            Err(err) => error!(%panel, %err, "dropping unencodable grid request"),
        }
    }

    fn submit_route(&mut self, panel: PanelId, request: RouteComputeRequest) {
        let generation = request.generation;
        match protocol::encode_route_request(&request) {
            Ok(raw) => self.outbox.push(Outbound::RouteCall {
                panel,
                generation,
                raw,
            }),
            Err(err) => error!(%panel, %err, "dropping unencodable route request"),
        }
    }
}
