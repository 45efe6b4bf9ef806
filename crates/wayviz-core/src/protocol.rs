//! JSON codec for the compute transports.
//!
//! The grid channel is a persistent bidirectional stream of
//! `{"event": <name>, "data": <payload>}` envelopes. The geographic
//! interface exchanges bare JSON bodies: a request object out, and an
//! untagged reply back that is either `{"route": [...]}` or
//! `{"error": "..."}`.
//!
//! Cells travel as `[row, col]` arrays, geographic points as `[lat, lon]`,
//! algorithms as lowercase names. Unknown envelope events are surfaced
//! distinctly from malformed payloads so a multiplexed channel can route
//! other traffic around this codec.

use std::error::Error;
use std::fmt;

use crate::compute::{GridComputeRequest, GridComputeResponse, RouteComputeRequest};
use crate::result::RouteResult;

/// Envelope event name for a grid search request.
pub const EVENT_RUN_PATHFINDING: &str = "run_pathfinding";
/// Envelope event name for a grid search response.
pub const EVENT_PATHFINDING_RESULT: &str = "pathfinding_result";

/// One envelope on the grid channel.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ChannelMessage {
    RunPathfinding(GridComputeRequest),
    PathfindingResult(GridComputeResponse),
}

impl ChannelMessage {
    /// The envelope's event name.
    #[must_use]
    pub const fn event(&self) -> &'static str {
        match self {
            Self::RunPathfinding(_) => EVENT_RUN_PATHFINDING,
            Self::PathfindingResult(_) => EVENT_PATHFINDING_RESULT,
        }
    }
}

/// Body of a geographic reply, distinguished by which key is present.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum RouteReply {
    Ok { route: Vec<crate::geo::GeoPoint> },
    Err { error: String },
}

impl RouteReply {
    /// Converts the reply into the engine-facing result form.
    pub fn into_result(self) -> Result<RouteResult, String> {
        match self {
            Self::Ok { route } => Ok(RouteResult::new(route)),
            Self::Err { error } => Err(error),
        }
    }
}

/// Errors that can occur while encoding or decoding protocol JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Envelope parsed, but named an event this codec does not know.
    UnknownEvent(String),
    /// Input was not valid JSON or did not match the expected shape.
    Malformed(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEvent(name) => write!(f, "unknown channel event: {name:?}"),
            Self::Malformed(msg) => write!(f, "malformed protocol JSON: {msg}"),
        }
    }
}

impl Error for CodecError {}

fn malformed(err: serde_json::Error) -> CodecError {
    CodecError::Malformed(err.to_string())
}

/// Encodes one grid channel envelope.
pub fn encode_channel(message: &ChannelMessage) -> Result<String, CodecError> {
    serde_json::to_string(message).map_err(malformed)
}

/// Decodes one grid channel envelope.
///
/// An envelope whose `event` is well-formed but unknown yields
/// [`CodecError::UnknownEvent`], letting multiplexing transports pass such
/// traffic to other handlers.
pub fn decode_channel(raw: &str) -> Result<ChannelMessage, CodecError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(malformed)?;
    match value.get("event").and_then(serde_json::Value::as_str) {
        Some(EVENT_RUN_PATHFINDING | EVENT_PATHFINDING_RESULT) | None => {
            serde_json::from_value(value).map_err(malformed)
        }
        Some(other) => Err(CodecError::UnknownEvent(other.to_owned())),
    }
}

/// Encodes a geographic route request body.
pub fn encode_route_request(request: &RouteComputeRequest) -> Result<String, CodecError> {
    serde_json::to_string(request).map_err(malformed)
}

/// Decodes a geographic route request body, as a responder would.
///
/// The generation never crosses the wire, so the decoded request carries
/// generation zero; the transport pairs replies with requests on its own.
pub fn decode_route_request(raw: &str) -> Result<RouteComputeRequest, CodecError> {
    serde_json::from_str(raw).map_err(malformed)
}

/// Decodes a geographic reply body.
pub fn decode_route_reply(raw: &str) -> Result<RouteReply, CodecError> {
    serde_json::from_str(raw).map_err(malformed)
}

/// Encodes a geographic reply body, as a responder would.
pub fn encode_route_reply(reply: &RouteReply) -> Result<String, CodecError> {
    serde_json::to_string(reply).map_err(malformed)
}
