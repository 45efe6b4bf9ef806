#![forbid(unsafe_code)]

//! Wayviz Runtime
//!
//! The playback orchestration engine: it takes computed search and route
//! results and deterministically replays them over time across any number of
//! isolated panels.
//!
//! # Key Components
//!
//! - [`Orchestrator`] - Single-threaded façade serializing all engine mutation
//! - [`Playback`] - Per-panel replay state machine (Idle / Running / Settled)
//! - [`PanelRegistry`] - Isolation boundary between the grid panel and the
//!   geographic comparison panels
//! - [`TickQueue`] - Deadline heap realizing deferred playback ticks
//! - [`RenderSink`] - Contract of the external rendering collaborator
//! - [`ComputeBridge`] - Outbound port to the external compute collaborator
//!
//! # Role in Wayviz
//! `wayviz-runtime` sits between the transport edge and the rendering edge.
//! Transports deliver results into the [`Orchestrator`]; the engine advances
//! per-panel playback on an explicit clock and emits synchronous render
//! instructions into the embedder's [`RenderSink`].
//!
//! # Concurrency model
//! Everything runs on one logical thread. Time is a `Duration` handed to
//! [`Orchestrator::advance`] by the host; the engine never sleeps, never
//! blocks, and never reads a wall clock. Races with in-flight compute
//! responses are fenced by per-panel generation counters.

pub mod compute;
pub mod orchestrator;
pub mod panel;
pub mod playback;
pub mod render;
pub mod scheduler;

pub use compute::{ComputeBridge, RecordingBridge, Submission};
pub use orchestrator::{
    DEFAULT_GRID_TICK, DEFAULT_ROUTE_DURATION, Orchestrator, OrchestratorConfig,
};
pub use panel::{EngineError, Panel, PanelField, PanelId, PanelKind, PanelRegistry};
pub use playback::{ActiveRun, Generation, Playback, PlaybackState, StartError, TickOutcome};
pub use render::{GridFrame, RecordingSink, RenderSink, SinkEvent, StatusUpdate};
pub use scheduler::{TickEntry, TickQueue};
