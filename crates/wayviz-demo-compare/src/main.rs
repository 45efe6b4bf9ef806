#![forbid(unsafe_code)]

//! Wayviz comparison demo.
//!
//! Registers one grid panel and two geographic panels, sends their compute
//! requests through the wire codec to a loopback service, and drives the
//! engine against the wall clock. Midway through the grid replay the
//! algorithm is switched to show the cancel-and-reissue path; the
//! superseded response is fenced off by its generation when it lands.
//!
//! # Running
//!
//! ```sh
//! cargo run -p wayviz-demo-compare
//! ```
//!
//! Pass `--verbose` to narrate the engine lifecycle on stderr.

mod bridge;
mod fixtures;
mod sink;

use std::error::Error;
use std::thread;
use std::time::Duration;

use tracing::Level;
use web_time::Instant;

use wayviz_core::algorithm::Algorithm;
use wayviz_core::grid::Cell;
use wayviz_core::protocol::{self, ChannelMessage};
use wayviz_runtime::{Orchestrator, OrchestratorConfig, PanelId};

use bridge::{JsonBridge, Outbound};
use fixtures::ComputeService;
use sink::TextSink;

const GRID: PanelId = PanelId::new(1);
const ROUTE_A: PanelId = PanelId::new(2);
const ROUTE_B: PanelId = PanelId::new(3);

const GRID_ROWS: u16 = 8;
const GRID_COLS: u16 = 12;

// Simulated service latencies.
const CHANNEL_LATENCY: Duration = Duration::from_millis(150);
const ROUTE_A_LATENCY: Duration = Duration::from_millis(400);
const ROUTE_B_LATENCY: Duration = Duration::from_millis(700);

/// When the mid-run algorithm switch fires.
const SWITCH_AT: Duration = Duration::from_millis(1200);

/// A service reply in transit back to the engine.
enum Inbound {
    Channel {
        panel: PanelId,
        due: Duration,
        raw: String,
    },
    RouteReply {
        panel: PanelId,
        generation: u64,
        due: Duration,
        raw: String,
    },
}

impl Inbound {
    fn due(&self) -> Duration {
        match self {
            Self::Channel { due, .. } | Self::RouteReply { due, .. } => *due,
        }
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("demo error: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let verbose = std::env::args().any(|arg| arg == "--verbose");
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    println!("wayviz \u{b7} playback comparison demo");
    println!(
        "grid replays a dijkstra sweep and switches to a* at {:.1}s; both routes animate \
         over {:.1}s regardless of point count",
        SWITCH_AT.as_secs_f64(),
        wayviz_runtime::DEFAULT_ROUTE_DURATION.as_secs_f64(),
    );
    println!();

    let mut sink = TextSink::new();
    sink.add_grid(
        GRID,
        "grid search replay",
        GRID_ROWS,
        GRID_COLS,
        Cell::new(0, 0),
        Cell::new(GRID_ROWS - 1, GRID_COLS - 1),
    );
    sink.add_route(ROUTE_A, "route \u{b7} dijkstra");
    sink.add_route(ROUTE_B, "route \u{b7} a*");

    let config = OrchestratorConfig::new().with_grid_size(GRID_ROWS, GRID_COLS);
    let mut engine = Orchestrator::with_config(config, sink, JsonBridge::new());
    engine.register_grid_panel(GRID)?;
    engine.register_geo_panel(ROUTE_A)?;
    engine.register_geo_panel(ROUTE_B)?;
    engine.select_algorithm(ROUTE_B, Algorithm::AStar)?;

    for cell in wall() {
        engine.toggle_obstacle(GRID, cell)?;
    }

    engine.run(GRID)?;
    engine.run(ROUTE_A)?;
    engine.run(ROUTE_B)?;

    let service = ComputeService::new();
    let origin = Instant::now();
    let mut inflight: Vec<Inbound> = Vec::new();
    let mut switched = false;

    loop {
        let now = origin.elapsed();

        // Requests leave through the bridge and come back as wire JSON
        // after their simulated latency.
        for outbound in engine.bridge_mut().drain() {
            match outbound {
                Outbound::Channel { panel, raw } => {
                    let raw = service.answer_channel(&raw)?;
                    inflight.push(Inbound::Channel {
                        panel,
                        due: now + CHANNEL_LATENCY,
                        raw,
                    });
                }
                Outbound::RouteCall {
                    panel,
                    generation,
                    raw,
                } => {
                    let latency = if panel == ROUTE_A {
                        ROUTE_A_LATENCY
                    } else {
                        ROUTE_B_LATENCY
                    };
                    let raw = service.answer_route(&raw)?;
                    inflight.push(Inbound::RouteReply {
                        panel,
                        generation,
                        due: now + latency,
                        raw,
                    });
                }
            }
        }

        let mut held = Vec::new();
        for reply in inflight.drain(..) {
            if reply.due() > now {
                held.push(reply);
                continue;
            }
            match reply {
                Inbound::Channel { panel, raw, .. } => {
                    if let ChannelMessage::PathfindingResult(response) =
                        protocol::decode_channel(&raw)?
                    {
                        engine.deliver_grid_result(panel, response, now)?;
                    }
                }
                Inbound::RouteReply {
                    panel,
                    generation,
                    raw,
                    ..
                } => match protocol::decode_route_reply(&raw)?.into_result() {
                    Ok(result) => {
                        engine.deliver_route_result(panel, generation, result.route, now)?;
                    }
                    Err(error) => engine.deliver_route_error(panel, generation, &error)?,
                },
            }
        }
        inflight = held;

        if !switched && now >= SWITCH_AT {
            engine.select_algorithm(GRID, Algorithm::AStar)?;
            switched = true;
        }

        engine.advance(now);

        if switched
            && inflight.is_empty()
            && engine.bridge().is_empty()
            && engine.pending_ticks() == 0
        {
            break;
        }

        let mut wake = now + Duration::from_millis(25);
        if let Some(deadline) = engine.next_deadline() {
            wake = wake.min(deadline);
        }
        for reply in &inflight {
            wake = wake.min(reply.due());
        }
        if !switched {
            wake = wake.min(SWITCH_AT);
        }
        let before_sleep = origin.elapsed();
        if wake > before_sleep {
            thread::sleep(wake - before_sleep);
        }
    }

    println!();
    println!(
        "all panels settled after {:.2}s",
        origin.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Two staggered walls forcing an S-shaped corridor through the grid.
fn wall() -> Vec<Cell> {
    let left = (0..GRID_ROWS - 2).map(|r| Cell::new(r, 5));
    let right = (2..GRID_ROWS).map(|r| Cell::new(r, 8));
    left.chain(right).collect()
}
