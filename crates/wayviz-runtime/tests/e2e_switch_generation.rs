#![forbid(unsafe_code)]

//! E2E test for algorithm switching and generation fencing.
//!
//! Covers:
//! 1. Switching mid-run cancels the animation and immediately re-requests
//!    with the panel's current field and the new algorithm
//! 2. The superseded run's response echoes a stale generation and is
//!    discarded; the re-issued response restarts playback
//! 3. Responses without a generation echo are accepted as latest
//! 4. Switching outside a run stores the selection and issues nothing,
//!    even when repeated; the next run uses the final selection
//! 5. Ticks queued by a superseded run never paint
//! 6. Stale geographic replies and errors are dropped after the panel has
//!    moved on
//!
//! Run:
//!   cargo test -p wayviz-runtime --test e2e_switch_generation

use std::time::Duration;

use wayviz_core::algorithm::Algorithm;
use wayviz_core::compute::GridComputeResponse;
use wayviz_core::geo::GeoPoint;
use wayviz_core::grid::{Cell, EndpointKind};
use wayviz_runtime::{
    Orchestrator, OrchestratorConfig, PanelId, RecordingBridge, RecordingSink, StatusUpdate,
};

const GRID: PanelId = PanelId::new(1);
const GEO: PanelId = PanelId::new(2);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn engine() -> Orchestrator<RecordingSink, RecordingBridge> {
    let mut engine = Orchestrator::with_config(
        OrchestratorConfig::new().with_grid_size(8, 8),
        RecordingSink::new(),
        RecordingBridge::new(),
    );
    engine.register_grid_panel(GRID).unwrap();
    engine.register_geo_panel(GEO).unwrap();
    engine
}

fn grid_response(
    visited: &[(u16, u16)],
    path: &[(u16, u16)],
    generation: Option<u64>,
) -> GridComputeResponse {
    GridComputeResponse {
        path: path.iter().map(|&(r, c)| Cell::new(r, c)).collect(),
        visited: visited.iter().map(|&(r, c)| Cell::new(r, c)).collect(),
        time_ms: 5,
        generation,
    }
}

fn route(points: usize) -> Vec<GeoPoint> {
    (0..points)
        .map(|i| GeoPoint::new(38.89 + i as f64 * 0.002, -77.03))
        .collect()
}

// ============================================================================
// Grid panel: the switch round trip
// ============================================================================

#[test]
fn mid_run_switch_reissues_and_the_stale_response_dies() {
    let mut engine = engine();
    engine.run(GRID).unwrap();
    let first_request = engine.bridge().grid_requests[0].request.clone();
    assert_eq!(first_request.algorithm, Algorithm::Dijkstra);

    engine
        .deliver_grid_result(
            GRID,
            grid_response(
                &[(0, 0), (0, 1), (0, 2), (0, 3)],
                &[],
                Some(first_request.generation),
            ),
            ms(0),
        )
        .unwrap();
    engine.advance(ms(50));
    let superseded_generation = engine.panel(GRID).unwrap().generation().value();

    // Switch mid-run: the animation stops and a new request goes out.
    engine.select_algorithm(GRID, Algorithm::AStar).unwrap();
    assert!(!engine.panel(GRID).unwrap().is_running());
    assert_eq!(engine.bridge().grid_requests.len(), 2);
    let reissued = engine.bridge().grid_requests[1].request.clone();
    assert_eq!(reissued.algorithm, Algorithm::AStar);
    assert!(reissued.generation > superseded_generation);

    // The slow first compute lands late, echoing the superseded generation.
    let frames_before = engine.sink().grid_frame_count(GRID);
    engine
        .deliver_grid_result(
            GRID,
            grid_response(&[(7, 7), (7, 6)], &[], Some(superseded_generation)),
            ms(80),
        )
        .unwrap();
    assert!(!engine.panel(GRID).unwrap().is_running());
    assert_eq!(engine.sink().grid_frame_count(GRID), frames_before);

    // The re-issued compute restarts playback from element zero.
    engine
        .deliver_grid_result(
            GRID,
            grid_response(&[(1, 0), (1, 1), (2, 1)], &[(1, 0), (2, 1)], Some(reissued.generation)),
            ms(100),
        )
        .unwrap();
    assert!(engine.panel(GRID).unwrap().is_running());

    engine.advance(ms(150));
    engine.advance(ms(200));
    engine.advance(ms(250));
    assert!(engine.panel(GRID).unwrap().is_settled());
    assert_eq!(engine.sink().celebrate_count(GRID), 1);
}

#[test]
fn ticks_of_the_superseded_run_never_paint() {
    let mut engine = engine();
    engine
        .deliver_grid_result(GRID, grid_response(&[(0, 0), (0, 1), (0, 2)], &[], None), ms(0))
        .unwrap();
    assert_eq!(engine.pending_ticks(), 1);

    engine.select_algorithm(GRID, Algorithm::Dfs).unwrap();
    let frames_before = engine.sink().grid_frame_count(GRID);

    // The queued tick of the cancelled run fires into the void.
    assert_eq!(engine.advance(ms(500)), 0);
    assert_eq!(engine.sink().grid_frame_count(GRID), frames_before);
    assert_eq!(engine.pending_ticks(), 0);
}

#[test]
fn echoless_responses_are_latest_authoritative() {
    let mut engine = engine();
    engine
        .deliver_grid_result(GRID, grid_response(&[(0, 0), (0, 1)], &[], None), ms(0))
        .unwrap();
    assert!(engine.panel(GRID).unwrap().is_running());

    // A responder that never learned to echo generations replies again.
    // With no echo to judge staleness by, the engine treats the reply as
    // the latest and restarts over the running animation.
    engine
        .deliver_grid_result(GRID, grid_response(&[(3, 3), (3, 4)], &[], None), ms(20))
        .unwrap();
    assert!(engine.panel(GRID).unwrap().is_running());
    assert_eq!(engine.sink().clear_transient_count(GRID), 1);
}

// ============================================================================
// Idle selection semantics
// ============================================================================

#[test]
fn idle_switches_store_only_and_the_next_run_uses_the_last() {
    let mut engine = engine();
    engine.select_algorithm(GRID, Algorithm::AStar).unwrap();
    engine.select_algorithm(GRID, Algorithm::Greedy).unwrap();
    assert!(engine.bridge().is_empty());
    assert!(engine.sink().events.is_empty());

    engine.run(GRID).unwrap();
    assert_eq!(engine.bridge().grid_requests.len(), 1);
    assert_eq!(
        engine.bridge().grid_requests[0].request.algorithm,
        Algorithm::Greedy
    );
}

#[test]
fn settled_switches_also_store_only() {
    let mut engine = engine();
    engine
        .deliver_grid_result(GRID, grid_response(&[(0, 0), (0, 1)], &[(0, 0)], None), ms(0))
        .unwrap();
    engine.advance(ms(50));
    engine.advance(ms(100));
    assert!(engine.panel(GRID).unwrap().is_settled());

    engine.select_algorithm(GRID, Algorithm::Bfs).unwrap();
    assert!(engine.panel(GRID).unwrap().is_settled());
    assert!(engine.bridge().grid_requests.is_empty());
    assert_eq!(engine.panel(GRID).unwrap().algorithm(), Algorithm::Bfs);
}

// ============================================================================
// Geographic panel: switches and stale replies
// ============================================================================

#[test]
fn geo_switch_mid_run_reissues_with_current_endpoints() {
    let mut engine = engine();
    engine.run(GEO).unwrap();
    engine
        .deliver_route_result(GEO, 0, route(3), ms(0))
        .unwrap();
    assert!(engine.panel(GEO).unwrap().is_running());

    let moved = GeoPoint::new(38.93, -77.06);
    engine
        .move_geo_endpoint(GEO, EndpointKind::End, moved)
        .unwrap();
    engine.select_algorithm(GEO, Algorithm::AStar).unwrap();

    assert!(!engine.panel(GEO).unwrap().is_running());
    assert_eq!(engine.bridge().route_requests.len(), 2);
    let reissued = &engine.bridge().route_requests[1].request;
    assert_eq!(reissued.algorithm, Algorithm::AStar);
    assert_eq!(reissued.end, moved);
    assert_eq!(
        reissued.generation,
        engine.panel(GEO).unwrap().generation().value()
    );
}

#[test]
fn stale_route_reply_and_error_are_both_dropped() {
    let mut engine = engine();
    engine.run(GEO).unwrap();
    let first_generation = engine.bridge().route_requests[0].request.generation;

    engine
        .deliver_route_result(GEO, first_generation, route(3), ms(0))
        .unwrap();
    assert!(engine.panel(GEO).unwrap().is_running());
    let progress_before = engine.sink().route_progress_count(GEO);

    // Both a duplicate reply and an error from the old request arrive late.
    engine
        .deliver_route_result(GEO, first_generation, route(6), ms(10))
        .unwrap();
    engine
        .deliver_route_error(GEO, first_generation, "request timed out")
        .unwrap();

    assert!(engine.panel(GEO).unwrap().is_running());
    assert_eq!(engine.sink().route_progress_count(GEO), progress_before);
    assert!(
        engine
            .sink()
            .statuses(GEO)
            .iter()
            .all(|s| !matches!(s, StatusUpdate::ComputeFailed(_)))
    );
}

#[test]
fn current_route_error_reaches_the_status_line() {
    let mut engine = engine();
    engine.run(GEO).unwrap();
    let generation = engine.bridge().route_requests[0].request.generation;

    engine
        .deliver_route_error(GEO, generation, "no route between points")
        .unwrap();
    assert_eq!(
        engine.sink().statuses(GEO),
        vec![&StatusUpdate::ComputeFailed("no route between points".to_owned())]
    );
}
