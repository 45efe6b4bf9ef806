//! A loopback compute service answering wire JSON with wire JSON.
//!
//! The expansions and routes here are illustrative playback material, not
//! faithful renditions of the algorithms the labels advertise: a flood
//! walk whose worklist order varies per algorithm, and interpolated
//! polylines whose point counts differ so the duration scaling is visible.

use std::collections::{HashMap, VecDeque};
use std::f64::consts::PI;

use wayviz_core::algorithm::Algorithm;
use wayviz_core::compute::{GridComputeRequest, GridComputeResponse, RouteComputeRequest};
use wayviz_core::geo::GeoPoint;
use wayviz_core::grid::Cell;
use wayviz_core::protocol::{self, ChannelMessage, CodecError, RouteReply};

/// Answers requests the way the remote services would.
#[derive(Debug, Default)]
pub struct ComputeService;

impl ComputeService {
    pub fn new() -> Self {
        Self
    }

    /// Answers one grid channel envelope with a result envelope.
    pub fn answer_channel(&self, raw: &str) -> Result<String, CodecError> {
        let message = protocol::decode_channel(raw)?;
        let ChannelMessage::RunPathfinding(request) = message else {
            return Err(CodecError::Malformed(
                "expected a run_pathfinding envelope".to_owned(),
            ));
        };
        let response = flood_search(&request);
        protocol::encode_channel(&ChannelMessage::PathfindingResult(response))
    }

    /// Answers one geographic request body with a reply body.
    pub fn answer_route(&self, raw: &str) -> Result<String, CodecError> {
        let request = protocol::decode_route_request(raw)?;
        let reply = plot_route(&request);
        protocol::encode_route_reply(&reply)
    }
}

fn neighbor_order(algorithm: Algorithm) -> [(i32, i32); 4] {
    match algorithm {
        Algorithm::Dijkstra | Algorithm::Bfs => [(-1, 0), (0, 1), (1, 0), (0, -1)],
        Algorithm::AStar | Algorithm::Greedy => [(0, 1), (1, 0), (-1, 0), (0, -1)],
        Algorithm::Dfs => [(1, 0), (0, 1), (0, -1), (-1, 0)],
    }
}

/// Flood walk from start to end around the obstacles. DFS pops the newest
/// frontier entry, everything else the oldest.
fn flood_search(request: &GridComputeRequest) -> GridComputeResponse {
    let blocked: Vec<Cell> = request.obstacles.clone();
    let in_bounds = |r: i32, c: i32| {
        r >= 0 && c >= 0 && r < i32::from(request.rows) && c < i32::from(request.cols)
    };

    let mut worklist = VecDeque::new();
    let mut parents: HashMap<Cell, Cell> = HashMap::new();
    let mut seen: Vec<Cell> = vec![request.start];
    let mut visited = Vec::new();
    worklist.push_back(request.start);

    while let Some(cell) = if request.algorithm == Algorithm::Dfs {
        worklist.pop_back()
    } else {
        worklist.pop_front()
    } {
        visited.push(cell);
        if cell == request.end {
            break;
        }
        for (dr, dc) in neighbor_order(request.algorithm) {
            let (r, c) = (i32::from(cell.row) + dr, i32::from(cell.col) + dc);
            if !in_bounds(r, c) {
                continue;
            }
            let next = Cell::new(r as u16, c as u16);
            if blocked.contains(&next) || seen.contains(&next) {
                continue;
            }
            seen.push(next);
            parents.insert(next, cell);
            worklist.push_back(next);
        }
    }

    let mut path = Vec::new();
    if visited.last() == Some(&request.end) {
        let mut cursor = request.end;
        path.push(cursor);
        while let Some(&parent) = parents.get(&cursor) {
            path.push(parent);
            cursor = parent;
        }
        path.reverse();
    }

    GridComputeResponse {
        path,
        time_ms: GridComputeResponse::clamp_time_ms(visited.len() as f64 * 0.05),
        visited,
        generation: Some(request.generation),
    }
}

/// Interpolated polyline between the requested endpoints, with a point
/// count and a wobble that vary per algorithm.
fn plot_route(request: &RouteComputeRequest) -> RouteReply {
    if request.start == request.end {
        return RouteReply::Err {
            error: "start and end are the same place".to_owned(),
        };
    }

    let (points, turns) = match request.algorithm {
        Algorithm::Dijkstra => (24, 2.0),
        Algorithm::AStar => (10, 1.0),
        Algorithm::Bfs => (16, 2.0),
        Algorithm::Dfs => (30, 3.0),
        Algorithm::Greedy => (8, 1.0),
    };

    let route = (0..points)
        .map(|i| {
            if i == 0 {
                return request.start;
            }
            if i == points - 1 {
                return request.end;
            }
            let t = f64::from(i) / f64::from(points - 1);
            let wobble = 0.0008 * (t * PI * turns).sin();
            GeoPoint::new(
                request.start.lat + (request.end.lat - request.start.lat) * t + wobble,
                request.start.lon + (request.end.lon - request.start.lon) * t,
            )
        })
        .collect();
    RouteReply::Ok { route }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(rows: u16, cols: u16, obstacles: Vec<Cell>) -> GridComputeRequest {
        GridComputeRequest {
            algorithm: Algorithm::Dijkstra,
            rows,
            cols,
            start: Cell::new(0, 0),
            end: Cell::new(rows - 1, cols - 1),
            obstacles,
            generation: 9,
        }
    }

    #[test]
    fn flood_search_connects_the_endpoints() {
        let request = request(5, 5, vec![Cell::new(1, 1), Cell::new(1, 2)]);
        let response = flood_search(&request);

        assert_eq!(response.path.first(), Some(&Cell::new(0, 0)));
        assert_eq!(response.path.last(), Some(&Cell::new(4, 4)));
        assert!(response.path.iter().all(|c| !request.obstacles.contains(c)));
        assert!(response.visited.len() >= response.path.len());
        assert_eq!(response.generation, Some(9));
    }

    #[test]
    fn walled_off_end_yields_an_empty_path() {
        // A full wall across row 2.
        let wall = (0..5).map(|c| Cell::new(2, c)).collect();
        let response = flood_search(&request(5, 5, wall));

        assert!(response.path.is_empty());
        assert!(!response.visited.is_empty());
    }

    #[test]
    fn plotted_routes_hit_the_endpoints_exactly() {
        let request = RouteComputeRequest {
            start: GeoPoint::new(38.0, -77.0),
            end: GeoPoint::new(38.1, -77.2),
            algorithm: Algorithm::AStar,
            generation: 0,
        };
        let RouteReply::Ok { route } = plot_route(&request) else {
            panic!("expected a route");
        };
        assert_eq!(route.len(), 10);
        assert_eq!(route[0], request.start);
        assert_eq!(route[9], request.end);
    }

    #[test]
    fn degenerate_endpoints_come_back_as_an_error() {
        let request = RouteComputeRequest {
            start: GeoPoint::new(38.0, -77.0),
            end: GeoPoint::new(38.0, -77.0),
            algorithm: Algorithm::Dijkstra,
            generation: 0,
        };
        assert!(matches!(plot_route(&request), RouteReply::Err { .. }));
    }

    #[test]
    fn service_round_trip_stays_in_wire_form() {
        let service = ComputeService::new();
        let raw = protocol::encode_channel(&ChannelMessage::RunPathfinding(request(
            4,
            4,
            Vec::new(),
        )))
        .unwrap();
        let answer = service.answer_channel(&raw).unwrap();
        let ChannelMessage::PathfindingResult(response) =
            protocol::decode_channel(&answer).unwrap()
        else {
            panic!("expected a result envelope");
        };
        assert_eq!(response.generation, Some(9));
        assert!(!response.visited.is_empty());
    }
}
