#![forbid(unsafe_code)]

//! Core data model for Wayviz: grids, routes, results, and wire shapes.
//!
//! # Role in Wayviz
//! `wayviz-core` owns the vocabulary the rest of the tree speaks: grid cells
//! and the editable obstacle field, geographic points, the search/route
//! results the compute side produces, and the request/response shapes that
//! cross the transport boundary.
//!
//! # Primary responsibilities
//! - **GridState**: obstacle and endpoint editing with silent rejection of
//!   invalid edits, never violating its invariants.
//! - **SearchResult / RouteResult / ResultBuffer**: immutable computation
//!   snapshots and their playback-admission predicates.
//! - **Algorithm**: the closed catalog of algorithms the engine can name on
//!   the wire (it never runs them).
//! - **compute / protocol**: request/response structs, and (behind the
//!   `protocol` feature) the JSON channel codec.
//!
//! # How it fits in the system
//! `wayviz-runtime` drives playback over these types; transports encode and
//! decode them at the process edge. Nothing here performs I/O or keeps time.

pub mod algorithm;
pub mod compute;
pub mod geo;
pub mod grid;
#[cfg(feature = "protocol")]
pub mod protocol;
pub mod result;

pub use algorithm::{Algorithm, ParseAlgorithmError};
pub use compute::{GridComputeRequest, GridComputeResponse, RouteComputeRequest};
pub use geo::{DEFAULT_GEO_END, DEFAULT_GEO_START, GeoPoint};
pub use grid::{Cell, DEFAULT_COLS, DEFAULT_ROWS, EndpointKind, GridState};
pub use result::{ResultBuffer, RouteResult, SearchResult};
