//! Network topology and offset-based location model for branch/node networks.
//!
//! A [`Network`] is a directed multigraph of [`Node`]s and [`Branch`]es.
//! Anything placed on the network is anchored to a branch by an offset
//! ([`NetworkLocation`], [`NetworkSegment`]). On top of that sit the
//! shortest-path engine, [`Route`] construction and validation, and the
//! editing helpers that keep the topology consistent after a split.

pub mod editing;
pub mod error;
pub mod geometry;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;

pub use error::Error;
pub use loading::{NetworkConfig, create_network, network_from_geojson};
pub use model::{
    Branch, BranchFeature, Network, NetworkCoverage, NetworkLocation, NetworkSegment, Node, Route,
};
pub use routing::{
    create_route, get_locations_in_route, get_route_offset, is_disconnected,
    locations_are_unique_on_route, path_length, route_contain_loops, shortest_path,
    shortest_path_lengths,
};

/// Stable handle of a node inside its [`Network`].
pub type NodeId = petgraph::graph::NodeIndex;
/// Stable handle of a branch inside its [`Network`].
pub type BranchId = petgraph::graph::EdgeIndex;

/// Margin used whenever two offsets along a branch are compared.
pub const OFFSET_TOLERANCE: f64 = 1e-6;
