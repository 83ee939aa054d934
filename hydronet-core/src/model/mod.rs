//! Data model of a branch/node network
//!
//! Contains the graph itself and everything anchored to it by an offset.

mod coverage;
mod features;
mod network;

pub use coverage::{NetworkCoverage, Route};
pub use features::{BranchFeature, NetworkLocation, NetworkSegment};
pub use network::{Branch, Network, Node};

#[cfg(test)]
pub(crate) use network::tests::{line_network, triangle_network};
