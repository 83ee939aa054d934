pub use crate::{BranchId, NodeId, OFFSET_TOLERANCE};

// Re-export key components
pub use crate::Error;
pub use crate::loading::{NetworkConfig, create_network, network_from_geojson};
pub use crate::model::{
    Branch, BranchFeature, Network, NetworkCoverage, NetworkLocation, NetworkSegment, Node, Route,
};
pub use crate::routing::{
    create_route, get_locations_in_route, get_route_offset, has_duplicate_offsets,
    is_disconnected, locations_are_unique_on_route, path_length, route_contain_loops,
    route_location_offsets, segments_to_geojson, shortest_path, shortest_path_lengths,
};
