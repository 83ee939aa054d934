//! Path search and route helpers on top of the network model

pub mod dijkstra;
pub mod route;
pub mod to_geojson;

pub use dijkstra::{path_length, shortest_path, shortest_path_lengths};
pub use route::{
    create_route, get_locations_in_route, get_route_offset, has_duplicate_offsets,
    is_disconnected, locations_are_unique_on_route, route_contain_loops, route_location_offsets,
};
pub use to_geojson::segments_to_geojson;
