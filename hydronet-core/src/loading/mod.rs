//! This module is responsible for loading network topology from `GeoJSON`
//! and building a [`crate::Network`] out of it.

mod builder;
mod config;
mod reader;

pub use builder::create_network;
pub use config::NetworkConfig;
pub use reader::network_from_geojson;
