use log::info;

use super::config::NetworkConfig;
use super::reader::network_from_geojson;
use crate::{Error, model::Network};

/// Creates a network from the `GeoJSON` file named in the configuration
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the file cannot be
/// read or parsed
pub fn create_network(config: &NetworkConfig) -> Result<Network, Error> {
    validate_config(config)?;

    info!("Reading network geometry: {}", config.path.display());
    let text = std::fs::read_to_string(&config.path)?;

    let network = network_from_geojson(
        config.network_name(),
        &text,
        config.snap_tolerance,
        &config.length_property,
    )?;

    if let Err(e) = network.validate() {
        log::warn!("Network {} failed validation: {e}", network.name);
    }

    info!("Network created successfully");
    Ok(network)
}

fn validate_config(config: &NetworkConfig) -> Result<(), Error> {
    if !config.path.exists() {
        return Err(Error::InvalidData(format!(
            "Network file not found: {}",
            config.path.display()
        )));
    }

    if !config.snap_tolerance.is_finite() || config.snap_tolerance < 0.0 {
        return Err(Error::InvalidData(format!(
            "Snap tolerance must be a non-negative number, got {}",
            config.snap_tolerance
        )));
    }

    Ok(())
}
