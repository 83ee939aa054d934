use std::path::PathBuf;

use serde::Deserialize;

fn default_snap_tolerance() -> f64 {
    0.01
}

fn default_length_property() -> String {
    "length".to_string()
}

/// Settings for building a network from a `GeoJSON` file
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// `GeoJSON` `FeatureCollection` with the network geometry
    pub path: PathBuf,
    /// Network name, the file stem when not set
    #[serde(default)]
    pub name: Option<String>,
    /// Branch endpoints closer than this share a node (map units)
    #[serde(default = "default_snap_tolerance")]
    pub snap_tolerance: f64,
    /// Numeric feature property holding a custom branch length
    #[serde(default = "default_length_property")]
    pub length_property: String,
}

impl NetworkConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name: None,
            snap_tolerance: default_snap_tolerance(),
            length_property: default_length_property(),
        }
    }

    pub(crate) fn network_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "network".to_string())
        })
    }
}
