//! Server configuration read from a TOML file, with CLI overrides.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use hydronet_core::NetworkConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_concurrency_limit() -> usize {
    64
}

/// Server configuration.
///
/// ```toml
/// bind = "0.0.0.0:3000"
/// request_timeout_secs = 30
///
/// [network]
/// path = "data/river.geojson"
/// snap_tolerance = 0.5
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// Network served by this instance.
    pub network: NetworkConfig,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Maximum number of requests processed at once.
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
}

impl ServerConfig {
    pub fn new(network: NetworkConfig) -> Self {
        Self {
            bind: default_bind(),
            network,
            request_timeout_secs: default_request_timeout_secs(),
            concurrency_limit: default_concurrency_limit(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.concurrency_limit == 0 {
            return Err(ConfigError::Invalid(
                "concurrency_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let config = ServerConfig::from_toml(
            r#"
            [network]
            path = "river.geojson"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind, default_bind());
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.concurrency_limit, 64);
        assert_eq!(config.network.path, PathBuf::from("river.geojson"));
        assert_eq!(config.network.length_property, "length");
    }

    #[test]
    fn test_full_toml() {
        let config = ServerConfig::from_toml(
            r#"
            bind = "0.0.0.0:8080"
            request_timeout_secs = 5
            concurrency_limit = 4

            [network]
            path = "delta.geojson"
            name = "delta"
            snap_tolerance = 0.5
            length_property = "chainage"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.concurrency_limit, 4);
        assert_eq!(config.network.name.as_deref(), Some("delta"));
        assert_eq!(config.network.snap_tolerance, 0.5);
    }

    #[test]
    fn test_rejects_zero_limits() {
        let result = ServerConfig::from_toml(
            r#"
            concurrency_limit = 0
            [network]
            path = "river.geojson"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_network_table() {
        assert!(matches!(
            ServerConfig::from_toml("bind = \"127.0.0.1:1\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
