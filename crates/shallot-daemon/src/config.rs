//! Configuration file management.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shallot_types::network::PortLayout;
use shallot_types::{
    DEFAULT_HOST, DEFAULT_NODE_BASE_PORT, DEFAULT_REGISTRY_PORT, DEFAULT_USER_BASE_PORT,
};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SHALLOT_CONFIG";

/// Config file looked up in the working directory when no override is set.
pub const DEFAULT_CONFIG_FILE: &str = "shallot.toml";

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Addresses and port ranges.
    #[serde(default)]
    pub network: NetworkConfig,
    /// What to start in this process.
    #[serde(default)]
    pub launch: LaunchConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// IP literal every role binds to and dials.
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_registry_port")]
    pub registry_port: u16,
    /// Relay `n` listens on `node_base_port + n`.
    #[serde(default = "default_node_base_port")]
    pub node_base_port: u16,
    /// User `n` listens on `user_base_port + n`.
    #[serde(default = "default_user_base_port")]
    pub user_base_port: u16,
}

/// Launch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Number of relays, with node ids `0..nodes`.
    #[serde(default = "default_nodes")]
    pub nodes: u32,
    /// Number of users, with user ids `0..users`.
    #[serde(default = "default_users")]
    pub users: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive: "debug" | "info" | "warn" | "error", or a full
    /// `tracing-subscriber` directive. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_registry_port() -> u16 {
    DEFAULT_REGISTRY_PORT
}

fn default_node_base_port() -> u16 {
    DEFAULT_NODE_BASE_PORT
}

fn default_user_base_port() -> u16 {
    DEFAULT_USER_BASE_PORT
}

fn default_nodes() -> u32 {
    3
}

fn default_users() -> u32 {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            registry_port: default_registry_port(),
            node_base_port: default_node_base_port(),
            user_base_port: default_user_base_port(),
        }
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            users: default_users(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl NetworkConfig {
    /// The three port ranges.
    pub fn layout(&self) -> PortLayout {
        PortLayout {
            registry_port: self.registry_port,
            node_base_port: self.node_base_port,
            user_base_port: self.user_base_port,
        }
    }

    /// Socket address for a role listening on `port`.
    pub fn bind_addr(&self, port: u16) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, port))
    }
}

impl DaemonConfig {
    /// Load configuration from `$SHALLOT_CONFIG` or `./shallot.toml`.
    ///
    /// Falls back to defaults if no file exists.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: DaemonConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.network.host, "127.0.0.1");
        assert_eq!(config.network.registry_port, 8080);
        assert_eq!(config.network.node_base_port, 4000);
        assert_eq!(config.network.user_base_port, 3000);
        assert_eq!(config.launch.nodes, 3);
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn test_config_serialization() {
        let config = DaemonConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let _parsed: DaemonConfig = toml::from_str(&toml_str).expect("parse");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: DaemonConfig = toml::from_str(
            r#"
            [network]
            registry_port = 9000

            [launch]
            nodes = 5
            "#,
        )
        .expect("parse");
        assert_eq!(config.network.registry_port, 9000);
        assert_eq!(config.network.node_base_port, 4000);
        assert_eq!(config.launch.nodes, 5);
        assert_eq!(config.launch.users, 2);
    }

    #[test]
    fn test_bind_addr() {
        let network = NetworkConfig::default();
        let addr = network.bind_addr(4001).expect("addr");
        assert_eq!(addr.to_string(), "127.0.0.1:4001");

        let bad = NetworkConfig {
            host: "not an ip".to_string(),
            ..NetworkConfig::default()
        };
        assert!(bad.bind_addr(1).is_err());
    }
}
