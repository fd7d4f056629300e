use crate::error::{MppError, MppResult};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

/// Shared bus port used for fleet-wide broadcast-style traffic.
pub const DEFAULT_BUS_PORT: u16 = 3999;
/// Port where every component's belief commits converge.
pub const DEFAULT_BELIEF_SINK_PORT: u16 = 4000;
/// Largest datagram the transport will read in one receive; longer
/// datagrams are truncated to this many bytes.
pub const DEFAULT_MAX_DATAGRAM_BYTES: usize = 65_536;
pub const DEFAULT_COMPONENT_NAME: &str = "REG";

/// Top-level configuration, loadable from TOML.
///
/// Missing sections and fields fall back to the fleet defaults, so an empty
/// file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MppConfig {
    pub node: NodeConfig,
    pub transport: TransportConfig,
    pub ports: FleetPorts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Identity used as the belief ownership prefix.
    pub name: String,
    /// Snapshot publish period in milliseconds (0 = never publish)
    pub publish_period_ms: u64,
    /// Also bind the shared bus port and dispatch its traffic.
    pub listen_bus: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_COMPONENT_NAME.to_string(),
            publish_period_ms: 0,
            listen_bus: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Destination address for all outbound sends.
    pub loopback: IpAddr,
    /// Local address the data and bus sockets bind to.
    pub bind_addr: IpAddr,
    /// Receive buffer size; must be at least 1.
    pub max_datagram_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            loopback: IpAddr::V4(Ipv4Addr::LOCALHOST),
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            max_datagram_bytes: DEFAULT_MAX_DATAGRAM_BYTES,
        }
    }
}

impl TransportConfig {
    pub fn validate(&self) -> MppResult<()> {
        if self.max_datagram_bytes == 0 {
            return Err(MppError::ConfigValue {
                field: "transport.max_datagram_bytes",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Well-known ports shared by every component in the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetPorts {
    pub bus: u16,
    pub belief_sink: u16,
}

impl Default for FleetPorts {
    fn default() -> Self {
        Self {
            bus: DEFAULT_BUS_PORT,
            belief_sink: DEFAULT_BELIEF_SINK_PORT,
        }
    }
}

impl MppConfig {
    pub fn from_toml_str(content: &str) -> MppResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.transport.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> MppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| MppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}
