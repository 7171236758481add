//! Bridge configuration file.

use cockpit_telemetry_core::LinkConfig;
use cockpit_telemetry_decoders::Protocol;
use opencockpit_errors::ConfigError;
use opencockpit_haptics::HapticConfig;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const STRUCTURED_DEFAULT_PORT: u16 = 7780;
pub const BINARY_DEFAULT_PORT: u16 = 5010;
pub const BINARY_MULTICAST_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 50, 10);

/// Everything the bridge loop needs, loaded from YAML.
///
/// Every section has defaults, so an empty file selects the structured
/// protocol on `127.0.0.1:7780` with the stock haptic tuning. Endpoint fields
/// left unset follow the protocol: the binary stream listens on
/// `0.0.0.0:5010` and joins `239.255.50.10`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub protocol: Protocol,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multicast_group: Option<Ipv4Addr>,
    /// Link goes idle after this long without a datagram.
    pub freshness_window_ms: u64,
    /// Loop period while the link is active.
    pub active_tick_ms: u64,
    /// Loop period while idle.
    pub idle_tick_ms: u64,
    /// Longest wait for one datagram per loop iteration.
    pub recv_timeout_ms: u64,
    pub haptics: HapticConfig,
    /// Mapping table file; relative paths resolve against the config file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mappings: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            bind_address: None,
            port: None,
            multicast_group: None,
            freshness_window_ms: LinkConfig::default().freshness_window_ms,
            active_tick_ms: 10,
            idle_tick_ms: 1000,
            recv_timeout_ms: 100,
            haptics: HapticConfig::default(),
            mappings: None,
        }
    }
}

impl BridgeConfig {
    pub fn binary() -> Self {
        Self {
            protocol: Protocol::Binary,
            ..Self::default()
        }
    }

    pub fn from_yaml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig =
            serde_yaml::from_str(text).map_err(|e| ConfigError::parse(origin, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file. A relative `mappings` path is
    /// resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::read(&origin, e))?;
        let mut config = Self::from_yaml_str(&text, &origin)?;
        if let Some(mappings) = config.mappings.as_mut()
            && mappings.is_relative()
            && let Some(dir) = path.parent()
        {
            *mappings = dir.join(&*mappings);
        }
        info!(path = %origin, protocol = %config.protocol, "Loaded bridge config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("active_tick_ms", self.active_tick_ms),
            ("idle_tick_ms", self.idle_tick_ms),
            ("recv_timeout_ms", self.recv_timeout_ms),
            ("freshness_window_ms", self.freshness_window_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be greater than zero"));
            }
        }
        if self.freshness_window_ms < self.active_tick_ms {
            return Err(ConfigError::invalid(
                "freshness_window_ms",
                format!(
                    "{} ms is shorter than the active tick ({} ms)",
                    self.freshness_window_ms, self.active_tick_ms
                ),
            ));
        }
        if let Some(group) = self.multicast_group
            && !group.is_multicast()
        {
            return Err(ConfigError::invalid(
                "multicast_group",
                format!("{group} is not a multicast address"),
            ));
        }
        self.haptics.validate()
    }

    /// Socket address to bind.
    pub fn listen_addr(&self) -> SocketAddr {
        let (address, port) = match self.protocol {
            Protocol::Structured => (IpAddr::V4(Ipv4Addr::LOCALHOST), STRUCTURED_DEFAULT_PORT),
            Protocol::Binary => (IpAddr::V4(Ipv4Addr::UNSPECIFIED), BINARY_DEFAULT_PORT),
        };
        SocketAddr::new(
            self.bind_address.unwrap_or(address),
            self.port.unwrap_or(port),
        )
    }

    /// Multicast group to join, if any.
    pub fn multicast(&self) -> Option<Ipv4Addr> {
        match self.protocol {
            Protocol::Binary => Some(self.multicast_group.unwrap_or(BINARY_MULTICAST_GROUP)),
            Protocol::Structured => self.multicast_group,
        }
    }

    pub fn link(&self) -> LinkConfig {
        LinkConfig::with_window(self.freshness_window_ms)
    }

    pub fn active_tick(&self) -> Duration {
        Duration::from_millis(self.active_tick_ms)
    }

    pub fn idle_tick(&self) -> Duration {
        Duration::from_millis(self.idle_tick_ms)
    }

    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms)
    }
}
