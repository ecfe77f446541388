use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Root configuration for the client
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the operator's REST API
    pub base_url: String,

    /// Timeout applied to every outbound HTTP request
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Inbound message polling
    #[serde(default)]
    pub inbound_pull: PullConfig,

    /// Delivery report polling
    #[serde(default)]
    pub delivery_report_pull: PullConfig,

    /// Push callback servers
    #[serde(default)]
    pub push: PushConfig,
}

impl Config {
    /// Configuration with defaults for everything but the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: default_request_timeout(),
            inbound_pull: PullConfig::default(),
            delivery_report_pull: PullConfig::default(),
            push: PushConfig::default(),
        }
    }
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Polling settings for one pull category
#[derive(Debug, Clone, Deserialize)]
pub struct PullConfig {
    /// Interval between poll cycles
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Upper bound on items requested per fetch
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_batch_size() -> u32 {
    100
}

/// Bind settings for the push callback servers
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    /// Host the callback servers bind on
    #[serde(default = "default_push_host")]
    pub host: IpAddr,

    /// Port for delivery status callbacks
    #[serde(default = "default_delivery_status_port")]
    pub delivery_status_port: u16,

    /// Port for inbound message callbacks
    #[serde(default = "default_inbound_messages_port")]
    pub inbound_messages_port: u16,

    /// Port for HLR roaming callbacks
    #[serde(default = "default_hlr_port")]
    pub hlr_port: u16,
}

impl PushConfig {
    /// Bind address for delivery status callbacks.
    pub fn delivery_status_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.delivery_status_port)
    }

    /// Bind address for inbound message callbacks.
    pub fn inbound_messages_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.inbound_messages_port)
    }

    /// Bind address for HLR roaming callbacks.
    pub fn hlr_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.hlr_port)
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            host: default_push_host(),
            delivery_status_port: default_delivery_status_port(),
            inbound_messages_port: default_inbound_messages_port(),
            hlr_port: default_hlr_port(),
        }
    }
}

fn default_push_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_delivery_status_port() -> u16 {
    3101
}

fn default_inbound_messages_port() -> u16 {
    3102
}

fn default_hlr_port() -> u16 {
    3103
}

/// Humantime serde support module
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
