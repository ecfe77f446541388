use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;
use url::Url;

use super::types::Config;

impl Config {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        debug!(path = %path.display(), "loading configuration");

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        Self::from_yaml(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .context("failed to parse YAML configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url: {}", self.base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("base_url must use http or https, got: {}", base.scheme());
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than zero");
        }

        for (name, pull) in [
            ("inbound_pull", &self.inbound_pull),
            ("delivery_report_pull", &self.delivery_report_pull),
        ] {
            if pull.interval.is_zero() {
                anyhow::bail!("{name}.interval must be greater than zero");
            }
            if pull.batch_size == 0 {
                anyhow::bail!("{name}.batch_size must be greater than zero");
            }
        }

        // Port 0 means "any free port" and may repeat; fixed ports may not.
        let mut seen = std::collections::HashSet::new();
        for port in [
            self.push.delivery_status_port,
            self.push.inbound_messages_port,
            self.push.hlr_port,
        ] {
            if port != 0 && !seen.insert(port) {
                anyhow::bail!("push ports must be distinct, {port} is used twice");
            }
        }

        debug!("configuration validated");
        Ok(())
    }
}
