//! Broker endpoint configuration

use crate::error::ConfigResult;
use crate::validation::{
    validate_path_prefix, validate_port_range, validate_positive, validate_required_string,
    Validatable,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Location of the broker and how to talk to it. Read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerEndpointConfig {
    /// Broker host
    #[serde(default = "default_host")]
    pub host: String,

    /// Broker port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path prefix in front of the `/workers` routes
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Per-request timeout, bounds both registration and deregistration
    #[serde(
        with = "crate::domains::utils::serde_duration_millis",
        default = "default_timeout"
    )]
    pub timeout: Duration,

    /// Whether to announce the worker to the broker on startup
    #[serde(default = "crate::domains::utils::default_true")]
    pub register_on_start: bool,
}

impl Default for BrokerEndpointConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_prefix: default_api_prefix(),
            timeout: default_timeout(),
            register_on_start: true,
        }
    }
}

impl BrokerEndpointConfig {
    /// Base URL of the broker API, e.g. `http://localhost:5000/api/unstable`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.api_prefix)
    }
}

impl Validatable for BrokerEndpointConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.host, "host", self.domain_name())?;
        validate_port_range(self.port, "port", self.domain_name())?;
        validate_path_prefix(&self.api_prefix, "api_prefix", self.domain_name())?;
        validate_positive(self.timeout.as_millis(), "timeout", self.domain_name())?;

        crate::validation::validate_url(&self.base_url(), "base_url", self.domain_name())?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "broker"
    }
}

// Default value functions
fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_api_prefix() -> String {
    "/api/unstable".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}
