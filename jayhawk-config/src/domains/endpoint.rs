//! Control endpoint configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Control endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// How long open connections may drain after a stop request before
    /// the serve call returns regardless
    #[serde(
        with = "crate::domains::utils::serde_duration_millis",
        default = "default_drain_timeout"
    )]
    pub drain_timeout: Duration,

    /// Enable per-request tracing spans
    #[serde(default = "crate::domains::utils::default_true")]
    pub enable_tracing: bool,

    /// Enable X-Request-ID propagation
    #[serde(default = "crate::domains::utils::default_true")]
    pub enable_request_id: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            drain_timeout: default_drain_timeout(),
            enable_tracing: true,
            enable_request_id: true,
        }
    }
}

impl Validatable for EndpointConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.drain_timeout.as_millis(), "drain_timeout", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "endpoint"
    }
}

fn default_drain_timeout() -> Duration {
    Duration::from_secs(2)
}
