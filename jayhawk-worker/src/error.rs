//! Worker runtime errors

use jayhawk_broker::BrokerError;
use jayhawk_config::ConfigError;
use jayhawk_execution::{LifecycleError, SupervisorError};
use jayhawk_metrics::MetricsError;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Failures that end the worker before it starts serving
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to bind control endpoint on {address}:{port}: {source}")]
    Bind {
        address: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Broker client error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}
