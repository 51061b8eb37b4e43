//! Domain-specific configuration modules

pub mod broker;
pub mod database;
pub mod endpoint;
pub mod logging;
pub mod supervisor;
pub mod utils;
pub mod worker;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Complete worker configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorkerSettings {
    /// Worker identity and process configuration
    #[serde(default)]
    pub worker: worker::WorkerConfig,

    /// Broker endpoint configuration
    #[serde(default)]
    pub broker: broker::BrokerEndpointConfig,

    /// Child process supervision configuration
    #[serde(default)]
    pub supervisor: supervisor::SupervisorConfig,

    /// Control endpoint configuration
    #[serde(default)]
    pub endpoint: endpoint::EndpointConfig,

    /// Metrics database configuration
    #[serde(default)]
    pub database: database::DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl WorkerSettings {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.worker.validate()?;
        self.broker.validate()?;
        self.supervisor.validate()?;
        self.endpoint.validate()?;
        self.database.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = WorkerSettings::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
