//! Configuration loading and environment variable handling

use crate::domains::WorkerSettings;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "JAYHAWK".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML (or `.json`) file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<WorkerSettings> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let mut config: WorkerSettings = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<WorkerSettings> {
        let mut config = WorkerSettings::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<WorkerSettings> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut WorkerSettings) -> ConfigResult<()> {
        self.apply_worker_overrides(&mut config.worker)?;
        self.apply_broker_overrides(&mut config.broker)?;
        self.apply_supervisor_overrides(&mut config.supervisor)?;
        self.apply_database_overrides(&mut config.database)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    /// Apply worker config overrides
    fn apply_worker_overrides(
        &self,
        config: &mut crate::domains::worker::WorkerConfig,
    ) -> ConfigResult<()> {
        if let Ok(id) = self.get_env_var("WORKER_ID") {
            config.id = Some(id);
        }

        if let Ok(host) = self.get_env_var("WORKER_HOST") {
            config.host = host;
        }

        if let Ok(bind) = self.get_env_var("WORKER_BIND_ADDRESS") {
            config.bind_address = bind;
        }

        if let Ok(port) = self.get_env_var("WORKER_PORT") {
            config.port = port
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid WORKER_PORT: {}", e)))?;
        }

        if let Ok(termination) = self.get_env_var("WORKER_TERMINATION") {
            config.termination = crate::domains::worker::TerminationPolicy::from_str(&termination)
                .map_err(ConfigError::EnvError)?;
        }

        Ok(())
    }

    /// Apply broker config overrides
    fn apply_broker_overrides(
        &self,
        config: &mut crate::domains::broker::BrokerEndpointConfig,
    ) -> ConfigResult<()> {
        if let Ok(host) = self.get_env_var("BROKER_HOST") {
            config.host = host;
        }

        if let Ok(port) = self.get_env_var("BROKER_PORT") {
            config.port = port
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid BROKER_PORT: {}", e)))?;
        }

        if let Ok(prefix) = self.get_env_var("BROKER_API_PREFIX") {
            config.api_prefix = prefix;
        }

        if let Ok(timeout) = self.get_env_var("BROKER_TIMEOUT_MS") {
            let millis: u64 = timeout
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid BROKER_TIMEOUT_MS: {}", e)))?;
            config.timeout = std::time::Duration::from_millis(millis);
        }

        Ok(())
    }

    /// Apply supervisor config overrides
    fn apply_supervisor_overrides(
        &self,
        config: &mut crate::domains::supervisor::SupervisorConfig,
    ) -> ConfigResult<()> {
        if let Ok(timeout) = self.get_env_var("STOP_TIMEOUT_MS") {
            let millis: u64 = timeout
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid STOP_TIMEOUT_MS: {}", e)))?;
            config.stop_timeout = std::time::Duration::from_millis(millis);
        }

        Ok(())
    }

    /// Apply database config overrides
    fn apply_database_overrides(
        &self,
        config: &mut crate::domains::database::DatabaseConfig,
    ) -> ConfigResult<()> {
        if let Ok(url) = self.get_env_var("DATABASE_URL") {
            config.url = url;
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
