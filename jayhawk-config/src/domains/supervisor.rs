//! Child computation process supervision configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Child process supervision configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// How long a child gets to exit after the graceful signal
    #[serde(
        with = "crate::domains::utils::serde_duration_millis",
        default = "default_stop_timeout"
    )]
    pub stop_timeout: Duration,

    /// How long to wait for the child to be reaped after a forced kill
    #[serde(
        with = "crate::domains::utils::serde_duration_millis",
        default = "default_reap_timeout"
    )]
    pub reap_timeout: Duration,

    /// Command used to launch the computation child
    #[serde(default)]
    pub computation: ComputationCommand,
}

/// Command line of the computation child
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputationCommand {
    /// Executable; the running worker binary when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    /// Leading arguments, query arguments are appended after these
    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            stop_timeout: default_stop_timeout(),
            reap_timeout: default_reap_timeout(),
            computation: ComputationCommand::default(),
        }
    }
}

impl Default for ComputationCommand {
    fn default() -> Self {
        Self {
            program: None,
            args: default_args(),
        }
    }
}

impl Validatable for SupervisorConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.stop_timeout.as_millis(), "stop_timeout", self.domain_name())?;
        validate_positive(self.reap_timeout.as_millis(), "reap_timeout", self.domain_name())?;
        self.computation.validate()?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "supervisor"
    }
}

impl Validatable for ComputationCommand {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(ref program) = self.program {
            validate_required_string(program, "program", self.domain_name())?;
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "supervisor.computation"
    }
}

// Default value functions
fn default_stop_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_reap_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_args() -> Vec<String> {
    vec!["compute".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supervisor_config_defaults() {
        let config = SupervisorConfig::default();
        assert_eq!(config.stop_timeout, Duration::from_secs(5));
        assert!(config.computation.program.is_none());
        assert_eq!(config.computation.args, vec!["compute".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_supervisor_config_validation() {
        let mut config = SupervisorConfig::default();
        config.stop_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        config = SupervisorConfig::default();
        config.computation.program = Some(String::new());
        assert!(config.validate().is_err());
    }
}
