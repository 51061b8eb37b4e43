//! Worker identity and process-level configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Worker identity and process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Worker name, the middle segment of the derived worker id
    #[serde(default = "default_name")]
    pub name: String,

    /// Namespace prefix of the derived worker id
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Explicit worker id; derived from namespace, name and port when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Host name the broker uses to reach this worker
    #[serde(default = "default_host")]
    pub host: String,

    /// Address the control endpoint binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Control endpoint port; 0 lets the OS pick one at startup
    #[serde(default = "default_port")]
    pub port: u16,

    /// How the process ends once teardown completes
    #[serde(default)]
    pub termination: TerminationPolicy,

    /// Metric models this worker advertises to the broker
    #[serde(default = "default_models")]
    pub models: Vec<String>,
}

/// Process termination policy applied at the end of teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TerminationPolicy {
    /// Send SIGKILL to the worker's own pid
    #[default]
    Kill,
    /// Exit with status 0
    Exit,
}

impl FromStr for TerminationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kill" => Ok(TerminationPolicy::Kill),
            "exit" => Ok(TerminationPolicy::Exit),
            _ => Err(format!("Invalid termination policy: {}", s)),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            namespace: default_namespace(),
            id: None,
            host: default_host(),
            bind_address: default_bind_address(),
            port: default_port(),
            termination: TerminationPolicy::default(),
            models: default_models(),
        }
    }
}

impl WorkerConfig {
    /// Worker id for the given (possibly OS-assigned) port
    pub fn worker_id(&self, port: u16) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{}.{}.{}", self.namespace, self.name, port),
        }
    }
}

impl Validatable for WorkerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.name, "name", self.domain_name())?;
        validate_required_string(&self.namespace, "namespace", self.domain_name())?;
        validate_required_string(&self.host, "host", self.domain_name())?;
        validate_required_string(&self.bind_address, "bind_address", self.domain_name())?;

        if let Some(ref id) = self.id {
            validate_required_string(id, "id", self.domain_name())?;
        }

        if self.models.is_empty() {
            return Err(self.validation_error("At least one model must be advertised"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "worker"
    }
}

// Default value functions
fn default_name() -> String {
    "jayhawk_worker".to_string()
}

fn default_namespace() -> String {
    "com.augurlabs.core".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    51236
}

fn default_models() -> Vec<String> {
    vec!["labor_hours".to_string()]
}
