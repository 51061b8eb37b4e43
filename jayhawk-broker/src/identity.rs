//! Worker identity and the broker request bodies built from it

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity a worker announces to the broker. Created once at startup after
/// the control endpoint's port is known, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerIdentity {
    pub id: String,
    pub host: String,
    pub port: u16,
}

impl WorkerIdentity {
    pub fn new(id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            host: host.into(),
            port,
        }
    }

    /// Base URL of this worker's control endpoint
    pub fn location(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for WorkerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.id, self.host, self.port)
    }
}

/// Body of `POST {prefix}/workers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub id: String,
    pub location: String,
    pub host: String,
    pub port: u16,
    pub models: Vec<String>,
}

impl RegistrationRequest {
    pub fn new(identity: &WorkerIdentity, models: &[String]) -> Self {
        Self {
            id: identity.id.clone(),
            location: identity.location(),
            host: identity.host.clone(),
            port: identity.port,
            models: models.to_vec(),
        }
    }
}

/// Body of `POST {prefix}/workers/remove`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeregistrationRequest {
    pub id: String,
}

impl From<&WorkerIdentity> for DeregistrationRequest {
    fn from(identity: &WorkerIdentity) -> Self {
        Self {
            id: identity.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registration_body() {
        let identity = WorkerIdentity::new("com.augurlabs.core.jayhawk_worker.51236", "localhost", 51236);
        let body = RegistrationRequest::new(&identity, &["labor_hours".to_string()]);

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "id": "com.augurlabs.core.jayhawk_worker.51236",
                "location": "http://localhost:51236",
                "host": "localhost",
                "port": 51236,
                "models": ["labor_hours"]
            })
        );
    }

    #[test]
    fn test_deregistration_body_only_carries_id() {
        let identity = WorkerIdentity::new("w-1", "worker.internal", 6000);
        let body = DeregistrationRequest::from(&identity);
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"id": "w-1"}));
    }
}
