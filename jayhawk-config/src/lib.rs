//! Domain-driven configuration management for the Jayhawk worker
//!
//! Configuration is split by functional domain (worker identity, broker,
//! child supervision, control endpoint, database, logging), each with its
//! own defaults and validation, and can be overridden from `JAYHAWK_*`
//! environment variables.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    broker::BrokerEndpointConfig,
    database::DatabaseConfig,
    endpoint::EndpointConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    supervisor::{ComputationCommand, SupervisorConfig},
    worker::{TerminationPolicy, WorkerConfig},
    WorkerSettings,
};

// Re-export utilities
pub use domains::utils::{serde_duration, serde_duration_millis};
