//! Errors raised while loading or validating worker settings

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Invalid YAML settings: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid JSON settings: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A `JAYHAWK_*` override that could not be applied
    #[error("Bad environment override: {0}")]
    EnvError(String),

    /// A settings section failed validation
    #[error("Invalid {domain} settings: {message}")]
    DomainError { domain: String, message: String },
}
