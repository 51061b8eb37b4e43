//! Broker error types

/// Result alias for broker calls
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Error type for broker operations
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("Broker unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("Broker rejected {operation} with status {status}: {body}")]
    Rejected {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl BrokerError {
    /// Whether the broker answered at all
    pub fn is_unreachable(&self) -> bool {
        matches!(self, BrokerError::Unreachable(_))
    }
}
