//! Metric errors

use thiserror::Error;

pub type MetricsResult<T> = Result<T, MetricsError>;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}
