//! Broker registration for Jayhawk workers
//!
//! A worker announces itself to the central broker when it starts and asks
//! to be removed when it shuts down. Both calls are best-effort: the broker
//! may be down, and the worker must carry on either way.

pub mod client;
pub mod errors;
pub mod identity;

// Re-export main types for convenience
pub use client::{BrokerClient, HttpBrokerClient};
pub use errors::{BrokerError, BrokerResult};
pub use identity::{DeregistrationRequest, RegistrationRequest, WorkerIdentity};
