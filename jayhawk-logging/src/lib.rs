//! Structured logging infrastructure for the Jayhawk worker
//!
//! All output goes to stderr: the computation child reports its results on
//! stdout, so log lines must never share that stream.

pub mod init;

pub use init::{build_env_filter, init_logging_from_config};
