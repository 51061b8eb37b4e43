//! Jayhawk worker
//!
//! Process-level lifecycle of a labor-hours worker: bind the control
//! endpoint, announce the worker to the broker, serve until told to stop,
//! then stop the computation child, deregister and terminate, in that order.

pub mod compute;
pub mod components;
pub mod error;
pub mod runtime;
pub mod terminator;

pub use components::{ChildControl, ControlEndpoint, Terminator};
pub use error::{RuntimeError, RuntimeResult};
pub use runtime::{RuntimeOptions, RuntimeParts, TeardownReport, WorkerRuntime};
pub use terminator::ProcessTerminator;
