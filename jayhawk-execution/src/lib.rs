//! Jayhawk execution
//!
//! Supervision of the worker's subordinate computation process. The
//! supervisor holds at most one child at a time, escalates from a graceful
//! signal to a forced kill on stop, and always reaps what it started.
//! Also home to the forward-only runtime lifecycle tracker.

pub mod command;
pub mod error;
pub mod lifecycle;
pub mod supervisor;

// Re-export main types
pub use command::ChildCommand;
pub use error::{LifecycleError, SupervisorError, SupervisorResult};
pub use lifecycle::{RuntimeState, StateTracker};
pub use supervisor::{
    ChildInfo, ChildProcessSupervisor, ChildStatus, ExitInfo, StopOutcome, SupervisorStats,
};
