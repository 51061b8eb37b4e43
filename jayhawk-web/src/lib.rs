//! Jayhawk control endpoint
//!
//! The small HTTP surface a worker exposes while it is serving: status,
//! a stop request, and starting or stopping the computation child. The
//! server returns once a stop is requested (or the listener fails), which the
//! runtime takes as its cue to tear down.

pub mod app;
pub mod context;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use app::{create_control_app, AppConfig};
pub use context::ControlContext;
pub use errors::{WebError, WebResult};
pub use server::{os_shutdown_signal, ControlServer, ServeExit, StopSignal};
