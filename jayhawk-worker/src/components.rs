//! Capabilities the runtime drives during its lifecycle
//!
//! Each is a trait so the teardown sequence can be exercised with recording
//! doubles; the production implementations live next to the types they wrap.

use jayhawk_execution::{ChildProcessSupervisor, StopOutcome, SupervisorResult};
use jayhawk_web::{ControlServer, ServeExit};
use std::time::Duration;

use crate::runtime::TeardownReport;

/// Control over the computation child
#[async_trait::async_trait]
pub trait ChildControl: Send + Sync {
    async fn stop(&self, timeout: Duration) -> SupervisorResult<StopOutcome>;

    fn is_running(&self) -> bool;
}

/// The blocking control endpoint. Returning means "tear down".
#[async_trait::async_trait]
pub trait ControlEndpoint: Send {
    async fn serve(self: Box<Self>) -> ServeExit;
}

/// Ends the process once teardown is complete. Invoked exactly once.
pub trait Terminator: Send + Sync {
    fn terminate(&self, report: &TeardownReport);
}

#[async_trait::async_trait]
impl ChildControl for ChildProcessSupervisor {
    async fn stop(&self, timeout: Duration) -> SupervisorResult<StopOutcome> {
        ChildProcessSupervisor::stop(self, timeout).await
    }

    fn is_running(&self) -> bool {
        ChildProcessSupervisor::is_running(self)
    }
}

#[async_trait::async_trait]
impl ControlEndpoint for ControlServer {
    async fn serve(self: Box<Self>) -> ServeExit {
        ControlServer::serve(*self).await
    }
}
