//! Shared state handed to control handlers

use jayhawk_broker::WorkerIdentity;
use jayhawk_config::{ComputationCommand, SupervisorConfig};
use jayhawk_execution::{ChildProcessSupervisor, StateTracker};
use std::sync::Arc;
use std::time::Duration;

use crate::server::StopSignal;

#[derive(Clone)]
pub struct ControlContext {
    pub identity: WorkerIdentity,
    pub supervisor: Arc<ChildProcessSupervisor>,
    pub state: StateTracker,
    pub stop: StopSignal,
    /// Command line the computation child is launched with
    pub computation: ComputationCommand,
    /// Grace period for `DELETE /computation`
    pub stop_timeout: Duration,
}

impl ControlContext {
    pub fn new(
        identity: WorkerIdentity,
        supervisor: Arc<ChildProcessSupervisor>,
        state: StateTracker,
        stop: StopSignal,
        config: &SupervisorConfig,
    ) -> Self {
        Self {
            identity,
            supervisor,
            state,
            stop,
            computation: config.computation.clone(),
            stop_timeout: config.stop_timeout,
        }
    }
}
