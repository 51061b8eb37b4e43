//! Process termination at the end of teardown

use jayhawk_config::TerminationPolicy;
use tracing::{info, warn};

use crate::components::Terminator;
use crate::runtime::TeardownReport;

/// Ends the worker process according to its [`TerminationPolicy`].
///
/// `Kill` sends SIGKILL to the worker's own pid so nothing left behind by
/// the HTTP stack can keep the process alive. `Exit` exits with status 0.
#[derive(Debug, Clone, Copy)]
pub struct ProcessTerminator {
    policy: TerminationPolicy,
}

impl ProcessTerminator {
    pub fn new(policy: TerminationPolicy) -> Self {
        Self { policy }
    }
}

impl Terminator for ProcessTerminator {
    fn terminate(&self, report: &TeardownReport) {
        info!(
            policy = ?self.policy,
            deregistered = report.deregistered,
            "Teardown complete, terminating worker process"
        );

        match self.policy {
            TerminationPolicy::Kill => kill_self(),
            TerminationPolicy::Exit => std::process::exit(0),
        }
    }
}

#[cfg(unix)]
fn kill_self() {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::getpid;

    if let Err(e) = kill(getpid(), Signal::SIGKILL) {
        warn!("Failed to SIGKILL own process: {}, exiting instead", e);
    }
    // Only reached if the signal could not be delivered
    std::process::exit(1);
}

#[cfg(not(unix))]
fn kill_self() {
    warn!("SIGKILL is unavailable on this platform, exiting instead");
    std::process::exit(1);
}
