//! Supervisor for the single computation child process

use chrono::{DateTime, Utc};
use jayhawk_config::SupervisorConfig;
use parking_lot::Mutex as StatsMutex;
use serde::Serialize;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Child;
use tokio::sync::{watch, Mutex, Notify};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::command::ChildCommand;
use crate::error::{SupervisorError, SupervisorResult};

/// Identity of a launched child
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChildInfo {
    pub pid: u32,
    pub program: String,
    pub started_at: DateTime<Utc>,
}

/// How a child ended
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ExitInfo {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl From<ExitStatus> for ExitInfo {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

/// Result of a stop request
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StopOutcome {
    /// No child was held
    NotRunning,
    /// The child had already finished and was reaped without signalling
    AlreadyExited { pid: u32, exit: ExitInfo },
    /// The child exited within the stop timeout after the graceful signal
    Graceful {
        pid: u32,
        exit: ExitInfo,
        elapsed_ms: u64,
    },
    /// The child had to be killed
    Forced {
        pid: u32,
        exit: ExitInfo,
        elapsed_ms: u64,
    },
}

impl StopOutcome {
    pub fn pid(&self) -> Option<u32> {
        match self {
            StopOutcome::NotRunning => None,
            StopOutcome::AlreadyExited { pid, .. }
            | StopOutcome::Graceful { pid, .. }
            | StopOutcome::Forced { pid, .. } => Some(*pid),
        }
    }

    pub fn was_forced(&self) -> bool {
        matches!(self, StopOutcome::Forced { .. })
    }
}

/// Lifetime counters
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SupervisorStats {
    pub spawned: u64,
    pub completed: u64,
    pub graceful_stops: u64,
    pub forced_kills: u64,
}

/// Snapshot for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct ChildStatus {
    pub running: bool,
    pub child: Option<ChildInfo>,
    pub last_exit: Option<ExitInfo>,
    pub stats: SupervisorStats,
}

#[derive(Debug, Default)]
struct Records {
    stats: StatsMutex<SupervisorStats>,
    last_exit: StatsMutex<Option<ExitInfo>>,
}

/// What the reaper task and `stop` agree on. Both fields only ever move
/// from unset to set.
#[derive(Debug, Default, Clone, Copy)]
struct ChildPhase {
    stopping: bool,
    exit: Option<ExitInfo>,
}

/// Slot entry for a child whose `Child` handle is owned by its reaper task
struct ManagedChild {
    info: ChildInfo,
    phase: Arc<watch::Sender<ChildPhase>>,
    kill: Arc<Notify>,
}

impl ManagedChild {
    fn exit(&self) -> Option<ExitInfo> {
        self.phase.borrow().exit
    }

    /// Mark the child as being stopped, unless it already finished on its
    /// own. Returns the exit in that case.
    fn begin_stop(&self) -> Option<ExitInfo> {
        let mut exited = None;
        self.phase.send_if_modified(|phase| {
            exited = phase.exit;
            phase.stopping = true;
            false
        });
        exited
    }

    async fn exited(&self) -> Option<ExitInfo> {
        let mut rx = self.phase.subscribe();
        let exit = match rx.wait_for(|phase| phase.exit.is_some()).await {
            Ok(phase) => phase.exit,
            Err(_) => None,
        };
        exit
    }

    fn terminate(&self) {
        #[cfg(unix)]
        signal_group(self.info.pid, nix::sys::signal::Signal::SIGTERM);

        #[cfg(not(unix))]
        {
            warn!(pid = self.info.pid, "No graceful signal on this platform, killing");
            self.kill.notify_one();
        }
    }

    fn kill(&self) {
        #[cfg(unix)]
        {
            if signal_group(self.info.pid, nix::sys::signal::Signal::SIGKILL) {
                return;
            }
        }
        self.kill.notify_one();
    }
}

impl Drop for ManagedChild {
    // The reaper's `Child` only kills the leader on drop
    fn drop(&mut self) {
        if self.exit().is_none() {
            warn!(
                pid = self.info.pid,
                "Dropping a live computation child, killing its process group"
            );
            self.kill();
        }
    }
}

/// Owns at most one computation child at a time.
///
/// Every child handed out by [`start`](Self::start) is waited on by its own
/// reaper task, so it is reaped as soon as it exits whether or not anyone
/// is polling. Once the child has exited the reaper also kills whatever is
/// left in its process group.
pub struct ChildProcessSupervisor {
    slot: Mutex<Option<ManagedChild>>,
    records: Arc<Records>,
    reap_timeout: Duration,
}

impl ChildProcessSupervisor {
    pub fn new(reap_timeout: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            records: Arc::new(Records::default()),
            reap_timeout,
        }
    }

    pub fn from_config(config: &SupervisorConfig) -> Self {
        Self::new(config.reap_timeout)
    }

    /// Launch a child. Fails if a live child is already held; a held child
    /// that has finished is released first.
    pub async fn start(&self, command: &ChildCommand) -> SupervisorResult<ChildInfo> {
        let mut slot = self.slot.lock().await;

        if let Some(managed) = slot.as_ref() {
            if managed.exit().is_none() {
                return Err(SupervisorError::AlreadyRunning {
                    pid: managed.info.pid,
                });
            }
            *slot = None;
        }

        let program = command.display_program();
        let child = command
            .to_command()
            .spawn()
            .map_err(|source| SupervisorError::SpawnError {
                program: program.clone(),
                source,
            })?;

        // Only None once the child has been polled to completion
        let pid = child.id().ok_or_else(|| SupervisorError::SpawnError {
            program: program.clone(),
            source: std::io::Error::other("child exited before its pid was read"),
        })?;

        let info = ChildInfo {
            pid,
            program,
            started_at: Utc::now(),
        };
        info!(pid, program = %info.program, "Started computation child");
        self.records.stats.lock().spawned += 1;

        let phase = Arc::new(watch::Sender::new(ChildPhase::default()));
        let kill = Arc::new(Notify::new());
        tokio::spawn(reap_child(
            child,
            pid,
            phase.clone(),
            kill.clone(),
            self.records.clone(),
        ));

        *slot = Some(ManagedChild {
            info: info.clone(),
            phase,
            kill,
        });

        Ok(info)
    }

    /// Non-blocking liveness check. Reports `true` while another operation
    /// holds the child.
    pub fn is_running(&self) -> bool {
        let Ok(mut slot) = self.slot.try_lock() else {
            return true;
        };
        Self::poll_slot(&mut slot)
    }

    /// Current state for status reporting
    pub async fn status(&self) -> ChildStatus {
        let mut slot = self.slot.lock().await;
        let running = Self::poll_slot(&mut slot);

        ChildStatus {
            running,
            child: slot.as_ref().map(|managed| managed.info.clone()),
            last_exit: *self.records.last_exit.lock(),
            stats: self.stats(),
        }
    }

    pub fn stats(&self) -> SupervisorStats {
        *self.records.stats.lock()
    }

    /// Stop the held child: graceful signal, bounded wait, then a forced
    /// kill. Idempotent; with nothing held this returns
    /// [`StopOutcome::NotRunning`] and sends no signal.
    ///
    /// The child stays in the slot until its exit has been observed, so a
    /// cancelled stop leaves it visible to the next one.
    pub async fn stop(&self, stop_timeout: Duration) -> SupervisorResult<StopOutcome> {
        let mut slot = self.slot.lock().await;

        let Some(managed) = slot.as_ref() else {
            debug!("Stop requested with no child running");
            return Ok(StopOutcome::NotRunning);
        };
        let pid = managed.info.pid;

        if let Some(exit) = managed.begin_stop() {
            *slot = None;
            return Ok(StopOutcome::AlreadyExited { pid, exit });
        }

        let started = Instant::now();
        info!(pid, "Initiating graceful stop of computation child");
        managed.terminate();

        match timeout(stop_timeout, managed.exited()).await {
            Ok(Some(exit)) => {
                info!(pid, ?exit, "Computation child stopped gracefully");
                self.records.stats.lock().graceful_stops += 1;
                *slot = None;
                return Ok(StopOutcome::Graceful {
                    pid,
                    exit,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                });
            }
            Ok(None) => error!(pid, "Lost track of computation child exit"),
            Err(_) => {
                warn!(
                    pid,
                    "Computation child did not exit within {:?}, killing", stop_timeout
                );
            }
        }

        managed.kill();

        match timeout(self.reap_timeout, managed.exited()).await {
            Ok(Some(exit)) => {
                info!(pid, ?exit, "Computation child killed");
                self.records.stats.lock().forced_kills += 1;
                *slot = None;
                Ok(StopOutcome::Forced {
                    pid,
                    exit,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                })
            }
            _ => {
                error!(pid, "Computation child did not exit even after kill");
                Err(SupervisorError::Unresponsive { pid })
            }
        }
    }

    fn poll_slot(slot: &mut Option<ManagedChild>) -> bool {
        match slot.as_ref().map(ManagedChild::exit) {
            None => false,
            Some(None) => true,
            Some(Some(_)) => {
                *slot = None;
                false
            }
        }
    }
}

impl Default for ChildProcessSupervisor {
    fn default() -> Self {
        Self::from_config(&SupervisorConfig::default())
    }
}

/// Wait for the child, reap it, clear out its process group and publish
/// the exit. Natural exits count as completions; exits during a stop are
/// counted by `stop`.
async fn reap_child(
    mut child: Child,
    pid: u32,
    phase: Arc<watch::Sender<ChildPhase>>,
    kill: Arc<Notify>,
    records: Arc<Records>,
) {
    let status = loop {
        tokio::select! {
            status = child.wait() => break status,
            _ = kill.notified() => {
                if let Err(e) = child.start_kill() {
                    warn!(pid, "Failed to kill child: {}", e);
                }
            }
        }
    };

    let exit = match status {
        Ok(status) => ExitInfo::from(status),
        Err(e) => {
            error!(pid, "Error waiting for computation child: {}", e);
            ExitInfo {
                code: None,
                signal: None,
            }
        }
    };

    #[cfg(unix)]
    sweep_group(pid);

    *records.last_exit.lock() = Some(exit);
    phase.send_modify(|phase| {
        if !phase.stopping {
            info!(pid, ?exit, "Computation child finished");
            records.stats.lock().completed += 1;
        }
        phase.exit = Some(exit);
    });
}

// The child leads its own process group (pgid == pid), so signalling the
// group also reaches anything it spawned.
#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) -> bool {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pid as i32), signal) {
        Ok(()) => true,
        Err(e) => {
            warn!(pid, "Failed to send {:?} to process group: {}", signal, e);
            false
        }
    }
}

/// Kill anything still in the group of a reaped child. An empty group is
/// the common case.
#[cfg(unix)]
fn sweep_group(pid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) => debug!(pid, "Killed leftover members of the child's process group"),
        Err(Errno::ESRCH) => {}
        Err(e) => warn!(pid, "Failed to sweep child process group: {}", e),
    }
}
