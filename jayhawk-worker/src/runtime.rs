//! Worker runtime state machine

use jayhawk_broker::{BrokerClient, HttpBrokerClient, WorkerIdentity};
use jayhawk_config::WorkerSettings;
use jayhawk_execution::{ChildProcessSupervisor, RuntimeState, StateTracker, StopOutcome};
use jayhawk_web::{
    create_control_app, AppConfig, ControlContext, ControlServer, ServeExit, StopSignal,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::components::{ChildControl, ControlEndpoint, Terminator};
use crate::error::{RuntimeError, RuntimeResult};
use crate::terminator::ProcessTerminator;

/// Knobs the runtime itself consults
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub register_on_start: bool,
    /// Grace period given to the child during teardown
    pub stop_timeout: Duration,
}

impl From<&WorkerSettings> for RuntimeOptions {
    fn from(settings: &WorkerSettings) -> Self {
        Self {
            register_on_start: settings.broker.register_on_start,
            stop_timeout: settings.supervisor.stop_timeout,
        }
    }
}

/// Everything a runtime is assembled from
pub struct RuntimeParts {
    pub identity: WorkerIdentity,
    pub broker: Arc<dyn BrokerClient>,
    pub child: Arc<dyn ChildControl>,
    pub endpoint: Box<dyn ControlEndpoint>,
    pub terminator: Box<dyn Terminator>,
    pub state: StateTracker,
    pub stop: StopSignal,
    pub options: RuntimeOptions,
}

/// What happened during teardown
#[derive(Debug, Clone)]
pub struct TeardownReport {
    pub registered: bool,
    pub endpoint_exit: ServeExit,
    /// `None` when stopping the child failed outright
    pub child: Option<StopOutcome>,
    pub deregistered: bool,
}

/// A worker between startup and termination.
///
/// Created in `STARTING` by [`bootstrap`](Self::bootstrap), then
/// [`run`](Self::run) serves, tears down and terminates. `run` consumes the
/// runtime, so the terminator cannot be reached twice.
pub struct WorkerRuntime {
    identity: WorkerIdentity,
    broker: Arc<dyn BrokerClient>,
    child: Arc<dyn ChildControl>,
    endpoint: Box<dyn ControlEndpoint>,
    terminator: Box<dyn Terminator>,
    state: StateTracker,
    stop: StopSignal,
    options: RuntimeOptions,
}

impl WorkerRuntime {
    pub fn from_parts(parts: RuntimeParts) -> Self {
        Self {
            identity: parts.identity,
            broker: parts.broker,
            child: parts.child,
            endpoint: parts.endpoint,
            terminator: parts.terminator,
            state: parts.state,
            stop: parts.stop,
            options: parts.options,
        }
    }

    /// STARTING: bind the control listener (which fixes the port and so the
    /// worker id), then build the broker client, supervisor and endpoint.
    /// On failure the runtime goes straight to `TERMINATED`.
    pub async fn bootstrap(
        settings: &WorkerSettings,
        config_path: Option<&Path>,
    ) -> RuntimeResult<Self> {
        let state = StateTracker::new();

        match Self::build(settings, config_path, state.clone()).await {
            Ok(runtime) => Ok(runtime),
            Err(e) => {
                error!("Worker startup failed: {}", e);
                let _ = state.advance(RuntimeState::Terminated);
                Err(e)
            }
        }
    }

    async fn build(
        settings: &WorkerSettings,
        config_path: Option<&Path>,
        state: StateTracker,
    ) -> RuntimeResult<Self> {
        settings.validate_all()?;

        let worker = &settings.worker;
        let listener = ControlServer::bind(&worker.bind_address, worker.port)
            .await
            .map_err(|source| RuntimeError::Bind {
                address: worker.bind_address.clone(),
                port: worker.port,
                source,
            })?;
        let port = listener
            .local_addr()
            .map_err(|source| RuntimeError::Bind {
                address: worker.bind_address.clone(),
                port: worker.port,
                source,
            })?
            .port();

        let identity = WorkerIdentity::new(worker.worker_id(port), worker.host.clone(), port);
        let broker = HttpBrokerClient::new(&settings.broker, worker.models.clone())?;

        // A re-executed worker binary needs the same configuration file
        let mut supervisor_config = settings.supervisor.clone();
        if supervisor_config.computation.program.is_none() {
            if let Some(path) = config_path {
                supervisor_config
                    .computation
                    .args
                    .extend(["--config".to_string(), path.display().to_string()]);
            }
        }

        let supervisor = Arc::new(ChildProcessSupervisor::from_config(&supervisor_config));
        let stop = StopSignal::new();
        let context = ControlContext::new(
            identity.clone(),
            supervisor.clone(),
            state.clone(),
            stop.clone(),
            &supervisor_config,
        );
        let app = create_control_app(context, AppConfig::from(&settings.endpoint));
        let server = ControlServer::new(listener, app, stop.clone(), settings.endpoint.drain_timeout);

        log_startup_summary(settings, &identity, broker.base_url());

        Ok(Self::from_parts(RuntimeParts {
            identity,
            broker: Arc::new(broker),
            child: supervisor,
            endpoint: Box::new(server),
            terminator: Box::new(ProcessTerminator::new(worker.termination)),
            state,
            stop,
            options: RuntimeOptions::from(settings),
        }))
    }

    pub fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    pub fn state(&self) -> StateTracker {
        self.state.clone()
    }

    /// Handle for requesting a stop from outside the endpoint, e.g. on SIGTERM
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Register, serve until stopped, tear down, terminate.
    pub async fn run(self) -> RuntimeResult<TeardownReport> {
        let worker_id = self.identity.id.clone();

        let registered = if self.options.register_on_start {
            match self.broker.register(&self.identity).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(worker_id = %worker_id, "Broker registration failed, continuing: {}", e);
                    false
                }
            }
        } else {
            false
        };

        self.state.advance(RuntimeState::Serving)?;
        info!(worker_id = %worker_id, "Worker serving at {}", self.identity.location());

        let endpoint_exit = self.endpoint.serve().await;
        if let ServeExit::ListenerFailed(reason) = &endpoint_exit {
            warn!(worker_id = %worker_id, "Control endpoint failed, tearing down: {}", reason);
        }

        self.state.advance(RuntimeState::Stopping)?;

        if self.child.is_running() {
            info!(worker_id = %worker_id, "Stopping computation child");
        }
        let child = match self.child.stop(self.options.stop_timeout).await {
            Ok(outcome) => {
                if outcome.was_forced() {
                    warn!(worker_id = %worker_id, pid = ?outcome.pid(), "Computation child had to be killed");
                }
                Some(outcome)
            }
            Err(e) => {
                error!(worker_id = %worker_id, "Failed to stop computation child: {}", e);
                None
            }
        };

        // Best-effort: the outcome is logged and otherwise dropped
        let deregistered = match self.broker.deregister(&self.identity).await {
            Ok(()) => true,
            Err(e) => {
                warn!(worker_id = %worker_id, "Broker deregistration failed: {}", e);
                false
            }
        };

        self.state.advance(RuntimeState::Terminated)?;

        let report = TeardownReport {
            registered,
            endpoint_exit,
            child,
            deregistered,
        };
        self.terminator.terminate(&report);

        Ok(report)
    }
}

fn log_startup_summary(settings: &WorkerSettings, identity: &WorkerIdentity, broker_url: &str) {
    info!("=== Jayhawk Worker ===");
    info!("Worker ID: {}", identity.id);
    info!("Control endpoint: {}", identity.location());
    info!("Broker: {}", broker_url);
    info!(
        "Register on start: {}",
        if settings.broker.register_on_start { "Enabled" } else { "Disabled" }
    );
    info!("Child stop timeout: {:?}", settings.supervisor.stop_timeout);
    info!("Termination: {:?}", settings.worker.termination);
    info!("======================");
}
