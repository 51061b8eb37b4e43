//! Worker lifecycle end to end: real control endpoint, real supervisor,
//! reqwest broker client against an in-process mock broker.

use axum::extract::{Json, State};
use axum::http::{StatusCode, Uri};
use axum::routing::post;
use axum::Router;
use jayhawk_broker::{HttpBrokerClient, WorkerIdentity};
use jayhawk_config::{BrokerEndpointConfig, ComputationCommand, SupervisorConfig};
use jayhawk_execution::{ChildProcessSupervisor, RuntimeState, StateTracker, StopOutcome};
use jayhawk_web::{create_control_app, AppConfig, ControlContext, ControlServer, ServeExit, StopSignal};
use jayhawk_worker::{RuntimeOptions, RuntimeParts, TeardownReport, Terminator, WorkerRuntime};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct BrokerLog {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
    /// Whether the child was still alive when each deregistration arrived
    child_alive_at_remove: Arc<Mutex<Vec<bool>>>,
    supervisor: Arc<Mutex<Option<Arc<ChildProcessSupervisor>>>>,
}

impl BrokerLog {
    fn paths(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    fn count(&self, path: &str) -> usize {
        self.paths().iter().filter(|p| *p == path).count()
    }
}

async fn broker_handler(State(log): State<BrokerLog>, uri: Uri, Json(body): Json<Value>) -> StatusCode {
    if uri.path().ends_with("/remove") {
        let alive = log
            .supervisor
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.is_running())
            .unwrap_or(false);
        log.child_alive_at_remove.lock().unwrap().push(alive);
    }
    log.calls.lock().unwrap().push((uri.path().to_string(), body));
    StatusCode::OK
}

async fn spawn_mock_broker(log: BrokerLog) -> u16 {
    let router = Router::new()
        .route("/api/unstable/workers", post(broker_handler))
        .route("/api/unstable/workers/remove", post(broker_handler))
        .with_state(log);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    port
}

fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

struct CountingTerminator {
    calls: Arc<AtomicUsize>,
}

impl Terminator for CountingTerminator {
    fn terminate(&self, _report: &TeardownReport) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

struct Worker {
    runtime: WorkerRuntime,
    supervisor: Arc<ChildProcessSupervisor>,
    stop: StopSignal,
    state: StateTracker,
    port: u16,
    terminations: Arc<AtomicUsize>,
}

async fn assemble(broker_port: u16) -> Worker {
    let listener = ControlServer::bind("127.0.0.1", 0).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let identity = WorkerIdentity::new(format!("com.augurlabs.core.jayhawk_worker.{}", port), "127.0.0.1", port);

    let broker = HttpBrokerClient::new(
        &BrokerEndpointConfig {
            host: "127.0.0.1".to_string(),
            port: broker_port,
            timeout: Duration::from_millis(500),
            ..Default::default()
        },
        vec!["labor_hours".to_string()],
    )
    .unwrap();

    let supervisor_config = SupervisorConfig {
        stop_timeout: Duration::from_secs(2),
        computation: ComputationCommand {
            program: Some("/bin/sh".to_string()),
            args: vec!["-c".to_string(), "sleep 30".to_string()],
        },
        ..Default::default()
    };
    let supervisor = Arc::new(ChildProcessSupervisor::from_config(&supervisor_config));
    let state = StateTracker::new();
    let stop = StopSignal::new();

    let context = ControlContext::new(
        identity.clone(),
        supervisor.clone(),
        state.clone(),
        stop.clone(),
        &supervisor_config,
    );
    let server = ControlServer::new(
        listener,
        create_control_app(context, AppConfig::default()),
        stop.clone(),
        Duration::from_millis(500),
    );

    let terminations = Arc::new(AtomicUsize::new(0));
    let runtime = WorkerRuntime::from_parts(RuntimeParts {
        identity,
        broker: Arc::new(broker),
        child: supervisor.clone(),
        endpoint: Box::new(server),
        terminator: Box::new(CountingTerminator {
            calls: terminations.clone(),
        }),
        state: state.clone(),
        stop: stop.clone(),
        options: RuntimeOptions {
            register_on_start: true,
            stop_timeout: supervisor_config.stop_timeout,
        },
    });

    Worker {
        runtime,
        supervisor,
        stop,
        state,
        port,
        terminations,
    }
}

#[tokio::test]
async fn test_stop_after_50ms_without_child() {
    let log = BrokerLog::default();
    let broker_port = spawn_mock_broker(log.clone()).await;
    let worker = assemble(broker_port).await;

    let stop = worker.stop.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.trigger();
    });

    let report = worker.runtime.run().await.unwrap();

    assert!(report.registered);
    assert!(report.deregistered);
    assert_eq!(report.endpoint_exit, ServeExit::Stopped);
    assert_eq!(report.child, Some(StopOutcome::NotRunning));

    let stats = worker.supervisor.stats();
    assert_eq!(stats.forced_kills, 0);
    assert_eq!(stats.graceful_stops, 0);

    assert_eq!(log.count("/api/unstable/workers"), 1);
    assert_eq!(log.count("/api/unstable/workers/remove"), 1);
    assert_eq!(worker.terminations.load(Ordering::SeqCst), 1);
    assert_eq!(worker.state.current(), RuntimeState::Terminated);
}

#[tokio::test]
async fn test_running_child_is_stopped_before_deregistration() {
    let log = BrokerLog::default();
    let broker_port = spawn_mock_broker(log.clone()).await;
    let worker = assemble(broker_port).await;
    *log.supervisor.lock().unwrap() = Some(worker.supervisor.clone());

    let base = format!("http://127.0.0.1:{}", worker.port);
    let supervisor = worker.supervisor.clone();
    let driver = tokio::spawn(async move {
        let client = reqwest::Client::new();

        // Wait for the runtime to start serving
        let mut ready = false;
        for _ in 0..50 {
            if client.get(format!("{}/health", base)).send().await.is_ok() {
                ready = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(ready, "control endpoint never came up");

        let started = client
            .post(format!("{}/computation", base))
            .json(&json!({"repo_group_id": 10, "repo_id": 42, "period": "month"}))
            .send()
            .await
            .unwrap();
        assert_eq!(started.status().as_u16(), 202);
        assert!(supervisor.is_running());

        let status: Value = client
            .get(format!("{}/status", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["state"], "SERVING");
        assert_eq!(status["child"]["running"], true);

        let stopped = client.post(format!("{}/stop", base)).send().await.unwrap();
        assert_eq!(stopped.status().as_u16(), 202);
    });

    let report = worker.runtime.run().await.unwrap();
    driver.await.unwrap();

    match report.child {
        Some(StopOutcome::Graceful { .. }) | Some(StopOutcome::Forced { .. }) => {}
        other => panic!("expected the child to be stopped, got {:?}", other),
    }
    assert!(!worker.supervisor.is_running());
    assert_eq!(*log.child_alive_at_remove.lock().unwrap(), vec![false]);
    assert_eq!(worker.terminations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreachable_broker_does_not_block_teardown() {
    let worker = assemble(unused_port()).await;
    worker.stop.trigger();

    let report = tokio::time::timeout(Duration::from_secs(5), worker.runtime.run())
        .await
        .expect("teardown hung on an unreachable broker")
        .unwrap();

    assert!(!report.registered);
    assert!(!report.deregistered);
    assert_eq!(worker.terminations.load(Ordering::SeqCst), 1);
    assert_eq!(
        worker.state.history(),
        vec![
            RuntimeState::Starting,
            RuntimeState::Serving,
            RuntimeState::Stopping,
            RuntimeState::Terminated
        ]
    );
}
