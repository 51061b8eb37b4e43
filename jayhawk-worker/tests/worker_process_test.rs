//! The real `jayhawk-worker` binary: how the process ends

#![cfg(unix)]

use std::os::unix::process::ExitStatusExt;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Worker command with an unreachable broker and JSON logs on stderr
fn worker() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_jayhawk-worker"));
    cmd.env("JAYHAWK_WORKER_BIND_ADDRESS", "127.0.0.1")
        .env("JAYHAWK_BROKER_HOST", "127.0.0.1")
        .env("JAYHAWK_BROKER_PORT", unused_port().to_string())
        .env("JAYHAWK_BROKER_TIMEOUT_MS", "500")
        .env("JAYHAWK_LOG_LEVEL", "info")
        .env("JAYHAWK_LOG_FORMAT", "json")
        .env_remove("JAYHAWK_WORKER_PORT")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Port from the startup summary line `Control endpoint: http://host:port`
fn control_port(line: &str) -> Option<u16> {
    let rest = line.split("Control endpoint: http://").nth(1)?;
    let location = rest.split('"').next()?;
    location.rsplit(':').next()?.trim().parse().ok()
}

#[test]
fn test_control_port_parsing() {
    let line = r#"{"level":"INFO","fields":{"message":"Control endpoint: http://localhost:40123"}}"#;
    assert_eq!(control_port(line), Some(40123));
    assert_eq!(control_port("Broker: http://127.0.0.1:5000/api/unstable"), None);
}

#[tokio::test]
async fn test_serve_ends_by_sigkill_after_stop_request() {
    let mut child = worker().args(["serve", "--port", "0"]).spawn().unwrap();
    let mut lines = BufReader::new(child.stderr.take().unwrap()).lines();

    let port = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(line) = lines.next_line().await.unwrap() {
            if let Some(port) = control_port(&line) {
                return port;
            }
        }
        panic!("worker exited before announcing its control endpoint");
    })
    .await
    .expect("no control endpoint announced");
    assert_ne!(port, 0);

    // Keep the pipe drained so logging never blocks the worker
    tokio::spawn(async move { while let Ok(Some(_)) = lines.next_line().await {} });

    let client = reqwest::Client::new();
    let base = format!("http://127.0.0.1:{}", port);
    let mut ready = false;
    for _ in 0..100 {
        if client.get(format!("{}/health", base)).send().await.is_ok() {
            ready = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(ready, "control endpoint never came up");

    let stopped = client.post(format!("{}/stop", base)).send().await.unwrap();
    assert_eq!(stopped.status().as_u16(), 202);

    let status = tokio::time::timeout(Duration::from_secs(10), child.wait())
        .await
        .expect("worker did not terminate after /stop")
        .unwrap();
    assert_eq!(status.code(), None);
    assert_eq!(status.signal(), Some(9));
}

#[tokio::test]
async fn test_invalid_port_override_exits_non_zero() {
    let output = worker()
        .env("JAYHAWK_WORKER_PORT", "not-a-port")
        .arg("serve")
        .output()
        .await
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("WORKER_PORT"), "unexpected stderr: {}", stderr);
}

#[tokio::test]
async fn test_port_in_use_exits_non_zero() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    let output = worker()
        .args(["serve", "--port", &port.to_string()])
        .output()
        .await
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    drop(taken);
}
