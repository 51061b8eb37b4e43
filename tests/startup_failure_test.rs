//! Startup (STARTING) failures surface as errors before anything is served

use jayhawk_config::WorkerSettings;
use jayhawk_worker::{RuntimeError, WorkerRuntime};

#[tokio::test]
async fn test_port_in_use_fails_startup() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    let mut settings = WorkerSettings::default();
    settings.worker.bind_address = "127.0.0.1".to_string();
    settings.worker.port = port;

    match WorkerRuntime::bootstrap(&settings, None).await {
        Err(RuntimeError::Bind { port: failed, .. }) => assert_eq!(failed, port),
        Err(other) => panic!("expected a bind error, got {}", other),
        Ok(_) => panic!("startup should fail while the port is taken"),
    }
}

#[tokio::test]
async fn test_invalid_settings_fail_startup() {
    let mut settings = WorkerSettings::default();
    settings.worker.models.clear();

    let result = WorkerRuntime::bootstrap(&settings, None).await;
    assert!(matches!(result, Err(RuntimeError::Config(_))));
}

#[tokio::test]
async fn test_ephemeral_port_fixes_identity() {
    let mut settings = WorkerSettings::default();
    settings.worker.bind_address = "127.0.0.1".to_string();
    settings.worker.port = 0;

    let runtime = WorkerRuntime::bootstrap(&settings, None).await.unwrap();
    let identity = runtime.identity();

    assert_ne!(identity.port, 0);
    assert_eq!(
        identity.id,
        format!("com.augurlabs.core.jayhawk_worker.{}", identity.port)
    );
    assert_eq!(identity.location(), format!("http://localhost:{}", identity.port));
    // Dropped without running: the terminator is never reached
}
