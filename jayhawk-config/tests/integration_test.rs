//! Integration tests for jayhawk-config

use jayhawk_config::*;
use std::io::Write;
use std::time::Duration;
use temp_env::with_vars;

#[test]
fn test_default_config_validation() {
    let config = WorkerSettings::default();
    assert!(config.validate_all().is_ok());
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("JAYHAWK_BROKER_HOST", Some("broker.internal")),
        ("JAYHAWK_BROKER_PORT", Some("5100")),
        ("JAYHAWK_WORKER_PORT", Some("0")),
        ("JAYHAWK_WORKER_TERMINATION", Some("exit")),
        ("JAYHAWK_STOP_TIMEOUT_MS", Some("200")),
        ("JAYHAWK_LOG_LEVEL", Some("debug")),
    ];

    with_vars(vars, || {
        let loader = ConfigLoader::new();
        let config = loader.from_env().unwrap();

        assert_eq!(config.broker.host, "broker.internal");
        assert_eq!(config.broker.port, 5100);
        assert_eq!(config.worker.port, 0);
        assert_eq!(config.worker.termination, TerminationPolicy::Exit);
        assert_eq!(config.supervisor.stop_timeout, Duration::from_millis(200));
        assert_eq!(config.logging.level, LogLevel::Debug);
    });
}

#[test]
fn test_invalid_env_override() {
    with_vars(vec![("JAYHAWK_BROKER_PORT", Some("not-a-port"))], || {
        let result = ConfigLoader::new().from_env();
        assert!(matches!(result, Err(ConfigError::EnvError(_))));
    });
}

#[test]
fn test_custom_prefix() {
    with_vars(vec![("LABOR_BROKER_PORT", Some("5200"))], || {
        let config = ConfigLoader::with_prefix("LABOR").from_env().unwrap();
        assert_eq!(config.broker.port, 5200);
    });
}

#[test]
fn test_yaml_config_roundtrip() {
    let yaml = WorkerSettings::generate_sample();
    let parsed: WorkerSettings = serde_yaml::from_str(&yaml).unwrap();
    assert!(parsed.validate_all().is_ok());
}

#[test]
fn test_comprehensive_config_file() {
    let yaml = r#"
worker:
  name: jayhawk_worker
  host: worker-1.internal
  port: 51300
  termination: exit

broker:
  host: broker.internal
  port: 5000
  api_prefix: ""
  timeout: 750

supervisor:
  stop_timeout: 200
  computation:
    program: /usr/local/bin/jayhawk-worker
    args: ["compute", "--quiet"]

endpoint:
  drain_timeout: 100

database:
  url: "sqlite::memory:"

logging:
  level: warn
  format: json
"#;

    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    // Distinct prefix keeps env-mutating tests from leaking into this one
    let config = ConfigLoader::with_prefix("JAYHAWK_FILE_TEST")
        .from_file(file.path())
        .unwrap();

    assert_eq!(config.worker.host, "worker-1.internal");
    assert_eq!(config.worker.port, 51300);
    assert_eq!(config.worker.termination, TerminationPolicy::Exit);
    assert_eq!(config.broker.base_url(), "http://broker.internal:5000");
    assert_eq!(config.broker.timeout, Duration::from_millis(750));
    assert_eq!(config.supervisor.stop_timeout, Duration::from_millis(200));
    assert_eq!(
        config.supervisor.computation.program.as_deref(),
        Some("/usr/local/bin/jayhawk-worker")
    );
    assert_eq!(config.endpoint.drain_timeout, Duration::from_millis(100));
    assert_eq!(config.database.url, "sqlite::memory:");
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_invalid_file_is_rejected() {
    let yaml = r#"
broker:
  port: 0
"#;
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let result = ConfigLoader::with_prefix("JAYHAWK_FILE_TEST").from_file(file.path());
    assert!(matches!(result, Err(ConfigError::DomainError { .. })));
}

#[test]
fn test_missing_file() {
    let result = ConfigLoader::new().from_file("/nonexistent/jayhawk.yaml");
    assert!(matches!(result, Err(ConfigError::FileReadError(_))));
}
