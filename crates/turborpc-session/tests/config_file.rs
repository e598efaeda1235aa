use std::io::Write as _;
use std::time::Duration;

use pretty_assertions::assert_eq;
use turborpc_session::{ConfigError, SessionOptions};

fn write_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn loads_toml() {
    let file = write_file(
        ".toml",
        r#"
requestTimeout = 5000
queManager = false
heartbeatRate = 15000
maxReconnectAttempts = 3
terminalCloseCodes = [4000, 4001]

[globalHeaders]
auth = "token"
"#,
    );

    let options = SessionOptions::from_file_with_prefix(file.path(), "TURBORPC_TEST_TOML").unwrap();
    let config = options.resolve();

    assert_eq!(config.request_timeout, Duration::from_secs(5));
    assert!(!config.sweep_enabled);
    assert_eq!(config.heartbeat_rate, Duration::from_secs(15));
    assert_eq!(config.reconnect.max_retries, 3);
    assert_eq!(config.terminal_close_codes, vec![4000, 4001]);
    assert_eq!(
        config.global_headers.get("auth"),
        Some(&serde_json::json!("token"))
    );
    // Untouched options keep their defaults.
    assert_eq!(config.heartbeat_timeout, Duration::from_secs(10));
}

#[test]
fn loads_json_and_clamps() {
    let file = write_file(
        ".json",
        r#"{"requestTimeout": 10, "queRunTimeout": 1, "reconnectBaseDelay": 0}"#,
    );

    let config = SessionOptions::from_file_with_prefix(file.path(), "TURBORPC_TEST_JSON")
        .unwrap()
        .resolve();

    assert_eq!(config.request_timeout, Duration::from_secs(1));
    assert_eq!(config.sweep_interval, Duration::from_millis(10));
    assert_eq!(config.reconnect.initial_delay, Duration::from_millis(1));
}

#[test]
fn loads_yaml() {
    let file = write_file(".yaml", "heartbeatTimeoutDuration: 2500\nconnectTimeout: 4000\n");

    let config = SessionOptions::from_file_with_prefix(file.path(), "TURBORPC_TEST_YAML")
        .unwrap()
        .resolve();

    assert_eq!(config.heartbeat_timeout, Duration::from_millis(2500));
    assert_eq!(config.connect_timeout, Duration::from_secs(4));
}

#[test]
fn rejects_invalid_values() {
    let file = write_file(".json", r#"{"requestTimeout": "soon"}"#);
    let err = SessionOptions::from_file_with_prefix(file.path(), "TURBORPC_TEST_BAD").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}
