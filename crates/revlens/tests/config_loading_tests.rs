//! Table-driven tests for configuration files on disk.

use std::io::Write;

use revlens::config::{load_config, LogFormat};
use revlens::error::ConfigError;
use revlens::JobMonitor;
use tempfile::NamedTempFile;

/// Represents a single config file test case.
struct ConfigFileCase {
    /// Test case name for identification.
    name: &'static str,
    /// File suffix, which selects the parser.
    suffix: &'static str,
    content: &'static str,
    /// Expected error substring, `None` if loading should succeed.
    expected_error: Option<&'static str>,
}

const CONFIG_FILE_CASES: &[ConfigFileCase] = &[
    ConfigFileCase {
        name: "json_minimal",
        suffix: ".json",
        content: r#"{ "server": { "baseUrl": "http://localhost:8000" } }"#,
        expected_error: None,
    },
    ConfigFileCase {
        name: "yaml_full",
        suffix: ".yaml",
        content: r#"
server:
  baseUrl: https://reviews.example.com
  connectTimeoutSecs: 5
  requestTimeoutSecs: 60
  paths:
    push: /live/{id}
channels:
  guardWindowMs: 5000
  pollIntervalMs: 1000
  keepaliveMs: 500
  eventBuffer: 16
defaults:
  maxItems: 200
  batchSize: 10
  maxPages: 3
logging:
  level: revlens=debug
  format: json
"#,
        expected_error: None,
    },
    ConfigFileCase {
        name: "yml_extension",
        suffix: ".yml",
        content: "server:\n  baseUrl: http://127.0.0.1:9000\n",
        expected_error: None,
    },
    ConfigFileCase {
        name: "json_syntax_error",
        suffix: ".json",
        content: r#"{ "server": "#,
        expected_error: Some("parse config JSON"),
    },
    ConfigFileCase {
        name: "yaml_wrong_type",
        suffix: ".yaml",
        content: "server:\n  baseUrl: http://localhost\nchannels:\n  guardWindowMs: soon\n",
        expected_error: Some("parse config YAML"),
    },
    ConfigFileCase {
        name: "missing_server",
        suffix: ".json",
        content: r#"{ "channels": { "pollIntervalMs": 1000 } }"#,
        expected_error: Some("server"),
    },
    ConfigFileCase {
        name: "zero_defaults",
        suffix: ".json",
        content: r#"{
            "server": { "baseUrl": "http://localhost" },
            "defaults": { "maxPages": 0 }
        }"#,
        expected_error: Some("maxPages"),
    },
    ConfigFileCase {
        name: "download_without_report_placeholder",
        suffix: ".yaml",
        content: "server:\n  baseUrl: http://localhost\n  paths:\n    download: /api/download\n",
        expected_error: Some("{report}"),
    },
];

fn write_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_config_files() {
    for case in CONFIG_FILE_CASES {
        let file = write_config(case.suffix, case.content);
        let result = load_config(file.path());

        match (case.expected_error, result) {
            (None, Ok(config)) => {
                assert!(config.server.base_url.starts_with("http"), "Test '{}'", case.name)
            }
            (None, Err(e)) => panic!("Test '{}': expected success, got: {}", case.name, e),
            (Some(expected), Ok(_)) => {
                panic!("Test '{}': expected error containing '{}'", case.name, expected)
            }
            (Some(expected), Err(e)) => assert!(
                e.to_string().contains(expected),
                "Test '{}': expected error containing '{}', got: {}",
                case.name,
                expected,
                e
            ),
        }
    }
}

#[test]
fn test_yaml_values_are_applied() {
    let file = write_config(".yaml", CONFIG_FILE_CASES[1].content);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.server.base_url, "https://reviews.example.com");
    assert_eq!(config.server.connect_timeout_secs, 5);
    assert_eq!(config.server.paths.push, "/live/{id}");
    assert_eq!(config.server.paths.job, "/api/jobs/{id}");
    assert_eq!(config.channels.guard_window().as_millis(), 5000);
    assert_eq!(config.channels.poll_interval().as_millis(), 1000);
    assert_eq!(config.channels.keepalive().as_millis(), 500);
    assert_eq!(config.channels.event_buffer, 16);
    assert_eq!(config.defaults.max_items, 200);
    assert_eq!(config.logging.level, "revlens=debug");
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    match load_config(&path) {
        Err(ConfigError::ReadFile { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("unexpected result: {:?}", other.map(|c| c.server.base_url)),
    }
}

#[test]
fn test_monitor_from_loaded_config() {
    let file = write_config(".json", CONFIG_FILE_CASES[0].content);
    let config = load_config(file.path()).unwrap();

    let monitor = JobMonitor::from_config(&config).unwrap();
    assert!(monitor.jobs().is_empty());
}
