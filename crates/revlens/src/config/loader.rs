use std::path::Path;

use crate::config::schema::MonitorConfig;
use crate::error::ConfigError;

/// Loads a configuration file; `.yaml`/`.yml` files are parsed as YAML,
/// anything else as JSON.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MonitorConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        load_config_from_yaml(&content)
    } else {
        load_config_from_str(&content)
    }
}

pub fn load_config_from_str(content: &str) -> Result<MonitorConfig, ConfigError> {
    let config: MonitorConfig = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn load_config_from_yaml(content: &str) -> Result<MonitorConfig, ConfigError> {
    let config: MonitorConfig = serde_yaml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &MonitorConfig) -> Result<(), ConfigError> {
    let base_url = config.server.base_url.trim();
    match reqwest::Url::parse(base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => {
            return Err(invalid(format!(
                "server.baseUrl must use http or https, got '{}'",
                url.scheme()
            )))
        }
        Err(e) => {
            return Err(invalid(format!(
                "server.baseUrl '{}' is not a valid URL: {}",
                base_url, e
            )))
        }
    }

    if config.server.connect_timeout_secs == 0 || config.server.request_timeout_secs == 0 {
        return Err(invalid("server timeouts must be greater than zero".to_string()));
    }

    let paths = &config.server.paths;
    for (name, template, placeholder) in [
        ("job", &paths.job, Some("{id}")),
        ("push", &paths.push, Some("{id}")),
        ("download", &paths.download, Some("{report}")),
        ("submitUrls", &paths.submit_urls, None),
        ("submitUpload", &paths.submit_upload, None),
    ] {
        if !template.starts_with('/') {
            return Err(invalid(format!(
                "server.paths.{} must start with '/': {}",
                name, template
            )));
        }
        if let Some(placeholder) = placeholder {
            if !template.contains(placeholder) {
                return Err(invalid(format!(
                    "server.paths.{} must contain '{}': {}",
                    name, placeholder, template
                )));
            }
        }
    }

    let channels = &config.channels;
    if channels.guard_window_ms == 0 {
        return Err(invalid("channels.guardWindowMs must be greater than zero".to_string()));
    }
    if channels.poll_interval_ms == 0 {
        return Err(invalid("channels.pollIntervalMs must be greater than zero".to_string()));
    }
    if channels.keepalive_ms == 0 {
        return Err(invalid("channels.keepaliveMs must be greater than zero".to_string()));
    }
    if channels.event_buffer == 0 {
        return Err(invalid("channels.eventBuffer must be greater than zero".to_string()));
    }

    config.defaults.validate().map_err(|e| invalid(format!("defaults: {}", e)))?;

    Ok(())
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Validation { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config =
            load_config_from_str(r#"{"server":{"baseUrl":"http://localhost:8000"}}"#).unwrap();
        assert_eq!(config.server.connect_timeout_secs, 10);
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.server.paths.job, "/api/jobs/{id}");
        assert_eq!(config.server.paths.push, "/ws/{id}");
        assert_eq!(config.channels.guard_window_ms, 3000);
        assert_eq!(config.channels.poll_interval_ms, 2000);
        assert_eq!(config.channels.keepalive_ms, 10_000);
        assert_eq!(config.defaults.max_items, 500);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let err = load_config_from_str(r#"{"server":{"baseUrl":"localhost"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));

        let err = load_config_from_str(r#"{"server":{"baseUrl":"ws://localhost"}}"#).unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_rejects_path_without_placeholder() {
        let json = r#"{
            "server": {
                "baseUrl": "http://localhost",
                "paths": { "job": "/api/jobs" }
            }
        }"#;
        let err = load_config_from_str(json).unwrap_err();
        assert!(err.to_string().contains("server.paths.job"));
    }

    #[test]
    fn test_rejects_zero_intervals() {
        let json = r#"{
            "server": { "baseUrl": "http://localhost" },
            "channels": { "pollIntervalMs": 0 }
        }"#;
        let err = load_config_from_str(json).unwrap_err();
        assert!(err.to_string().contains("pollIntervalMs"));
    }

    #[test]
    fn test_yaml_config() {
        let yaml = r#"
server:
  baseUrl: https://analyzer.internal
channels:
  guardWindowMs: 1500
logging:
  format: json
"#;
        let config = load_config_from_yaml(yaml).unwrap();
        assert_eq!(config.server.base_url, "https://analyzer.internal");
        assert_eq!(config.channels.guard_window_ms, 1500);
        assert_eq!(config.logging.format, LogFormat::Json);
    }
}
