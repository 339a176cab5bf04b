//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! turning it into GitLab resilience wiring.

use std::io::Write;
use std::time::Duration;

use ciforge_infra::{config, GitLabAccess};
use tempfile::{Builder, NamedTempFile};

fn config_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write to temp file");
    file
}

#[test]
fn test_load_config_from_json_file() {
    let json_content = r#"{
        "gitlab": {
            "base_url": "https://gitlab.example.com",
            "service_name": "Example GitLab",
            "request_timeout_seconds": 10
        },
        "resilience": {
            "circuit_breaker": {
                "failure_threshold": 3,
                "recovery_timeout_seconds": 30,
                "half_open_max_calls": 1
            },
            "retry": {
                "max_attempts": 4,
                "base_delay_ms": 250,
                "max_delay_ms": 2000
            }
        },
        "logging": {
            "level": "debug",
            "json": true
        }
    }"#;
    let file = config_file(".json", json_content);

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from JSON file");

    assert_eq!(config.gitlab.base_url, "https://gitlab.example.com");
    assert_eq!(config.gitlab.service_name.as_deref(), Some("Example GitLab"));
    assert_eq!(config.gitlab.request_timeout(), Duration::from_secs(10));
    assert_eq!(config.gitlab.operation_deadline_seconds, 120);

    assert_eq!(config.resilience.circuit_breaker.failure_threshold, 3);
    assert_eq!(config.resilience.circuit_breaker.recovery_timeout(), Duration::from_secs(30));
    assert_eq!(config.resilience.circuit_breaker.half_open_max_calls, 1);

    assert_eq!(config.resilience.retry.max_attempts, 4);
    assert_eq!(config.resilience.retry.base_delay(), Duration::from_millis(250));

    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
}

#[test]
fn test_load_config_from_toml_file() {
    let toml_content = r#"
        [gitlab]
        base_url = "https://gitlab.internal"

        [resilience.circuit_breaker]
        failure_threshold = 2

        [resilience.retry]
        max_attempts = 1
    "#;
    let file = config_file(".toml", toml_content);

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from TOML file");

    assert_eq!(config.gitlab.base_url, "https://gitlab.internal");
    assert_eq!(config.resilience.circuit_breaker.failure_threshold, 2);
    // Unset fields keep their defaults
    assert_eq!(config.resilience.circuit_breaker.half_open_max_calls, 2);
    assert_eq!(config.resilience.retry.max_attempts, 1);
    assert_eq!(config.resilience.retry.max_delay_ms, 5_000);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_invalid_toml_is_rejected() {
    let file = config_file(".toml", "[resilience.retry\nmax_attempts = ");

    let result = config::load_from_file(Some(file.path().to_path_buf()));

    let err = result.expect_err("malformed TOML should fail");
    assert!(err.to_string().contains("Invalid TOML"));
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let file = config_file(".yaml", "gitlab:\n  base_url: https://gitlab.com\n");

    let result = config::load_from_file(Some(file.path().to_path_buf()));

    assert!(result.is_err());
}

#[test]
fn test_loaded_file_builds_gitlab_access() {
    let file = config_file(
        ".toml",
        "[gitlab]\nservice_name = \"Acme GitLab\"\noperation_deadline_seconds = 45\n\n\
         [resilience.circuit_breaker]\nfailure_threshold = 7\n",
    );

    let config = config::load_from_file(Some(file.path().to_path_buf())).expect("config loads");
    let access = GitLabAccess::from_config(&config).expect("access builds");

    assert_eq!(access.breaker().name(), "Acme GitLab");
    assert_eq!(access.breaker().config().failure_threshold, 7);
    assert_eq!(access.deadline(), Duration::from_secs(45));
    assert_eq!(access.policy().max_attempts(), 3);
}

#[test]
fn test_invalid_settings_fail_at_wiring() {
    let file = config_file(".json", r#"{"resilience": {"retry": {"max_attempts": 0}}}"#);

    let config = config::load_from_file(Some(file.path().to_path_buf())).expect("parses");

    assert!(config.validate().is_err());
    assert!(GitLabAccess::from_config(&config).is_err());
}
