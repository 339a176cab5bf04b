//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. If `CIFORGE_GITLAB_URL` is set, configuration comes from the
//!    environment
//! 2. Otherwise the first config file found by [`probe_config_paths`] is used
//! 3. Otherwise built-in defaults apply
//!
//! The result is validated before it is returned.
//!
//! ## Environment Variables
//! - `CIFORGE_GITLAB_URL`: GitLab base URL (selects environment mode)
//! - `CIFORGE_SERVICE_NAME`: name used in failure messages
//! - `CIFORGE_REQUEST_TIMEOUT`: per-request timeout in seconds
//! - `CIFORGE_OPERATION_DEADLINE`: outer deadline per operation in seconds
//! - `CIFORGE_CB_FAILURE_THRESHOLD`: consecutive failures before opening
//! - `CIFORGE_CB_RECOVERY_TIMEOUT`: seconds before a probe is allowed
//! - `CIFORGE_CB_HALF_OPEN_MAX_CALLS`: probe budget while half-open
//! - `CIFORGE_RETRY_MAX_ATTEMPTS`: total attempts per call
//! - `CIFORGE_RETRY_BASE_DELAY_MS`: first backoff delay in milliseconds
//! - `CIFORGE_RETRY_MAX_DELAY_MS`: backoff cap in milliseconds
//! - `CIFORGE_LOG_LEVEL`: tracing filter directive
//! - `CIFORGE_LOG_JSON`: JSON log output (true/false)
//!
//! Unset optional variables keep their defaults.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./ciforge.toml`, `./ciforge.json`, `./config.toml`, `./config.json`
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ciforge_domain::{CiforgeError, Config, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["ciforge.toml", "ciforge.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `CiforgeError::Config` if the selected source is malformed or the
/// resulting configuration is invalid.
pub fn load() -> Result<Config> {
    let config = if std::env::var_os("CIFORGE_GITLAB_URL").is_some() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        config
    } else if let Some(path) = probe_config_paths() {
        load_from_file(Some(path))?
    } else {
        tracing::debug!("No configuration source found, using defaults");
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// `CIFORGE_GITLAB_URL` is required; every other variable is optional.
///
/// # Errors
/// Returns `CiforgeError::Config` if the URL is missing or a variable has an
/// invalid value.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.gitlab.base_url = env_var("CIFORGE_GITLAB_URL")?;
    if let Ok(name) = std::env::var("CIFORGE_SERVICE_NAME") {
        config.gitlab.service_name = Some(name);
    }
    config.gitlab.request_timeout_seconds =
        env_parse("CIFORGE_REQUEST_TIMEOUT", config.gitlab.request_timeout_seconds)?;
    config.gitlab.operation_deadline_seconds =
        env_parse("CIFORGE_OPERATION_DEADLINE", config.gitlab.operation_deadline_seconds)?;

    let breaker = &mut config.resilience.circuit_breaker;
    breaker.failure_threshold = env_parse("CIFORGE_CB_FAILURE_THRESHOLD", breaker.failure_threshold)?;
    breaker.recovery_timeout_seconds =
        env_parse("CIFORGE_CB_RECOVERY_TIMEOUT", breaker.recovery_timeout_seconds)?;
    breaker.half_open_max_calls =
        env_parse("CIFORGE_CB_HALF_OPEN_MAX_CALLS", breaker.half_open_max_calls)?;

    let retry = &mut config.resilience.retry;
    retry.max_attempts = env_parse("CIFORGE_RETRY_MAX_ATTEMPTS", retry.max_attempts)?;
    retry.base_delay_ms = env_parse("CIFORGE_RETRY_BASE_DELAY_MS", retry.base_delay_ms)?;
    retry.max_delay_ms = env_parse("CIFORGE_RETRY_MAX_DELAY_MS", retry.max_delay_ms)?;

    if let Ok(level) = std::env::var("CIFORGE_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("CIFORGE_LOG_JSON", config.logging.json);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Supports JSON and
/// TOML (detected by file extension). Missing fields take their defaults.
///
/// # Errors
/// Returns `CiforgeError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CiforgeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CiforgeError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CiforgeError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CiforgeError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CiforgeError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(CiforgeError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    // Try relative to executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    candidates(&dirs).into_iter().find(|path| path.exists())
}

fn candidates(dirs: &[PathBuf]) -> Vec<PathBuf> {
    dirs.iter().flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name))).collect()
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        CiforgeError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional environment variable, keeping `default` when unset
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CiforgeError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
