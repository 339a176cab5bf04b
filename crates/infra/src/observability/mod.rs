//! Logging bootstrap
//!
//! Installs the global `tracing` subscriber from [`LoggingConfig`]. The
//! `RUST_LOG` environment variable, when set, overrides the configured level.

use ciforge_domain::{CiforgeError, LoggingConfig, Result};
use tracing_subscriber::EnvFilter;

/// Build the filter for `config`, preferring `RUST_LOG` when present
///
/// # Errors
/// Returns `CiforgeError::Config` if the configured level is not a valid
/// filter directive.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            CiforgeError::Config(format!("Invalid log level '{}': {}", config.level, e))
        }),
    }
}

/// Install the global subscriber
///
/// Returns `Ok(false)` if a subscriber was already installed; calling this
/// more than once is harmless.
///
/// # Errors
/// Returns `CiforgeError::Config` if the log level is invalid.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = env_filter(config)?;

    let installed = if config.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().try_init().is_ok()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok()
    };

    if installed {
        tracing::debug!(level = %config.level, json = config.json, "Tracing initialized");
    }
    Ok(installed)
}
