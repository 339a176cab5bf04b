//! # Ciforge Infrastructure
//!
//! Infrastructure around the resilient GitLab access layer.
//!
//! This crate contains:
//! - Configuration loading (environment, TOML, JSON)
//! - Tracing subscriber bootstrap
//! - `reqwest` failure conversions
//! - GitLab breaker and facade wiring
//!
//! ## Architecture
//! - Builds the shared resilience objects defined in `ciforge-common`
//! - Depends on `ciforge-domain` and `ciforge-core`
//! - Contains all "impure" code (I/O, environment, network)

pub mod config;
pub mod errors;
pub mod gitlab;
pub mod observability;

// Re-export commonly used items
pub use errors::{check_response, status_failure, InfraError, InfraFailure};
pub use gitlab::{breaker_config, retry_policy, send_checked, GitLabAccess};
pub use observability::init_tracing;
