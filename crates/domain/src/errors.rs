//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for ciforge
///
/// Resilient remote calls do not use this type; they report failures as
/// `OperationOutcome` data. This covers configuration and input problems.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CiforgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Pipeline generation error: {0}")]
    Generation(String),
}

/// Result type alias for ciforge operations
pub type Result<T> = std::result::Result<T, CiforgeError>;
