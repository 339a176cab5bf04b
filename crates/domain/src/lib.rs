//! # ciforge Domain
//!
//! Business domain types and models for ciforge.
//!
//! This crate contains:
//! - Project classification (`ProjectType`, `Confidence`)
//! - Live and degraded analysis records
//! - Domain error types and Result definitions
//! - Configuration structures and their defaults
//!
//! ## Architecture
//! - No dependencies on other ciforge crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
