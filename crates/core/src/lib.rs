//! # ciforge Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The analysis workflow and its ports (traits)
//! - Graceful degradation: fallback coordination and degraded analysis
//!
//! ## Architecture Principles
//! - Only depends on `ciforge-common` and `ciforge-domain`
//! - No HTTP or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod analysis;
pub mod fallback;

// Re-export specific items to avoid ambiguity
pub use analysis::ports::{PipelineGenerator, ProjectAnalyzer};
pub use analysis::{AnalysisReport, AnalysisService, GeneratedPipeline};
pub use fallback::{DegradedAnalysisProvider, FallbackCoordinator};
