//! Domain types and models

pub mod analysis;
pub mod project;

pub use analysis::{AnalysisView, DegradedAnalysisResult, ProjectAnalysis};
pub use project::{Confidence, ProjectType};
