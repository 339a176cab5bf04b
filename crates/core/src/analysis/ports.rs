//! Port interfaces for project analysis
//!
//! These traits define the boundaries between the analysis workflow and the
//! collaborators that talk to GitLab or render pipelines.

use async_trait::async_trait;
use ciforge_common::resilience::RawFailure;
use ciforge_domain::{AnalysisView, ProjectAnalysis, Result};

/// Live analysis of a remote GitLab project
///
/// Implementations perform the remote calls and report failures as a
/// [`RawFailure`] so the resilience layer can classify them. They must be
/// safe to call more than once for the same project.
#[async_trait]
pub trait ProjectAnalyzer: Send + Sync {
    /// Analyze the project at `project_path` (e.g. `group/project`)
    async fn analyze(&self, project_path: &str) -> std::result::Result<ProjectAnalysis, RawFailure>;
}

/// Renders a CI/CD pipeline definition from an analysis
pub trait PipelineGenerator: Send + Sync {
    /// Produce the pipeline document for `analysis`
    fn generate(&self, analysis: AnalysisView<'_>) -> Result<String>;
}
