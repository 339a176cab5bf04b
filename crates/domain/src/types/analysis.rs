//! Analysis results consumed by pipeline generation

use serde::{Deserialize, Serialize};

use super::project::{Confidence, ProjectType};

/// Result of a live analysis of a remote GitLab project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    pub detected_type: ProjectType,
    pub framework_name: String,
    pub build_commands: Vec<String>,
    pub test_commands: Vec<String>,
    pub confidence: Confidence,
}

/// Minimal analysis computed locally when the live analysis is unavailable
///
/// Built from a static table keyed by project type. `confidence` is always
/// [`Confidence::Low`] and `warnings` always explains that degraded mode was
/// used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedAnalysisResult {
    pub detected_type: ProjectType,
    pub framework_name: String,
    pub build_commands: Vec<String>,
    pub test_commands: Vec<String>,
    pub confidence: Confidence,
    pub warnings: Vec<String>,
    /// Default CI image for the ecosystem
    pub docker_image: String,
    /// Conventional dependency cache locations
    pub cache_paths: Vec<String>,
}

/// The inputs pipeline generation needs, whichever path produced them
///
/// Lets a generator accept both live and degraded results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisView<'a> {
    Live(&'a ProjectAnalysis),
    Degraded(&'a DegradedAnalysisResult),
}

impl AnalysisView<'_> {
    pub fn project_type(&self) -> ProjectType {
        match self {
            Self::Live(a) => a.detected_type,
            Self::Degraded(a) => a.detected_type,
        }
    }

    pub fn build_commands(&self) -> &[String] {
        match self {
            Self::Live(a) => &a.build_commands,
            Self::Degraded(a) => &a.build_commands,
        }
    }

    pub fn test_commands(&self) -> &[String] {
        match self {
            Self::Live(a) => &a.test_commands,
            Self::Degraded(a) => &a.test_commands,
        }
    }

    pub fn confidence(&self) -> Confidence {
        match self {
            Self::Live(a) => a.confidence,
            Self::Degraded(a) => a.confidence,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

impl<'a> From<&'a ProjectAnalysis> for AnalysisView<'a> {
    fn from(analysis: &'a ProjectAnalysis) -> Self {
        Self::Live(analysis)
    }
}

impl<'a> From<&'a DegradedAnalysisResult> for AnalysisView<'a> {
    fn from(analysis: &'a DegradedAnalysisResult) -> Self {
        Self::Degraded(analysis)
    }
}
