//! Outcome of the analysis workflow

use ciforge_common::error::OperationFailure;
use ciforge_domain::{AnalysisView, DegradedAnalysisResult, ProjectAnalysis};
use serde::Serialize;

/// What the workflow produced for one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AnalysisReport {
    /// The remote analysis succeeded
    Live(ProjectAnalysis),
    /// The remote analysis failed terminally; conventional defaults were used
    Degraded {
        analysis: DegradedAnalysisResult,
        /// Why the live analysis was abandoned
        failure: OperationFailure,
        /// Hint for doing the job by hand
        suggestion: String,
    },
}

impl AnalysisReport {
    pub fn view(&self) -> AnalysisView<'_> {
        match self {
            Self::Live(analysis) => AnalysisView::Live(analysis),
            Self::Degraded { analysis, .. } => AnalysisView::Degraded(analysis),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// The failure that forced degraded mode, if any
    pub fn failure(&self) -> Option<&OperationFailure> {
        match self {
            Self::Live(_) => None,
            Self::Degraded { failure, .. } => Some(failure),
        }
    }

    /// Message for the presentation layer: the failure followed by the
    /// manual-fallback suggestion
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Live(_) => None,
            Self::Degraded { failure, suggestion, .. } => {
                Some(format!("{}\n{}", failure.message, suggestion))
            }
        }
    }
}
