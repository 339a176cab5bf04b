//! Fallback coordinator
//!
//! Invoked by the workflow whenever a resilient call ends in a terminal
//! failure, `CircuitOpen` included. Manual operation is always available;
//! it does not depend on the remote side in any way.

use std::sync::Arc;

use ciforge_common::error::OperationFailure;
use ciforge_domain::{AnalysisView, DegradedAnalysisResult, ProjectType, Result};
use tracing::{debug, info};

use super::provider::DegradedAnalysisProvider;
use crate::analysis::ports::PipelineGenerator;
use crate::analysis::report::AnalysisReport;

/// Routes terminal failures to degraded analysis and pipeline generation
#[derive(Clone)]
pub struct FallbackCoordinator {
    provider: DegradedAnalysisProvider,
    generator: Arc<dyn PipelineGenerator>,
}

impl FallbackCoordinator {
    /// Create a coordinator that renders fallback pipelines with `generator`
    pub fn new(generator: Arc<dyn PipelineGenerator>) -> Self {
        Self { provider: DegradedAnalysisProvider::new(), generator }
    }

    /// Whether manual/degraded operation is possible. Always true.
    pub fn can_fallback_to_manual_mode(&self) -> bool {
        true
    }

    pub fn degraded_analysis(&self, project_type: ProjectType) -> DegradedAnalysisResult {
        self.provider.basic_analysis(project_type)
    }

    /// Produce a minimal pipeline from the degraded analysis
    pub fn generate_fallback_pipeline(&self, project_type: ProjectType) -> Result<String> {
        let analysis = self.degraded_analysis(project_type);
        info!(%project_type, "Generating fallback pipeline from degraded analysis");
        self.generator.generate(AnalysisView::Degraded(&analysis))
    }

    /// Hint shown next to a terminal failure
    pub fn fallback_suggestion(&self, project_type: Option<ProjectType>) -> String {
        match project_type {
            Some(project_type) => format!(
                "You can still generate a pipeline manually with --type {project_type}"
            ),
            None => "You can still generate a pipeline manually with --type <type> (e.g. \
                     --type node)"
                .to_string(),
        }
    }

    /// Package a terminal failure into a degraded report
    ///
    /// Without a type hint the generic profile is used.
    pub fn recover(&self, failure: OperationFailure, type_hint: Option<ProjectType>) -> AnalysisReport {
        let project_type = type_hint.unwrap_or(ProjectType::Generic);
        debug!(kind = %failure.kind, %project_type, "Falling back to degraded analysis");

        AnalysisReport::Degraded {
            analysis: self.degraded_analysis(project_type),
            suggestion: self.fallback_suggestion(type_hint),
            failure,
        }
    }
}

impl std::fmt::Debug for FallbackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackCoordinator").field("provider", &self.provider).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use ciforge_common::error::ErrorKind;
    use ciforge_domain::{CiforgeError, Confidence};

    use super::*;

    #[derive(Default)]
    struct RecordingGenerator {
        seen: Mutex<Vec<(ProjectType, bool)>>,
    }

    impl PipelineGenerator for RecordingGenerator {
        fn generate(&self, analysis: AnalysisView<'_>) -> Result<String> {
            self.seen.lock().unwrap().push((analysis.project_type(), analysis.is_degraded()));
            Ok(format!("test:\n  script:\n    - {}\n", analysis.test_commands().join(" && ")))
        }
    }

    struct FailingGenerator;

    impl PipelineGenerator for FailingGenerator {
        fn generate(&self, _analysis: AnalysisView<'_>) -> Result<String> {
            Err(CiforgeError::Generation("template missing".to_string()))
        }
    }

    #[test]
    fn test_manual_mode_always_available() {
        let coordinator = FallbackCoordinator::new(Arc::new(FailingGenerator));
        assert!(coordinator.can_fallback_to_manual_mode());
    }

    #[test]
    fn test_degraded_analysis_delegates_to_provider() {
        let coordinator = FallbackCoordinator::new(Arc::new(FailingGenerator));
        let analysis = coordinator.degraded_analysis(ProjectType::Rust);
        assert_eq!(analysis, DegradedAnalysisProvider::new().basic_analysis(ProjectType::Rust));
        assert_eq!(analysis.confidence, Confidence::Low);
    }

    #[test]
    fn test_fallback_pipeline_uses_degraded_analysis() {
        let generator = Arc::new(RecordingGenerator::default());
        let coordinator = FallbackCoordinator::new(generator.clone());

        let pipeline = coordinator.generate_fallback_pipeline(ProjectType::Go).unwrap();

        assert!(pipeline.contains("go test ./..."));
        assert_eq!(*generator.seen.lock().unwrap(), vec![(ProjectType::Go, true)]);
    }

    #[test]
    fn test_generator_errors_propagate() {
        let coordinator = FallbackCoordinator::new(Arc::new(FailingGenerator));
        assert!(matches!(
            coordinator.generate_fallback_pipeline(ProjectType::Node),
            Err(CiforgeError::Generation(_))
        ));
    }

    #[test]
    fn test_suggestion_names_the_type_flag() {
        let coordinator = FallbackCoordinator::new(Arc::new(FailingGenerator));
        assert!(coordinator.fallback_suggestion(Some(ProjectType::Python)).contains("--type python"));
        assert!(coordinator.fallback_suggestion(None).contains("--type"));
    }

    #[test]
    fn test_recover_without_hint_uses_generic_profile() {
        let coordinator = FallbackCoordinator::new(Arc::new(FailingGenerator));
        let failure = OperationFailure::new(ErrorKind::CircuitOpen, "GitLab is temporarily unavailable");

        let report = coordinator.recover(failure, None);

        assert!(report.is_degraded());
        assert_eq!(report.view().project_type(), ProjectType::Generic);
        assert_eq!(report.failure().map(|f| f.kind), Some(ErrorKind::CircuitOpen));
        let message = report.user_message().unwrap();
        assert!(message.starts_with("GitLab is temporarily unavailable"));
        assert!(message.contains("--type"));
    }
}
