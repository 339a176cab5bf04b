//! Analysis service - core business logic
//!
//! Runs the remote project analysis through the resilience facade and turns
//! every terminal failure into a degraded, still-usable result.

use std::sync::Arc;
use std::time::Duration;

use ciforge_common::error::OperationOutcome;
use ciforge_common::resilience::{Clock, ResilienceFacade, RetryPolicy, SystemClock};
use ciforge_domain::{ProjectType, Result};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::ports::{PipelineGenerator, ProjectAnalyzer};
use super::report::AnalysisReport;
use crate::fallback::FallbackCoordinator;

/// A rendered pipeline together with the analysis it came from
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedPipeline {
    pub content: String,
    pub report: AnalysisReport,
}

/// Analysis workflow for GitLab projects
pub struct AnalysisService<C: Clock = SystemClock> {
    analyzer: Arc<dyn ProjectAnalyzer>,
    generator: Arc<dyn PipelineGenerator>,
    facade: ResilienceFacade<C>,
    coordinator: FallbackCoordinator,
    policy: RetryPolicy,
    deadline: Option<Duration>,
}

impl<C: Clock> AnalysisService<C> {
    /// Create a new analysis service
    ///
    /// `facade` should wrap the process-wide breaker for the GitLab
    /// dependency; the service never creates breakers of its own.
    pub fn new(
        analyzer: Arc<dyn ProjectAnalyzer>,
        generator: Arc<dyn PipelineGenerator>,
        facade: ResilienceFacade<C>,
    ) -> Self {
        let coordinator = FallbackCoordinator::new(Arc::clone(&generator));
        Self {
            analyzer,
            generator,
            facade,
            coordinator,
            policy: RetryPolicy::default(),
            deadline: None,
        }
    }

    /// Retry policy for the analysis call site
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Outer deadline for one analysis, retries and backoff included
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn coordinator(&self) -> &FallbackCoordinator {
        &self.coordinator
    }

    /// Analyze `project_path`, degrading instead of failing
    ///
    /// `type_hint` selects the degraded profile if the live analysis fails.
    #[instrument(skip(self), fields(breaker = %self.facade.breaker().name()))]
    pub async fn analyze(&self, project_path: &str, type_hint: Option<ProjectType>) -> AnalysisReport {
        let analyzer = &*self.analyzer;
        let operation = move || analyzer.analyze(project_path);

        let outcome = match self.deadline {
            Some(deadline) => self.facade.try_execute_within(operation, &self.policy, deadline).await,
            None => self.facade.try_execute(operation, &self.policy).await,
        };

        match outcome {
            OperationOutcome::Success(analysis) => {
                info!(detected_type = %analysis.detected_type, "Live project analysis succeeded");
                AnalysisReport::Live(analysis)
            }
            OperationOutcome::Failure(failure) => {
                warn!(
                    kind = %failure.kind,
                    error = %failure.message,
                    "Live project analysis failed, using degraded analysis"
                );
                self.coordinator.recover(failure, type_hint)
            }
        }
    }

    /// Analyze `project_path` and render a pipeline from the result
    ///
    /// # Errors
    /// Only pipeline rendering can fail; analysis failures degrade.
    pub async fn generate_pipeline(
        &self,
        project_path: &str,
        type_hint: Option<ProjectType>,
    ) -> Result<GeneratedPipeline> {
        let report = self.analyze(project_path, type_hint).await;
        let content = match &report {
            AnalysisReport::Live(analysis) => self.generator.generate(analysis.into())?,
            AnalysisReport::Degraded { analysis, .. } => {
                self.coordinator.generate_fallback_pipeline(analysis.detected_type)?
            }
        };
        Ok(GeneratedPipeline { content, report })
    }
}
