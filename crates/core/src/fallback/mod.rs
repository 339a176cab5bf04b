//! Graceful degradation when GitLab is unusable

pub mod coordinator;
pub mod provider;

pub use coordinator::FallbackCoordinator;
pub use provider::DegradedAnalysisProvider;
