//! GitLab access wiring
//!
//! Builds the process-lifetime circuit breaker and resilience facade for the
//! GitLab dependency from [`Config`]. Construct one [`GitLabAccess`] at
//! startup and hand clones of its facade to every caller; all GitLab calls
//! must share the same breaker.

use std::sync::Arc;
use std::time::Duration;

use ciforge_common::resilience::{
    CircuitBreaker, CircuitBreakerConfig, ErrorTranslator, RawFailure, ResilienceFacade,
    RetryPolicy,
};
use ciforge_core::{AnalysisService, PipelineGenerator, ProjectAnalyzer};
use ciforge_domain::{CircuitBreakerSettings, CiforgeError, Config, Result, RetrySettings};
use reqwest::{Client, RequestBuilder, Response};
use tracing::info;
use url::Url;

use crate::errors::{check_response, InfraError, InfraFailure};

const USER_AGENT: &str = concat!("ciforge/", env!("CARGO_PKG_VERSION"));

/// Convert breaker settings, validating them
///
/// # Errors
/// Returns `CiforgeError::Config` for a zero threshold or probe budget.
pub fn breaker_config(settings: &CircuitBreakerSettings) -> Result<CircuitBreakerConfig> {
    CircuitBreakerConfig::builder()
        .failure_threshold(settings.failure_threshold)
        .recovery_timeout(settings.recovery_timeout())
        .half_open_max_calls(settings.half_open_max_calls)
        .build()
        .map_err(|e| InfraError::from(e).into())
}

/// Convert retry settings, validating them
///
/// # Errors
/// Returns `CiforgeError::Config` for zero attempts or a cap below the base
/// delay.
pub fn retry_policy(settings: &RetrySettings) -> Result<RetryPolicy> {
    RetryPolicy::builder()
        .max_attempts(settings.max_attempts)
        .base_delay(settings.base_delay())
        .max_delay(settings.max_delay())
        .build()
        .map_err(|e| InfraError::from(e).into())
}

/// Send a request once and classify the result
///
/// Transport errors and non-success statuses both come back as
/// [`RawFailure`], ready for the resilience facade.
pub async fn send_checked(request: RequestBuilder) -> std::result::Result<Response, RawFailure> {
    let response = request.send().await.map_err(|e| RawFailure::from(InfraFailure::from(e)))?;
    check_response(response)
}

/// Shared resilience wiring for one GitLab instance
#[derive(Debug, Clone)]
pub struct GitLabAccess {
    base_url: Url,
    facade: ResilienceFacade,
    policy: RetryPolicy,
    request_timeout: Duration,
    deadline: Duration,
}

impl GitLabAccess {
    /// Build the breaker, facade and default policy for `config`
    ///
    /// # Errors
    /// Returns `CiforgeError::Config` if the base URL or any resilience
    /// setting is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.gitlab.base_url).map_err(|e| {
            CiforgeError::Config(format!("Invalid GitLab URL '{}': {}", config.gitlab.base_url, e))
        })?;

        let breaker_config = breaker_config(&config.resilience.circuit_breaker)?;
        let policy = retry_policy(&config.resilience.retry)?;

        let translator = config
            .gitlab
            .service_name
            .clone()
            .map_or_else(ErrorTranslator::default, ErrorTranslator::new);
        let breaker = CircuitBreaker::new(translator.service(), breaker_config)
            .map_err(|e| CiforgeError::from(InfraError::from(e)))?;
        let facade = ResilienceFacade::new(Arc::new(breaker)).with_translator(translator);

        info!(
            url = %base_url,
            failure_threshold = config.resilience.circuit_breaker.failure_threshold,
            max_attempts = policy.max_attempts(),
            "GitLab access configured"
        );

        Ok(Self {
            base_url,
            facade,
            policy,
            request_timeout: config.gitlab.request_timeout(),
            deadline: config.gitlab.operation_deadline(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The facade around the shared GitLab breaker
    pub fn facade(&self) -> &ResilienceFacade {
        &self.facade
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        self.facade.breaker()
    }

    /// Default retry policy for GitLab call sites
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Outer deadline for one resilient operation
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// HTTP client with the configured per-request timeout
    ///
    /// # Errors
    /// Returns `CiforgeError::Config` if the TLS backend cannot be
    /// initialized.
    pub fn http_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CiforgeError::Config(format!("Failed to build HTTP client: {}", e)))
    }

    /// Analysis workflow bound to this instance's breaker, policy and deadline
    pub fn analysis_service(
        &self,
        analyzer: Arc<dyn ProjectAnalyzer>,
        generator: Arc<dyn PipelineGenerator>,
    ) -> AnalysisService {
        AnalysisService::new(analyzer, generator, self.facade.clone())
            .with_policy(self.policy.clone())
            .with_deadline(self.deadline)
    }
}

#[cfg(test)]
mod tests {
    use ciforge_common::resilience::CircuitState;

    use super::*;

    #[test]
    fn test_from_default_config() {
        let access = GitLabAccess::from_config(&Config::default()).unwrap();

        assert_eq!(access.base_url().as_str(), "https://gitlab.com/");
        assert_eq!(access.breaker().name(), "GitLab");
        assert_eq!(access.breaker().state(), CircuitState::Closed);
        assert_eq!(access.breaker().config().failure_threshold, 5);
        assert_eq!(access.policy().max_attempts(), 3);
        assert_eq!(access.policy().base_delay(), Duration::from_secs(1));
        assert_eq!(access.deadline(), Duration::from_secs(120));
        assert_eq!(access.facade().translator().service(), "GitLab");
    }

    #[test]
    fn test_configured_service_name_names_breaker_and_messages() {
        let mut config = Config::default();
        config.gitlab.service_name = Some("Acme GitLab".to_string());

        let access = GitLabAccess::from_config(&config).unwrap();

        assert_eq!(access.breaker().name(), "Acme GitLab");
        assert_eq!(access.facade().translator().service(), "Acme GitLab");
    }

    #[test]
    fn test_clones_share_one_breaker() {
        let access = GitLabAccess::from_config(&Config::default()).unwrap();
        let other = access.clone();
        assert!(Arc::ptr_eq(access.breaker(), other.breaker()));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let mut config = Config::default();
        config.gitlab.base_url = "not a url".to_string();
        let err = GitLabAccess::from_config(&config).unwrap_err();
        assert!(matches!(err, CiforgeError::Config(msg) if msg.contains("not a url")));
    }

    #[test]
    fn test_settings_are_validated() {
        let settings = CircuitBreakerSettings { failure_threshold: 0, ..Default::default() };
        assert!(matches!(breaker_config(&settings), Err(CiforgeError::Config(_))));

        let settings = RetrySettings { max_attempts: 3, base_delay_ms: 5_000, max_delay_ms: 1_000 };
        assert!(matches!(retry_policy(&settings), Err(CiforgeError::Config(_))));
    }

    #[test]
    fn test_http_client_builds() {
        let access = GitLabAccess::from_config(&Config::default()).unwrap();
        assert!(access.http_client().is_ok());
    }
}
