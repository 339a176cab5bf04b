//! Conversions from external infrastructure errors into resilience and
//! domain errors.
//!
//! Transport failures become [`RawFailure`] signals; the translator in
//! `ciforge-common` decides what they mean.

use std::time::Duration;

use ciforge_common::resilience::{ConfigError, RawFailure};
use ciforge_domain::CiforgeError;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Error as HttpError, Response, StatusCode};

/// Raw failure newtype that keeps transport conversions on the
/// infrastructure side.
#[derive(Debug)]
pub struct InfraFailure(pub RawFailure);

impl From<InfraFailure> for RawFailure {
    fn from(value: InfraFailure) -> Self {
        value.0
    }
}

/// Error newtype for domain errors raised while wiring infrastructure.
#[derive(Debug)]
pub struct InfraError(pub CiforgeError);

impl From<InfraError> for CiforgeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CiforgeError> for InfraError {
    fn from(value: CiforgeError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoRawFailure {
    fn into_raw_failure(self) -> RawFailure;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → RawFailure */
/* -------------------------------------------------------------------------- */

impl IntoRawFailure for HttpError {
    fn into_raw_failure(self) -> RawFailure {
        if self.is_timeout() {
            return RawFailure::Timeout(Duration::ZERO);
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            let detail = error_chain(&self);
            return if looks_like_dns(&detail) {
                RawFailure::Dns(detail)
            } else {
                RawFailure::Connect(detail)
            };
        }

        if let Some(status) = self.status() {
            return RawFailure::status(status.as_u16());
        }

        RawFailure::Other(error_chain(&self))
    }
}

impl From<HttpError> for InfraFailure {
    fn from(value: HttpError) -> Self {
        InfraFailure(value.into_raw_failure())
    }
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn looks_like_dns(detail: &str) -> bool {
    let lower = detail.to_ascii_lowercase();
    lower.contains("dns error")
        || lower.contains("failed to lookup address")
        || lower.contains("name or service not known")
}

/* -------------------------------------------------------------------------- */
/* HTTP responses → RawFailure */
/* -------------------------------------------------------------------------- */

/// Failure signal for a non-success status, `None` for 2xx/3xx.
///
/// Only the delta-seconds form of `Retry-After` is understood; an HTTP-date
/// leaves the hint empty and the backoff schedule applies.
pub fn status_failure(status: StatusCode, headers: &HeaderMap) -> Option<RawFailure> {
    if !(status.is_client_error() || status.is_server_error()) {
        return None;
    }

    let retry_after = headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    Some(RawFailure::Status { code: status.as_u16(), retry_after })
}

/// Pass successful responses through, turn error statuses into failures
pub fn check_response(response: Response) -> Result<Response, RawFailure> {
    match status_failure(response.status(), response.headers()) {
        Some(failure) => Err(failure),
        None => Ok(response),
    }
}

/* -------------------------------------------------------------------------- */
/* ConfigError → CiforgeError */
/* -------------------------------------------------------------------------- */

impl From<ConfigError> for InfraError {
    fn from(value: ConfigError) -> Self {
        InfraError(CiforgeError::Config(value.to_string()))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;
    use reqwest::Client;
    use tokio::runtime::Runtime;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn http_status_error_maps_to_status_failure() {
        Runtime::new().unwrap().block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
                .mount(&server)
                .await;

            let client = Client::builder().no_proxy().build().unwrap();
            let error =
                client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

            let mapped: RawFailure = InfraFailure::from(error).into();
            assert_eq!(mapped, RawFailure::status(401));
        });
    }

    #[test]
    fn refused_connection_maps_to_connect_failure() {
        Runtime::new().unwrap().block_on(async {
            // Bind then drop to get a port nobody listens on.
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            let address = listener.local_addr().unwrap();
            drop(listener);

            let client = Client::builder().no_proxy().build().unwrap();
            let error = client.get(format!("http://{address}")).send().await.unwrap_err();

            let mapped: RawFailure = InfraFailure::from(error).into();
            assert!(matches!(mapped, RawFailure::Connect(_)), "got {mapped:?}");
        });
    }

    #[test]
    fn slow_response_maps_to_timeout() {
        Runtime::new().unwrap().block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
                .mount(&server)
                .await;

            let client =
                Client::builder().no_proxy().timeout(Duration::from_millis(50)).build().unwrap();
            let error = client.get(server.uri()).send().await.unwrap_err();

            let mapped: RawFailure = InfraFailure::from(error).into();
            assert!(matches!(mapped, RawFailure::Timeout(_)));
        });
    }

    #[test]
    fn retry_after_seconds_become_a_hint() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));

        let failure = status_failure(StatusCode::TOO_MANY_REQUESTS, &headers);

        assert_eq!(
            failure,
            Some(RawFailure::Status { code: 429, retry_after: Some(Duration::from_secs(7)) })
        );
    }

    #[test]
    fn retry_after_http_date_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));

        let failure = status_failure(StatusCode::SERVICE_UNAVAILABLE, &headers);

        assert_eq!(failure, Some(RawFailure::status(503)));
    }

    #[test]
    fn success_and_redirect_statuses_pass() {
        let headers = HeaderMap::new();
        assert_eq!(status_failure(StatusCode::OK, &headers), None);
        assert_eq!(status_failure(StatusCode::NOT_MODIFIED, &headers), None);
    }

    #[test]
    fn dns_detection_looks_at_the_error_chain() {
        assert!(looks_like_dns("error sending request: dns error: failed to lookup address"));
        assert!(!looks_like_dns("tcp connect error: Connection refused"));
    }

    #[test]
    fn config_error_maps_to_config_variant() {
        let err = ConfigError::Invalid { message: "failure_threshold must be > 0".to_string() };
        let mapped: CiforgeError = InfraError::from(err).into();
        assert!(matches!(mapped, CiforgeError::Config(msg) if msg.contains("failure_threshold")));
    }
}
