//! Infrastructure error conversions

mod conversions;

pub use conversions::{check_response, status_failure, InfraError, InfraFailure};
