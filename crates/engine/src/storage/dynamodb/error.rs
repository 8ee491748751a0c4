//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to the `RemoteError` payload the engine classifies.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use dynamo_engine_core::RemoteError;

/// Map any operation's SDK error to a RemoteError.
///
/// Service errors keep their code and message. Everything else (dispatch,
/// timeout, response errors) becomes a transport error with the full error
/// chain as its message.
pub fn map_sdk_error<E, R>(err: SdkError<E, R>) -> RemoteError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    if let Some(service_error) = err.as_service_error() {
        if let Some(code) = service_error.code() {
            return RemoteError::new(code, service_error.message().unwrap_or(code));
        }
    }

    RemoteError::transport(DisplayErrorContext(&err).to_string())
}

/// Error for a response that lacks a field the engine needs.
pub fn missing_field(operation: &str, field: &str) -> RemoteError {
    RemoteError::transport(format!("{} response has no {}", operation, field))
}
