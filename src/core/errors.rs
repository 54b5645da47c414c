// src/core/errors.rs

//! Defines the internal error types and the single translation point that turns
//! them into client-facing `ProtocolError`s.

use crate::core::protocol::{ErrorCode, ProtocolError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Message returned for any failure whose detail must not reach the client.
const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// Failures reported by a backend connection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The backend rejected the operation with a protocol error code.
    #[error("backend error {code}: {message}")]
    Reported { code: i32, message: String },

    /// The connection is no longer usable.
    #[error("backend connection lost: {0}")]
    ConnectionLost(String),

    /// The operation was aborted through its cancellation token.
    #[error("backend operation canceled")]
    Canceled,

    #[error("backend failure: {0}")]
    Other(String),
}

impl BackendError {
    /// True if the connection that produced this error must not be reused.
    ///
    /// A canceled operation leaves the backend session in an unknown state, so
    /// its connection is discarded as well.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BackendError::ConnectionLost(_) | BackendError::Canceled)
    }
}

/// The main error enum for everything that can go wrong while serving a request.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// A locally detected failure that already carries its protocol mapping.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// No pooled connection became available before the acquire timeout.
    #[error("connection pool exhausted after waiting {waited:?}")]
    PoolExhausted { waited: Duration },

    #[error("connection pool is closed")]
    PoolClosed,

    /// The request's cancellation token fired.
    #[error("operation canceled")]
    Canceled,

    #[error("malformed request: {0}")]
    Decode(String),

    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Shorthand for a locally detected validation failure.
    pub fn protocol(code: ErrorCode, message: impl Into<String>) -> Self {
        GatewayError::Protocol(ProtocolError::new(code, message))
    }

    /// Shorthand for a validation failure naming the offending argument.
    pub fn with_argument(
        code: ErrorCode,
        message: impl Into<String>,
        argument: impl Into<String>,
    ) -> Self {
        GatewayError::Protocol(ProtocolError::with_argument(code, message, argument))
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(e: std::io::Error) -> Self {
        GatewayError::Io(Arc::new(e))
    }
}

/// Maps any internal error to the protocol error sent to the client.
///
/// This function is total: errors outside the taxonomy become `InternalError`
/// with a generic message, and the raw detail is only logged.
pub fn translate(err: &GatewayError) -> ProtocolError {
    match err {
        GatewayError::Protocol(p) => p.clone(),
        GatewayError::Backend(BackendError::Reported { code, message }) => {
            match ErrorCode::from_code(*code) {
                Some(kind) => ProtocolError::new(kind, message.clone()),
                None => internal(err),
            }
        }
        GatewayError::Backend(BackendError::Canceled) | GatewayError::Canceled => {
            ProtocolError::new(ErrorCode::Interrupted, "operation was interrupted")
        }
        GatewayError::PoolExhausted { waited } => ProtocolError::new(
            ErrorCode::ExceededTimeLimit,
            format!(
                "no backend connection became available within {}ms, try again later",
                waited.as_millis()
            ),
        ),
        GatewayError::PoolClosed => ProtocolError::new(
            ErrorCode::ShutdownInProgress,
            "the gateway is shutting down",
        ),
        GatewayError::Decode(msg) => ProtocolError::new(ErrorCode::FailedToParse, msg.clone()),
        GatewayError::Backend(BackendError::ConnectionLost(_))
        | GatewayError::Backend(BackendError::Other(_))
        | GatewayError::Io(_)
        | GatewayError::Internal(_) => internal(err),
    }
}

fn internal(err: &GatewayError) -> ProtocolError {
    warn!("Translating unmapped error to InternalError: {}", err);
    ProtocolError::new(ErrorCode::InternalError, INTERNAL_ERROR_MESSAGE)
}

impl From<&GatewayError> for ProtocolError {
    fn from(err: &GatewayError) -> Self {
        translate(err)
    }
}
