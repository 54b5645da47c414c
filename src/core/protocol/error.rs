// src/core/protocol/error.rs

//! The closed taxonomy of protocol error codes and the `ProtocolError` value
//! that is sent back to clients in place of a success response.

use super::document::Document;
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, IntoStaticStr};
use thiserror::Error;

/// Every error code the gateway may surface to a client.
///
/// Numeric values are fixed by the wire protocol; clients match on the
/// `(code, codeName)` pair, so adding a variant is a protocol change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[repr(i32)]
pub enum ErrorCode {
    InternalError = 1,
    BadValue = 2,
    FailedToParse = 9,
    Unauthorized = 13,
    TypeMismatch = 14,
    AuthenticationFailed = 18,
    NamespaceNotFound = 26,
    NamespaceExists = 48,
    ExceededTimeLimit = 50,
    CommandNotFound = 59,
    InvalidNamespace = 73,
    ShutdownInProgress = 91,
    TooManyLogicalSessions = 261,
    Interrupted = 11601,
    #[strum(serialize = "Location40414")]
    MissingField = 40414,
}

impl ErrorCode {
    /// The numeric wire code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// The symbolic name paired with `code()`.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Looks up a taxonomy entry by its numeric code.
    pub fn from_code(code: i32) -> Option<Self> {
        ErrorCode::iter().find(|c| c.code() == code)
    }
}

/// A structured failure that is returned to the client instead of a response.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("({}) {message}", .code.name())]
pub struct ProtocolError {
    code: ErrorCode,
    message: String,
    argument: Option<String>,
}

impl ProtocolError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            argument: None,
        }
    }

    /// Builds an error for a locally detected validation failure, recording
    /// which argument was at fault.
    pub fn with_argument(
        code: ErrorCode,
        message: impl Into<String>,
        argument: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            argument: Some(argument.into()),
        }
    }

    pub fn kind(&self) -> ErrorCode {
        self.code
    }

    pub fn code(&self) -> i32 {
        self.code.code()
    }

    pub fn code_name(&self) -> &'static str {
        self.code.name()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Renders the wire-level error document.
    pub fn to_document(&self) -> Document {
        Document::new()
            .with("ok", 0.0)
            .with("errmsg", self.message.clone())
            .with("code", self.code())
            .with("codeName", self.code_name())
    }
}
