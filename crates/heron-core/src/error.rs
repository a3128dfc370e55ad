//! Error types for the binding and dispatch pipeline.
//!
//! Every failure between "request arrived" and "handler returned" is a
//! [`DispatchError`]. Errors are handed untranslated to the
//! [`Responder`](crate::Responder), which picks the status code through
//! [`DispatchError::status_code`].
//!
//! | Kind | Status | Code |
//! |---|---|---|
//! | `BodyRead` | 400 | `BODY_READ_FAILED` |
//! | `Query` | 400 | `MALFORMED_QUERY` |
//! | `Coercion` | 400 | `INVALID_PARAMETER` |
//! | `File` | 400 | `FILE_UNAVAILABLE` |
//! | `Validation` | 422 | `VALIDATION_FAILED` |
//! | `UnsupportedSource` | 500 | `UNSUPPORTED_SOURCE` |
//! | `AmbiguousBody` | 400 | `AMBIGUOUS_BODY_BINDING` |
//! | `Payload` | 500 | `PAYLOAD_ENCODING_FAILED` |
//! | `Handler` | 500 | `HANDLER_ERROR` |

use crate::{SerialError, SourceKind, ValidationError};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A boxed error as returned by handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A malformed escape sequence in a query or form string.
///
/// # Example
///
/// ```rust
/// use heron_core::QueryError;
///
/// let err = QueryError::new("%zz", "invalid percent escape");
/// assert_eq!(err.input(), "%zz");
/// assert!(err.to_string().contains("%zz"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid escape in {input:?}: {reason}")]
pub struct QueryError {
    input: String,
    reason: &'static str,
}

impl QueryError {
    /// Creates an error for the offending raw input.
    #[must_use]
    pub fn new(input: impl Into<String>, reason: &'static str) -> Self {
        Self {
            input: input.into(),
            reason,
        }
    }

    /// Returns the raw input that failed to unescape.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns why the input was rejected.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

/// Error produced while binding a request or dispatching a handler.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request body could not be read.
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] std::io::Error),

    /// The query string or form body contained a malformed escape.
    #[error("malformed query string: {0}")]
    Query(#[from] QueryError),

    /// A raw value could not be converted into the field's type.
    #[error("failed to bind {kind} parameter '{name}': {error}")]
    Coercion {
        /// Where the raw value came from.
        kind: SourceKind,
        /// The source name of the field (empty for a whole body).
        name: String,
        /// The serializer's failure.
        #[source]
        error: SerialError,
    },

    /// An uploaded file part could not be retrieved.
    #[error("failed to retrieve file '{name}': {reason}")]
    File {
        /// The file part name.
        name: String,
        /// Why retrieval failed.
        reason: String,
    },

    /// An assembled record failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A field was annotated with a source tag Heron does not know.
    #[error("unsupported parameter source: {0}")]
    UnsupportedSource(String),

    /// A body field cannot be bound from a body of this content type.
    #[error("cannot bind body field '{name}' from a '{content_type}' body")]
    AmbiguousBody {
        /// The source name of the field (empty for a whole body).
        name: String,
        /// The request content type.
        content_type: String,
    },

    /// The handler's data could not be turned into a payload.
    #[error("failed to encode response payload: {0}")]
    Payload(#[source] serde_json::Error),

    /// The handler returned an error.
    #[error("{0}")]
    Handler(BoxError),
}

impl DispatchError {
    /// Creates a coercion error.
    #[must_use]
    pub fn coercion(kind: SourceKind, name: impl Into<String>, error: SerialError) -> Self {
        Self::Coercion {
            kind,
            name: name.into(),
            error,
        }
    }

    /// Creates a file retrieval error.
    #[must_use]
    pub fn file(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::File {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an ambiguous body binding error.
    #[must_use]
    pub fn ambiguous_body(name: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::AmbiguousBody {
            name: name.into(),
            content_type: content_type.into(),
        }
    }

    /// Wraps an error returned by a handler.
    ///
    /// A boxed `DispatchError` is unwrapped back to its own kind so that
    /// handlers can propagate binding errors with `?` unchanged.
    ///
    /// ```rust
    /// use heron_core::{DispatchError, SourceKind};
    ///
    /// let inner = DispatchError::UnsupportedSource("form".into());
    /// let err = DispatchError::handler(inner);
    /// assert_eq!(err.error_code(), "UNSUPPORTED_SOURCE");
    ///
    /// let err = DispatchError::handler(std::io::Error::other("disk full"));
    /// assert_eq!(err.error_code(), "HANDLER_ERROR");
    /// ```
    #[must_use]
    pub fn handler(error: impl Into<BoxError>) -> Self {
        match error.into().downcast::<Self>() {
            Ok(own) => *own,
            Err(other) => Self::Handler(other),
        }
    }

    /// Returns the HTTP status code conventionally used for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BodyRead(_)
            | Self::Query(_)
            | Self::Coercion { .. }
            | Self::File { .. }
            | Self::AmbiguousBody { .. } => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UnsupportedSource(_) | Self::Payload(_) | Self::Handler(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the stable error code used in error envelopes.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BodyRead(_) => "BODY_READ_FAILED",
            Self::Query(_) => "MALFORMED_QUERY",
            Self::Coercion { .. } => "INVALID_PARAMETER",
            Self::File { .. } => "FILE_UNAVAILABLE",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::UnsupportedSource(_) => "UNSUPPORTED_SOURCE",
            Self::AmbiguousBody { .. } => "AMBIGUOUS_BODY_BINDING",
            Self::Payload(_) => "PAYLOAD_ENCODING_FAILED",
            Self::Handler(_) => "HANDLER_ERROR",
        }
    }

    /// Converts this error to a serializable error envelope.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }
}

/// Serializable error envelope written by [`JsonResponder`](crate::JsonResponder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request id for correlation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::Error as _;

    #[test]
    fn test_coercion_error() {
        let err = DispatchError::coercion(
            SourceKind::Query,
            "limit",
            SerialError::custom("invalid digit found in string"),
        );

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
        assert!(err.to_string().contains("query parameter 'limit'"));
        assert!(err.to_string().contains("invalid digit"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_validation_error_is_transparent() {
        let err: DispatchError = ValidationError::new("$.name", "required field is null").into();

        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
        assert_eq!(
            err.to_string(),
            "validation error at '$.name': required field is null"
        );
    }

    #[test]
    fn test_query_error_conversion() {
        let err: DispatchError = QueryError::new("%g1", "invalid percent escape").into();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "MALFORMED_QUERY");
        assert!(err.to_string().contains("%g1"));
    }

    #[test]
    fn test_file_error() {
        let err = DispatchError::file("avatar", "no such file part");

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("avatar"));
    }

    #[test]
    fn test_ambiguous_body_error() {
        let err = DispatchError::ambiguous_body("b1", "application/json");

        assert_eq!(err.error_code(), "AMBIGUOUS_BODY_BINDING");
        assert!(err.to_string().contains("'b1'"));
        assert!(err.to_string().contains("application/json"));
    }

    #[test]
    fn test_handler_error_keeps_message() {
        let err = DispatchError::handler("user not found");

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "user not found");
    }

    #[test]
    fn test_handler_unwraps_dispatch_error() {
        let inner = DispatchError::file("f1", "missing");
        let err = DispatchError::handler(inner);

        assert!(matches!(err, DispatchError::File { ref name, .. } if name == "f1"));
    }

    #[test]
    fn test_envelope() {
        let err = DispatchError::file("avatar", "no such file part");
        let json = serde_json::to_value(err.to_envelope(Some("req-1"))).unwrap();

        assert_eq!(json["error"]["code"], "FILE_UNAVAILABLE");
        assert_eq!(
            json["error"]["message"],
            "failed to retrieve file 'avatar': no such file part"
        );
        assert_eq!(json["request_id"], "req-1");

        let json = serde_json::to_string(&err.to_envelope(None)).unwrap();
        assert!(!json.contains("request_id"));
    }

    #[test]
    fn test_body_read_error() {
        let err = DispatchError::BodyRead(std::io::Error::other("connection reset"));

        assert_eq!(err.error_code(), "BODY_READ_FAILED");
        assert!(err.to_string().contains("connection reset"));
    }
}
