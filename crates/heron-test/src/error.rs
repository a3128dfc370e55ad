//! Test error types.

use thiserror::Error;

/// Errors raised while building requests or reading replies in tests.
#[derive(Debug, Error)]
pub enum TestError {
    /// The path and query do not form a valid request target.
    #[error("invalid request target '{target}': {source}")]
    InvalidUri {
        /// The rejected target.
        target: String,
        /// Why `http` rejected it.
        #[source]
        source: http::uri::InvalidUri,
    },

    /// A header name or value is invalid.
    #[error("invalid header {0}")]
    InvalidHeader(String),

    /// The reply body is not UTF-8.
    #[error("reply body is not UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No mounted route matches the request.
    #[error("no route for {method} {path}")]
    NoRoute {
        /// Request method.
        method: http::Method,
        /// Request path.
        path: String,
    },

    /// Nothing was written to the exchange.
    #[error("no reply was written")]
    NoReply,
}
