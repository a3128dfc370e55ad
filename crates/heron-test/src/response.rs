//! Test response wrapper.

use crate::error::TestError;
use bytes::Bytes;
use heron_bind::Dispatched;
use heron_core::{ErrorEnvelope, Reply};
use http::{header, HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

/// The result of running a chain: what each endpoint did and the reply
/// left in the exchange.
///
/// Without a reply, [`status`](Self::status) reports `200 OK`, the status
/// an untouched response writer sends, and the body is empty.
#[derive(Debug, Clone)]
pub struct TestResponse {
    dispatched: Vec<Dispatched>,
    reply: Option<Reply>,
}

impl TestResponse {
    /// Creates a response from dispatch results and an optional reply.
    pub fn new(dispatched: Vec<Dispatched>, reply: Option<Reply>) -> Self {
        Self { dispatched, reply }
    }

    /// Returns the result of every endpoint that ran, in order.
    #[must_use]
    pub fn dispatched(&self) -> &[Dispatched] {
        &self.dispatched
    }

    /// Returns the reply, if one was written.
    #[must_use]
    pub fn reply(&self) -> Option<&Reply> {
        self.reply.as_ref()
    }

    /// Returns true if a reply was written.
    #[must_use]
    pub fn has_reply(&self) -> bool {
        self.reply.is_some()
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.reply.as_ref().map_or(StatusCode::OK, |r| r.status)
    }

    /// Returns the reply headers.
    #[must_use]
    pub fn headers(&self) -> HeaderMap {
        self.reply
            .as_ref()
            .map(|r| r.headers.clone())
            .unwrap_or_default()
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.reply.as_ref().and_then(Reply::content_type)
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> Bytes {
        self.reply
            .as_ref()
            .map(|r| r.body.clone())
            .unwrap_or_default()
    }

    /// Returns the body as a string.
    ///
    /// Returns an error if there is no reply or the body is not UTF-8.
    pub fn text(&self) -> Result<&str, TestError> {
        let reply = self.reply.as_ref().ok_or(TestError::NoReply)?;
        Ok(std::str::from_utf8(&reply.body)?)
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        let reply = self.reply.as_ref().ok_or(TestError::NoReply)?;
        serde_json::from_slice(&reply.body).map_err(TestError::Json)
    }

    /// Deserializes the body as a JSON Value.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// Deserializes the body as an error envelope.
    pub fn error_envelope(&self) -> Result<ErrorEnvelope, TestError> {
        self.json()
    }

    // Assertion methods

    /// Asserts that the status code equals the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        let status = self.status();
        assert_eq!(status, expected, "Expected status {expected}, got {status}");
        self
    }

    /// Asserts that no reply was written.
    ///
    /// # Panics
    ///
    /// Panics if a reply exists.
    pub fn assert_no_reply(&self) -> &Self {
        assert!(
            self.reply.is_none(),
            "Expected no reply, got {:?}",
            self.reply
        );
        self
    }

    /// Asserts that the Content-Type header starts with `expected`.
    ///
    /// # Panics
    ///
    /// Panics if Content-Type doesn't match.
    pub fn assert_content_type(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let actual = self
            .reply
            .as_ref()
            .and_then(|r| r.headers.get(header::CONTENT_TYPE))
            .and_then(|v| v.to_str().ok())
            .unwrap_or_else(|| panic!("Content-Type header not found"));
        assert!(
            actual.starts_with(expected),
            "Content-Type: expected '{expected}', got '{actual}'"
        );
        self
    }

    /// Asserts that the body equals the expected string.
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't match.
    pub fn assert_body_eq(&self, expected: impl AsRef<str>) -> &Self {
        let body = self.text().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(body, expected.as_ref(), "Body mismatch");
        self
    }

    /// Asserts that the JSON body matches the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON or doesn't match.
    pub fn assert_json_eq(&self, expected: &serde_json::Value) -> &Self {
        let actual = self.json_value().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(&actual, expected, "JSON body mismatch");
        self
    }

    /// Asserts that the body is an error envelope with `code`.
    ///
    /// # Panics
    ///
    /// Panics if the body is not an envelope or the code differs.
    pub fn assert_error_code(&self, code: &str) -> &Self {
        let envelope = self.error_envelope().unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(envelope.error.code, code, "Error code mismatch");
        self
    }
}
