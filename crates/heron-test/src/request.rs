//! Test request building.

use crate::error::TestError;
use bytes::Bytes;
use heron_core::{Exchange, Params, UploadedFile};
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use std::io::{self, Read};

/// Characters escaped in query and form components.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Boundary used when a request carries file parts.
pub const MULTIPART_BOUNDARY: &str = "heron-test-boundary";

/// Entry points for building test requests.
pub struct TestRequest;

impl TestRequest {
    /// Creates a new GET request.
    pub fn get(path: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, path)
    }

    /// Creates a new POST request.
    pub fn post(path: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, path)
    }

    /// Creates a new PUT request.
    pub fn put(path: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PUT, path)
    }

    /// Creates a new PATCH request.
    pub fn patch(path: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::PATCH, path)
    }

    /// Creates a new DELETE request.
    pub fn delete(path: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::DELETE, path)
    }
}

enum TestBody {
    Bytes(Bytes),
    Failing(io::ErrorKind),
}

struct FailingReader(io::ErrorKind);

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(self.0, "test body read failure"))
    }
}

/// Builder for an in-memory [`Exchange`].
///
/// Errors from individual steps (a bad header name, an unserializable JSON
/// value) are kept and reported by [`build`](Self::build).
///
/// # Example
///
/// ```rust
/// use heron_test::TestRequest;
///
/// let exchange = TestRequest::get("/users/7")
///     .query("q", "hello world")
///     .header("x-request-id", "req-1")
///     .cookie("session", "abc")
///     .path_param("id", "7")
///     .build()
///     .unwrap();
///
/// assert_eq!(exchange.query(), Some("q=hello%20world"));
/// assert_eq!(exchange.cookie("session"), Some("abc"));
/// assert_eq!(exchange.path_param("id"), Some("7"));
/// ```
#[must_use]
pub struct TestRequestBuilder {
    method: Method,
    path: String,
    query: Vec<String>,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    path_params: Params,
    files: Vec<UploadedFile>,
    body: TestBody,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, path: impl AsRef<str>) -> Self {
        Self {
            method,
            path: path.as_ref().to_string(),
            query: Vec::new(),
            headers: Vec::new(),
            cookies: Vec::new(),
            path_params: Params::new(),
            files: Vec::new(),
            body: TestBody::Bytes(Bytes::new()),
            error: None,
        }
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path, without the query.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Appends an encoded query pair.
    pub fn query(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.query.push(encode_pair(name.as_ref(), value.as_ref()));
        self
    }

    /// Appends query text as is, without encoding.
    pub fn raw_query(mut self, query: impl Into<String>) -> Self {
        self.query.push(query.into());
        self
    }

    /// Appends a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Adds a cookie. All cookies are sent in one `Cookie` header.
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    /// Adds a path parameter, as a router would after matching.
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = TestBody::Bytes(body.into());
        self
    }

    /// Sets the request body as JSON.
    ///
    /// This also sets the `Content-Type` header to `application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = TestBody::Bytes(bytes.into()),
            Err(e) => self.fail(TestError::Json(e)),
        }
        self.content_type("application/json")
    }

    /// Sets a url-encoded form body.
    ///
    /// This also sets the `Content-Type` header to
    /// `application/x-www-form-urlencoded`.
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded: Vec<String> = fields
            .into_iter()
            .map(|(k, v)| encode_pair(k.as_ref(), v.as_ref()))
            .collect();
        self.body = TestBody::Bytes(encoded.join("&").into());
        self.content_type("application/x-www-form-urlencoded")
    }

    /// Adds a file part and marks the request as multipart.
    pub fn file(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }

    /// Makes every body read fail with `kind`.
    pub fn failing_body(mut self, kind: io::ErrorKind) -> Self {
        self.body = TestBody::Failing(kind);
        self
    }

    fn fail(&mut self, error: TestError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Builds the exchange.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while building, or an error for an
    /// invalid URI or header.
    pub fn build(self) -> Result<Exchange, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let target = if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query.join("&"))
        };
        let uri = Uri::try_from(target.as_str())
            .map_err(|source| TestError::InvalidUri {
                target: target.clone(),
                source,
            })?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| TestError::InvalidHeader(format!("{name}: {e}")))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| TestError::InvalidHeader(format!("{name}: {e}")))?;
            headers.append(name, value);
        }

        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            let value = HeaderValue::try_from(cookie)
                .map_err(|e| TestError::InvalidHeader(format!("cookie: {e}")))?;
            headers.append(header::COOKIE, value);
        }

        if !self.files.is_empty() && !headers.contains_key(header::CONTENT_TYPE) {
            let value =
                HeaderValue::try_from(format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"))
                    .map_err(|e| TestError::InvalidHeader(format!("content-type: {e}")))?;
            headers.insert(header::CONTENT_TYPE, value);
        }

        let mut builder = Exchange::builder()
            .method(self.method)
            .uri(uri)
            .headers(headers)
            .path_params(self.path_params);
        for file in self.files {
            builder = builder.file(file);
        }
        builder = match self.body {
            TestBody::Bytes(bytes) => builder.body(bytes),
            TestBody::Failing(kind) => builder.body_reader(FailingReader(kind)),
        };

        Ok(builder.build())
    }
}

fn encode_pair(name: &str, value: &str) -> String {
    format!(
        "{}={}",
        utf8_percent_encode(name, COMPONENT),
        utf8_percent_encode(value, COMPONENT)
    )
}
