//! The per-request transport object.
//!
//! An [`Exchange`] is what the routing layer hands Heron for every matched
//! request. It exposes the raw request parts (method, URI, headers, path
//! parameters, cookies, body, uploaded files), the middleware abort flag, and
//! a reply slot the responder or the handler itself writes into.
//!
//! `Exchange` is a cheap handle: clones share the same request. Only the body
//! buffer, the abort flag and the reply slot are mutable.

use crate::{DispatchError, Params, RequestId};
use bytes::Bytes;
use http::header::{self, HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode, Uri};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A file part uploaded with a `multipart/form-data` request.
///
/// Heron does not parse multipart bodies itself; the routing layer supplies
/// the parts it parsed when it builds the [`Exchange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl UploadedFile {
    /// Creates a file part with the given form field name and contents.
    #[must_use]
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: data.into(),
        }
    }

    /// Sets the client-supplied file name.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Sets the part's content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns the form field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the client-supplied file name.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Returns the part's content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the file contents.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Returns the size of the file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Serializes the part's metadata. The contents are reported as `size` only.
impl Serialize for UploadedFile {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("UploadedFile", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("file_name", &self.file_name)?;
        state.serialize_field("content_type", &self.content_type)?;
        state.serialize_field("size", &self.data.len())?;
        state.end()
    }
}

/// A response written into an [`Exchange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl Reply {
    /// Creates a reply with no headers.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Returns the `Content-Type` of the reply.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the body as UTF-8 text, if it is valid UTF-8.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

enum Body {
    Buffered(Bytes),
    Stream(Box<dyn Read + Send>),
}

struct Inner {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path_params: Params,
    files: HashMap<String, UploadedFile>,
    body: Mutex<Body>,
    aborted: AtomicBool,
    request_id: Mutex<Option<RequestId>>,
    reply: Mutex<Option<Reply>>,
}

/// The transport object for one request.
///
/// # Example
///
/// ```rust
/// use heron_core::Exchange;
/// use http::{Method, Uri};
///
/// let exchange = Exchange::builder()
///     .method(Method::GET)
///     .uri(Uri::from_static("/users/42?verbose=1"))
///     .header("x-request-id", "abc-123")
///     .header("cookie", "session=s1; theme=dark")
///     .path_param("id", "42")
///     .build();
///
/// assert_eq!(exchange.path(), "/users/42");
/// assert_eq!(exchange.query(), Some("verbose=1"));
/// assert_eq!(exchange.header("x-request-id"), Some("abc-123"));
/// assert_eq!(exchange.cookie("theme"), Some("dark"));
/// assert_eq!(exchange.path_param("id"), Some("42"));
/// ```
#[derive(Clone)]
pub struct Exchange {
    inner: Arc<Inner>,
}

impl Exchange {
    /// Returns a builder for a new exchange.
    #[must_use]
    pub fn builder() -> ExchangeBuilder {
        ExchangeBuilder::new()
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.inner.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.inner.uri.path()
    }

    /// Returns the raw query string, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.inner.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// Returns a header value as a string.
    ///
    /// Values that are not visible ASCII are treated as absent.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the `Content-Type` header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Returns the path parameters matched by the router.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.inner.path_params
    }

    /// Returns a single path parameter.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.inner.path_params.get(name)
    }

    /// Looks up a cookie by name across all `Cookie` headers.
    ///
    /// Surrounding double quotes are stripped from the value.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.inner
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(n, _)| n.trim() == name)
            .map(|(_, v)| v.trim().trim_matches('"'))
    }

    /// Retrieves an uploaded file part by form field name.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::File`] if the request has no such part.
    pub fn file(&self, name: &str) -> Result<UploadedFile, DispatchError> {
        if let Some(file) = self.inner.files.get(name) {
            return Ok(file.clone());
        }
        let reason = if self.inner.files.is_empty() && !self.is_multipart() {
            "request is not multipart/form-data"
        } else {
            "no such file part"
        };
        Err(DispatchError::file(name, reason))
    }

    fn is_multipart(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.trim_start().starts_with("multipart/form-data"))
    }

    /// Reads the whole request body.
    ///
    /// The first call drains the underlying stream and keeps the bytes
    /// buffered, so the body stays readable for the rest of the stack.
    /// Later calls return the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::BodyRead`] if the stream fails. Whatever was
    /// read before the failure stays buffered.
    pub fn read_body(&self) -> Result<Bytes, DispatchError> {
        let mut body = self.inner.body.lock();
        let mut stream = match std::mem::replace(&mut *body, Body::Buffered(Bytes::new())) {
            Body::Buffered(bytes) => {
                *body = Body::Buffered(bytes.clone());
                return Ok(bytes);
            }
            Body::Stream(stream) => stream,
        };

        let mut buf = Vec::new();
        let result = stream.read_to_end(&mut buf);
        let bytes = Bytes::from(buf);
        *body = Body::Buffered(bytes.clone());
        result.map(|_| bytes).map_err(DispatchError::BodyRead)
    }

    /// Copies the request parts into a detached snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::BodyRead`] if the body cannot be read.
    pub fn snapshot(&self) -> Result<ExchangeSnapshot, DispatchError> {
        Ok(ExchangeSnapshot {
            method: self.inner.method.clone(),
            uri: self.inner.uri.clone(),
            headers: self.inner.headers.clone(),
            path_params: self.inner.path_params.clone(),
            body: self.read_body()?,
        })
    }

    /// Marks the request as aborted; later chain entries must not run.
    pub fn abort(&self) {
        self.inner.aborted.store(true, Ordering::Release);
    }

    /// Returns true if a middleware aborted the request.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::Acquire)
    }

    /// Returns the id of the first [`RequestContext`](crate::RequestContext)
    /// created for this request, if any.
    ///
    /// Every endpoint of a chain sees the same id.
    #[must_use]
    pub fn request_id(&self) -> Option<RequestId> {
        *self.inner.request_id.lock()
    }

    pub(crate) fn request_id_or_insert_with(&self, id: impl FnOnce() -> RequestId) -> RequestId {
        *self.inner.request_id.lock().get_or_insert_with(id)
    }

    /// Writes a reply, replacing any earlier one.
    pub fn reply(&self, reply: Reply) {
        *self.inner.reply.lock() = Some(reply);
    }

    /// Writes a plain-text reply.
    pub fn reply_text(&self, status: StatusCode, body: impl Into<String>) {
        let mut reply = Reply::new(status, body.into());
        reply.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self.reply(reply);
    }

    /// Serializes `value` as JSON and writes it as the reply.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Payload`] if serialization fails; no reply is
    /// written in that case.
    pub fn reply_json<T: Serialize + ?Sized>(
        &self,
        status: StatusCode,
        value: &T,
    ) -> Result<(), DispatchError> {
        let body = serde_json::to_vec(value).map_err(DispatchError::Payload)?;
        let mut reply = Reply::new(status, body);
        reply.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.reply(reply);
        Ok(())
    }

    /// Returns true if a reply has been written.
    #[must_use]
    pub fn has_reply(&self) -> bool {
        self.inner.reply.lock().is_some()
    }

    /// Removes and returns the written reply.
    #[must_use]
    pub fn take_reply(&self) -> Option<Reply> {
        self.inner.reply.lock().take()
    }
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("method", &self.inner.method)
            .field("uri", &self.inner.uri)
            .field("headers", &self.inner.headers)
            .field("path_params", &self.inner.path_params)
            .field("files", &self.inner.files.len())
            .field("aborted", &self.is_aborted())
            .finish_non_exhaustive()
    }
}

/// A detached copy of the request parts of an [`Exchange`].
///
/// Handlers that take the transport by value receive a snapshot: it owns its
/// data and cannot abort the request or write a reply.
#[derive(Debug, Clone)]
pub struct ExchangeSnapshot {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path_params: Params,
    body: Bytes,
}

impl ExchangeSnapshot {
    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the matched path parameters.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Returns the buffered request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Builder for an [`Exchange`].
///
/// Defaults to `GET /` with no headers and an empty body.
#[must_use]
pub struct ExchangeBuilder {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path_params: Params,
    files: HashMap<String, UploadedFile>,
    body: Body,
}

impl Default for ExchangeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeBuilder {
    /// Creates a builder for `GET /`.
    pub fn new() -> Self {
        Self {
            method: Method::GET,
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
            path_params: Params::new(),
            files: HashMap::new(),
            body: Body::Buffered(Bytes::new()),
        }
    }

    /// Sets the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request URI.
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    /// Replaces all headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Appends a header. Invalid names or values are ignored.
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        HeaderValue: TryFrom<V>,
    {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            self.headers.append(name, value);
        }
        self
    }

    /// Replaces the path parameters.
    pub fn path_params(mut self, params: Params) -> Self {
        self.path_params = params;
        self
    }

    /// Appends a path parameter.
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Adds an uploaded file part, keyed by its field name.
    pub fn file(mut self, file: UploadedFile) -> Self {
        self.files.insert(file.name.clone(), file);
        self
    }

    /// Sets an already buffered body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Body::Buffered(body.into());
        self
    }

    /// Sets a streaming body, drained on first read.
    pub fn body_reader(mut self, reader: impl Read + Send + 'static) -> Self {
        self.body = Body::Stream(Box::new(reader));
        self
    }

    /// Builds the exchange.
    #[must_use]
    pub fn build(self) -> Exchange {
        Exchange {
            inner: Arc::new(Inner {
                method: self.method,
                uri: self.uri,
                headers: self.headers,
                path_params: self.path_params,
                files: self.files,
                body: Mutex::new(self.body),
                aborted: AtomicBool::new(false),
                request_id: Mutex::new(None),
                reply: Mutex::new(None),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset"))
        }
    }

    #[test]
    fn test_defaults() {
        let exchange = Exchange::builder().build();

        assert_eq!(exchange.method(), &Method::GET);
        assert_eq!(exchange.path(), "/");
        assert_eq!(exchange.query(), None);
        assert!(!exchange.is_aborted());
        assert!(!exchange.has_reply());
    }

    #[test]
    fn test_cookie_lookup() {
        let exchange = Exchange::builder()
            .header("cookie", "session=abc123; theme=\"dark\"")
            .header("cookie", "lang=en")
            .build();

        assert_eq!(exchange.cookie("session"), Some("abc123"));
        assert_eq!(exchange.cookie("theme"), Some("dark"));
        assert_eq!(exchange.cookie("lang"), Some("en"));
        assert_eq!(exchange.cookie("missing"), None);
    }

    #[test]
    fn test_streaming_body_is_buffered_after_read() {
        let exchange = Exchange::builder()
            .body_reader(io::Cursor::new(b"hello world".to_vec()))
            .build();

        assert_eq!(exchange.read_body().unwrap(), Bytes::from_static(b"hello world"));
        // Second read is served from the buffer.
        assert_eq!(exchange.read_body().unwrap(), Bytes::from_static(b"hello world"));
    }

    #[test]
    fn test_body_read_failure() {
        let exchange = Exchange::builder().body_reader(FailingReader).build();

        let err = exchange.read_body().unwrap_err();
        assert!(matches!(err, DispatchError::BodyRead(_)));
        // The failed stream is not retried.
        assert!(exchange.read_body().unwrap().is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let exchange = Exchange::builder().build();
        let other = exchange.clone();

        other.abort();
        other.reply_text(StatusCode::ACCEPTED, "queued");

        assert!(exchange.is_aborted());
        let reply = exchange.take_reply().unwrap();
        assert_eq!(reply.status, StatusCode::ACCEPTED);
        assert_eq!(reply.text(), Some("queued"));
        assert!(!other.has_reply());
    }

    #[test]
    fn test_reply_json() {
        let exchange = Exchange::builder().build();
        exchange
            .reply_json(StatusCode::OK, &serde_json::json!({"ok": true}))
            .unwrap();

        let reply = exchange.take_reply().unwrap();
        assert_eq!(reply.content_type(), Some("application/json"));
        assert_eq!(reply.text(), Some(r#"{"ok":true}"#));
    }

    #[test]
    fn test_file_lookup() {
        let exchange = Exchange::builder()
            .header("content-type", "multipart/form-data; boundary=xyz")
            .file(UploadedFile::new("avatar", "png-bytes").with_file_name("me.png"))
            .build();

        let file = exchange.file("avatar").unwrap();
        assert_eq!(file.file_name(), Some("me.png"));
        assert_eq!(file.len(), 9);

        let err = exchange.file("resume").unwrap_err();
        assert!(err.to_string().contains("no such file part"));
    }

    #[test]
    fn test_file_view_omits_contents() {
        let file = UploadedFile::new("avatar", "png-bytes").with_content_type("image/png");
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            serde_json::json!({
                "name": "avatar",
                "file_name": null,
                "content_type": "image/png",
                "size": 9,
            })
        );
    }

    #[test]
    fn test_file_on_non_multipart_request() {
        let exchange = Exchange::builder()
            .header("content-type", "application/json")
            .build();

        let err = exchange.file("avatar").unwrap_err();
        assert!(err.to_string().contains("not multipart/form-data"));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let exchange = Exchange::builder()
            .method(Method::POST)
            .uri(Uri::from_static("/items"))
            .body("payload")
            .path_param("id", "7")
            .build();

        let snapshot = exchange.snapshot().unwrap();
        exchange.abort();

        assert_eq!(snapshot.method(), &Method::POST);
        assert_eq!(snapshot.body(), &Bytes::from_static(b"payload"));
        assert_eq!(snapshot.path_params().get("id"), Some("7"));
    }

    #[test]
    fn test_invalid_header_is_ignored() {
        let exchange = Exchange::builder().header("bad header", "x").build();
        assert!(exchange.headers().is_empty());
    }
}
