//! The per-request value store.
//!
//! [`ValueStore::capture`] snapshots everything the resolver needs from an
//! [`Exchange`] once, before any field is bound: the content type, the raw
//! body, and the query string and form body parsed into [`RawValues`].

use bytes::Bytes;
use heron_core::{DispatchError, Exchange, QueryError};
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;

/// Raw multi-valued string data keyed by name, in first-seen key order.
///
/// # Example
///
/// ```rust
/// use heron_bind::{parse_query, RawValues};
///
/// let mut values = RawValues::new();
/// parse_query(&mut values, "tags=a,b&tags=c&q=hello+world").unwrap();
///
/// assert_eq!(values.get("q"), Some("hello world"));
/// assert_eq!(values.get_all("tags"), Some(&["a".to_string(), "b".into(), "c".into()][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawValues {
    entries: IndexMap<String, Vec<String>>,
}

impl RawValues {
    /// Creates an empty value map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// Returns the first value recorded under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns every value recorded under `key`, in request order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Option<&[String]> {
        self.entries
            .get(key)
            .map(Vec::as_slice)
            .filter(|values| !values.is_empty())
    }

    /// Returns `true` if at least one value is recorded under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get_all(key).is_some()
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no key is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over keys and their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

/// Unescapes one query or form component.
///
/// `+` becomes a space and `%XX` is decoded. A `%` not followed by two hex
/// digits, or a decoded result that is not UTF-8, is rejected.
///
/// ```rust
/// use heron_bind::unescape;
///
/// assert_eq!(unescape("a%20b+c").unwrap(), "a b c");
/// assert_eq!(unescape("1%2B1").unwrap(), "1+1");
/// assert!(unescape("100%").is_err());
/// ```
pub fn unescape(raw: &str) -> Result<String, QueryError> {
    let mut rest = raw;
    while let Some(pos) = rest.find('%') {
        let valid = rest
            .get(pos + 1..pos + 3)
            .is_some_and(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()));
        if !valid {
            return Err(QueryError::new(raw, "invalid percent escape"));
        }
        rest = &rest[pos + 3..];
    }

    let spaced = if raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };

    percent_decode_str(&spaced)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| QueryError::new(raw, "invalid UTF-8 after unescaping"))
}

/// Parses a query string or form body into `values`.
///
/// Entries are separated by `&` or `;` and split on the first `=`. A value
/// containing commas is recorded as several values under the same key. A
/// malformed key skips its entry and a malformed value skips only itself;
/// parsing always runs to the end and the first error is returned
/// afterwards.
pub fn parse_query(values: &mut RawValues, raw: &str) -> Result<(), QueryError> {
    let mut first_error = None;

    for entry in raw.split(|c| c == '&' || c == ';') {
        if entry.is_empty() {
            continue;
        }
        let (key, value) = entry.split_once('=').unwrap_or((entry, ""));

        let key = match unescape(key) {
            Ok(key) => key,
            Err(err) => {
                first_error.get_or_insert(err);
                continue;
            }
        };

        for part in value.split(',') {
            match unescape(part) {
                Ok(part) => values.append(key.as_str(), part),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
    }

    first_error.map_or(Ok(()), Err)
}

/// Well-known content types, by essence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// `application/json`
    Json,
    /// `application/x-www-form-urlencoded`
    Form,
    /// `multipart/form-data`
    Multipart,
    /// Anything else, including a missing header.
    Other,
}

impl ContentKind {
    /// Classifies a content type essence.
    #[must_use]
    pub fn of(essence: &str) -> Self {
        match essence.parse::<mime::Mime>() {
            Ok(m) if m == mime::APPLICATION_JSON => Self::Json,
            Ok(m) if m == mime::APPLICATION_WWW_FORM_URLENCODED => Self::Form,
            Ok(m) if m.essence_str() == mime::MULTIPART_FORM_DATA.essence_str() => Self::Multipart,
            _ => Self::Other,
        }
    }
}

/// Returns the essence of a `Content-Type` value: parameters stripped,
/// whitespace trimmed.
#[must_use]
pub fn content_type_essence(value: &str) -> &str {
    value.split(';').next().unwrap_or_default().trim()
}

/// A snapshot of the raw request data one dispatch binds from.
#[derive(Debug, Clone)]
pub struct ValueStore {
    content_type: String,
    kind: ContentKind,
    body: Bytes,
    queries: RawValues,
    forms: RawValues,
}

impl ValueStore {
    /// Captures the value store of a request.
    ///
    /// The body is read once and stays readable through the exchange. The
    /// query string is always parsed; the body is parsed as a form only for
    /// `application/x-www-form-urlencoded`. Both are parsed to completion
    /// before a malformed escape is reported.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::BodyRead`] if the body cannot be read and
    /// [`DispatchError::Query`] for the first malformed escape.
    pub fn capture(exchange: &Exchange) -> Result<Self, DispatchError> {
        let content_type = exchange
            .content_type()
            .map(content_type_essence)
            .unwrap_or_default()
            .to_string();
        let kind = ContentKind::of(&content_type);
        let body = exchange.read_body()?;

        let mut queries = RawValues::new();
        let query_result = parse_query(&mut queries, exchange.query().unwrap_or_default());

        let mut forms = RawValues::new();
        let form_result = if kind == ContentKind::Form {
            parse_query(&mut forms, &String::from_utf8_lossy(&body))
        } else {
            Ok(())
        };

        query_result.and(form_result)?;

        Ok(Self {
            content_type,
            kind,
            body,
            queries,
            forms,
        })
    }

    /// Returns the content type essence (empty if the header is missing).
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the classified content type.
    #[must_use]
    pub fn content_kind(&self) -> ContentKind {
        self.kind
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the parsed query string.
    #[must_use]
    pub fn queries(&self) -> &RawValues {
        &self.queries
    }

    /// Returns the parsed form body.
    #[must_use]
    pub fn forms(&self) -> &RawValues {
        &self.forms
    }
}
