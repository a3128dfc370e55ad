//! Source resolution: where a field's raw value comes from.

use crate::values::{ContentKind, ValueStore};
use heron_core::{DispatchError, Exchange, Raw, SourceKind, UploadedFile};
use std::str::FromStr;

/// The binding declaration of one record field.
///
/// Generated by `#[derive(Record)]` from field annotations such as
/// `#[heron(query = "page,1")]`: the part before the first comma is the source
/// name, the rest (commas included) is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// The Rust field name.
    pub field: &'static str,
    /// Where the raw value is read from.
    pub source: SourceKind,
    /// The name within the source. Empty for a whole body.
    pub name: &'static str,
    /// Raw text coerced when the source has no value.
    pub default: Option<&'static str>,
}

impl FieldSpec {
    /// Creates a field spec.
    #[must_use]
    pub const fn new(
        field: &'static str,
        source: SourceKind,
        name: &'static str,
        default: Option<&'static str>,
    ) -> Self {
        Self {
            field,
            source,
            name,
            default,
        }
    }

    /// Builds a field spec from an annotation tag and its payload.
    ///
    /// ```rust
    /// use heron_bind::FieldSpec;
    /// use heron_core::SourceKind;
    ///
    /// let spec = FieldSpec::from_tag("tags", "query", "tags,a,b").unwrap();
    /// assert_eq!(spec.source, SourceKind::Query);
    /// assert_eq!(spec.name, "tags");
    /// assert_eq!(spec.default, Some("a,b"));
    ///
    /// assert!(FieldSpec::from_tag("x", "form", "x").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnsupportedSource`] for an unknown tag.
    pub fn from_tag(
        field: &'static str,
        tag: &str,
        payload: &'static str,
    ) -> Result<Self, DispatchError> {
        let source = SourceKind::from_str(tag)?;
        let (name, default) = split_payload(payload);
        Ok(Self::new(field, source, name, default))
    }
}

/// Splits an annotation payload into source name and optional default.
#[must_use]
pub fn split_payload(payload: &str) -> (&str, Option<&str>) {
    match payload.split_once(',') {
        Some((name, default)) => (name, Some(default)),
        None => (payload, None),
    }
}

/// What to do with a body field whose content type it cannot be bound from.
///
/// Only a whole JSON body (empty name) and a named form field are bindable.
/// A named field on a JSON body, a whole form body, or a body of any other
/// content type is ambiguous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyMismatch {
    /// Treat the field as absent and log a warning.
    #[default]
    Ignore,
    /// Fail the dispatch with [`DispatchError::AmbiguousBody`].
    Reject,
}

/// A resolved raw value.
#[derive(Debug, Clone)]
pub enum Resolved<'r> {
    /// Raw data awaiting coercion.
    Raw(Raw<'r>),
    /// An uploaded file part.
    File(UploadedFile),
}

/// Finds the raw value of a field within one request.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    exchange: &'r Exchange,
    store: &'r ValueStore,
    body_mismatch: BodyMismatch,
}

impl<'r> Resolver<'r> {
    /// Creates a resolver over a captured value store.
    #[must_use]
    pub fn new(exchange: &'r Exchange, store: &'r ValueStore, body_mismatch: BodyMismatch) -> Self {
        Self {
            exchange,
            store,
            body_mismatch,
        }
    }

    /// Returns the value store being resolved against.
    #[must_use]
    pub fn store(&self) -> &'r ValueStore {
        self.store
    }

    /// Resolves a field. `Ok(None)` means the source has no value.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::File`] when a file part cannot be retrieved,
    /// and [`DispatchError::AmbiguousBody`] under [`BodyMismatch::Reject`].
    pub fn resolve(&self, spec: &FieldSpec) -> Result<Option<Resolved<'r>>, DispatchError> {
        let raw = match spec.source {
            SourceKind::Query => self.store.queries().get_all(spec.name).map(Raw::Values),
            SourceKind::Path => self.exchange.path_param(spec.name).map(Raw::Text),
            SourceKind::Header => self
                .exchange
                .header(spec.name)
                .filter(|value| !value.is_empty())
                .map(Raw::Text),
            SourceKind::Cookie => self.exchange.cookie(spec.name).map(Raw::Text),
            SourceKind::Body => self.resolve_body(spec)?,
            SourceKind::File => return self.exchange.file(spec.name).map(|f| Some(Resolved::File(f))),
        };
        Ok(raw.map(Resolved::Raw))
    }

    fn resolve_body(&self, spec: &FieldSpec) -> Result<Option<Raw<'r>>, DispatchError> {
        match (self.store.content_kind(), spec.name.is_empty()) {
            (ContentKind::Json, true) if self.store.body().is_empty() => Ok(None),
            (ContentKind::Json, true) => Ok(Some(Raw::Json(self.store.body()))),
            (ContentKind::Form, false) => Ok(self.store.forms().get_all(spec.name).map(Raw::Values)),
            _ => match self.body_mismatch {
                BodyMismatch::Reject => Err(DispatchError::ambiguous_body(
                    spec.name,
                    self.store.content_type(),
                )),
                BodyMismatch::Ignore => {
                    tracing::warn!(
                        field = spec.field,
                        name = spec.name,
                        content_type = self.store.content_type(),
                        "body field cannot be bound from this content type, leaving it unset"
                    );
                    Ok(None)
                }
            },
        }
    }
}
