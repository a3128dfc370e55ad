//! Records: structs whose fields are bound from request data.

use crate::coerce::{coerce, coerce_default};
use crate::resolve::{FieldSpec, Resolved, Resolver};
use heron_core::{DispatchError, Serial, SourceKind, UploadedFile};
use serde::de::DeserializeOwned;

/// A struct assembled field by field from one request.
///
/// Usually derived with `#[derive(Record)]`:
///
/// ```rust,ignore
/// #[derive(Debug, Default, Serialize, Record)]
/// struct Search {
///     #[heron(query = "q")]
///     q: String,
///     #[heron(query = "page,1")]
///     page: u32,
///     #[heron(header = "x-api-key")]
///     api_key: Option<String>,
/// }
/// ```
///
/// A hand-written implementation binds each annotated field through the
/// [`Assembler`] and gives the rest their default value.
pub trait Record: Sized {
    /// The record name, used to look up validation schemas.
    const NAME: &'static str;

    /// The annotated fields, in declaration order.
    const FIELDS: &'static [FieldSpec];

    /// Builds the record. The first failing field aborts assembly.
    fn assemble<S: Serial>(assembler: &Assembler<'_, S>) -> Result<Self, DispatchError>;
}

/// Binds record fields within one request.
#[derive(Debug)]
pub struct Assembler<'r, S> {
    resolver: Resolver<'r>,
    serial: &'r S,
}

impl<'r, S: Serial> Assembler<'r, S> {
    /// Creates an assembler.
    #[must_use]
    pub fn new(resolver: Resolver<'r>, serial: &'r S) -> Self {
        Self { resolver, serial }
    }

    /// Assembles a record.
    pub fn assemble<R: Record>(&self) -> Result<R, DispatchError> {
        R::assemble(self)
    }

    /// Binds a value field.
    ///
    /// The resolved value is coerced; when the source has none, the declared
    /// default is coerced instead, and without a default the field takes
    /// `T::default()` (`None` for optional fields).
    ///
    /// # Errors
    ///
    /// Returns resolution and coercion failures, and
    /// [`DispatchError::UnsupportedSource`] for a file source.
    pub fn bind<T>(&self, spec: &FieldSpec) -> Result<T, DispatchError>
    where
        T: DeserializeOwned + Default,
    {
        match self.resolver.resolve(spec)? {
            Some(Resolved::Raw(raw)) => coerce(self.serial, spec, raw),
            Some(Resolved::File(_)) => Err(DispatchError::UnsupportedSource(format!(
                "{} (field '{}' is not a file field)",
                SourceKind::File,
                spec.field
            ))),
            None => Ok(coerce_default(self.serial, spec)?.unwrap_or_default()),
        }
    }

    /// Binds a file field, typed `UploadedFile` or `Option<UploadedFile>`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::File`] when the part cannot be retrieved, and
    /// [`DispatchError::UnsupportedSource`] for a non-file source.
    pub fn file<T>(&self, spec: &FieldSpec) -> Result<T, DispatchError>
    where
        T: From<UploadedFile>,
    {
        if spec.source != SourceKind::File {
            return Err(DispatchError::UnsupportedSource(format!(
                "{} (field '{}' is a file field)",
                spec.source, spec.field
            )));
        }
        match self.resolver.resolve(spec)? {
            Some(Resolved::File(file)) => Ok(T::from(file)),
            _ => Err(DispatchError::file(spec.name, "no such file part")),
        }
    }
}
