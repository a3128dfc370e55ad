//! The bridge between resolved raw data and typed field values.

use crate::resolve::FieldSpec;
use heron_core::serial::short_type_name;
use heron_core::{DispatchError, Raw, Serial};
use serde::de::DeserializeOwned;

/// Coerces raw data into the type of the field described by `spec`.
///
/// # Errors
///
/// Returns [`DispatchError::Coercion`] naming the field's source and name.
pub fn coerce<T, S>(serial: &S, spec: &FieldSpec, raw: Raw<'_>) -> Result<T, DispatchError>
where
    T: DeserializeOwned,
    S: Serial,
{
    serial.deserialize(raw).map_err(|err| {
        tracing::debug!(
            field = spec.field,
            target = short_type_name::<T>(),
            error = %err,
            "coercion failed"
        );
        DispatchError::coercion(spec.source, spec.name, err)
    })
}

/// Coerces the declared default of a field, if it has one.
///
/// The default text takes the same path as a single request value, so
/// `"a,b"` fills a sequence field with two items.
pub fn coerce_default<T, S>(serial: &S, spec: &FieldSpec) -> Result<Option<T>, DispatchError>
where
    T: DeserializeOwned,
    S: Serial,
{
    spec.default
        .map(|default| coerce(serial, spec, Raw::Text(default)))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{SourceKind, TextSerial};

    #[test]
    fn test_coercion_error_names_field() {
        let spec = FieldSpec::new("limit", SourceKind::Query, "limit", None);
        let values = vec!["ten".to_string()];

        let err = coerce::<u32, _>(&TextSerial, &spec, Raw::Values(&values)).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
        assert!(err.to_string().contains("query parameter 'limit'"));
    }

    #[test]
    fn test_default_takes_text_path() {
        let spec = FieldSpec::new("tags", SourceKind::Query, "tags", Some("a,b"));
        let tags: Option<Vec<String>> = coerce_default(&TextSerial, &spec).unwrap();
        assert_eq!(tags.unwrap(), ["a", "b"]);

        let none = FieldSpec::new("page", SourceKind::Query, "page", None);
        assert_eq!(coerce_default::<u32, _>(&TextSerial, &none).unwrap(), None);
    }

    #[test]
    fn test_bad_default_is_a_coercion_error() {
        let spec = FieldSpec::new("page", SourceKind::Query, "page", Some("first"));
        assert!(coerce_default::<u32, _>(&TextSerial, &spec).is_err());
    }
}
