//! A small JSON schema engine used by [`SchemaValidator`](crate::SchemaValidator).
//!
//! Records are validated through their JSON view, so one schema language
//! covers every record type. Supported constraints:
//!
//! - string length bounds
//! - integer and number ranges
//! - array item schema and item count bounds
//! - object properties, with required properties
//! - `required` on any schema (rejects `null`)
//!
//! # Example
//!
//! ```
//! use heron_core::schema::Schema;
//!
//! let schema = Schema::object([
//!     ("name", Schema::string().min_length(1).required()),
//!     ("age", Schema::integer().minimum(0)),
//! ]);
//!
//! assert!(schema.validate(&serde_json::json!({"name": "Ada", "age": 36})).is_ok());
//!
//! let err = schema.validate(&serde_json::json!({"name": "", "age": 36})).unwrap_err();
//! assert_eq!(err.path(), "$.name");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A schema for one JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Whether `null` (an absent optional) is rejected.
    #[serde(default)]
    pub required: bool,
    /// The shape of the value.
    #[serde(flatten)]
    pub kind: SchemaKind,
}

/// The shape constraints of a [`Schema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaKind {
    /// A string.
    String {
        /// Minimum length in characters.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        /// Maximum length in characters.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    /// An integer.
    Integer {
        /// Inclusive lower bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
        /// Inclusive upper bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<i64>,
    },
    /// Any number.
    Number {
        /// Inclusive lower bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        /// Inclusive upper bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    /// A boolean.
    Boolean,
    /// An array whose items all match `items`.
    Array {
        /// Schema of every item.
        items: Box<Schema>,
        /// Minimum number of items.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        /// Maximum number of items.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
    /// An object. Unlisted properties are allowed.
    Object {
        /// Property schemas by name.
        #[serde(default)]
        properties: BTreeMap<String, Schema>,
    },
    /// Anything.
    Any,
    /// Only `null`.
    Null,
}

impl Schema {
    const fn of(kind: SchemaKind) -> Self {
        Self {
            required: false,
            kind,
        }
    }

    /// Creates a string schema.
    #[must_use]
    pub const fn string() -> Self {
        Self::of(SchemaKind::String {
            min_length: None,
            max_length: None,
        })
    }

    /// Creates an integer schema.
    #[must_use]
    pub const fn integer() -> Self {
        Self::of(SchemaKind::Integer {
            minimum: None,
            maximum: None,
        })
    }

    /// Creates a number schema.
    #[must_use]
    pub const fn number() -> Self {
        Self::of(SchemaKind::Number {
            minimum: None,
            maximum: None,
        })
    }

    /// Creates a boolean schema.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    /// Creates an array schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self::of(SchemaKind::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        })
    }

    /// Creates an object schema from `(name, schema)` pairs.
    ///
    /// A property whose schema is [`required`](Self::required) must be
    /// present and non-null.
    #[must_use]
    pub fn object<'a>(properties: impl IntoIterator<Item = (&'a str, Schema)>) -> Self {
        Self::of(SchemaKind::Object {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.to_string(), schema))
                .collect(),
        })
    }

    /// Creates a schema accepting any value.
    #[must_use]
    pub const fn any() -> Self {
        Self::of(SchemaKind::Any)
    }

    /// Creates a schema accepting only `null`.
    #[must_use]
    pub const fn null() -> Self {
        Self::of(SchemaKind::Null)
    }

    /// Marks the schema as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the minimum length of a string schema. No effect on other kinds.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        if let SchemaKind::String { min_length, .. } = &mut self.kind {
            *min_length = Some(len);
        }
        self
    }

    /// Sets the maximum length of a string schema. No effect on other kinds.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        if let SchemaKind::String { max_length, .. } = &mut self.kind {
            *max_length = Some(len);
        }
        self
    }

    /// Sets the lower bound of an integer or number schema.
    #[must_use]
    pub fn minimum(mut self, min: i64) -> Self {
        match &mut self.kind {
            SchemaKind::Integer { minimum, .. } => *minimum = Some(min),
            #[allow(clippy::cast_precision_loss)]
            SchemaKind::Number { minimum, .. } => *minimum = Some(min as f64),
            _ => {}
        }
        self
    }

    /// Sets the upper bound of an integer or number schema.
    #[must_use]
    pub fn maximum(mut self, max: i64) -> Self {
        match &mut self.kind {
            SchemaKind::Integer { maximum, .. } => *maximum = Some(max),
            #[allow(clippy::cast_precision_loss)]
            SchemaKind::Number { maximum, .. } => *maximum = Some(max as f64),
            _ => {}
        }
        self
    }

    /// Sets the minimum item count of an array schema.
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        if let SchemaKind::Array { min_items, .. } = &mut self.kind {
            *min_items = Some(min);
        }
        self
    }

    /// Sets the maximum item count of an array schema.
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        if let SchemaKind::Array { max_items, .. } = &mut self.kind {
            *max_items = Some(max);
        }
        self
    }

    /// Validates a JSON value, reporting the first violation.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.validate_at(value, "$")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<(), ValidationError> {
        if value.is_null() {
            if self.required {
                return Err(ValidationError::new(path, "required field is null"));
            }
            return Ok(());
        }

        match &self.kind {
            SchemaKind::String {
                min_length,
                max_length,
            } => {
                let s = value.as_str().ok_or_else(|| mismatch(path, "string", value))?;
                let len = s.chars().count();
                if let Some(min) = min_length.filter(|min| len < *min) {
                    return Err(ValidationError::new(
                        path,
                        format!("string length {len} is less than minimum {min}"),
                    ));
                }
                if let Some(max) = max_length.filter(|max| len > *max) {
                    return Err(ValidationError::new(
                        path,
                        format!("string length {len} is greater than maximum {max}"),
                    ));
                }
                Ok(())
            }

            SchemaKind::Integer { minimum, maximum } => {
                let n = value.as_i64().ok_or_else(|| mismatch(path, "integer", value))?;
                check_range(path, n, *minimum, *maximum)
            }

            SchemaKind::Number { minimum, maximum } => {
                let n = value.as_f64().ok_or_else(|| mismatch(path, "number", value))?;
                check_range(path, n, *minimum, *maximum)
            }

            SchemaKind::Boolean => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(mismatch(path, "boolean", value))
                }
            }

            SchemaKind::Array {
                items,
                min_items,
                max_items,
            } => {
                let arr = value.as_array().ok_or_else(|| mismatch(path, "array", value))?;
                if let Some(min) = min_items.filter(|min| arr.len() < *min) {
                    return Err(ValidationError::new(
                        path,
                        format!("array length {} is less than minimum {min}", arr.len()),
                    ));
                }
                if let Some(max) = max_items.filter(|max| arr.len() > *max) {
                    return Err(ValidationError::new(
                        path,
                        format!("array length {} is greater than maximum {max}", arr.len()),
                    ));
                }
                arr.iter()
                    .enumerate()
                    .try_for_each(|(idx, item)| items.validate_at(item, &format!("{path}[{idx}]")))
            }

            SchemaKind::Object { properties } => {
                let obj = value.as_object().ok_or_else(|| mismatch(path, "object", value))?;
                for (key, schema) in properties {
                    let prop_path = format!("{path}.{key}");
                    match obj.get(key) {
                        Some(prop) => schema.validate_at(prop, &prop_path)?,
                        None if schema.required => {
                            return Err(ValidationError::new(
                                prop_path,
                                format!("missing required property '{key}'"),
                            ))
                        }
                        None => {}
                    }
                }
                Ok(())
            }

            SchemaKind::Any => Ok(()),

            SchemaKind::Null => Err(mismatch(path, "null", value)),
        }
    }
}

fn check_range<T>(path: &str, n: T, minimum: Option<T>, maximum: Option<T>) -> Result<(), ValidationError>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if let Some(min) = minimum.filter(|min| n < *min) {
        return Err(ValidationError::new(
            path,
            format!("value {n} is less than minimum {min}"),
        ));
    }
    if let Some(max) = maximum.filter(|max| n > *max) {
        return Err(ValidationError::new(
            path,
            format!("value {n} is greater than maximum {max}"),
        ));
    }
    Ok(())
}

fn mismatch(path: &str, expected: &str, value: &Value) -> ValidationError {
    ValidationError::new(path, format!("expected {expected}, got {}", type_name(value)))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A validation failure: where it happened and what went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    path: String,
    message: String,
}

impl ValidationError {
    /// Creates a validation error at a JSON path (`$` is the root).
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the JSON path of the offending value.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation error at '{}': {}", self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_bounds() {
        let schema = Schema::string().min_length(2).max_length(4);

        assert!(schema.validate(&json!("abc")).is_ok());
        assert!(schema.validate(&json!("a")).is_err());
        assert!(schema.validate(&json!("abcde")).is_err());
        assert!(schema.validate(&json!(3)).is_err());
        // Length counts characters, not bytes.
        assert!(schema.validate(&json!("éé")).is_ok());
    }

    #[test]
    fn test_required_rejects_null() {
        assert!(Schema::string().validate(&json!(null)).is_ok());

        let err = Schema::string().required().validate(&json!(null)).unwrap_err();
        assert_eq!(err.path(), "$");
        assert_eq!(err.message(), "required field is null");
    }

    #[test]
    fn test_integer_range() {
        let schema = Schema::integer().minimum(0).maximum(100);

        assert!(schema.validate(&json!(50)).is_ok());
        assert!(schema.validate(&json!(-1)).is_err());
        assert!(schema.validate(&json!(101)).is_err());
        assert!(schema.validate(&json!(1.5)).is_err());
    }

    #[test]
    fn test_number_range() {
        let schema = Schema::number().minimum(1);

        assert!(schema.validate(&json!(1.5)).is_ok());
        assert!(schema.validate(&json!(0.5)).is_err());
    }

    #[test]
    fn test_array_items() {
        let schema = Schema::array(Schema::integer().minimum(0))
            .min_items(1)
            .max_items(3);

        assert!(schema.validate(&json!([1, 2])).is_ok());
        assert!(schema.validate(&json!([])).is_err());
        assert!(schema.validate(&json!([1, 2, 3, 4])).is_err());

        let err = schema.validate(&json!([1, -2])).unwrap_err();
        assert_eq!(err.path(), "$[1]");
    }

    #[test]
    fn test_object_properties() {
        let schema = Schema::object([
            ("name", Schema::string().required()),
            ("tags", Schema::array(Schema::string())),
        ]);

        assert!(schema.validate(&json!({"name": "x", "extra": 1})).is_ok());

        let err = schema.validate(&json!({"tags": []})).unwrap_err();
        assert_eq!(err.path(), "$.name");
        assert!(err.message().contains("missing required property"));

        let err = schema.validate(&json!({"name": "x", "tags": [1]})).unwrap_err();
        assert_eq!(err.path(), "$.tags[0]");
    }

    #[test]
    fn test_any_and_null() {
        assert!(Schema::any().validate(&json!({"a": [1]})).is_ok());
        assert!(Schema::null().validate(&json!(null)).is_ok());
        assert!(Schema::null().validate(&json!(false)).is_err());
    }

    #[test]
    fn test_schema_from_json() {
        let schema: Schema = serde_json::from_value(json!({
            "type": "object",
            "properties": {
                "q": {"type": "string", "required": true, "min_length": 1}
            }
        }))
        .unwrap();

        assert!(schema.validate(&json!({"q": "rust"})).is_ok());
        assert!(schema.validate(&json!({"q": ""})).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::new("$.age", "value -1 is less than minimum 0");
        assert_eq!(
            err.to_string(),
            "validation error at '$.age': value -1 is less than minimum 0"
        );
    }
}
