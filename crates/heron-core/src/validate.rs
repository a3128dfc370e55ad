//! Record validation.

use crate::schema::{Schema, ValidationError};
use serde_json::Value;
use std::collections::HashMap;

/// The validator capability.
///
/// Called with the name of an assembled record and its JSON view. Shared by
/// every request of a dispatcher.
pub trait Validator: Send + Sync + 'static {
    /// Validates one assembled record.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    fn validate(&self, record: &str, value: &Value) -> Result<(), ValidationError>;

    /// Returns `false` when [`validate`](Self::validate) would accept any
    /// view of `record`. The dispatcher skips building the JSON view then.
    fn covers(&self, _record: &str) -> bool {
        true
    }
}

/// A validator that accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopValidator;

impl Validator for NoopValidator {
    fn validate(&self, _record: &str, _value: &Value) -> Result<(), ValidationError> {
        Ok(())
    }

    fn covers(&self, _record: &str) -> bool {
        false
    }
}

/// A validator holding one [`Schema`] per record name.
///
/// Records without a registered schema are accepted.
///
/// # Example
///
/// ```
/// use heron_core::{Schema, SchemaValidator, Validator};
/// use serde_json::json;
///
/// let validator = SchemaValidator::new()
///     .register("Search", Schema::object([("q", Schema::string().min_length(1))]));
///
/// assert!(validator.validate("Search", &json!({"q": "rust"})).is_ok());
/// assert!(validator.validate("Search", &json!({"q": ""})).is_err());
/// assert!(validator.validate("Other", &json!({"q": ""})).is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    schemas: HashMap<String, Schema>,
}

impl SchemaValidator {
    /// Creates an empty validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the schema for a record name, replacing any previous one.
    #[must_use]
    pub fn register(mut self, record: impl Into<String>, schema: Schema) -> Self {
        self.schemas.insert(record.into(), schema);
        self
    }

    /// Returns the schema registered for a record name.
    #[must_use]
    pub fn schema(&self, record: &str) -> Option<&Schema> {
        self.schemas.get(record)
    }

    /// Returns the number of registered schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if no schema is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl Validator for SchemaValidator {
    fn validate(&self, record: &str, value: &Value) -> Result<(), ValidationError> {
        match self.schemas.get(record) {
            Some(schema) => schema.validate(value),
            None => Ok(()),
        }
    }

    fn covers(&self, record: &str) -> bool {
        self.schemas.contains_key(record)
    }
}

impl<V: Validator + ?Sized> Validator for std::sync::Arc<V> {
    fn validate(&self, record: &str, value: &Value) -> Result<(), ValidationError> {
        (**self).validate(record, value)
    }

    fn covers(&self, record: &str) -> bool {
        (**self).covers(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_noop_accepts_everything() {
        assert!(NoopValidator.validate("Anything", &json!(null)).is_ok());
        assert!(!NoopValidator.covers("Anything"));
    }

    #[test]
    fn test_covers_registered_records() {
        let validator: Arc<dyn Validator> = Arc::new(
            SchemaValidator::new().register("Signup", Schema::object([("age", Schema::integer())])),
        );
        assert!(validator.covers("Signup"));
        assert!(!validator.covers("Login"));
    }

    #[test]
    fn test_schema_validator_reports_path() {
        let validator = SchemaValidator::new().register(
            "Signup",
            Schema::object([("age", Schema::integer().minimum(18).required())]),
        );

        let err = validator.validate("Signup", &json!({"age": 12})).unwrap_err();
        assert_eq!(err.path(), "$.age");
        assert_eq!(validator.len(), 1);
        assert!(validator.schema("Signup").is_some());
    }

    #[test]
    fn test_register_replaces() {
        let validator = SchemaValidator::new()
            .register("R", Schema::null())
            .register("R", Schema::any());

        assert_eq!(validator.len(), 1);
        assert!(validator.validate("R", &json!(1)).is_ok());
    }

    #[test]
    fn test_shared_validator() {
        let validator: Arc<dyn Validator> =
            Arc::new(SchemaValidator::new().register("R", Schema::boolean()));

        assert!(validator.validate("R", &json!("no")).is_err());
        assert!(SchemaValidator::new().is_empty());
    }
}
