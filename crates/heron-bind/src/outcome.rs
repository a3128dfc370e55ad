//! Handler outcomes.

use heron_core::{BoxError, DispatchError};
use serde::Serialize;
use serde_json::Value;

/// What a handler produced: a data slot and an error slot.
///
/// A *silent* outcome means the handler wrote its own reply and the
/// responder must not run.
///
/// # Example
///
/// ```rust
/// use heron_bind::Outcome;
///
/// let outcome = Outcome::ok("ok");
/// assert_eq!(outcome.data(), Some(&serde_json::json!("ok")));
/// assert!(outcome.error().is_none());
///
/// let outcome = Outcome::failed("user not found");
/// assert_eq!(outcome.error().unwrap().to_string(), "user not found");
/// ```
#[derive(Debug, Default)]
pub struct Outcome {
    data: Option<Value>,
    error: Option<DispatchError>,
    silent: bool,
}

impl Outcome {
    /// Creates an outcome from both slots.
    #[must_use]
    pub fn new(data: Option<Value>, error: Option<DispatchError>) -> Self {
        Self {
            data,
            error,
            silent: false,
        }
    }

    /// Creates an outcome carrying data.
    ///
    /// Data that cannot be represented as JSON becomes a
    /// [`DispatchError::Payload`] error.
    #[must_use]
    pub fn ok(data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self::new(Some(value), None),
            Err(err) => Self::new(None, Some(DispatchError::Payload(err))),
        }
    }

    /// Creates an outcome carrying an error.
    #[must_use]
    pub fn failed(error: impl Into<BoxError>) -> Self {
        Self::new(None, Some(DispatchError::handler(error)))
    }

    /// Creates an outcome with neither data nor error.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a silent outcome.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }

    /// Returns the data slot.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Returns the error slot.
    #[must_use]
    pub fn error(&self) -> Option<&DispatchError> {
        self.error.as_ref()
    }

    /// Returns `true` if the responder must not run.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        self.silent
    }

    /// Splits the outcome into its two slots.
    #[must_use]
    pub fn into_parts(self) -> (Option<Value>, Option<DispatchError>) {
        (self.data, self.error)
    }
}

/// Converts a handler's return value into an [`Outcome`].
pub trait IntoOutcome {
    /// Performs the conversion.
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome {
        self
    }
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Outcome {
        Outcome::silent()
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: Serialize,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(data) => Outcome::ok(data),
            Err(err) => Outcome::failed(err),
        }
    }
}

impl<T: Serialize> IntoOutcome for Option<T> {
    fn into_outcome(self) -> Outcome {
        match self {
            Some(data) => Outcome::ok(data),
            None => Outcome::empty(),
        }
    }
}

impl IntoOutcome for Value {
    fn into_outcome(self) -> Outcome {
        Outcome::new(Some(self), None)
    }
}

impl IntoOutcome for String {
    fn into_outcome(self) -> Outcome {
        Outcome::new(Some(Value::String(self)), None)
    }
}

impl IntoOutcome for &'static str {
    fn into_outcome(self) -> Outcome {
        Outcome::new(Some(Value::from(self)), None)
    }
}
