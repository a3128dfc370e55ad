//! Argument planning: producing handler arguments from one request.

use crate::record::{Assembler, Record};
use heron_core::{DispatchError, Exchange, ExchangeSnapshot, RequestContext, Serial, Validator};
use serde::Serialize;
use std::sync::Arc;

/// What a handler parameter is bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// The per-request [`RequestContext`].
    Context,
    /// The transport object.
    Transport,
    /// A user record.
    Record,
}

/// The cached binding plan of one handler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamPlan {
    /// Zero-based parameter position.
    pub position: usize,
    /// What the parameter is bound from.
    pub kind: ParamKind,
    /// Whether the handler receives a shared or boxed value rather than its
    /// own copy.
    pub by_ref: bool,
    /// The parameter's type name.
    pub type_name: &'static str,
}

impl ParamPlan {
    /// Describes the parameter type `P` at `position`.
    #[must_use]
    pub fn of<P: Param>(position: usize) -> Self {
        Self {
            position,
            kind: P::KIND,
            by_ref: P::BY_REF,
            type_name: std::any::type_name::<P>(),
        }
    }
}

/// A type that can be a handler parameter.
///
/// Implemented for the request context, the transport object and, through
/// `#[derive(Record)]`, for every record `R` and `Box<R>`. Scalars are not
/// parameters.
pub trait Param: Sized {
    /// What the parameter is bound from.
    const KIND: ParamKind;

    /// Whether the parameter is passed by reference.
    const BY_REF: bool;

    /// Produces the argument for one request.
    fn provide<S: Serial>(planner: &Planner<'_, S>) -> Result<Self, DispatchError>;
}

/// Produces handler arguments for one request.
pub struct Planner<'r, S> {
    context: &'r Arc<RequestContext>,
    assembler: Assembler<'r, S>,
    validator: Option<&'r dyn Validator>,
}

impl<'r, S: Serial> Planner<'r, S> {
    /// Creates a planner. Records are validated unless `validator` is `None`.
    #[must_use]
    pub fn new(
        context: &'r Arc<RequestContext>,
        assembler: Assembler<'r, S>,
        validator: Option<&'r dyn Validator>,
    ) -> Self {
        Self {
            context,
            assembler,
            validator,
        }
    }

    /// Returns the request context.
    #[must_use]
    pub fn context(&self) -> &'r Arc<RequestContext> {
        self.context
    }

    /// Returns the transport object.
    #[must_use]
    pub fn exchange(&self) -> &'r Exchange {
        self.context.exchange()
    }

    /// Assembles and validates a record.
    ///
    /// The JSON view is only built when the validator covers `R`.
    ///
    /// # Errors
    ///
    /// Returns the first binding failure, or the validation failure.
    pub fn record<R>(&self) -> Result<R, DispatchError>
    where
        R: Record + Serialize,
    {
        let record: R = self.assembler.assemble()?;
        if let Some(validator) = self.validator.filter(|v| v.covers(R::NAME)) {
            let view = serde_json::to_value(&record).map_err(DispatchError::Payload)?;
            if let Err(err) = validator.validate(R::NAME, &view) {
                tracing::debug!(record = R::NAME, error = %err, "record failed validation");
                heron_telemetry::metrics::record_validation_failure(R::NAME);
                return Err(err.into());
            }
        }
        Ok(record)
    }
}

impl Param for RequestContext {
    const KIND: ParamKind = ParamKind::Context;
    const BY_REF: bool = false;

    fn provide<S: Serial>(planner: &Planner<'_, S>) -> Result<Self, DispatchError> {
        Ok(RequestContext::clone(planner.context()))
    }
}

impl Param for Arc<RequestContext> {
    const KIND: ParamKind = ParamKind::Context;
    const BY_REF: bool = true;

    fn provide<S: Serial>(planner: &Planner<'_, S>) -> Result<Self, DispatchError> {
        Ok(Arc::clone(planner.context()))
    }
}

impl Param for Exchange {
    const KIND: ParamKind = ParamKind::Transport;
    const BY_REF: bool = true;

    fn provide<S: Serial>(planner: &Planner<'_, S>) -> Result<Self, DispatchError> {
        Ok(planner.exchange().clone())
    }
}

impl Param for ExchangeSnapshot {
    const KIND: ParamKind = ParamKind::Transport;
    const BY_REF: bool = false;

    fn provide<S: Serial>(planner: &Planner<'_, S>) -> Result<Self, DispatchError> {
        planner.exchange().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{BodyMismatch, FieldSpec, Resolver};
    use crate::values::ValueStore;
    use heron_core::{NoopValidator, Schema, SchemaValidator, SourceKind, TextSerial};
    use http::Uri;

    #[derive(Debug, Default, Serialize)]
    struct Login {
        user: String,
    }

    impl Record for Login {
        const NAME: &'static str = "Login";
        const FIELDS: &'static [FieldSpec] =
            &[FieldSpec::new("user", SourceKind::Query, "user", None)];

        fn assemble<S: Serial>(a: &Assembler<'_, S>) -> Result<Self, DispatchError> {
            Ok(Self {
                user: a.bind(&Self::FIELDS[0])?,
            })
        }
    }

    fn validator() -> SchemaValidator {
        SchemaValidator::new().register(
            "Login",
            Schema::object([("user", Schema::string().min_length(1))]),
        )
    }

    fn with_planner<T>(
        uri: &'static str,
        validator: Option<&dyn Validator>,
        f: impl FnOnce(&Planner<'_, TextSerial>) -> T,
    ) -> T {
        let exchange = Exchange::builder().uri(Uri::from_static(uri)).body("raw").build();
        let context = Arc::new(RequestContext::new(exchange.clone()));
        let store = ValueStore::capture(&exchange).unwrap();
        let assembler = Assembler::new(
            Resolver::new(&exchange, &store, BodyMismatch::Ignore),
            &TextSerial,
        );
        f(&Planner::new(&context, assembler, validator))
    }

    #[test]
    fn test_param_plans() {
        let plan = ParamPlan::of::<Arc<RequestContext>>(2);
        assert_eq!(plan.position, 2);
        assert_eq!(plan.kind, ParamKind::Context);
        assert!(plan.by_ref);

        let plan = ParamPlan::of::<ExchangeSnapshot>(0);
        assert_eq!(plan.kind, ParamKind::Transport);
        assert!(!plan.by_ref);
        assert!(plan.type_name.ends_with("ExchangeSnapshot"));
    }

    #[test]
    fn test_context_and_transport_params() {
        with_planner("/", None, |planner| {
            let ctx = RequestContext::provide(planner).unwrap();
            let shared = <Arc<RequestContext>>::provide(planner).unwrap();
            assert_eq!(ctx.request_id(), shared.request_id());

            let exchange = Exchange::provide(planner).unwrap();
            exchange.abort();
            assert!(planner.exchange().is_aborted());

            let snapshot = ExchangeSnapshot::provide(planner).unwrap();
            assert_eq!(snapshot.body().as_ref(), b"raw");
        });
    }

    #[test]
    fn test_record_is_validated() {
        let validator = validator();

        with_planner("/?user=ada", Some(&validator), |planner| {
            assert_eq!(planner.record::<Login>().unwrap().user, "ada");
        });

        with_planner("/", Some(&validator), |planner| {
            let err = planner.record::<Login>().unwrap_err();
            assert_eq!(err.error_code(), "VALIDATION_FAILED");
        });
    }

    #[derive(Debug, Default)]
    struct Opaque;

    impl Serialize for Opaque {
        fn serialize<Z: serde::Serializer>(&self, _: Z) -> Result<Z::Ok, Z::Error> {
            Err(serde::ser::Error::custom("opaque records have no JSON view"))
        }
    }

    impl Record for Opaque {
        const NAME: &'static str = "Opaque";
        const FIELDS: &'static [FieldSpec] = &[];

        fn assemble<S: Serial>(_: &Assembler<'_, S>) -> Result<Self, DispatchError> {
            Ok(Self)
        }
    }

    #[test]
    fn test_view_built_only_for_covered_records() {
        with_planner("/", Some(&NoopValidator), |planner| {
            assert!(planner.record::<Opaque>().is_ok());
        });

        let uncovered = validator();
        with_planner("/", Some(&uncovered), |planner| {
            assert!(planner.record::<Opaque>().is_ok());
        });

        let covered = SchemaValidator::new().register("Opaque", Schema::any());
        with_planner("/", Some(&covered), |planner| {
            let err = planner.record::<Opaque>().unwrap_err();
            assert_eq!(err.error_code(), "PAYLOAD_ENCODING_FAILED");
        });
    }

    #[test]
    fn test_validation_can_be_skipped() {
        with_planner("/", None, |planner| {
            assert_eq!(planner.record::<Login>().unwrap().user, "");
        });
    }
}
