//! The dispatcher: runs one handler for one request.

use crate::handler::Handler;
use crate::outcome::Outcome;
use crate::plan::{ParamPlan, Planner};
use crate::record::Assembler;
use crate::resolve::{BodyMismatch, Resolver};
use crate::routes::Routes;
use crate::values::ValueStore;
use heron_config::BindingConfig;
use heron_core::{
    DispatchError, Exchange, JsonResponder, NoopValidator, RequestContext, Responder, Serial,
    TextSerial, Validator,
};
use heron_telemetry::metrics;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// How one dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// The request was already aborted. Nothing ran.
    Aborted,
    /// Capturing request data or planning arguments failed. The responder
    /// received the error.
    PlanFailed,
    /// The handler returned nothing and was assumed to have replied itself.
    Silent,
    /// The responder received the handler's outcome.
    Responded,
}

impl Dispatched {
    /// Returns the metric label for this result.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aborted => "aborted",
            Self::PlanFailed => "plan_failed",
            Self::Silent => "silent",
            Self::Responded => "responded",
        }
    }
}

struct Shared<S> {
    serial: S,
    validator: Arc<dyn Validator>,
    validate: bool,
    body_mismatch: BodyMismatch,
    responder: Arc<dyn Responder>,
}

impl<S: Serial> Shared<S> {
    fn dispatch<H, Args>(&self, endpoint: &'static str, handler: &H, exchange: &Exchange) -> Dispatched
    where
        H: Handler<Args>,
    {
        if exchange.is_aborted() {
            tracing::debug!(endpoint, "request aborted, skipping handler");
            metrics::record_skipped(Dispatched::Aborted.as_str());
            return Dispatched::Aborted;
        }

        let started = Instant::now();
        let context = Arc::new(RequestContext::new(exchange.clone()).with_endpoint(endpoint));
        let span = tracing::debug_span!(
            "dispatch",
            request_id = %context.request_id(),
            endpoint,
            method = %exchange.method(),
            path = exchange.path(),
        );
        let _enter = span.enter();

        let result = match self.plan_and_invoke::<H, Args>(&context, handler) {
            Ok(outcome) => self.respond(exchange, outcome),
            Err(err) => {
                tracing::debug!(error = %err, code = err.error_code(), "planning failed");
                self.responder.respond(exchange, None, Some(&err));
                Dispatched::PlanFailed
            }
        };

        metrics::record_dispatch(result.as_str(), started.elapsed());
        result
    }

    fn plan_and_invoke<H, Args>(
        &self,
        context: &Arc<RequestContext>,
        handler: &H,
    ) -> Result<Outcome, DispatchError>
    where
        H: Handler<Args>,
    {
        let exchange = context.exchange();
        let store = ValueStore::capture(exchange)?;
        let resolver = Resolver::new(exchange, &store, self.body_mismatch);
        let validator = self.validate.then_some(&*self.validator);
        let planner = Planner::new(context, Assembler::new(resolver, &self.serial), validator);
        handler.invoke(&planner)
    }

    fn respond(&self, exchange: &Exchange, outcome: Outcome) -> Dispatched {
        if outcome.is_silent() {
            tracing::debug!("handler returned nothing, no response written");
            return Dispatched::Silent;
        }

        let (data, error) = outcome.into_parts();
        if let Some(err) = &error {
            tracing::warn!(error = %err, code = err.error_code(), "handler returned an error");
        }
        self.responder.respond(exchange, data, error.as_ref());
        Dispatched::Responded
    }
}

/// Binds requests to handlers and writes their responses.
///
/// A dispatcher is configured once and cheaply cloned; every endpoint it
/// creates shares its serializer, validator and responder.
///
/// # Example
///
/// ```rust
/// use heron_bind::{Dispatched, Dispatcher};
/// use heron_core::Exchange;
///
/// let dispatcher = Dispatcher::new();
/// let hello = dispatcher.endpoint(|| "hello");
///
/// let exchange = Exchange::builder().build();
/// assert_eq!(hello.call(&exchange), Dispatched::Responded);
/// assert_eq!(exchange.take_reply().unwrap().text(), Some("\"hello\""));
/// ```
pub struct Dispatcher<S = TextSerial> {
    shared: Arc<Shared<S>>,
}

impl Dispatcher<TextSerial> {
    /// Creates a dispatcher with the default collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a builder with the default collaborators.
    #[must_use]
    pub fn builder() -> DispatcherBuilder<TextSerial> {
        DispatcherBuilder::new()
    }
}

impl Default for Dispatcher<TextSerial> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("serial", &std::any::type_name::<S>())
            .field("validate", &self.shared.validate)
            .field("body_mismatch", &self.shared.body_mismatch)
            .finish_non_exhaustive()
    }
}

impl<S: Serial> Dispatcher<S> {
    /// Registers a handler under its type name.
    pub fn endpoint<H, Args>(&self, handler: H) -> Endpoint
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.named_endpoint(std::any::type_name::<H>(), handler)
    }

    /// Registers a handler under an explicit name.
    ///
    /// The parameter plan is computed here, once.
    pub fn named_endpoint<H, Args>(&self, name: &'static str, handler: H) -> Endpoint
    where
        H: Handler<Args>,
        Args: 'static,
    {
        let plans: Arc<[ParamPlan]> = H::signature().into();
        tracing::debug!(endpoint = name, params = plans.len(), "registered endpoint");

        let shared = Arc::clone(&self.shared);
        Endpoint {
            name,
            plans,
            call: Arc::new(move |exchange: &Exchange| shared.dispatch::<H, Args>(name, &handler, exchange)),
        }
    }

    /// Runs an endpoint for one request.
    pub fn dispatch(&self, endpoint: &Endpoint, exchange: &Exchange) -> Dispatched {
        endpoint.call(exchange)
    }

    /// Returns a route registration builder bound to this dispatcher.
    #[must_use]
    pub fn routes(&self) -> Routes<S> {
        Routes::new(self.clone())
    }

    /// Returns `true` if records are validated before the handler runs.
    #[must_use]
    pub fn validates(&self) -> bool {
        self.shared.validate
    }

    /// Returns the body mismatch policy.
    #[must_use]
    pub fn body_mismatch(&self) -> BodyMismatch {
        self.shared.body_mismatch
    }
}

/// A registered handler with its cached parameter plan.
#[derive(Clone)]
pub struct Endpoint {
    name: &'static str,
    plans: Arc<[ParamPlan]>,
    call: Arc<dyn Fn(&Exchange) -> Dispatched + Send + Sync>,
}

impl Endpoint {
    /// Returns the endpoint name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the parameter plan.
    #[must_use]
    pub fn signature(&self) -> &[ParamPlan] {
        &self.plans
    }

    /// Dispatches one request to the handler.
    pub fn call(&self, exchange: &Exchange) -> Dispatched {
        (self.call)(exchange)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("plans", &self.plans)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Dispatcher`].
///
/// ```rust
/// use heron_bind::{BodyMismatch, Dispatcher};
/// use heron_core::{Schema, SchemaValidator};
///
/// let dispatcher = Dispatcher::builder()
///     .validator(SchemaValidator::new().register("Search", Schema::object([])))
///     .body_mismatch(BodyMismatch::Reject)
///     .build();
///
/// assert!(dispatcher.validates());
/// assert_eq!(dispatcher.body_mismatch(), BodyMismatch::Reject);
/// ```
pub struct DispatcherBuilder<S = TextSerial> {
    serial: S,
    validator: Arc<dyn Validator>,
    validate: bool,
    body_mismatch: BodyMismatch,
    responder: Arc<dyn Responder>,
}

impl DispatcherBuilder<TextSerial> {
    /// Creates a builder with `TextSerial`, `NoopValidator` and
    /// `JsonResponder`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            serial: TextSerial,
            validator: Arc::new(NoopValidator),
            validate: true,
            body_mismatch: BodyMismatch::default(),
            responder: Arc::new(JsonResponder),
        }
    }
}

impl Default for DispatcherBuilder<TextSerial> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Serial> DispatcherBuilder<S> {
    /// Sets the serializer.
    pub fn serial<T: Serial>(self, serial: T) -> DispatcherBuilder<T> {
        DispatcherBuilder {
            serial,
            validator: self.validator,
            validate: self.validate,
            body_mismatch: self.body_mismatch,
            responder: self.responder,
        }
    }

    /// Sets the validator.
    pub fn validator(mut self, validator: impl Validator) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Turns record validation off (or back on).
    pub fn disable_validation(mut self, disable: bool) -> Self {
        self.validate = !disable;
        self
    }

    /// Sets the body mismatch policy.
    pub fn body_mismatch(mut self, policy: BodyMismatch) -> Self {
        self.body_mismatch = policy;
        self
    }

    /// Sets the responder.
    pub fn responder(mut self, responder: impl Responder) -> Self {
        self.responder = Arc::new(responder);
        self
    }

    /// Applies loaded binding configuration.
    pub fn configure(self, config: &BindingConfig) -> Self {
        let policy = if config.reject_ambiguous_body {
            BodyMismatch::Reject
        } else {
            BodyMismatch::Ignore
        };
        self.disable_validation(config.disable_validation)
            .body_mismatch(policy)
    }

    /// Builds the dispatcher.
    pub fn build(self) -> Dispatcher<S> {
        tracing::debug!(
            serial = std::any::type_name::<S>(),
            validate = self.validate,
            body_mismatch = ?self.body_mismatch,
            "dispatcher configured"
        );
        Dispatcher {
            shared: Arc::new(Shared {
                serial: self.serial,
                validator: self.validator,
                validate: self.validate,
                body_mismatch: self.body_mismatch,
                responder: self.responder,
            }),
        }
    }
}
