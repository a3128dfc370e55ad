//! The handler protocol.
//!
//! Any `Fn` of up to eight [`Param`] arguments whose return type implements
//! [`IntoOutcome`] is a handler. Its parameter plan is computed once, when
//! the handler is registered.

use crate::outcome::{IntoOutcome, Outcome};
use crate::plan::{Param, ParamPlan, Planner};
use heron_core::{DispatchError, Serial};

/// A function the dispatcher can call with planned arguments.
///
/// `Args` is the tuple of parameter types; it only disambiguates the
/// implementations for different arities.
pub trait Handler<Args>: Send + Sync + 'static {
    /// Describes every parameter, in order.
    fn signature() -> Vec<ParamPlan>;

    /// Plans the arguments in order and calls the function.
    ///
    /// # Errors
    ///
    /// Returns the first planning failure. The function is not called then.
    fn invoke<S: Serial>(&self, planner: &Planner<'_, S>) -> Result<Outcome, DispatchError>;
}

macro_rules! impl_handler_for_fn ({ $($param:ident)* } => {
    impl<Func, Ret, $($param,)*> Handler<($($param,)*)> for Func
    where
        Func: Fn($($param),*) -> Ret + Send + Sync + 'static,
        Ret: IntoOutcome,
        $($param: Param,)*
    {
        fn signature() -> Vec<ParamPlan> {
            let mut plans: Vec<ParamPlan> = vec![$(ParamPlan::of::<$param>(0),)*];
            for (position, plan) in plans.iter_mut().enumerate() {
                plan.position = position;
            }
            plans
        }

        #[inline]
        #[allow(non_snake_case, unused_variables)]
        fn invoke<S: Serial>(&self, planner: &Planner<'_, S>) -> Result<Outcome, DispatchError> {
            $(let $param = <$param as Param>::provide(planner)?;)*
            Ok((self)($($param),*).into_outcome())
        }
    }
});

impl_handler_for_fn! {}
impl_handler_for_fn! { A }
impl_handler_for_fn! { A B }
impl_handler_for_fn! { A B C }
impl_handler_for_fn! { A B C D }
impl_handler_for_fn! { A B C D E }
impl_handler_for_fn! { A B C D E F }
impl_handler_for_fn! { A B C D E F G }
impl_handler_for_fn! { A B C D E F G H }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ParamKind;
    use heron_core::{Exchange, ExchangeSnapshot, RequestContext};
    use std::sync::Arc;

    fn signature_of<Args, H: Handler<Args>>(_: &H) -> Vec<ParamPlan> {
        H::signature()
    }

    #[test]
    fn test_empty_signature() {
        let handler = || "ok";
        assert!(signature_of(&handler).is_empty());
    }

    #[test]
    fn test_signature_positions() {
        fn handler(_: Exchange, _: Arc<RequestContext>, _: ExchangeSnapshot) {}

        let plans = signature_of(&handler);
        assert_eq!(plans.len(), 3);
        assert_eq!(
            plans.iter().map(|p| p.position).collect::<Vec<_>>(),
            [0, 1, 2]
        );
        assert_eq!(plans[0].kind, ParamKind::Transport);
        assert_eq!(plans[1].kind, ParamKind::Context);
        assert!(!plans[2].by_ref);
    }
}
