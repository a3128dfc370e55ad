//! The response-writing capability.

use crate::{DispatchError, Exchange};
use http::StatusCode;
use serde_json::Value;

/// Writes the response for one dispatch.
///
/// The dispatcher calls a responder at most once per request, with the
/// handler's data and error slots. Any closure with the same shape is a
/// responder:
///
/// ```
/// use heron_core::{DispatchError, Exchange, Responder};
/// use http::StatusCode;
///
/// let responder = |exchange: &Exchange, _data: Option<serde_json::Value>, error: Option<&DispatchError>| {
///     let status = error.map_or(StatusCode::OK, DispatchError::status_code);
///     exchange.reply_text(status, "done");
/// };
///
/// let exchange = Exchange::builder().build();
/// responder.respond(&exchange, None, None);
/// assert_eq!(exchange.take_reply().unwrap().status, StatusCode::OK);
/// ```
pub trait Responder: Send + Sync + 'static {
    /// Writes the response for `exchange`.
    fn respond(&self, exchange: &Exchange, data: Option<Value>, error: Option<&DispatchError>);
}

impl<F> Responder for F
where
    F: Fn(&Exchange, Option<Value>, Option<&DispatchError>) + Send + Sync + 'static,
{
    fn respond(&self, exchange: &Exchange, data: Option<Value>, error: Option<&DispatchError>) {
        self(exchange, data, error);
    }
}

/// The default responder.
///
/// - error: the error's status code and an [`ErrorEnvelope`](crate::ErrorEnvelope)
///   carrying the request's context id (or, without a context, the
///   `x-request-id` header)
/// - data: `200 OK` with the data as JSON
/// - neither: `204 No Content`
///
/// When both slots are filled the error wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponder;

impl Responder for JsonResponder {
    fn respond(&self, exchange: &Exchange, data: Option<Value>, error: Option<&DispatchError>) {
        let written = match (error, data) {
            (Some(err), _) => {
                let request_id = exchange.request_id().map(|id| id.to_string());
                let envelope = err.to_envelope(
                    request_id.as_deref().or_else(|| exchange.header("x-request-id")),
                );
                exchange.reply_json(err.status_code(), &envelope)
            }
            (None, Some(data)) => exchange.reply_json(StatusCode::OK, &data),
            (None, None) => {
                exchange.reply(crate::Reply::new(StatusCode::NO_CONTENT, ""));
                Ok(())
            }
        };

        if let Err(err) = written {
            tracing::warn!(error = %err, "failed to write response");
            exchange.reply_text(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
        }
    }
}
