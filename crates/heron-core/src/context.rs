//! Request context types.
//!
//! The [`RequestContext`] is the ambient request-scoped value handed to
//! handlers that ask for it. It carries a request id, the endpoint name and a
//! handle to the transport object of the request.

use crate::Exchange;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Header consulted for an upstream request id.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps ids sortable in logs.
///
/// # Example
///
/// ```
/// use heron_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request context.
///
/// Created by the dispatcher once per request. Handlers receive it by value
/// (`RequestContext`, a clone) or by reference (`Arc<RequestContext>`).
///
/// # Example
///
/// ```
/// use heron_core::{Exchange, RequestContext};
///
/// let exchange = Exchange::builder()
///     .header("x-request-id", "0191e3c4-6b1f-7cc0-a0f5-1a2b3c4d5e6f")
///     .build();
/// let ctx = RequestContext::new(exchange).with_endpoint("get_user");
///
/// assert_eq!(ctx.request_id().to_string(), "0191e3c4-6b1f-7cc0-a0f5-1a2b3c4d5e6f");
/// assert_eq!(ctx.endpoint(), Some("get_user"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    endpoint: Option<&'static str>,
    exchange: Exchange,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for the given exchange.
    ///
    /// The first context of a request picks its id: a valid UUID in the
    /// `x-request-id` header is reused, otherwise a fresh one is generated.
    /// Later contexts for the same exchange share that id.
    #[must_use]
    pub fn new(exchange: Exchange) -> Self {
        let request_id = exchange.request_id_or_insert_with(|| {
            exchange
                .header(REQUEST_ID_HEADER)
                .and_then(|v| Uuid::parse_str(v).ok())
                .map_or_else(RequestId::new, RequestId::from_uuid)
        });

        Self {
            request_id,
            endpoint: None,
            exchange,
            started_at: Instant::now(),
        }
    }

    /// Returns a context with the endpoint name set.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: &'static str) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Returns the request id.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the name of the endpoint handling the request.
    #[must_use]
    pub const fn endpoint(&self) -> Option<&'static str> {
        self.endpoint
    }

    /// Returns the transport object of the request.
    #[must_use]
    pub const fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    /// Returns the time elapsed since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_request_id_serialization() {
        let id = RequestId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_invalid_upstream_id_is_replaced() {
        let exchange = Exchange::builder()
            .header("x-request-id", "not-a-uuid")
            .build();
        let ctx = RequestContext::new(exchange);

        assert_eq!(ctx.request_id().to_string().len(), 36);
        assert_eq!(ctx.endpoint(), None);
    }

    #[test]
    fn test_one_id_per_exchange() {
        let exchange = Exchange::builder().build();
        assert_eq!(exchange.request_id(), None);

        let first = RequestContext::new(exchange.clone());
        let second = RequestContext::new(exchange.clone());
        assert_eq!(first.request_id(), second.request_id());
        assert_eq!(exchange.request_id(), Some(first.request_id()));
    }

    #[test]
    fn test_context_shares_exchange() {
        let exchange = Exchange::builder().build();
        let ctx = RequestContext::new(exchange.clone());

        ctx.exchange().abort();
        assert!(exchange.is_aborted());
    }

    #[test]
    fn test_elapsed() {
        let ctx = RequestContext::new(Exchange::builder().build());
        std::thread::sleep(Duration::from_millis(5));
        assert!(ctx.elapsed() >= Duration::from_millis(5));
    }
}
