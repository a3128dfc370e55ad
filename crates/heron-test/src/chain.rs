//! Running endpoints in sequence.

use crate::response::TestResponse;
use heron_bind::{Dispatched, Endpoint};
use heron_core::Exchange;

/// An ordered list of endpoints run against one exchange.
///
/// Mirrors how a router runs middleware followed by a route's handlers:
/// every endpoint sees the same exchange, and once one of them aborts the
/// request the rest are skipped.
///
/// # Example
///
/// ```rust
/// use heron_bind::{Dispatched, Dispatcher};
/// use heron_core::Exchange;
/// use heron_test::{Chain, TestRequest};
///
/// let dispatcher = Dispatcher::new();
/// let chain = Chain::new([
///     dispatcher.endpoint(|exchange: Exchange| exchange.abort()),
///     dispatcher.endpoint(|| "never"),
/// ]);
///
/// let response = chain.execute(TestRequest::get("/").build().unwrap());
/// assert_eq!(response.dispatched(), [Dispatched::Silent]);
/// assert!(!response.has_reply());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Chain {
    endpoints: Vec<Endpoint>,
}

impl Chain {
    /// Creates a chain from endpoints, in run order.
    pub fn new(endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        Self {
            endpoints: endpoints.into_iter().collect(),
        }
    }

    /// Appends an endpoint.
    #[must_use]
    pub fn then(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Returns the number of endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` if the chain has no endpoints.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Runs the endpoints until one aborts the exchange.
    ///
    /// Returns the result of every endpoint that ran.
    pub fn run(&self, exchange: &Exchange) -> Vec<Dispatched> {
        let mut ran = Vec::with_capacity(self.endpoints.len());
        for endpoint in &self.endpoints {
            if exchange.is_aborted() {
                break;
            }
            ran.push(endpoint.call(exchange));
        }
        ran
    }

    /// Runs the chain and collects the reply.
    pub fn execute(&self, exchange: Exchange) -> TestResponse {
        let dispatched = self.run(&exchange);
        TestResponse::new(dispatched, exchange.take_reply())
    }
}
