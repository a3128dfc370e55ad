//! Endpoint registration onto a routing layer.

use crate::dispatch::{Dispatcher, Endpoint};
use crate::handler::Handler;
use heron_core::Serial;
use http::Method;

/// A routing layer endpoints can be mounted onto.
///
/// Implemented by the adapter between Heron and a concrete router. Every
/// middleware entry and every chain element is one [`Endpoint`].
pub trait Mount {
    /// Adds an endpoint that runs before every route.
    fn middleware(&mut self, endpoint: Endpoint);

    /// Adds a route. `None` matches any method.
    fn route(&mut self, method: Option<&Method>, path: &str, chain: Vec<Endpoint>);
}

/// One registered route.
#[derive(Debug, Clone)]
pub struct Route {
    /// The method matched, or `None` for any.
    pub method: Option<Method>,
    /// The path pattern, in the routing layer's syntax.
    pub path: String,
    /// The endpoints run in order for a match.
    pub chain: Vec<Endpoint>,
}

/// A registration builder bound to a [`Dispatcher`].
///
/// # Example
///
/// ```rust
/// use heron_bind::{Dispatcher, Endpoint, Mount};
/// use http::Method;
///
/// #[derive(Default)]
/// struct Table(Vec<String>);
///
/// impl Mount for Table {
///     fn middleware(&mut self, endpoint: Endpoint) {
///         self.0.push(format!("use {}", endpoint.name()));
///     }
///     fn route(&mut self, method: Option<&Method>, path: &str, chain: Vec<Endpoint>) {
///         let method = method.map_or("ANY", Method::as_str);
///         self.0.push(format!("{method} {path} ({})", chain.len()));
///     }
/// }
///
/// let dispatcher = Dispatcher::new();
/// let mut table = Table::default();
///
/// dispatcher
///     .routes()
///     .named_middleware("audit", || ())
///     .get("/users/:id", || "user")
///     .any("/health", || "ok")
///     .mount(&mut table);
///
/// assert_eq!(table.0, ["use audit", "GET /users/:id (1)", "ANY /health (1)"]);
/// ```
#[derive(Debug)]
pub struct Routes<S> {
    dispatcher: Dispatcher<S>,
    middleware: Vec<Endpoint>,
    routes: Vec<Route>,
}

impl<S: Serial> Routes<S> {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(dispatcher: Dispatcher<S>) -> Self {
        Self {
            dispatcher,
            middleware: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Registers a handler with the bound dispatcher.
    pub fn endpoint<H, Args>(&self, handler: H) -> Endpoint
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.dispatcher.endpoint(handler)
    }

    /// Adds a middleware handler.
    pub fn middleware<H, Args>(mut self, handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.middleware.push(self.dispatcher.endpoint(handler));
        self
    }

    /// Adds a middleware handler under an explicit name.
    pub fn named_middleware<H, Args>(mut self, name: &'static str, handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.middleware.push(self.dispatcher.named_endpoint(name, handler));
        self
    }

    /// Adds a route running `chain` in order. `None` matches any method.
    pub fn route(
        mut self,
        method: Option<Method>,
        path: impl Into<String>,
        chain: impl IntoIterator<Item = Endpoint>,
    ) -> Self {
        self.routes.push(Route {
            method,
            path: path.into(),
            chain: chain.into_iter().collect(),
        });
        self
    }

    fn single<H, Args>(self, method: Option<Method>, path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        let endpoint = self.dispatcher.endpoint(handler);
        self.route(method, path, [endpoint])
    }

    /// Adds a `GET` route.
    pub fn get<H, Args>(self, path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.single(Some(Method::GET), path, handler)
    }

    /// Adds a `POST` route.
    pub fn post<H, Args>(self, path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.single(Some(Method::POST), path, handler)
    }

    /// Adds a `PUT` route.
    pub fn put<H, Args>(self, path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.single(Some(Method::PUT), path, handler)
    }

    /// Adds a `PATCH` route.
    pub fn patch<H, Args>(self, path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.single(Some(Method::PATCH), path, handler)
    }

    /// Adds a `DELETE` route.
    pub fn delete<H, Args>(self, path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.single(Some(Method::DELETE), path, handler)
    }

    /// Adds a route matching any method.
    pub fn any<H, Args>(self, path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<Args>,
        Args: 'static,
    {
        self.single(None, path, handler)
    }

    /// Returns the registered middleware.
    #[must_use]
    pub fn middlewares(&self) -> &[Endpoint] {
        &self.middleware
    }

    /// Returns the registered routes.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Mounts middleware, then routes, onto `target`.
    pub fn mount<M: Mount + ?Sized>(self, target: &mut M) {
        tracing::debug!(
            middleware = self.middleware.len(),
            routes = self.routes.len(),
            "mounting routes"
        );
        for endpoint in self.middleware {
            target.middleware(endpoint);
        }
        for route in self.routes {
            target.route(route.method.as_ref(), &route.path, route.chain);
        }
    }
}
