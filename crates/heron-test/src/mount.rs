//! An in-memory routing table.

use crate::chain::Chain;
use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;
use heron_bind::{Endpoint, Mount, Route};
use heron_core::Params;
use http::Method;

/// A [`Mount`] that records what is mounted and can serve test requests.
///
/// Route paths use `:name` for one segment and `*name` for the rest of the
/// path. Routes are tried in registration order.
///
/// # Example
///
/// ```rust
/// use heron_bind::Dispatcher;
/// use heron_core::RequestContext;
/// use heron_test::{RecordingMount, TestRequest};
///
/// let mut mount = RecordingMount::new();
/// Dispatcher::new()
///     .routes()
///     .get("/users/:id", |ctx: RequestContext| {
///         ctx.exchange().path_param("id").unwrap_or_default().to_string()
///     })
///     .mount(&mut mount);
///
/// let response = mount.send(TestRequest::get("/users/42")).unwrap();
/// response.assert_body_eq("\"42\"");
/// ```
#[derive(Debug, Default)]
pub struct RecordingMount {
    middleware: Vec<Endpoint>,
    routes: Vec<Route>,
}

impl Mount for RecordingMount {
    fn middleware(&mut self, endpoint: Endpoint) {
        self.middleware.push(endpoint);
    }

    fn route(&mut self, method: Option<&Method>, path: &str, chain: Vec<Endpoint>) {
        self.routes.push(Route {
            method: method.cloned(),
            path: path.to_string(),
            chain,
        });
    }
}

impl RecordingMount {
    /// Creates an empty mount.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mounted middleware.
    pub fn middleware(&self) -> &[Endpoint] {
        &self.middleware
    }

    /// Returns the mounted routes.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Finds the first route matching `method` and `path`.
    ///
    /// Returns the full chain (middleware first) and the captured path
    /// parameters.
    pub fn find(&self, method: &Method, path: &str) -> Option<(Chain, Params)> {
        self.routes.iter().find_map(|route| {
            if route.method.as_ref().is_some_and(|m| m != method) {
                return None;
            }
            let params = match_path(&route.path, path)?;
            let chain = Chain::new(
                self.middleware
                    .iter()
                    .chain(route.chain.iter())
                    .cloned(),
            );
            Some((chain, params))
        })
    }

    /// Routes a request and runs its chain.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::NoRoute`] when nothing matches, or the request's
    /// build error.
    pub fn send(&self, request: TestRequestBuilder) -> Result<TestResponse, TestError> {
        let (chain, params) =
            self.find(request.method(), request.path())
                .ok_or_else(|| TestError::NoRoute {
                    method: request.method().clone(),
                    path: request.path().to_string(),
                })?;

        let request = params
            .iter()
            .fold(request, |request, (name, value)| request.path_param(name, value));
        Ok(chain.execute(request.build()?))
    }
}

/// Matches `path` against a route pattern, capturing parameters.
fn match_path(pattern: &str, path: &str) -> Option<Params> {
    let mut params = Params::new();
    let mut segments = path.trim_start_matches('/').split('/');

    for part in pattern.trim_start_matches('/').split('/') {
        if let Some(name) = part.strip_prefix('*') {
            let rest: Vec<&str> = segments.by_ref().collect();
            params.push(name, format!("/{}", rest.join("/")));
            return Some(params);
        }

        let segment = segments.next()?;
        match part.strip_prefix(':') {
            Some(name) if !segment.is_empty() => params.push(name, segment),
            Some(_) => return None,
            None if part == segment => {}
            None => return None,
        }
    }

    segments.next().is_none().then_some(params)
}
