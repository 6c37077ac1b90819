use axum::{http::Method, response::Response};
use std::{collections::HashMap, future::Future, pin::Pin};

use crate::{
    AppState,
    error::AppError,
    request::AdminRequest,
    routing::pattern::{PatternError, RoutePattern, normalize_path},
};

/// Future returned by a route handler.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send + 'a>>;

/// A route handler: borrows the request context and the application container for the
/// duration of the call.
pub type HandlerFn = for<'a> fn(&'a mut AdminRequest, &'a AppState) -> HandlerFuture<'a>;

/// Endpoint
///
/// A named handler reference. The name shows up in logs and route listings.
#[derive(Clone, Copy)]
pub struct Endpoint {
    pub name: &'static str,
    pub handler: HandlerFn,
}

impl Endpoint {
    pub const fn new(name: &'static str, handler: HandlerFn) -> Self {
        Self { name, handler }
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Endpoint").field(&self.name).finish()
    }
}

/// Route
///
/// A compiled pattern bound to an endpoint and an ordered list of guard ids.
/// Immutable once registered.
#[derive(Debug)]
pub struct Route {
    pattern: RoutePattern,
    endpoint: Endpoint,
    guards: Vec<String>,
}

impl Route {
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn name(&self) -> &'static str {
        self.endpoint.name
    }

    /// Guard ids in evaluation order.
    pub fn guards(&self) -> &[String] {
        &self.guards
    }
}

/// RouteTable
///
/// Routes indexed by HTTP method. Within a method, registration order is priority:
/// the first route whose pattern matches wins, with no specificity ranking.
/// Built once at startup and only read afterwards.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<Method, Vec<Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// add
    ///
    /// Compiles `template` and appends the route to `method`'s list.
    pub fn add(
        &mut self,
        method: Method,
        template: &str,
        endpoint: Endpoint,
        guards: &[&str],
    ) -> Result<&mut Self, PatternError> {
        let pattern = RoutePattern::compile(template)?;
        tracing::debug!(%method, template = pattern.template(), route = endpoint.name, ?guards, "route registered");

        self.routes.entry(method).or_default().push(Route {
            pattern,
            endpoint,
            guards: guards.iter().map(|id| id.to_string()).collect(),
        });
        Ok(self)
    }

    pub fn get(
        &mut self,
        template: &str,
        endpoint: Endpoint,
        guards: &[&str],
    ) -> Result<&mut Self, PatternError> {
        self.add(Method::GET, template, endpoint, guards)
    }

    pub fn post(
        &mut self,
        template: &str,
        endpoint: Endpoint,
        guards: &[&str],
    ) -> Result<&mut Self, PatternError> {
        self.add(Method::POST, template, endpoint, guards)
    }

    /// find
    ///
    /// First route for `method` whose pattern accepts the normalized `path`, together
    /// with its extracted parameters.
    pub fn find(&self, method: &Method, path: &str) -> Option<(&Route, HashMap<String, String>)> {
        let path = normalize_path(path);

        self.routes.get(method)?.iter().find_map(|route| {
            if !route.pattern.matches(path) {
                return None;
            }
            let params = route.pattern.extract_params(path).unwrap_or_default();
            Some((route, params))
        })
    }

    /// Routes registered for `method`, in priority order.
    pub fn routes(&self, method: &Method) -> &[Route] {
        self.routes.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every guard id referenced by any route, duplicates included.
    pub fn guard_ids(&self) -> impl Iterator<Item = &str> {
        self.routes
            .values()
            .flatten()
            .flat_map(|route| route.guards.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
