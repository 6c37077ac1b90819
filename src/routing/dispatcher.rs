use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::{
    AppState,
    cookies::CookieStore,
    error::AppError,
    guards::{GuardOutcome, GuardRegistry},
    request::AdminRequest,
    routing::{pattern::normalize_path, table::{Route, RouteTable}},
};

/// Where unmatched requests are sent.
pub const NOT_FOUND_PATH: &str = "/404";

/// redirect
///
/// `302 Found` to `location`.
pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Dispatcher
///
/// Selects the route for a request, runs its guards in order and invokes its handler.
/// Dispatch is total: every request ends in a response, with unmatched paths redirected
/// to [`NOT_FOUND_PATH`] and configuration errors rendered as a generic 500.
pub struct Dispatcher {
    routes: RouteTable,
    guards: GuardRegistry,
}

impl Dispatcher {
    pub fn new(routes: RouteTable, guards: GuardRegistry) -> Self {
        Self { routes, guards }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn guards(&self) -> &GuardRegistry {
        &self.guards
    }

    /// dispatch
    ///
    /// Cookies written or cleared by guards or the handler are attached to whatever
    /// response comes out, redirects and rejections included.
    pub async fn dispatch(&self, mut request: AdminRequest, state: &AppState) -> Response {
        let path = normalize_path(&request.path).to_string();

        let Some((route, params)) = self.routes.find(&request.method, &path) else {
            tracing::info!(method = %request.method, path = %path, "no route matched");
            return redirect(NOT_FOUND_PATH);
        };

        tracing::debug!(method = %request.method, path = %path, route = route.name(), "route matched");
        request.params = params;

        let response = match self.run(route, &mut request, state).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(route = route.name(), error = %e, "request failed");
                e.into_response()
            }
        };

        with_cookies(response, &request.cookies)
    }

    async fn run(
        &self,
        route: &Route,
        request: &mut AdminRequest,
        state: &AppState,
    ) -> Result<Response, AppError> {
        for guard_id in route.guards() {
            // Resolved per request; an unknown key is a configuration error.
            let guard = self.guards.resolve(guard_id)?;

            match guard.handle(request).await? {
                GuardOutcome::Allow => {}
                GuardOutcome::Redirect(location) => {
                    tracing::debug!(guard = %guard_id, route = route.name(), location = %location, "guard redirected");
                    return Ok(redirect(&location));
                }
                GuardOutcome::Reject(response) => {
                    tracing::debug!(guard = %guard_id, route = route.name(), status = %response.status(), "guard rejected");
                    return Ok(response);
                }
            }
        }

        (route.endpoint().handler)(request, state).await
    }
}

fn with_cookies(mut response: Response, cookies: &CookieStore) -> Response {
    for value in cookies.set_cookie_headers() {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// Shared handle stored in `AppState`.
pub type DispatcherState = Arc<Dispatcher>;
