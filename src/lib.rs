use axum::{
    Router,
    extract::{Request, State},
    http::HeaderName,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core services: crypto, cookies, credential stores and the auth state machine.
pub mod auth;
pub mod cipher;
pub mod config;
pub mod cookies;
pub mod error;
pub mod models;
pub mod repository;
pub mod tokens;

// Request pipeline: context, routing, guards and the handlers behind them.
pub mod guards;
pub mod handlers;
pub mod request;
pub mod routes;
pub mod routing;
pub mod views;

// --- Public Re-exports ---

pub use auth::AuthenticationService;
pub use cipher::Cipher;
pub use config::AppConfig;
pub use error::AppError;
pub use repository::{AdminRepositoryState, PostgresAdminRepository};
pub use request::AdminRequest;
pub use routing::{Dispatcher, DispatcherState};
pub use tokens::{InMemoryTokenStore, PostgresTokenStore, TokenStoreState};

use guards::GuardRegistry;

/// AppState
///
/// The container shared by every request: configuration plus the services built from it.
/// Cloning is cheap; every service sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
    /// Cookie cipher derived from `APP_KEY`.
    pub cipher: Arc<Cipher>,
    pub tokens: TokenStoreState,
    pub admins: AdminRepositoryState,
    pub auth: Arc<AuthenticationService>,
    /// Route table and guard registry.
    pub dispatcher: DispatcherState,
}

impl AppState {
    /// build
    ///
    /// Wires the services together and checks the route table against the guard registry.
    /// Fails on out-of-range lifetimes, an unusable `APP_KEY`, an invalid route pattern or
    /// a route naming a guard that does not exist.
    pub fn build(
        config: AppConfig,
        admins: AdminRepositoryState,
        tokens: TokenStoreState,
    ) -> Result<Self, AppError> {
        // 1. Configuration limits
        config
            .validate()
            .map_err(|e| AppError::configuration(e.to_string()))?;

        // 2. Cookie cipher
        let cipher = Cipher::from_base64_key(&config.app_key)
            .map_err(|e| AppError::configuration(format!("APP_KEY: {e}")))?;

        // 3. Authentication service
        let auth = Arc::new(AuthenticationService::new(
            admins.clone(),
            tokens.clone(),
            &config,
        ));

        // 4. Routes and guards, checked against each other
        let routes = routes::route_table()
            .map_err(|e| AppError::configuration(format!("route table: {e}")))?;
        let guards = GuardRegistry::default_registry(auth.clone());
        guards.ensure_registered(&routes)?;

        tracing::info!(routes = routes.len(), "route table ready");

        Ok(Self {
            config,
            cipher: Arc::new(cipher),
            tokens,
            admins,
            auth,
            dispatcher: Arc::new(Dispatcher::new(routes, guards)),
        })
    }
}

/// dispatch_request
///
/// The router's only handler. Converts the axum request into an `AdminRequest` and hands
/// it to the dispatcher, which always produces a response.
async fn dispatch_request(State(state): State<AppState>, request: Request) -> Response {
    let request = match AdminRequest::from_http(request, state.cipher.clone()).await {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "could not read request");
            return e.into_response();
        }
    };

    state.dispatcher.dispatch(request, &state).await
}

/// create_router
///
/// Every request goes through the fallback into the dispatcher; path matching and guards
/// live there rather than in axum's router.
pub fn create_router(state: AppState) -> Router {
    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 1. Base Router Assembly
    let base_router = Router::new().fallback(dispatch_request).with_state(state);

    // 2. Observability and Correlation Layers
    base_router.layer(
        ServiceBuilder::new()
            // 2a. Request ID Generation: a UUID for every incoming request.
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            // 2b. Request Tracing: one span per request, carrying the request id.
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            // 2c. Request ID Propagation: echo x-request-id back to the client.
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Builds the `TraceLayer` span from the method, URI and `x-request-id` header so every
/// log line for a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
