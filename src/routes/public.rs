use crate::{
    handlers,
    routing::{Endpoint, PatternError, RouteTable},
};

/// Public Routes
///
/// Unguarded endpoints: the root redirect, the health check and the not-found page the
/// dispatcher falls back to.
pub fn register(table: &mut RouteTable) -> Result<(), PatternError> {
    table
        // GET /
        // Sends visitors to the admin dashboard; the auth gate there takes over.
        .get("/", Endpoint::new("root", handlers::root), &[])?
        // GET /health
        // Load balancer check. Returns "ok" without touching storage.
        .get("/health", Endpoint::new("health", handlers::health), &[])?
        // GET /404
        .get("/404", Endpoint::new("not_found", handlers::not_found), &[])?;
    Ok(())
}
