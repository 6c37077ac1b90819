use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    auth::AuthenticationService,
    cookies::{SESSION_COOKIE, TOKEN_COOKIE},
    error::AppError,
    guards::{Guard, GuardOutcome},
    request::AdminRequest,
};

/// Where unauthenticated requests to the admin area are sent.
pub const UNAUTHORIZED_REDIRECT: &str = "/admin/login?error=unauthorized";

/// AdminAuthGate
///
/// Admits the request when it carries a live remember-me token or a valid, unexpired
/// session cookie, and records the admin id on the request. Everything else is
/// redirected to the login page.
pub struct AdminAuthGate {
    auth: Arc<AuthenticationService>,
}

impl AdminAuthGate {
    pub fn new(auth: Arc<AuthenticationService>) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl Guard for AdminAuthGate {
    async fn handle(&self, request: &mut AdminRequest) -> Result<GuardOutcome, AppError> {
        let state = self.auth.current_state(&request.cookies).await?;

        if let Some(admin_id) = state.admin_id() {
            request.admin_id = Some(admin_id);
            return Ok(GuardOutcome::Allow);
        }

        // Drop cookies that no longer prove anything so the browser stops sending them.
        if request.cookies.get(TOKEN_COOKIE).is_some() {
            request.cookies.clear_cookie(TOKEN_COOKIE);
        }
        if request.cookies.get(SESSION_COOKIE).is_some() {
            request.cookies.clear_cookie(SESSION_COOKIE);
        }

        tracing::info!(path = %request.path, ?state, "admin area access denied");
        Ok(GuardOutcome::Redirect(UNAUTHORIZED_REDIRECT.to_string()))
    }
}
