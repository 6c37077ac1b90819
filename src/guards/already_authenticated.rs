use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    auth::{AuthState, AuthenticationService},
    cookies::SESSION_COOKIE,
    error::AppError,
    guards::{Guard, GuardOutcome},
    request::AdminRequest,
};

/// Where already signed-in admins are sent instead of the login page.
pub const DASHBOARD_REDIRECT: &str = "/admin/dashboard";

/// AlreadyAuthenticatedGate
///
/// Guards guest-only routes. Admins holding a valid credential are redirected to the
/// dashboard; everyone else continues to the login page.
pub struct AlreadyAuthenticatedGate {
    auth: Arc<AuthenticationService>,
}

impl AlreadyAuthenticatedGate {
    pub fn new(auth: Arc<AuthenticationService>) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl Guard for AlreadyAuthenticatedGate {
    async fn handle(&self, request: &mut AdminRequest) -> Result<GuardOutcome, AppError> {
        match self.auth.current_state(&request.cookies).await? {
            AuthState::Persistent { admin_id } | AuthState::Session { admin_id } => {
                tracing::debug!(admin_id, "already authenticated, skipping login page");
                Ok(GuardOutcome::Redirect(DASHBOARD_REDIRECT.to_string()))
            }
            AuthState::InvalidSession => {
                // A tampered session counts as a guest; the login form will replace it.
                request.cookies.clear_cookie(SESSION_COOKIE);
                Ok(GuardOutcome::Allow)
            }
            AuthState::Unauthenticated => Ok(GuardOutcome::Allow),
        }
    }
}
