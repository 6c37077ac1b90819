use async_trait::async_trait;
use axum::{http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::{
    auth::AuthenticationService,
    error::AppError,
    guards::{Guard, GuardOutcome},
    request::AdminRequest,
    views,
};

/// PasswordPolicyGate
///
/// Checks the submitted `password` field against the service's policy before the login
/// handler runs. A weak password re-renders the login form with the rule messages and
/// the submitted username, answered with `422 Unprocessable Entity`.
pub struct PasswordPolicyGate {
    auth: Arc<AuthenticationService>,
}

impl PasswordPolicyGate {
    pub fn new(auth: Arc<AuthenticationService>) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl Guard for PasswordPolicyGate {
    async fn handle(&self, request: &mut AdminRequest) -> Result<GuardOutcome, AppError> {
        let password = request.form_value("password").unwrap_or_default();

        match self.auth.validate_password(password) {
            Ok(()) => Ok(GuardOutcome::Allow),
            Err(e) => {
                tracing::info!(violations = ?e.violations, "login form rejected by password policy");
                let username = request.form_value("username").unwrap_or_default();
                let page = views::login_page(&e.messages(), username);
                Ok(GuardOutcome::Reject(
                    (StatusCode::UNPROCESSABLE_ENTITY, page).into_response(),
                ))
            }
        }
    }
}
