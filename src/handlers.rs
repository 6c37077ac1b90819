use axum::{
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    models::LoginForm,
    request::AdminRequest,
    routing::{HandlerFuture, NOT_FOUND_PATH, redirect},
    views,
};

/// Landing page for a successful login.
pub const DASHBOARD_PATH: &str = "/admin/dashboard";
/// Where a failed login is sent back to.
pub const LOGIN_FAILED_REDIRECT: &str = "/admin/login?error=invalid_credentials";
/// Where a logout ends up.
pub const LOGGED_OUT_REDIRECT: &str = "/admin/login?status=logged_out";

// --- Public ---

/// root
///
/// `GET /`. The admin area is the only thing served here.
pub fn root<'a>(_request: &'a mut AdminRequest, _state: &'a AppState) -> HandlerFuture<'a> {
    Box::pin(async move { Ok(redirect(DASHBOARD_PATH)) })
}

pub fn health<'a>(_request: &'a mut AdminRequest, _state: &'a AppState) -> HandlerFuture<'a> {
    Box::pin(async move { Ok((StatusCode::OK, "ok").into_response()) })
}

/// not_found
///
/// Target of the dispatcher's fallback redirect. Served at [`NOT_FOUND_PATH`].
pub fn not_found<'a>(_request: &'a mut AdminRequest, _state: &'a AppState) -> HandlerFuture<'a> {
    Box::pin(async move {
        tracing::debug!(path = NOT_FOUND_PATH, "rendering not found page");
        Ok((StatusCode::NOT_FOUND, views::not_found()).into_response())
    })
}

// --- Admin authentication ---

/// login_page
///
/// [Guest Route] Renders the sign-in form. Known `?error=` and `?status=` codes are
/// turned into messages; anything else in the query is ignored.
pub fn login_page<'a>(request: &'a mut AdminRequest, _state: &'a AppState) -> HandlerFuture<'a> {
    Box::pin(async move {
        let messages: Vec<String> = [
            request.query_value("error").and_then(views::login_error_message),
            request.query_value("status").and_then(views::login_status_message),
        ]
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();

        Ok(views::login_page(&messages, "").into_response())
    })
}

/// login_submit
///
/// [Guest Route] Handles the sign-in form. The password policy guard has already run,
/// so only credential checks remain here.
pub fn login_submit<'a>(request: &'a mut AdminRequest, state: &'a AppState) -> HandlerFuture<'a> {
    Box::pin(async move {
        let form = LoginForm::from_fields(&request.form);

        let ok = state
            .auth
            .attempt_login(
                &mut request.cookies,
                &form.username,
                &form.password,
                form.remember_me,
            )
            .await;

        if ok {
            Ok(redirect(DASHBOARD_PATH))
        } else {
            Ok(redirect(LOGIN_FAILED_REDIRECT))
        }
    })
}

/// logout
///
/// [Admin Route] Revokes the remember-me token (if any) and clears both auth cookies.
pub fn logout<'a>(request: &'a mut AdminRequest, state: &'a AppState) -> HandlerFuture<'a> {
    Box::pin(async move {
        state.auth.logout(&mut request.cookies).await?;
        tracing::info!(admin_id = ?request.admin_id, "admin logged out");
        Ok(redirect(LOGGED_OUT_REDIRECT))
    })
}

// --- Admin area ---

pub fn dashboard<'a>(request: &'a mut AdminRequest, _state: &'a AppState) -> HandlerFuture<'a> {
    Box::pin(async move {
        // admin.auth always runs first and records the id.
        let Some(admin_id) = request.admin_id else {
            tracing::warn!("dashboard reached without an authenticated admin");
            return Ok(redirect(crate::guards::admin_auth::UNAUTHORIZED_REDIRECT));
        };
        Ok(views::dashboard(admin_id).into_response())
    })
}
