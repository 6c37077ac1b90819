use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{repository::RepositoryError, tokens::TokenStoreError};

/// AppError
///
/// Failures that escape a guard or handler. Authorization and validation failures never
/// show up here: guards turn those into redirects or re-rendered forms.
#[derive(Debug, Error)]
pub enum AppError {
    /// Unregistered guard key, unusable application key and similar wiring mistakes.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn configuration(message: impl Into<String>) -> Self {
        AppError::Configuration(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    /// Server-side failures get a generic body; the detail only goes to the log.
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "unrecoverable request error");
            return (status, "Internal Server Error").into_response();
        }
        (status, self.to_string()).into_response()
    }
}
