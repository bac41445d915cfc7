use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::db::DbError;
use crate::visits::VisitError;

/// Failures a handler can't turn into a page. Rendered as a bare 500.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] DbError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("visit tracking failed: {0}")]
    Visit(#[from] VisitError),

    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}
