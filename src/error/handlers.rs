//! Error handlers
//!
//! Converts domain errors into HTTP responses. Bodies are fixed strings so
//! no server-side path or internal detail reaches the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use log::{error, warn};

use crate::error::types::{AuthError, StorageError, WebError};

/// Where unauthenticated users are sent.
pub const LOGIN_PATH: &str = "/login";

/// Log a storage error at a level matching its severity.
pub fn handle_error(err: &StorageError) {
    match err {
        StorageError::OutsideRoot(_) | StorageError::RefusedRootDeletion => {
            warn!("Rejected request: {}", err)
        }
        StorageError::Io(_) => error!("Storage failure: {}", err),
        _ => {}
    }
}

/// Convert a storage error to an HTTP status code
pub fn error_to_status_code(err: &StorageError) -> StatusCode {
    match err {
        StorageError::OutsideRoot(_) => StatusCode::FORBIDDEN,
        StorageError::RefusedRootDeletion => StatusCode::FORBIDDEN,
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        StorageError::NotADirectory(_) => StatusCode::NOT_FOUND,
        StorageError::InvalidFilename(_) => StatusCode::BAD_REQUEST,
        StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn public_message(err: &StorageError) -> &'static str {
    match err {
        StorageError::OutsideRoot(_) => "Forbidden",
        StorageError::RefusedRootDeletion => "Refusing to delete the root directory",
        StorageError::NotFound(_) | StorageError::NotADirectory(_) => "Not Found",
        StorageError::InvalidFilename(_) => "Invalid file name",
        StorageError::Io(_) => "Internal Server Error",
    }
}

impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        handle_error(&self);
        (error_to_status_code(&self), public_message(&self)).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Denied => Redirect::to(LOGIN_PATH).into_response(),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::Storage(e) => e.into_response(),
            WebError::Auth(e) => e.into_response(),
            WebError::Multipart(e) => {
                warn!("Rejected upload body: {}", e);
                (e.status(), "Invalid upload").into_response()
            }
            WebError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            WebError::PayloadTooLarge { limit } => {
                warn!("Rejected upload larger than {} bytes", limit);
                (StatusCode::PAYLOAD_TOO_LARGE, "Upload too large").into_response()
            }
        }
    }
}
