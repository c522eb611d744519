//! Error types
//!
//! Defines domain-specific error types for each module of the file manager.

use std::io;

use thiserror::Error;

/// Storage module errors
///
/// Variants carry the *relative* path as the caller supplied it, never the
/// server-side absolute path, so they are safe to log next to client input.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("path escapes the server root: {0}")]
    OutsideRoot(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("invalid file name: {0:?}")]
    InvalidFilename(String),

    #[error("refusing to delete the server root")]
    RefusedRootDeletion,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Maps an `io::Error` raised while looking at `path`, keeping
    /// "does not exist" distinct from other filesystem failures.
    pub(crate) fn from_io(error: io::Error, path: &str) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            io::ErrorKind::NotADirectory => StorageError::NotADirectory(path.to_string()),
            _ => StorageError::Io(error),
        }
    }
}

/// Authentication module errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("authentication required")]
    Denied,
}

/// Startup errors. Any of these is fatal.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to read credential store {path}: {source}")]
    CredentialsIo { path: String, source: io::Error },

    #[error("malformed credential store {path}: {source}")]
    CredentialsFormat {
        path: String,
        source: serde_json::Error,
    },

    #[error("invalid server root {path}: {source}")]
    Root { path: String, source: StorageError },

    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors surfaced by HTTP request handlers
#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("malformed upload: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("bad request: {0}")]
    BadRequest(&'static str),

    #[error("upload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
}
