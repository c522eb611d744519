//! Route table

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;

use crate::middleware::logging::log_request;
use crate::server::AppState;
use crate::web::handlers;

/// Room for multipart headers and boundaries on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes().saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(handlers::home))
        .route("/browse", get(handlers::home))
        .route("/browse/", get(handlers::browse_root))
        .route("/browse/{*path}", get(handlers::browse))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route(
            "/upload/",
            get(handlers::upload_form_root).post(handlers::upload_root),
        )
        .route(
            "/upload/{*path}",
            get(handlers::upload_form).post(handlers::upload),
        )
        .route("/remove", get(handlers::remove_root))
        .route("/remove/", get(handlers::remove_root))
        .route("/remove/{*path}", get(handlers::remove))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
