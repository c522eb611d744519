//! HTTP front end
//!
//! Routes, handlers, session cookie and page rendering.

pub mod handlers;
pub mod render;
pub mod routes;
pub mod session;

pub use routes::build_router;
