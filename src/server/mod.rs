//! Server core functionality
//!
//! Application state and the HTTP listener lifecycle.

pub mod core;
pub mod state;

pub use core::Server;
pub use state::AppState;
