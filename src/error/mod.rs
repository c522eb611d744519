//! Error handling
//!
//! Defines error types and how they surface to HTTP clients.

pub mod handlers;
pub mod types;

pub use types::*;
