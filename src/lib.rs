//! RAX File Manager
//!
//! A browser-accessible file manager confined to a single root directory.

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod server;
pub mod storage;
pub mod utils;
pub mod web;

pub use server::{AppState, Server};
