//! Authentication system
//!
//! Handles credential loading, login validation and authorization of
//! mutating operations.

pub mod credentials;
pub mod results;
pub mod validator;

pub use credentials::{Credential, CredentialStore};
pub use results::Principal;
pub use validator::{authenticate, authorize};
