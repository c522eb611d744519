//! Authentication validator
//!
//! Login is an exact, case-sensitive match of the (username, password) pair
//! against the credential store. Mutating operations need a principal.

use log::{info, warn};

use super::credentials::{Credential, CredentialStore};
use super::results::Principal;
use crate::error::AuthError;

/// Checks a login attempt against the store.
pub fn authenticate(
    username: &str,
    password: &str,
    store: &CredentialStore,
) -> Result<Principal, AuthError> {
    if store.contains(&Credential::new(username, password)) {
        info!("User {username} logged in");
        Ok(Principal::new(username))
    } else {
        warn!("Failed login attempt for user {username:?}");
        Err(AuthError::Denied)
    }
}

/// Gate for upload and remove: anonymous requests are denied.
pub fn authorize(principal: Option<&Principal>) -> Result<&Principal, AuthError> {
    principal.ok_or(AuthError::Denied)
}
