//! Session cookie
//!
//! A signed `user` cookie carries the username of a logged-in user. Handlers
//! turn it into an `Option<Principal>` and pass that on explicitly.

use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::auth::Principal;

pub const SESSION_COOKIE: &str = "user";

/// The principal carried by a validly signed session cookie, if any.
pub fn current_principal(jar: &SignedCookieJar) -> Option<Principal> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|name| !name.is_empty())
        .map(Principal::new)
}

pub fn start(jar: SignedCookieJar, principal: &Principal) -> SignedCookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, principal.username().to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

pub fn end(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/").build())
}
