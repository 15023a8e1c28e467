use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    SignedCookieJar,
};

use crate::error::RegistrationError;

pub const FLASH_COOKIE: &str = "flash";

/// Attach a one-shot failure message to the next page view.
pub fn push(jar: SignedCookieJar, err: &RegistrationError) -> SignedCookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, err.code()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Read the pending message, if any, and drop it from the jar.
/// Cookies with a bad signature or an unknown code read as nothing.
pub fn take(jar: SignedCookieJar) -> (SignedCookieJar, Option<&'static str>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };
    let message = RegistrationError::message_for_code(cookie.value());
    (clear(jar), message)
}

pub fn clear(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(FLASH_COOKIE).path("/"))
}
