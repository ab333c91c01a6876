//! Session cookies
//!
//! Both cookies are HttpOnly, SameSite=Lax and scoped to `/`.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

pub const STUDENT_COOKIE: &str = "maum_student_session";
pub const TEACHER_COOKIE: &str = "maum_teacher_session";

/// Cookie carrying a session token for `max_age`.
pub fn session_cookie(name: &'static str, value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .max_age(max_age)
        .expires(OffsetDateTime::now_utc() + max_age)
        .build()
}

/// Expired, empty cookie that makes the browser drop `name` when added to a jar.
pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).http_only(true).path("/").build();
    cookie.make_removal();
    cookie
}
