//! Per-attempt, domain-scoped cookie store.
//!
//! A [`SessionJar`] is owned by exactly one resolver call or redirect walk. It
//! is never installed as a client-wide cookie provider: callers ask it for the
//! `Cookie` header of each hop and hand it every `Set-Cookie` they receive.

use std::time::{Duration, UNIX_EPOCH};

use reqwest::cookie::{CookieStore, Jar};
use tracing::{trace, warn};
use url::Url;

use super::cookies::{Cookie, parse_cookie_header};

/// Domain-scoped cookie store for one login attempt.
#[derive(Debug, Default)]
pub struct SessionJar {
    jar: Jar,
}

impl SessionJar {
    /// Creates an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `cookie` as if `url` had answered with it in a `Set-Cookie` header.
    ///
    /// Cookies whose `Domain` does not match `url` are dropped by the
    /// underlying store, as a browser would. An already expired cookie
    /// (`Max-Age=0` or a past `Expires`) removes any stored cookie with the
    /// same name, domain and path.
    pub fn store(&self, url: &Url, cookie: &Cookie) {
        let set_cookie = build_set_cookie_string(cookie);
        self.jar.add_cookie_str(&set_cookie, url);
        trace!(url = %url, name = %cookie.name, "stored cookie in jar");
    }

    /// Stores every cookie in `cookies` against `url`.
    pub fn store_all(&self, url: &Url, cookies: &[Cookie]) {
        for cookie in cookies {
            self.store(url, cookie);
        }
    }

    /// `Cookie` request header for `url`, or `None` when nothing matches.
    #[must_use]
    pub fn header_for(&self, url: &Url) -> Option<String> {
        let value = self.jar.cookies(url)?;
        match value.to_str() {
            Ok(header) => Some(header.to_string()),
            Err(_) => {
                warn!(url = %url, "dropping non-ASCII cookie header from jar");
                None
            }
        }
    }

    /// Cookies the jar would send to `url`, as name/value pairs.
    #[must_use]
    pub fn cookies_for(&self, url: &Url) -> Vec<Cookie> {
        self.header_for(url)
            .map(|header| parse_cookie_header(&header))
            .unwrap_or_default()
    }
}

/// Builds a `Set-Cookie` header string from a [`Cookie`].
fn build_set_cookie_string(cookie: &Cookie) -> String {
    let mut parts = vec![cookie.pair()];

    if let Some(domain) = &cookie.domain {
        parts.push(format!("Domain={domain}"));
    }
    if let Some(path) = &cookie.path {
        parts.push(format!("Path={path}"));
    }
    if cookie.secure {
        parts.push("Secure".to_string());
    }
    if cookie.http_only {
        parts.push("HttpOnly".to_string());
    }
    if let Some(max_age) = cookie.max_age {
        parts.push(format!("Max-Age={max_age}"));
    }
    if let Some(expires) = cookie.expires {
        if let Some(date) = unix_to_http_date(expires) {
            parts.push(format!("Expires={date}"));
        } else {
            warn!(
                name = %cookie.name,
                expires,
                "cookie expiry overflows SystemTime; storing as session cookie"
            );
        }
    }

    parts.join("; ")
}

/// Converts a Unix timestamp to an HTTP-date string.
fn unix_to_http_date(timestamp: u64) -> Option<String> {
    let time = UNIX_EPOCH.checked_add(Duration::from_secs(timestamp))?;
    Some(httpdate::fmt_http_date(time))
}
