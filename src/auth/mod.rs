//! Cookie handling for the login flow.
//!
//! [`SessionJar`] scopes cookies by domain while a single attempt is running;
//! [`SessionCookieSet`] is the flattened, name-keyed result handed to callers.

mod cookies;
mod jar;

pub use cookies::{
    CAPTCHA_MARKER_COOKIE, Cookie, INGRESS_COOKIE, JSESSIONID_COOKIE, PORTAL_COOKIES,
    SESSION_TOKEN_COOKIE, SessionCookieSet, WEU_COOKIE, parse_cookie_header,
};
pub use jar::SessionJar;
