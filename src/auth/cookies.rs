//! Cookie values and the flattened session cookie set.
//!
//! Every hop of the login flow contributes cookies to one [`SessionCookieSet`]
//! keyed only by name. The portal client later re-attaches a fixed allow-list
//! of names regardless of which host issued them, so the set deliberately
//! drops domain scoping at its boundary.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

/// Session-binding cookie carried from round one into round two.
pub const SESSION_TOKEN_COOKIE: &str = "_astraeus_session";
/// Load-balancer affinity cookie required by the SSO login POST.
pub const INGRESS_COOKIE: &str = "INGRESSCOOKIE";
/// Servlet session cookie required by the SSO login POST.
pub const JSESSIONID_COOKIE: &str = "JSESSIONID";
/// Marker cookie telling the SSO server a captcha accompanies the POST.
pub const CAPTCHA_MARKER_COOKIE: &str = "X_CAPTCHA";
/// Rotating portal cookie refreshed before each grades query.
pub const WEU_COOKIE: &str = "_WEU";
/// Cookies the portal needs on authenticated requests.
pub const PORTAL_COOKIES: [&str; 3] = ["GS_SESSIONID", WEU_COOKIE, "_webvpn_key"];

/// A single cookie observed during the flow.
///
/// The value is redacted in `Debug` output so tracing a cookie never leaks
/// session material.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    value: String,
    /// `Domain` attribute, when the issuing response set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// `Path` attribute, when the issuing response set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Whether the cookie is restricted to HTTPS.
    #[serde(default)]
    pub secure: bool,
    /// Whether the cookie is hidden from scripts.
    #[serde(default)]
    pub http_only: bool,
    /// `Max-Age` attribute in seconds. `Some(0)` deletes the cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
    /// `Expires` attribute as a Unix timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<u64>,
}

impl Cookie {
    /// Creates a host-scoped cookie with no attributes.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            secure: false,
            http_only: false,
            max_age: None,
            expires: None,
        }
    }

    /// Sets the `Path` attribute.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the `Domain` attribute.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the `Max-Age` attribute in seconds.
    #[must_use]
    pub fn with_max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive; avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replaces the cookie value, keeping its attributes.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// `name=value` pair as sent in a `Cookie` request header.
    #[must_use]
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("http_only", &self.http_only)
            .field("max_age", &self.max_age)
            .field("expires", &self.expires)
            .finish()
    }
}

impl From<&reqwest::cookie::Cookie<'_>> for Cookie {
    fn from(cookie: &reqwest::cookie::Cookie<'_>) -> Self {
        Self {
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
            domain: cookie.domain().map(str::to_string),
            path: cookie.path().map(str::to_string),
            secure: cookie.secure(),
            http_only: cookie.http_only(),
            max_age: cookie.max_age().map(|age| age.as_secs()),
            expires: cookie
                .expires()
                .and_then(|at| at.duration_since(UNIX_EPOCH).ok())
                .map(|since| since.as_secs()),
        }
    }
}

/// Splits a `Cookie` request header (`a=1; b=2`) into cookies.
///
/// Fragments without `=` or with an empty name are skipped.
#[must_use]
pub fn parse_cookie_header(header: &str) -> Vec<Cookie> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| Cookie::new(name, value.trim()))
        })
        .collect()
}

/// Name-keyed cookie set threaded through the login flow and handed to the
/// grades client. Inserting a name that already exists replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCookieSet {
    cookies: BTreeMap<String, Cookie>,
}

impl SessionCookieSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `cookie`, returning the cookie it replaced.
    pub fn insert(&mut self, cookie: Cookie) -> Option<Cookie> {
        self.cookies.insert(cookie.name.clone(), cookie)
    }

    /// Inserts `cookie` only if no cookie of that name exists yet.
    ///
    /// Returns `true` when the cookie was added.
    pub fn insert_if_absent(&mut self, cookie: Cookie) -> bool {
        match self.cookies.entry(cookie.name.clone()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(cookie);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Sets the value of `name`, keeping existing attributes or adding a bare cookie.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) {
        match self.cookies.get_mut(name) {
            Some(cookie) => cookie.set_value(value),
            None => {
                self.insert(Cookie::new(name, value));
            }
        }
    }

    /// Looks up a cookie by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.get(name)
    }

    /// Looks up a cookie value by name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(Cookie::value)
    }

    /// Returns true when a cookie named `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    /// Number of cookies in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Returns true when the set holds no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Iterates cookies in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.values()
    }

    /// Names of the cookies in the set, in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cookies.keys().map(String::as_str)
    }

    /// Builds a `Cookie` header from the allow-listed `names` that are present.
    ///
    /// Returns `None` when none of them are present.
    #[must_use]
    pub fn cookie_header(&self, names: &[&str]) -> Option<String> {
        let pairs: Vec<String> = names
            .iter()
            .filter_map(|name| self.cookies.get(*name))
            .map(Cookie::pair)
            .collect();
        (!pairs.is_empty()).then(|| pairs.join("; "))
    }
}

impl Extend<Cookie> for SessionCookieSet {
    fn extend<I: IntoIterator<Item = Cookie>>(&mut self, iter: I) {
        for cookie in iter {
            self.insert(cookie);
        }
    }
}

impl FromIterator<Cookie> for SessionCookieSet {
    fn from_iter<I: IntoIterator<Item = Cookie>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
