//! Explicit request/response transport.
//!
//! Each hop of the flow is described by a [`HopRequest`] and answered by a
//! [`HopResponse`]. The [`Transport`] never follows redirects and never stores
//! cookies; callers decide both.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{COOKIE, LOCATION};
use tracing::{debug, instrument};
use url::Url;
use url::form_urlencoded;

use crate::auth::Cookie;
use crate::config::PortalConfig;
use crate::error::PortalError;

use super::client::build_http_client;

/// `Content-Type` for urlencoded form bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP method of a hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HopMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

/// One outgoing request.
///
/// `Debug` output omits the cookie header and form body, which carry session
/// values and credentials.
#[derive(Clone)]
pub struct HopRequest {
    /// Request method.
    pub method: HopMethod,
    /// Absolute request URL.
    pub url: Url,
    /// `Cookie` header to send, if any.
    pub cookie_header: Option<String>,
    /// Extra headers, names in lowercase.
    pub headers: Vec<(&'static str, String)>,
    /// Urlencoded form body for POSTs.
    pub form: Option<String>,
}

impl HopRequest {
    /// A bare GET.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            method: HopMethod::Get,
            url,
            cookie_header: None,
            headers: Vec::new(),
            form: None,
        }
    }

    /// A POST with an urlencoded body built from `fields`.
    #[must_use]
    pub fn post_form(url: Url, fields: &[(&str, &str)]) -> Self {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        Self {
            method: HopMethod::Post,
            url,
            cookie_header: None,
            headers: vec![("content-type", FORM_CONTENT_TYPE.to_string())],
            form: Some(body),
        }
    }

    /// Attaches a `Cookie` header.
    #[must_use]
    pub fn with_cookies(mut self, cookie_header: Option<String>) -> Self {
        self.cookie_header = cookie_header;
        self
    }

    /// Sets a header, replacing any earlier value of the same name.
    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name, value.into()));
        self
    }

    /// Value of a header previously set on this request.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Debug for HopRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HopRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("has_cookies", &self.cookie_header.is_some())
            .field("has_form", &self.form.is_some())
            .finish_non_exhaustive()
    }
}

/// One response, read in full.
#[derive(Debug, Clone)]
pub struct HopResponse {
    /// URL that produced this response.
    pub url: Url,
    /// HTTP status code.
    pub status: u16,
    /// Raw `Location` header, if present.
    pub location: Option<String>,
    /// Cookies from every `Set-Cookie` header, in header order.
    pub set_cookies: Vec<Cookie>,
    /// Response body as text.
    pub body: String,
}

impl HopResponse {
    /// True for 3xx statuses.
    #[must_use]
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// `Location` resolved against the URL that produced it.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::InvalidUrl`] when the header cannot be resolved.
    pub fn location_url(&self) -> Result<Option<Url>, PortalError> {
        let Some(location) = self.location.as_deref().filter(|l| !l.trim().is_empty()) else {
            return Ok(None);
        };
        self.url
            .join(location.trim())
            .map(Some)
            .map_err(|e| PortalError::invalid_url(location, &e))
    }

    /// Last cookie named `name` set by this response.
    #[must_use]
    pub fn set_cookie(&self, name: &str) -> Option<&Cookie> {
        self.set_cookies.iter().rev().find(|c| c.name == name)
    }
}

/// Sends one request and returns the raw response.
///
/// # Object Safety
///
/// Uses `async_trait` so clients can hold an `Arc<dyn Transport>` and tests can
/// substitute a scripted implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues `request` without following redirects.
    async fn send(&self, request: HopRequest) -> Result<HopResponse, PortalError>;
}

/// [`Transport`] backed by a redirect-free `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a transport using the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] when the HTTP client cannot be constructed.
    pub fn new(config: &PortalConfig) -> Result<Self, PortalError> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Wraps an existing client. The client must not follow redirects.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(level = "debug", skip(self, request), fields(method = ?request.method, url = %request.url))]
    async fn send(&self, request: HopRequest) -> Result<HopResponse, PortalError> {
        let HopRequest {
            method,
            url,
            cookie_header,
            headers,
            form,
        } = request;

        let mut builder = match method {
            HopMethod::Get => self.client.get(url.clone()),
            HopMethod::Post => self.client.post(url.clone()),
        };
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if let Some(cookie_header) = cookie_header {
            builder = builder.header(COOKIE, cookie_header);
        }
        if let Some(form) = form {
            builder = builder.body(form);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PortalError::network(url.as_str(), e))?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let set_cookies: Vec<Cookie> = response.cookies().map(|c| Cookie::from(&c)).collect();
        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| PortalError::network(url.as_str(), e))?;

        debug!(
            status,
            has_location = location.is_some(),
            cookies = set_cookies.len(),
            "hop answered"
        );

        Ok(HopResponse {
            url: final_url,
            status,
            location,
            set_cookies,
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn response(status: u16, location: Option<&str>) -> HopResponse {
        HopResponse {
            url: Url::parse("https://cas.example.edu/cas/login?service=x").unwrap(),
            status,
            location: location.map(str::to_string),
            set_cookies: Vec::new(),
            body: String::new(),
        }
    }

    #[test]
    fn test_post_form_encodes_fields_and_sets_content_type() {
        let url = Url::parse("https://cas.example.edu/cas/login").unwrap();
        let request = HopRequest::post_form(url, &[("username", "a b"), ("_eventId", "submit")]);
        assert_eq!(request.method, HopMethod::Post);
        assert_eq!(request.form.as_deref(), Some("username=a+b&_eventId=submit"));
        assert_eq!(request.header("Content-Type"), Some(FORM_CONTENT_TYPE));
    }

    #[test]
    fn test_with_header_replaces_case_insensitively() {
        let url = Url::parse("https://jwgl.example.edu/").unwrap();
        let request = HopRequest::post_form(url, &[])
            .with_header("Content-Type", "application/x-www-form-urlencoded; charset=UTF-8");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(
            request.header("content-type"),
            Some("application/x-www-form-urlencoded; charset=UTF-8")
        );
    }

    #[test]
    fn test_debug_hides_credentials() {
        let url = Url::parse("https://cas.example.edu/cas/login").unwrap();
        let request = HopRequest::post_form(url, &[("password", "hunter2")])
            .with_cookies(Some("JSESSIONID=secret".to_string()));
        let debug = format!("{request:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_location_url_resolves_relative_paths() {
        let resolved = response(302, Some("/jwapp/sys/index.do")).location_url().unwrap();
        assert_eq!(
            resolved.unwrap().as_str(),
            "https://cas.example.edu/jwapp/sys/index.do"
        );

        let absolute = response(302, Some("https://jwgl.example.edu/x"))
            .location_url()
            .unwrap();
        assert_eq!(absolute.unwrap().host_str(), Some("jwgl.example.edu"));
    }

    #[test]
    fn test_location_url_absent_or_blank_is_none() {
        assert!(response(302, None).location_url().unwrap().is_none());
        assert!(response(302, Some("  ")).location_url().unwrap().is_none());
    }

    #[test]
    fn test_is_redirect_bounds() {
        assert!(!response(299, None).is_redirect());
        assert!(response(300, None).is_redirect());
        assert!(response(399, None).is_redirect());
        assert!(!response(400, None).is_redirect());
    }
}
