//! Login-page resolution: follows the portal's entry redirect to the SSO
//! login form and captures its hidden fields and session cookies.

use tracing::{debug, instrument};

use crate::auth::{Cookie, SESSION_TOKEN_COOKIE, SessionCookieSet, SessionJar};
use crate::error::PortalError;
use crate::http::HopRequest;

use super::SsoClient;
use super::form::extract_form_params;

/// Portal page whose unauthenticated GET triggers the SSO entry redirect.
pub const PORTAL_ENTRY_PATH: &str = "/jwapp/sys/emaphome/portal/index.do";

/// Hidden form values and cookies captured from the CAS login page.
#[derive(Debug, Clone, Default)]
pub struct LoginParams {
    /// Login ticket.
    pub lt: String,
    /// Login source marker.
    pub source: String,
    /// Page id. Not submitted, kept for completeness.
    pub pid: String,
    /// Webflow execution key.
    pub execution: String,
    /// Cookies the login page's jar holds for its final URL.
    pub cookies: SessionCookieSet,
}

impl SsoClient {
    /// Navigates to the portal unauthenticated, follows the SSO entry redirect
    /// with a fresh jar, and captures the login form parameters.
    ///
    /// A non-empty `prior_token` is planted in the jar as `_astraeus_session`,
    /// scoped to the redirect target, before the target is fetched.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Resolution`] if the entry does not redirect or
    /// the login page does not answer 200, and [`PortalError::Network`] on
    /// transport failure.
    #[instrument(skip(self, prior_token), fields(seeded = !prior_token.is_empty()))]
    pub async fn resolve_login_params(&self, prior_token: &str) -> Result<LoginParams, PortalError> {
        let entry = self.endpoints.portal_url(PORTAL_ENTRY_PATH)?;
        let mut request_url = entry.clone();
        request_url
            .query_pairs_mut()
            .append_pair("origin", entry.as_str())
            .append_pair(
                "reason",
                &format!("site {} not found", self.endpoints.portal_host()),
            );

        let response = self.transport.send(HopRequest::get(request_url)).await?;
        if !response.is_redirect() {
            return Err(PortalError::resolution(
                entry.as_str(),
                format!("expected an SSO redirect, got HTTP {}", response.status),
            ));
        }
        let Some(target) = response.location_url()? else {
            return Err(PortalError::resolution(
                entry.as_str(),
                format!("HTTP {} without a Location header", response.status),
            ));
        };

        let jar = SessionJar::new();
        if !prior_token.is_empty() {
            jar.store(
                &target,
                &Cookie::new(SESSION_TOKEN_COOKIE, prior_token).with_path("/"),
            );
        }

        let page = self.follow_with_jar(&jar, target).await?;
        if page.status != 200 {
            return Err(PortalError::resolution(
                page.url.as_str(),
                format!("login page answered HTTP {}", page.status),
            ));
        }

        let mut form = extract_form_params(&page.body);
        let cookies: SessionCookieSet = jar.cookies_for(&page.url).into_iter().collect();
        debug!(
            form_fields = form.len(),
            cookies = cookies.len(),
            "resolved login parameters"
        );

        Ok(LoginParams {
            lt: form.remove("lt").unwrap_or_default(),
            source: form.remove("source").unwrap_or_default(),
            pid: form.remove("pid").unwrap_or_default(),
            execution: form.remove("execution").unwrap_or_default(),
            cookies,
        })
    }
}
