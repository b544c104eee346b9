//! Credential submission to the SSO login endpoint.

use std::fmt;

use tracing::{debug, instrument, warn};

use crate::auth::{CAPTCHA_MARKER_COOKIE, INGRESS_COOKIE, JSESSIONID_COOKIE};
use crate::error::PortalError;
use crate::http::{HopRequest, HopResponse};

use super::SsoClient;
use super::params::LoginParams;

/// CAS login endpoint on the SSO host.
pub const LOGIN_PATH: &str = "/cas/login";

/// Everything the login POST carries.
///
/// `Debug` shows only the username and which cookies are present.
#[derive(Clone, Copy)]
pub struct LoginSubmission<'a> {
    /// `INGRESSCOOKIE` value from the login page.
    pub ingress_cookie: &'a str,
    /// `JSESSIONID` value from the login page.
    pub session_cookie: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    /// Captcha answer text.
    pub captcha: &'a str,
    /// Token of the captcha being answered.
    pub token: &'a str,
    pub lt: &'a str,
    pub source: &'a str,
    pub execution: &'a str,
}

impl<'a> LoginSubmission<'a> {
    /// Builds a submission from resolved login parameters.
    ///
    /// A missing `INGRESSCOOKIE` or `JSESSIONID` is sent as an empty value; the
    /// SSO server then rejects the POST with its own error.
    #[must_use]
    pub fn from_params(
        params: &'a LoginParams,
        username: &'a str,
        password: &'a str,
        captcha: &'a str,
        token: &'a str,
    ) -> Self {
        Self {
            ingress_cookie: required_cookie(params, INGRESS_COOKIE),
            session_cookie: required_cookie(params, JSESSIONID_COOKIE),
            username,
            password,
            captcha,
            token,
            lt: &params.lt,
            source: &params.source,
            execution: &params.execution,
        }
    }

    fn cookie_header(&self) -> String {
        format!(
            "{INGRESS_COOKIE}={}; {JSESSIONID_COOKIE}={}; {CAPTCHA_MARKER_COOKIE}=true",
            self.ingress_cookie, self.session_cookie
        )
    }
}

fn required_cookie<'a>(params: &'a LoginParams, name: &str) -> &'a str {
    params.cookies.value(name).unwrap_or_else(|| {
        warn!(cookie = name, "login page did not set a required cookie");
        ""
    })
}

impl fmt::Debug for LoginSubmission<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginSubmission")
            .field("username", &self.username)
            .field("has_ingress_cookie", &!self.ingress_cookie.is_empty())
            .field("has_session_cookie", &!self.session_cookie.is_empty())
            .finish_non_exhaustive()
    }
}

impl SsoClient {
    /// Submits credentials and a captcha answer to the CAS login endpoint.
    ///
    /// The raw response is returned unfollowed; its `Location` starts the
    /// redirect walk.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Network`] on transport failure.
    #[instrument(skip(self, submission), fields(username = submission.username))]
    pub async fn execute_login(
        &self,
        submission: &LoginSubmission<'_>,
    ) -> Result<HopResponse, PortalError> {
        let url = self.endpoints.sso_url(LOGIN_PATH)?;
        let request = HopRequest::post_form(
            url,
            &[
                ("username", submission.username),
                ("password", submission.password),
                ("captcha", submission.captcha),
                ("token", submission.token),
                ("_eventId", "submit"),
                ("lt", submission.lt),
                ("source", submission.source),
                ("execution", submission.execution),
            ],
        )
        .with_cookies(Some(submission.cookie_header()));

        let response = self.transport.send(request).await?;
        debug!(
            status = response.status,
            redirects = response.is_redirect(),
            "login POST answered"
        );
        Ok(response)
    }
}
