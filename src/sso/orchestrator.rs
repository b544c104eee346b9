//! Two-round login.
//!
//! Round one yields the session-binding token; round two replays the whole
//! flow with that token planted and yields the cookies the portal accepts.
//! Only the token crosses the round boundary.

use std::fmt;

use serde::Deserialize;
use tracing::{info, instrument};

use crate::auth::SessionCookieSet;
use crate::error::{LoginRound, PortalError};

use super::SsoClient;
use super::executor::LoginSubmission;
use super::redirect::RoundResult;

/// A solved captcha: the answer text and the token of the image it answers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaptchaAnswer {
    /// Characters read from the image.
    pub text: String,
    /// Token returned alongside the image.
    pub token: String,
}

impl CaptchaAnswer {
    #[must_use]
    pub fn new(text: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            token: token.into(),
        }
    }
}

/// Credentials plus one solved captcha per round.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Captcha answered in round one.
    pub first: CaptchaAnswer,
    /// Captcha answered in round two.
    pub second: CaptchaAnswer,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("first", &self.first)
            .field("second", &self.second)
            .finish()
    }
}

impl SsoClient {
    /// Runs both login rounds and returns the final merged cookie set.
    ///
    /// Each call starts from nothing; a failed earlier attempt leaves no state
    /// behind.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::FirstLogin`] or [`PortalError::SecondLogin`]
    /// wrapping the failing step. Round one ending without a session token is
    /// reported as `FirstLogin(SessionTokenMissing)` and round two never starts.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: &LoginRequest) -> Result<SessionCookieSet, PortalError> {
        let first = self
            .login_round(request, &request.first, "")
            .await
            .map_err(|e| e.in_round(LoginRound::First))?;
        let token = first
            .session_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| PortalError::SessionTokenMissing.in_round(LoginRound::First))?;
        info!("First login round complete");

        let second = self
            .login_round(request, &request.second, &token)
            .await
            .map_err(|e| e.in_round(LoginRound::Second))?;
        info!(cookies = second.cookies.len(), "Second login round complete");

        Ok(second.cookies)
    }

    /// Resolve, submit, walk: one round of the flow.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error, unwrapped.
    pub async fn login_round(
        &self,
        request: &LoginRequest,
        captcha: &CaptchaAnswer,
        prior_token: &str,
    ) -> Result<RoundResult, PortalError> {
        let params = self.resolve_login_params(prior_token).await?;
        let submission = LoginSubmission::from_params(
            &params,
            &request.username,
            &request.password,
            &captcha.text,
            &captcha.token,
        );
        let response = self.execute_login(&submission).await?;
        self.walk_redirects(response, prior_token).await
    }
}
