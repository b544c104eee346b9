//! Captcha image and token fetch from the SSO gateway.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::PortalError;
use crate::http::HopRequest;

use super::SsoClient;

/// Captcha API path on the SSO host.
pub const CAPTCHA_PATH: &str = "/sso/apis/v2/open/captcha";

/// A captcha challenge: the image (a data URL or image URL) and the token that
/// must accompany its answer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Captcha {
    /// Image payload as returned by the gateway.
    pub img: String,
    /// Token binding an answer to this image.
    pub token: String,
}

impl fmt::Debug for Captcha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Captcha")
            .field("img_len", &self.img.len())
            .field("token", &self.token)
            .finish()
    }
}

impl SsoClient {
    /// Fetches a fresh captcha. No retries; the caller decides whether to ask again.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Network`] on transport failure and
    /// [`PortalError::Parse`] when the body is not `{img, token}` JSON.
    #[instrument(skip(self))]
    pub async fn fetch_captcha(&self) -> Result<Captcha, PortalError> {
        let mut url = self.endpoints.sso_url(CAPTCHA_PATH)?;
        url.query_pairs_mut()
            .append_pair("imageWidth", "100")
            .append_pair("captchaSize", "4");

        let response = self.transport.send(HopRequest::get(url)).await?;
        let captcha: Captcha = serde_json::from_str(&response.body)
            .map_err(|e| PortalError::parse("captcha response", e))?;
        debug!(status = response.status, img_len = captcha.img.len(), "captcha fetched");
        Ok(captcha)
    }
}
