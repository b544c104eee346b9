//! SSO gateway client: captcha fetch, login-parameter resolution, the login
//! POST, the redirect walk, and the two-round login built on top of them.
//!
//! # Flow
//!
//! ```text
//! login
//!  ├─ round 1: resolve_login_params("") → execute_login → walk_redirects
//!  │            └─ yields the session-binding token
//!  └─ round 2: resolve_login_params(token) → execute_login → walk_redirects
//!               └─ yields the final SessionCookieSet
//! ```
//!
//! Every call builds its own [`crate::auth::SessionJar`]; nothing is shared
//! between attempts except the transport.

mod captcha;
mod executor;
mod form;
mod orchestrator;
mod params;
mod redirect;

use std::sync::Arc;

use crate::config::{PortalConfig, PortalEndpoints};
use crate::error::PortalError;
use crate::http::{ReqwestTransport, Transport};

pub use captcha::{CAPTCHA_PATH, Captcha};
pub use executor::{LOGIN_PATH, LoginSubmission};
pub use form::{FORM_PARAM_NAMES, extract_form_params};
pub use orchestrator::{CaptchaAnswer, LoginRequest};
pub use params::{LoginParams, PORTAL_ENTRY_PATH};
pub use redirect::{RoundResult, WalkState};

/// Client for the SSO gateway.
#[derive(Clone)]
pub struct SsoClient {
    transport: Arc<dyn Transport>,
    endpoints: PortalEndpoints,
    max_redirect_hops: usize,
}

impl std::fmt::Debug for SsoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsoClient")
            .field("endpoints", &self.endpoints)
            .field("max_redirect_hops", &self.max_redirect_hops)
            .finish_non_exhaustive()
    }
}

impl SsoClient {
    /// Creates a client with a real HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::ClientSetup`] when the HTTP client cannot be built.
    pub fn new(config: &PortalConfig) -> Result<Self, PortalError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Creates a client over an arbitrary transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>, config: &PortalConfig) -> Self {
        Self {
            transport,
            endpoints: config.endpoints.clone(),
            max_redirect_hops: config.max_redirect_hops,
        }
    }

    /// Hosts this client talks to.
    #[must_use]
    pub fn endpoints(&self) -> &PortalEndpoints {
        &self.endpoints
    }
}
