//! Host-facing login module. Errors come back as What/Why/Fix strings.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::auth::SessionCookieSet;
use crate::config::PortalConfig;
use crate::error::PortalError;
use crate::grades::{GradeReport, GradesClient, save_grade_to_file};
use crate::http::{ReqwestTransport, Transport};
use crate::sso::{Captcha, LoginRequest, SsoClient};

use super::{AppContext, AppModule};

/// Login and grades module.
///
/// Holds nothing but the configuration captured at startup; every call builds
/// fresh clients, so a failed call never affects the next one.
#[derive(Default)]
pub struct LoginApp {
    config: Option<PortalConfig>,
    transport: Option<Arc<dyn Transport>>,
}

impl std::fmt::Debug for LoginApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginApp")
            .field("started", &self.is_started())
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

impl AppModule for LoginApp {
    fn name(&self) -> &'static str {
        "login"
    }

    fn startup(&mut self, ctx: &AppContext) {
        self.config = Some(ctx.config.clone());
    }
}

impl LoginApp {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Module that sends every request through `transport`.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            config: None,
            transport: Some(transport),
        }
    }

    /// True once `startup` has run.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.config.is_some()
    }

    /// Fetches a captcha image and its token.
    ///
    /// # Errors
    ///
    /// Returns a What/Why/Fix message on any failure.
    pub async fn get_captcha(&self) -> Result<Captcha, String> {
        let (config, transport) = self.parts()?;
        SsoClient::with_transport(transport, config)
            .fetch_captcha()
            .await
            .map_err(|e| describe("Could not fetch a captcha.", &e))
    }

    /// Runs the two-round login.
    ///
    /// # Errors
    ///
    /// Returns a What/Why/Fix message naming the round that failed.
    pub async fn login(&self, request: &LoginRequest) -> Result<SessionCookieSet, String> {
        let (config, transport) = self.parts()?;
        SsoClient::with_transport(transport, config)
            .login(request)
            .await
            .map_err(|e| describe("Login failed.", &e))
    }

    /// Queries every grade with a prior login's cookies.
    ///
    /// # Errors
    ///
    /// Returns a What/Why/Fix message on any failure.
    pub async fn query_all_grade(&self, cookies: &SessionCookieSet) -> Result<GradeReport, String> {
        let (config, transport) = self.parts()?;
        GradesClient::with_transport(transport, config)
            .query_grades(cookies)
            .await
            .map_err(|e| describe("Could not query grades.", &e))
    }

    /// Writes `report` to the configured grade file and returns its path.
    ///
    /// # Errors
    ///
    /// Returns a What/Why/Fix message when the file cannot be written.
    pub fn save_grade_to_file(&self, report: &GradeReport) -> Result<PathBuf, String> {
        let config = self.config()?;
        let path = config.grade_output_path();
        save_grade_to_file(report, &path)
            .map_err(|e| describe("Could not save the grade report.", &e))?;
        Ok(path)
    }

    fn config(&self) -> Result<&PortalConfig, String> {
        self.config.as_ref().ok_or_else(|| {
            "What: The login module is not started.\n\
             Why: startup() was not called before this request.\n\
             Fix: Start the module through AppManager::startup before using it."
                .to_string()
        })
    }

    fn parts(&self) -> Result<(&PortalConfig, Arc<dyn Transport>), String> {
        let config = self.config()?;
        let transport = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => {
                let transport = ReqwestTransport::new(config)
                    .map_err(|e| describe("Could not set up networking.", &e))?;
                Arc::new(transport) as Arc<dyn Transport>
            }
        };
        Ok((config, transport))
    }
}

/// Formats `error` as a What/Why/Fix message.
fn describe(what: &str, error: &PortalError) -> String {
    warn!(error = %error, "{what}");
    let fix = match error {
        PortalError::FirstLogin(inner) if matches!(**inner, PortalError::SessionTokenMissing) => {
            "The first captcha, username or password was probably wrong. Fetch two new captchas and retry."
        }
        PortalError::FirstLogin(_) => {
            "Check the username, password and first captcha, then retry with two new captchas."
        }
        PortalError::SecondLogin(_) => {
            "The second captcha was probably wrong. Fetch two new captchas and retry."
        }
        PortalError::Network { .. } | PortalError::ClientSetup(_) => {
            "Check network access to the campus gateway and retry."
        }
        PortalError::RedirectLoop { .. } => "The gateway redirected in a cycle. Retry the login.",
        PortalError::Resolution { .. } | PortalError::InvalidUrl { .. } => {
            "The gateway answered unexpectedly. Check the configured endpoints and retry."
        }
        PortalError::InvalidArgument(_) => "Log in first and pass the cookies it returned.",
        PortalError::Parse { .. } => {
            "The session has probably expired. Log in again and retry the query."
        }
        PortalError::FileIo { .. } => {
            "Check that the output directory exists and is writable, or set output_file in config.json."
        }
        PortalError::SessionTokenMissing => "Retry the login with two new captchas.",
    };
    format!("What: {what}\nWhy: {error}\nFix: {fix}")
}
