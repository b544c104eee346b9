//! Grades query against the academic-records portal.
//!
//! Refreshes the rotating `_WEU` cookie, then posts the fixed grade query.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::auth::{PORTAL_COOKIES, SessionCookieSet, WEU_COOKIE};
use crate::config::{PortalConfig, PortalEndpoints};
use crate::error::PortalError;
use crate::http::{HopRequest, ReqwestTransport, Transport};

/// Portal page whose GET rotates the `_WEU` cookie.
pub const APP_SHOW_PATH: &str = "/jwapp/sys/emaphome/appShow.do";
/// App id of the grades module, passed to [`APP_SHOW_PATH`].
pub const GRADES_APP_ID: &str = "d71f7b57b4f348368f06c3e9a2a0988f";
/// Grades query endpoint.
pub const GRADES_QUERY_PATH: &str = "/jwapp/sys/cjcx/modules/cjcx/xscjcx.do";
/// Grades module index page, sent as `Referer`.
const GRADES_REFERER_PATH: &str = "/jwapp/sys/cjcx/*default/index.do?THEME=purple&EMAP_LANG=zh";

/// Valid records only, without the max-score view.
const QUERY_SETTING: &str = r#"[{"name":"SFYX","caption":"是否有效","linkOpt":"AND","builderList":"cbl_m_List","builder":"m_value_equal","value":"1","value_display":"是"},{"name":"SHOWMAXCJ","caption":"显示最高成绩","linkOpt":"AND","builderList":"cbl_m_List","builder":"m_value_equal","value":"0","value_display":"否"}]"#;
/// Term, course, class: all descending.
const QUERY_ORDER: &str = "-XNXQDM,-KCH,-KXH";
const PAGE_SIZE: &str = "100";
const PAGE_NUMBER: &str = "1";

/// Parsed grades payload together with the cookie set used to fetch it.
///
/// Serializes as `{"data": ..., "cookies": ...}`, the layout of the grade file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeReport {
    /// Grades JSON exactly as the portal returned it.
    pub data: serde_json::Value,
    /// Input cookies, with `_WEU` refreshed when the portal rotated it.
    pub cookies: SessionCookieSet,
}

/// Client for authenticated portal queries.
#[derive(Clone)]
pub struct GradesClient {
    transport: Arc<dyn Transport>,
    endpoints: PortalEndpoints,
}

impl std::fmt::Debug for GradesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradesClient")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl GradesClient {
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
        }
    }

    /// Fetches every valid grade record (first page of 100).
    ///
    /// # Errors
    ///
    /// - [`PortalError::InvalidArgument`] if `cookies` is empty; nothing is sent.
    /// - [`PortalError::Network`] on transport failure.
    /// - [`PortalError::Parse`] if the grades body is not JSON.
    #[instrument(skip(self, cookies), fields(cookies = cookies.len()))]
    pub async fn query_grades(&self, cookies: &SessionCookieSet) -> Result<GradeReport, PortalError> {
        if cookies.is_empty() {
            return Err(PortalError::invalid_argument(
                "cookie set is empty; log in before querying grades",
            ));
        }
        let mut cookies = cookies.clone();

        self.refresh_weu(&mut cookies).await?;

        let url = self.endpoints.portal_url(GRADES_QUERY_PATH)?;
        let referer = self.endpoints.portal_url(GRADES_REFERER_PATH)?;
        let request = HopRequest::post_form(
            url,
            &[
                ("querySetting", QUERY_SETTING),
                ("*order", QUERY_ORDER),
                ("pageSize", PAGE_SIZE),
                ("pageNumber", PAGE_NUMBER),
            ],
        )
        .with_header("content-type", "application/x-www-form-urlencoded; charset=UTF-8")
        .with_header("referer", referer.as_str())
        .with_header("accept", "application/json, text/javascript, */*; q=0.01")
        .with_header("origin", self.endpoints.portal_base.trim_end_matches('/'))
        .with_header("x-requested-with", "XMLHttpRequest")
        .with_cookies(cookies.cookie_header(&PORTAL_COOKIES));

        let response = self.transport.send(request).await?;
        let data: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| PortalError::parse("grades response", e))?;
        info!(status = response.status, "Grades fetched");

        Ok(GradeReport { data, cookies })
    }

    async fn refresh_weu(&self, cookies: &mut SessionCookieSet) -> Result<(), PortalError> {
        let mut url = self.endpoints.portal_url(APP_SHOW_PATH)?;
        url.query_pairs_mut().append_pair("id", GRADES_APP_ID);

        let request = HopRequest::get(url).with_cookies(cookies.cookie_header(&PORTAL_COOKIES));
        let response = self.transport.send(request).await?;
        if let Some(weu) = response.set_cookie(WEU_COOKIE) {
            cookies.set_value(WEU_COOKIE, weu.value());
            debug!("_WEU rotated");
        }
        Ok(())
    }
}
