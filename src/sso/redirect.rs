//! Explicit redirect walking.
//!
//! The transport never follows redirects. After the login POST, a
//! [`RedirectWalk`] drives the chain one GET at a time through
//! [`WalkState`], attaching cookies from its own [`SessionJar`] and merging
//! every `Set-Cookie` into one flattened [`SessionCookieSet`].

use tracing::{debug, instrument, trace, warn};
use url::Url;

use crate::auth::{Cookie, SESSION_TOKEN_COOKIE, SessionCookieSet, SessionJar};
use crate::error::PortalError;
use crate::http::{HopRequest, HopResponse, Transport};

use super::SsoClient;

/// Output of one login round.
#[derive(Debug, Clone, Default)]
pub struct RoundResult {
    /// Every cookie seen during the round, later values winning.
    pub cookies: SessionCookieSet,
    /// Latest `_astraeus_session` value set by a redirect hop.
    pub session_token: Option<String>,
}

/// States of the redirect walk.
#[derive(Debug)]
pub enum WalkState {
    /// A response is in hand; decide whether it redirects.
    AwaitingRedirect(HopResponse),
    /// The next GET goes to this URL.
    Following(Url),
    /// The chain ended on a response without a usable `Location`.
    Terminated,
    /// A hop failed or the hop cap was reached.
    Failed(PortalError),
}

/// One redirect walk. Owns its jar and merged set; consumed by [`RedirectWalk::run`].
pub(crate) struct RedirectWalk<'a> {
    transport: &'a dyn Transport,
    sweep_origins: [Url; 3],
    prior_token: Option<&'a str>,
    max_hops: usize,
    jar: SessionJar,
    merged: SessionCookieSet,
    session_token: Option<String>,
    hops: usize,
}

impl<'a> RedirectWalk<'a> {
    pub(crate) fn new(
        transport: &'a dyn Transport,
        sweep_origins: [Url; 3],
        prior_token: &'a str,
        max_hops: usize,
    ) -> Self {
        Self {
            transport,
            sweep_origins,
            prior_token: (!prior_token.is_empty()).then_some(prior_token),
            max_hops,
            jar: SessionJar::new(),
            merged: SessionCookieSet::new(),
            session_token: None,
            hops: 0,
        }
    }

    /// Walks the chain starting at the login POST response.
    ///
    /// `seed_url` scopes the POST's cookies inside the walk's jar.
    pub(crate) async fn run(
        mut self,
        initial: HopResponse,
        seed_url: &Url,
    ) -> Result<RoundResult, PortalError> {
        self.jar.store_all(seed_url, &initial.set_cookies);
        self.merged.extend(initial.set_cookies.iter().cloned());

        let mut state = WalkState::AwaitingRedirect(initial);
        loop {
            state = match state {
                WalkState::AwaitingRedirect(response) => Self::next_target(&response),
                WalkState::Following(url) => self.follow(url).await,
                WalkState::Terminated => return Ok(self.finish()),
                WalkState::Failed(error) => return Err(error),
            };
        }
    }

    fn next_target(response: &HopResponse) -> WalkState {
        if !response.is_redirect() {
            return WalkState::Terminated;
        }
        match response.location_url() {
            Ok(Some(url)) => WalkState::Following(url),
            Ok(None) => WalkState::Terminated,
            Err(error) => WalkState::Failed(error),
        }
    }

    async fn follow(&mut self, url: Url) -> WalkState {
        if self.hops >= self.max_hops {
            warn!(hops = self.hops, url = %url, "redirect hop cap reached");
            return WalkState::Failed(PortalError::redirect_loop(self.hops, url.as_str()));
        }

        if self.hops == 0
            && let Some(token) = self.prior_token
        {
            self.jar
                .store(&url, &Cookie::new(SESSION_TOKEN_COOKIE, token).with_path("/"));
            trace!(url = %url, "injected carried session token");
        }

        self.hops += 1;
        let request = HopRequest::get(url.clone()).with_cookies(self.jar.header_for(&url));
        match self.transport.send(request).await {
            Ok(response) => {
                self.absorb(&response);
                WalkState::AwaitingRedirect(response)
            }
            Err(error) => WalkState::Failed(error),
        }
    }

    fn absorb(&mut self, response: &HopResponse) {
        self.jar.store_all(&response.url, &response.set_cookies);
        for cookie in &response.set_cookies {
            if cookie.name == SESSION_TOKEN_COOKIE {
                self.session_token = Some(cookie.value().to_string());
            }
            self.merged.insert(cookie.clone());
        }
        trace!(
            hop = self.hops,
            status = response.status,
            cookies = response.set_cookies.len(),
            "absorbed hop"
        );
    }

    fn finish(mut self) -> RoundResult {
        if self.hops > 0 {
            let mut swept = 0_usize;
            for origin in &self.sweep_origins {
                for cookie in self.jar.cookies_for(origin) {
                    if self.merged.insert_if_absent(cookie) {
                        swept += 1;
                    }
                }
            }
            debug!(hops = self.hops, swept, "redirect walk terminated");
        } else {
            debug!("login response did not redirect");
        }

        RoundResult {
            cookies: self.merged,
            session_token: self.session_token,
        }
    }
}

impl SsoClient {
    /// Walks the redirect chain that follows a login POST.
    ///
    /// A non-empty `prior_token` is injected as `_astraeus_session` before the
    /// first GET.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::RedirectLoop`] past the hop cap, and any
    /// transport error from a hop.
    #[instrument(skip(self, initial, prior_token), fields(status = initial.status))]
    pub async fn walk_redirects(
        &self,
        initial: HopResponse,
        prior_token: &str,
    ) -> Result<RoundResult, PortalError> {
        let origins = self.endpoints.sweep_origins()?;
        let seed_url = origins[0].clone();
        RedirectWalk::new(
            self.transport.as_ref(),
            origins,
            prior_token,
            self.max_redirect_hops,
        )
        .run(initial, &seed_url)
        .await
    }

    /// GETs `start` and keeps following redirects through `jar` until a
    /// non-redirect response, storing every `Set-Cookie` along the way.
    pub(crate) async fn follow_with_jar(
        &self,
        jar: &SessionJar,
        start: Url,
    ) -> Result<HopResponse, PortalError> {
        let mut url = start;
        let mut hops = 0_usize;
        loop {
            if hops >= self.max_redirect_hops {
                return Err(PortalError::redirect_loop(hops, url.as_str()));
            }
            hops += 1;

            let request = HopRequest::get(url.clone()).with_cookies(jar.header_for(&url));
            let response = self.transport.send(request).await?;
            jar.store_all(&response.url, &response.set_cookies);

            if !response.is_redirect() {
                return Ok(response);
            }
            match response.location_url()? {
                Some(next) => url = next,
                None => return Ok(response),
            }
        }
    }
}
