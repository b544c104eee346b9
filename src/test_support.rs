//! In-process [`Transport`] for unit tests.
//!
//! Responses are scripted per `(method, path)`. Each route answers from a
//! queue; the last entry repeats once earlier entries are used up.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::auth::Cookie;
use crate::error::PortalError;
use crate::http::{HopMethod, HopRequest, HopResponse, Transport};

/// One scripted answer.
#[derive(Debug, Clone)]
pub struct Reply {
    status: u16,
    location: Option<String>,
    cookies: Vec<Cookie>,
    body: String,
}

/// Starts a reply with the given status.
pub fn reply(status: u16) -> Reply {
    Reply {
        status,
        location: None,
        cookies: Vec::new(),
        body: String::new(),
    }
}

impl Reply {
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push(Cookie::new(name, value).with_path("/"));
        self
    }

    /// Adds a `Set-Cookie: {name}=; Path=/; Max-Age=0` deletion.
    pub fn expire_cookie(mut self, name: &str) -> Self {
        self.cookies
            .push(Cookie::new(name, "").with_path("/").with_max_age(0));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Reply(Reply),
    Fail(String),
}

type RouteKey = (HopMethod, String);

/// Records every request and answers from scripted routes.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<RouteKey, VecDeque<Scripted>>>,
    requests: Mutex<Vec<HopRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `reply` for `method` on `path`.
    #[must_use]
    pub fn on(self, method: HopMethod, path: &str, reply: Reply) -> Self {
        self.push(method, path, Scripted::Reply(reply));
        self
    }

    /// Queues a connection-reset [`PortalError::Network`] for `method` on `path`.
    #[must_use]
    pub fn fail(self, method: HopMethod, path: &str, message: &str) -> Self {
        self.push(method, path, Scripted::Fail(message.to_string()));
        self
    }

    fn push(&self, method: HopMethod, path: &str, entry: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(entry);
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<HopRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests sent with `method` to `path`.
    pub fn count(&self, method: HopMethod, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url.path() == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HopRequest) -> Result<HopResponse, PortalError> {
        let key = (request.method, request.url.path().to_string());
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        let entry = {
            let mut routes = self.routes.lock().unwrap();
            let queue = routes.get_mut(&key);
            match queue {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match entry {
            Some(Scripted::Reply(reply)) => Ok(HopResponse {
                url,
                status: reply.status,
                location: reply.location,
                set_cookies: reply.cookies,
                body: reply.body,
            }),
            Some(Scripted::Fail(message)) => Err(PortalError::network(
                url.as_str(),
                io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    format!("scripted failure: {message}"),
                ),
            )),
            None => Err(PortalError::resolution(
                url.as_str(),
                format!("no scripted response for {:?} {}", key.0, key.1),
            )),
        }
    }
}
