//! Error types shared by the SSO login flow, the grades client, and the
//! grade-file writer.
//!
//! Every fallible operation in the crate returns [`PortalError`] so a host can
//! surface network, protocol, and persistence failures through one channel.

use std::path::PathBuf;

use thiserror::Error;

/// Which of the two login rounds a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginRound {
    /// The first round, answered with the first captcha.
    First,
    /// The second round, seeded with the session-binding token from round one.
    Second,
}

impl std::fmt::Display for LoginRound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Second => f.write_str("second"),
        }
    }
}

/// Errors that can occur while talking to the SSO gateway or the portal.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Transport-level failure (DNS, connect, TLS, timeout) on any hop.
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL being requested.
        url: String,
        /// The underlying transport error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The SSO entry did not redirect, or the login page did not answer 200.
    #[error("could not resolve login parameters from {url}: {reason}")]
    Resolution {
        /// The URL whose response was unexpected.
        url: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A redirect chain exceeded the configured hop cap.
    #[error(
        "redirect chain exceeded {hops} hops at {url}\n  Suggestion: the gateway is probably redirecting in a cycle; retry the login"
    )]
    RedirectLoop {
        /// Number of hops followed before giving up.
        hops: usize,
        /// The URL the walk was about to request.
        url: String,
    },

    /// Round one ended without the gateway issuing a session-binding token.
    #[error(
        "login finished without a session token\n  Suggestion: check the username, password and captcha answer"
    )]
    SessionTokenMissing,

    /// Any failure inside the first login round.
    #[error("first login round failed: {0}")]
    FirstLogin(#[source] Box<PortalError>),

    /// Any failure inside the second login round.
    #[error("second login round failed: {0}")]
    SecondLogin(#[source] Box<PortalError>),

    /// A response body that should be JSON could not be decoded.
    #[error("failed to parse {what}: {source}")]
    Parse {
        /// Which payload failed to decode.
        what: &'static str,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A caller-supplied argument cannot be used.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A configured base URL or a `Location` header could not be parsed.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    /// Writing the grade file failed.
    #[error("IO error writing to {path}: {source}")]
    FileIo {
        /// The file path being written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl PortalError {
    /// Creates a network error from any transport's error.
    pub fn network(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Network {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Creates a resolution error.
    pub fn resolution(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a redirect-loop error.
    pub fn redirect_loop(hops: usize, url: impl Into<String>) -> Self {
        Self::RedirectLoop {
            hops,
            url: url.into(),
        }
    }

    /// Creates a parse error for the named payload.
    pub fn parse(what: &'static str, source: serde_json::Error) -> Self {
        Self::Parse { what, source }
    }

    /// Creates an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates an invalid-URL error.
    pub fn invalid_url(url: impl Into<String>, source: &url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: source.to_string(),
        }
    }

    /// Creates a file IO error.
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Wraps `self` as a failure of the given login round.
    #[must_use]
    pub fn in_round(self, round: LoginRound) -> Self {
        match round {
            LoginRound::First => Self::FirstLogin(Box::new(self)),
            LoginRound::Second => Self::SecondLogin(Box::new(self)),
        }
    }

    /// Returns the login round this error was raised in, if any.
    #[must_use]
    pub fn round(&self) -> Option<LoginRound> {
        match self {
            Self::FirstLogin(_) => Some(LoginRound::First),
            Self::SecondLogin(_) => Some(LoginRound::Second),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_round_wrapping_preserves_cause() {
        let err = PortalError::resolution("https://sso.example/cas/login", "HTTP 500")
            .in_round(LoginRound::Second);
        assert_eq!(err.round(), Some(LoginRound::Second));

        let msg = err.to_string();
        assert!(msg.starts_with("second login round failed"), "got: {msg}");
        assert!(msg.contains("HTTP 500"), "cause should be in message: {msg}");

        let source = err.source().unwrap();
        assert!(source.to_string().contains("could not resolve login parameters"));
    }

    #[test]
    fn test_redirect_loop_message_names_hops_and_url() {
        let err = PortalError::redirect_loop(50, "https://wvpn.example/loop");
        let msg = err.to_string();
        assert!(msg.contains("50 hops"));
        assert!(msg.contains("wvpn.example/loop"));
        assert!(msg.contains("Suggestion"));
        assert_eq!(err.round(), None);
    }

    #[test]
    fn test_parse_error_names_payload() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = PortalError::parse("grades response", source);
        assert!(err.to_string().contains("grades response"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_file_io_message_contains_path() {
        let err = PortalError::file_io(
            "/tmp/grade_data.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/grade_data.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_network_error_keeps_transport_cause() {
        let err = PortalError::network(
            "https://cas.example/cas/login",
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer"),
        );
        assert!(err.to_string().starts_with("network error requesting https://cas.example"));
        let source = err.source().unwrap();
        assert!(source.downcast_ref::<std::io::Error>().is_some());
    }

    #[test]
    fn test_login_round_display() {
        assert_eq!(LoginRound::First.to_string(), "first");
        assert_eq!(LoginRound::Second.to_string(), "second");
    }
}
