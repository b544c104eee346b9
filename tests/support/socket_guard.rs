//! Skips wiremock-backed tests where the sandbox forbids loopback sockets.

use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_ENV: &str = "WISEDU_REQUIRE_SOCKET_TESTS";

fn sockets_required() -> bool {
    std::env::var(REQUIRE_ENV)
        .is_ok_and(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Starts a mock gateway, or returns `None` when no loopback socket can be bound.
///
/// With `WISEDU_REQUIRE_SOCKET_TESTS=1` a missing socket fails the test instead.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    match TcpListener::bind("127.0.0.1:0") {
        Ok(_) => Some(MockServer::start().await),
        Err(err) => {
            assert!(
                !sockets_required(),
                "mock gateway needs a loopback socket ({err}); unset {REQUIRE_ENV} to skip"
            );
            eprintln!("skipping mock gateway test: cannot bind loopback ({err}); set {REQUIRE_ENV}=1 to fail instead");
            None
        }
    }
}
