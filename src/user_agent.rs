//! Shared User-Agent string for gateway and portal requests.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/HEU-Wisedu/wisedu";

/// Default User-Agent for every request the crate issues.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("wisedu/{version} (records-client; +{PROJECT_UA_URL})")
}
