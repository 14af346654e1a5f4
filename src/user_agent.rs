//! Shared User-Agent string for login, catalog and download traffic.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/unspok3n/beatportdl";

/// Default User-Agent for every request the tool makes.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("beatportdl/{version} (+{PROJECT_UA_URL})")
}
