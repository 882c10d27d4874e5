use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING};
use reqwest::Client;

/// Sent on every request; the mod registry rejects anonymous agents.
pub const APP_USER_AGENT: &str = concat!(
    "craftline/",
    env!("CARGO_PKG_VERSION"),
    " (launcher core)"
);

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    // Hashes are computed over the exact bytes on the wire.
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    default_headers.insert(ACCEPT, HeaderValue::from_static("application/json, */*"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .build()
}
