pub mod google_api;
pub mod openai_api;
pub mod openai_client;

use crate::error::DermisError;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use std::time::Duration;
use url::Url;

/// Shared outbound HTTP client for OpenAI and Google calls.
pub fn build_http_client(
    proxy: Option<&Url>,
    timeout: Duration,
) -> Result<reqwest::Client, DermisError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("dermis/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .default_headers(headers);
    if let Some(proxy_url) = proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }
    Ok(builder.build()?)
}
