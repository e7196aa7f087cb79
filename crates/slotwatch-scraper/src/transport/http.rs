use std::time::Duration;

use reqwest::Client;

use super::RawResponse;
use crate::error::TransportError;
use crate::user_agent::random_user_agent;

/// Plain HTTP GETs with a per-request timeout and a random `User-Agent`.
///
/// Idle connections are never pooled: a kept-alive connection would stay on
/// the circuit it was opened on and defeat identity rotation.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher, optionally routed through `proxy`
    /// (e.g. `socks5h://127.0.0.1:9050`).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] if the proxy URL is invalid or
    /// the underlying `reqwest::Client` cannot be constructed.
    pub fn new(proxy: Option<&str>, timeout_secs: u64) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(0);

        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(TransportError::ClientBuild)?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(TransportError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Sends one GET and returns whatever status the server answered with.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Timeout`] when the request exceeds the
    /// configured timeout and [`TransportError::Network`] for any other
    /// connect, TLS, or body read failure.
    pub async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        let user_agent = random_user_agent();

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "de-DE,de;q=0.9,en;q=0.8")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| TransportError::from_request(url, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::from_request(url, e))?;

        tracing::debug!(url, status, user_agent, "fetched page");
        Ok(RawResponse { status, body })
    }
}
