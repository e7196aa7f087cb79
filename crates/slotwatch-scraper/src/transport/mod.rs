//! Anonymized HTTP transport.
//!
//! The [`Transport`] trait is the seam the poller depends on: one call to
//! obtain a fresh network identity and one plain GET. [`TorTransport`] is the
//! production implementation, routing requests through a local Tor SOCKS
//! proxy and rotating circuits over the Tor control port.

mod control;
mod http;

use async_trait::async_trait;
use slotwatch_core::TorConfig;

use crate::error::TransportError;

pub use control::ControlChannel;
pub use http::HttpFetcher;

/// Status and body of one GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// A network route whose egress identity can be replaced on demand.
///
/// Callers rotate before every fetch; implementations never retry
/// internally.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Requests a new anonymous identity and waits for acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::IdentityRotation`] if the control channel is
    /// unreachable, rejects authentication, or does not acknowledge.
    async fn rotate_identity(&self) -> Result<(), TransportError>;

    /// Performs a single GET over the anonymized route.
    ///
    /// Any HTTP status is a successful fetch; only transport-level failures
    /// are errors.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Network`] or [`TransportError::Timeout`].
    async fn fetch(&self, url: &str) -> Result<RawResponse, TransportError>;
}

/// Tor-backed [`Transport`]: SOCKS proxy for requests, control port for
/// `NEWNYM` identity rotation.
pub struct TorTransport {
    http: HttpFetcher,
    control: ControlChannel,
}

impl TorTransport {
    /// Builds the transport from the Tor section of the app config.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] if the proxy URL is invalid or
    /// the HTTP client cannot be constructed.
    pub fn new(config: &TorConfig, request_timeout_secs: u64) -> Result<Self, TransportError> {
        let http = HttpFetcher::new(Some(&config.socks_proxy), request_timeout_secs)?;
        let control = ControlChannel::new(
            config.control_addr,
            config.control_password.clone(),
            config.control_timeout_secs,
        );
        Ok(Self::from_parts(http, control))
    }

    #[must_use]
    pub fn from_parts(http: HttpFetcher, control: ControlChannel) -> Self {
        Self { http, control }
    }
}

#[async_trait]
impl Transport for TorTransport {
    async fn rotate_identity(&self) -> Result<(), TransportError> {
        self.control.new_identity().await
    }

    async fn fetch(&self, url: &str) -> Result<RawResponse, TransportError> {
        self.http.get(url).await
    }
}
