//! Client configuration (C ambient stack): pool capacity, connect timeout,
//! TLS verification mode, and default headers in one builder, grounded on
//! `awc::client::config::ConnectorConfig`/`ConnectConfig`.

use std::time::Duration;

use http::HeaderMap;

use crate::transport::CONNECT_TIMEOUT;

#[cfg(feature = "rustls-tls")]
use crate::transport::TlsConfig;

/// Mirrors `ConnectorConfig`'s role: one struct a [`crate::web_client::WebClient`]
/// or [`crate::subscriber::HttpSubscriber`] is built from, instead of setting
/// pool size, timeout, and TLS mode through separate ad hoc calls.
#[derive(Clone)]
pub struct ClientConfig {
    pool_capacity: usize,
    connect_timeout: Duration,
    verify_peer: bool,
    default_headers: HeaderMap,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            pool_capacity: 5,
            connect_timeout: CONNECT_TIMEOUT,
            verify_peer: true,
            default_headers: HeaderMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        ClientConfig::default()
    }

    /// Max sessions a pool built from this config keeps per endpoint.
    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    /// Bounds DNS resolution and each connect attempt (spec §4.1).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// `false` disables TLS peer verification entirely — unsafe outside a
    /// closed test harness (spec §9 Open Question 1).
    pub fn verify_peer(mut self, verify: bool) -> Self {
        self.verify_peer = verify;
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn get_pool_capacity(&self) -> usize {
        self.pool_capacity
    }

    pub fn get_connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn get_default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    #[cfg(feature = "rustls-tls")]
    pub(crate) fn tls_config(&self) -> TlsConfig {
        if self.verify_peer {
            TlsConfig::verify_peer()
        } else {
            TlsConfig::verify_none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_connect_timeout() {
        let config = ClientConfig::default();
        assert_eq!(config.get_pool_capacity(), 5);
        assert_eq!(config.get_connect_timeout(), CONNECT_TIMEOUT);
    }

    #[test]
    fn builder_overrides_all_fields() {
        let config = ClientConfig::new()
            .pool_capacity(10)
            .connect_timeout(Duration::from_secs(1))
            .verify_peer(false)
            .default_headers(HeaderMap::new());
        assert_eq!(config.get_pool_capacity(), 10);
        assert_eq!(config.get_connect_timeout(), Duration::from_secs(1));
    }
}
