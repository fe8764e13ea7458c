//! WebClient (C6): fluent, immutable-intermediary builder over a
//! [`Session`], terminating in a [`HttpMono`] or [`HttpFlux`] (spec §4.6).

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{Error, InvalidUrl};
use crate::http_source::{HttpFlux, HttpMono};
use crate::request::Request;
use crate::session::Session;

pub struct WebClient {
    session: Session,
    secure: bool,
    retry: Option<i32>,
    config: ClientConfig,
}

impl Default for WebClient {
    fn default() -> Self {
        let config = ClientConfig::default();
        let mut session = Session::new_plain();
        session.set_connect_timeout(config.get_connect_timeout());
        WebClient {
            session,
            secure: false,
            retry: None,
            config,
        }
    }
}

impl WebClient {
    pub fn new() -> Self {
        WebClient::default()
    }

    /// Creates the session (and thus the transport) with an explicit kind
    /// rather than inferring it later from the endpoint scheme — mirrors
    /// `with_session(executor, transport-args…)` (spec §4.6).
    pub fn with_session(session: Session) -> Self {
        WebClient {
            session,
            secure: false,
            retry: None,
            config: ClientConfig::default(),
        }
    }

    /// Applies pool-style connect timeout, TLS verification mode, and
    /// default headers from one [`ClientConfig`] (spec §3 ambient stack,
    /// grounded on `awc::client::config::ConnectorConfig`). Call before
    /// `with_endpoint` so a secure scheme picks up the configured TLS mode.
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.session.set_connect_timeout(config.get_connect_timeout());
        for (name, value) in config.get_default_headers().iter() {
            self.session.set_header(name.clone(), value.clone());
        }
        self.config = config;
        self
    }

    /// Parses `url` into host/port/path/query and selects a matching
    /// transport kind if the scheme requires TLS (spec §4.6, §6).
    pub fn with_endpoint(mut self, url: &str) -> Result<Self, InvalidUrl> {
        let endpoint = crate::url::parse(url)?;

        #[cfg(feature = "rustls-tls")]
        if endpoint.secure && !self.secure {
            let mut session = Session::new_tls(self.config.tls_config());
            session.set_connect_timeout(self.config.get_connect_timeout());
            self.session = session;
        }
        #[cfg(not(feature = "rustls-tls"))]
        if endpoint.secure {
            return Err(InvalidUrl::UnknownScheme);
        }

        self.secure = endpoint.secure;
        let target = endpoint.target();
        self.session
            .set_host(endpoint.host)
            .set_port(endpoint.port)
            .set_target(target);
        Ok(self)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.session.set_host(host);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.session.set_port(port);
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.session.set_target(target);
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.session.set_method(method);
        self
    }

    pub fn get(self, url: &str) -> Result<Self, InvalidUrl> {
        self.with_method(Method::GET).with_endpoint(url)
    }

    pub fn post(self, url: &str) -> Result<Self, InvalidUrl> {
        self.with_method(Method::POST).with_endpoint(url)
    }

    pub fn patch(self, url: &str) -> Result<Self, InvalidUrl> {
        self.with_method(Method::PATCH).with_endpoint(url)
    }

    pub fn put(self, url: &str) -> Result<Self, InvalidUrl> {
        self.with_method(Method::PUT).with_endpoint(url)
    }

    pub fn del(self, url: &str) -> Result<Self, InvalidUrl> {
        self.with_method(Method::DELETE).with_endpoint(url)
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers.iter() {
            self.session.set_header(name.clone(), value.clone());
        }
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.session.set_header(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.session.set_body(body);
        self
    }

    /// Sets the body to the JSON serialization of `value` and the content
    /// type to `application/json` (spec §4.6 `with_body(json)`).
    pub fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, Error> {
        let body = serde_json::to_vec(value).map_err(|e| Error::bad_value(e.to_string()))?;
        self.session.set_content_type("application/json");
        self.session.set_body(body);
        Ok(self)
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.session.set_content_type(content_type);
        self
    }

    pub fn with_request(mut self, request: Request) -> Self {
        self.session.set_request(request);
        self
    }

    pub fn with_retry(mut self, n: i32) -> Self {
        self.retry = Some(n);
        self
    }

    /// Terminal: materializes a one-shot [`HttpMono`] (spec §4.6 `to_mono`).
    pub fn to_mono(self) -> HttpMono {
        let mono = HttpMono::new(self.session);
        match self.retry {
            Some(n) => mono.retry(n),
            None => mono,
        }
    }

    /// Terminal: materializes a [`HttpFlux`] with an exchange budget of
    /// `count` (spec §4.6 `to_flux`).
    pub fn to_flux(self, count: u32) -> HttpFlux {
        let flux = HttpFlux::new(self.session, count);
        match self.retry {
            Some(n) => flux.retry(n),
            None => flux,
        }
    }

    /// Terminal: materializes an unbounded streaming [`HttpFlux`]
    /// (`forever = true`, spec §4.6).
    pub fn to_flux_forever(self) -> HttpFlux {
        let flux = HttpFlux::forever(self.session);
        match self.retry {
            Some(n) => flux.retry(n),
            None => flux,
        }
    }
}
