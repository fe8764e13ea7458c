//! The request envelope (spec §3): everything a [`crate::session::Session`]
//! needs to serialize one HTTP/1.1 request, independent of the transport
//! that will carry it.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Version};

/// Legacy wire quirk from the original C++ source: the port is additionally
/// written into the request as a plain header named `port` (spec §6, Open
/// Question 2). Default on for wire compatibility; flip off for a clean
/// rewrite of a peer that doesn't expect it.
pub const LEGACY_PORT_HEADER: &str = "port";

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub version: Version,
    pub host: String,
    pub port: u16,
    pub target: String,
    pub headers: HeaderMap,
    pub keep_alive: bool,
    pub content_type: Option<String>,
    pub body: Bytes,
    pub legacy_port_header: bool,
}

impl Default for Request {
    fn default() -> Self {
        Request {
            method: Method::GET,
            version: Version::HTTP_11,
            host: String::new(),
            port: 80,
            target: "/".to_owned(),
            headers: HeaderMap::new(),
            keep_alive: true,
            content_type: None,
            body: Bytes::new(),
            legacy_port_header: true,
        }
    }
}

impl Request {
    pub fn new(method: Method, host: impl Into<String>, port: u16, target: impl Into<String>) -> Self {
        Request {
            method,
            host: host.into(),
            port,
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.append(name, value);
    }

    /// Serializes this envelope as an RFC 7230 request-line + headers + body,
    /// filling in `Host`, `User-Agent` and `Connection` the way
    /// [`crate::session::Session::run`] does for every exchange.
    pub fn to_wire(&self, user_agent: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + 256);

        let version = if self.version == Version::HTTP_10 { "1.0" } else { "1.1" };
        out.extend_from_slice(
            format!("{} {} HTTP/{}\r\n", self.method, self.target, version).as_bytes(),
        );

        let host_header = if self.port == 80 || self.port == 443 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        };
        out.extend_from_slice(format!("Host: {host_header}\r\n").as_bytes());
        out.extend_from_slice(format!("User-Agent: {user_agent}\r\n").as_bytes());
        out.extend_from_slice(
            format!(
                "Connection: {}\r\n",
                if self.keep_alive { "keep-alive" } else { "close" }
            )
            .as_bytes(),
        );

        if self.legacy_port_header {
            out.extend_from_slice(format!("{LEGACY_PORT_HEADER}: {}\r\n", self.port).as_bytes());
        }

        if let Some(ct) = &self.content_type {
            out.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
        }
        if !self.body.is_empty() {
            out.extend_from_slice(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        }

        for (name, value) in self.headers.iter() {
            out.extend_from_slice(name.as_str().as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }

        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }
}
