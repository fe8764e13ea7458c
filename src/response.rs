//! The response envelope (spec §3).

use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};

use crate::error::{Error, ErrorKind};

#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn keep_alive(&self) -> bool {
        match self.headers.get(http::header::CONNECTION) {
            Some(v) => !v.as_bytes().eq_ignore_ascii_case(b"close"),
            None => self.version != Version::HTTP_10,
        }
    }

    /// Parses the body as JSON, surfacing a [`ErrorKind::BadValue`] error
    /// through the normal value channel rather than a transport failure
    /// (spec §6/§7) — `as_json` on [`crate::http_source::HttpMono`] and
    /// [`crate::http_source::HttpFlux`] builds on this.
    pub fn as_json<T: serde::de::DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::new(ErrorKind::BadValue, e.to_string()))
    }

    /// A synthetic response delivered to a response handler when a transport
    /// error occurs instead of a real reply (spec §4.2/§7).
    pub fn not_found() -> Response {
        Response {
            status: StatusCode::NOT_FOUND,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}
