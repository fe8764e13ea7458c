//! Endpoint parsing: `scheme://host[:port]/path[?query]` → host/port/path/query.
//!
//! Only host, port, path and query are used; fragments are ignored (spec §6).

use crate::error::InvalidUrl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub secure: bool,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub query: Option<String>,
}

impl Endpoint {
    /// The path used as the HTTP request target, including a `?query` suffix
    /// when present.
    pub fn target(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }
}

pub fn parse(raw: &str) -> Result<Endpoint, InvalidUrl> {
    let parsed = url::Url::parse(raw)?;

    let secure = match parsed.scheme() {
        "https" => true,
        "http" => false,
        _ => return Err(InvalidUrl::UnknownScheme),
    };

    let host = parsed.host_str().ok_or(InvalidUrl::MissingHost)?.to_owned();
    let port = parsed
        .port()
        .unwrap_or(if secure { 443 } else { 80 });

    let path = if parsed.path().is_empty() {
        "/".to_owned()
    } else {
        parsed.path().to_owned()
    };

    Ok(Endpoint {
        secure,
        host,
        port,
        path,
        query: parsed.query().map(str::to_owned),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_http_port() {
        let e = parse("http://example.com/foo").unwrap();
        assert_eq!(e.port, 80);
        assert!(!e.secure);
        assert_eq!(e.path, "/foo");
    }

    #[test]
    fn defaults_https_port() {
        let e = parse("https://example.com/foo").unwrap();
        assert_eq!(e.port, 443);
        assert!(e.secure);
    }

    #[test]
    fn explicit_port_and_query() {
        let e = parse("http://127.0.0.1:8081/testget?x=1").unwrap();
        assert_eq!(e.host, "127.0.0.1");
        assert_eq!(e.port, 8081);
        assert_eq!(e.target(), "/testget?x=1");
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(matches!(parse("ftp://x/y"), Err(InvalidUrl::UnknownScheme)));
    }
}
