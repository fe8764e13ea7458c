//! HTTP Session (C2): a state machine owning one [`Transport`] that
//! serializes a request and parses one response at a time.

use bytes::Bytes;
use http::{HeaderName, HeaderValue, Method, Version};

use crate::error::{Error, ErrorKind};
use crate::request::Request;
use crate::response::Response;
use crate::transport::Transport;

#[cfg(feature = "rustls-tls")]
use crate::transport::TlsConfig;

/// One of four tagged states (spec §3). Only `Fresh`/`Disconnected`/`Idle`
/// may accept a new request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Fresh,
    Disconnected,
    Idle,
    InUse,
}

impl SessionState {
    pub fn can_accept_request(self) -> bool {
        !matches!(self, SessionState::InUse)
    }
}

#[derive(Clone)]
enum TransportKind {
    Plain,
    #[cfg(feature = "rustls-tls")]
    Tls(TlsConfig),
}

impl TransportKind {
    fn build(&self) -> Transport {
        match self {
            TransportKind::Plain => Transport::plain(),
            #[cfg(feature = "rustls-tls")]
            TransportKind::Tls(cfg) => Transport::tls(cfg.clone()),
        }
    }
}

const USER_AGENT: &str = concat!("reactor-http/", env!("CARGO_PKG_VERSION"));

/// Owns exactly one [`Transport`]; see the module documentation for the
/// state diagram (spec §4.2).
pub struct Session {
    state: SessionState,
    transport_kind: TransportKind,
    transport: Option<Transport>,
    connected_host: Option<(String, u16)>,
    connect_timeout: std::time::Duration,
    pending: Request,
}

impl Session {
    pub fn new_plain() -> Self {
        Session::from_kind(TransportKind::Plain)
    }

    #[cfg(feature = "rustls-tls")]
    pub fn new_tls(config: TlsConfig) -> Self {
        Session::from_kind(TransportKind::Tls(config))
    }

    fn from_kind(kind: TransportKind) -> Self {
        Session {
            state: SessionState::Fresh,
            transport_kind: kind,
            transport: None,
            connected_host: None,
            connect_timeout: crate::transport::CONNECT_TIMEOUT,
            pending: Request::default(),
        }
    }

    /// A new session bound to the same transport configuration but with a
    /// fresh, unconnected transport (spec §4.2 `clone`).
    pub fn clone_blank(&self) -> Session {
        let mut session = Session::from_kind(self.transport_kind.clone());
        session.connect_timeout = self.connect_timeout;
        session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Overrides the default 30s connect deadline (spec §9 ambient stack;
    /// [`crate::config::ClientConfig::connect_timeout`]).
    pub fn set_connect_timeout(&mut self, timeout: std::time::Duration) -> &mut Self {
        self.connect_timeout = timeout;
        self
    }

    // -- idempotent setters (spec §4.2 `set_option`) --

    pub fn set_host(&mut self, host: impl Into<String>) -> &mut Self {
        self.pending.host = host.into();
        self
    }

    pub fn set_port(&mut self, port: u16) -> &mut Self {
        self.pending.port = port;
        self
    }

    pub fn set_target(&mut self, target: impl Into<String>) -> &mut Self {
        self.pending.target = target.into();
        self
    }

    pub fn set_method(&mut self, method: Method) -> &mut Self {
        self.pending.method = method;
        self
    }

    pub fn set_version(&mut self, version: Version) -> &mut Self {
        self.pending.version = version;
        self
    }

    pub fn set_keep_alive(&mut self, keep_alive: bool) -> &mut Self {
        self.pending.keep_alive = keep_alive;
        self
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) -> &mut Self {
        self.pending.content_type = Some(content_type.into());
        self
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.pending.set_header(name, value);
        self
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.pending.body = body.into();
        self
    }

    pub fn set_request(&mut self, request: Request) -> &mut Self {
        self.pending = request;
        self
    }

    pub fn request(&self) -> &Request {
        &self.pending
    }

    /// Drives resolve → connect → (handshake) → write → read using the
    /// pending request, or the request set by the most recent `set_*` calls.
    /// Always echoes the request back (spec: "the request is always echoed
    /// so retry code can reconstruct the envelope").
    pub async fn run(&mut self) -> (Request, Result<Response, Error>) {
        let request = self.pending.clone();
        self.run_with(request).await
    }

    /// Like [`Session::run`] but with an explicit request, e.g. a
    /// reconstructed envelope from a [`crate::retry::RetryController`].
    pub async fn run_with(&mut self, mut request: Request) -> (Request, Result<Response, Error>) {
        if !self.state.can_accept_request() {
            // Fatal programmer error (spec §7): concurrent `run` on one session.
            debug_assert!(false, "Session::run called while a request is already in flight");
            return (
                request,
                Err(Error::new(ErrorKind::Write, "session is already in use")),
            );
        }

        self.state = SessionState::InUse;

        let needs_connect = self.transport.is_none()
            || self.connected_host.as_ref() != Some(&(request.host.clone(), request.port));

        let result = self.exchange(&mut request, needs_connect).await;

        match &result {
            Ok(response) => {
                self.state = SessionState::Idle;
                if !response.keep_alive() {
                    self.state = SessionState::Fresh;
                    if let Some(t) = self.transport.as_mut() {
                        t.shutdown().await;
                    }
                    self.transport = None;
                    self.connected_host = None;
                }
            }
            Err(_) => {
                if let Some(t) = self.transport.as_mut() {
                    t.shutdown().await;
                }
                self.transport = None;
                self.connected_host = None;
                self.state = SessionState::Fresh;
            }
        }

        (request, result)
    }

    async fn exchange(&mut self, request: &mut Request, needs_connect: bool) -> Result<Response, Error> {
        if needs_connect {
            let mut transport = self.transport_kind.build();
            log::debug!("connecting to {}:{}", request.host, request.port);
            transport.connect(&request.host, request.port, self.connect_timeout).await?;
            self.transport = Some(transport);
            self.connected_host = Some((request.host.clone(), request.port));
        }

        let transport = self.transport.as_mut().expect("transport set above");

        let wire = request.to_wire(USER_AGENT);
        transport.write(&wire).await?;

        read_response(transport).await
    }

    /// Forces shutdown of the transport (spec §4.2 `close`).
    pub async fn close(&mut self) {
        if let Some(t) = self.transport.as_mut() {
            t.shutdown().await;
        }
        self.transport = None;
        self.connected_host = None;
        self.state = SessionState::Fresh;
    }

    /// Non-blocking check used when handing an idle session back out of the
    /// pool (spec §4.3 `acquire`): if the peer already closed or sent
    /// unsolicited data while this session sat idle, tears the transport
    /// down and returns the session to `Fresh` so the next request reconnects
    /// instead of writing into a dead socket.
    pub fn check_idle(&mut self) {
        if self.state != SessionState::Idle {
            return;
        }
        let Some(transport) = &self.transport else {
            return;
        };
        if transport.poll_idle_closed().unwrap_or(true) {
            self.transport = None;
            self.connected_host = None;
            self.state = SessionState::Fresh;
        }
    }
}

/// Reads and parses exactly one HTTP/1.1 response off `transport`.
async fn read_response(transport: &mut Transport) -> Result<Response, Error> {
    let mut buf: Vec<u8> = Vec::with_capacity(4096);

    let headers_end = loop {
        let n = transport.read(&mut buf).await?;
        if n == 0 {
            return Err(Error::new(ErrorKind::Read, "peer closed before a complete response"));
        }
        if let Some(pos) = find_header_terminator(&buf) {
            break pos;
        }
        if buf.len() > 64 * 1024 {
            return Err(Error::new(ErrorKind::Read, "response headers too large"));
        }
    };

    let mut header_storage = [httparse::EMPTY_HEADER; 64];
    let mut parsed = httparse::Response::new(&mut header_storage);
    let status = parsed
        .parse(&buf[..headers_end])
        .map_err(|e| Error::new(ErrorKind::Read, e.to_string()))?;
    if status.is_partial() {
        return Err(Error::new(ErrorKind::Read, "incomplete response headers"));
    }

    let status_code = http::StatusCode::from_u16(parsed.code.unwrap_or(0))
        .map_err(|e| Error::new(ErrorKind::Read, e.to_string()))?;
    let version = if parsed.version == Some(0) {
        Version::HTTP_10
    } else {
        Version::HTTP_11
    };

    let mut headers = http::HeaderMap::new();
    let mut content_length = 0usize;
    let mut chunked = false;
    for h in parsed.headers.iter() {
        let name = http::HeaderName::from_bytes(h.name.as_bytes())
            .map_err(|e| Error::new(ErrorKind::Read, e.to_string()))?;
        let value = http::HeaderValue::from_bytes(h.value)
            .map_err(|e| Error::new(ErrorKind::Read, e.to_string()))?;
        if name == http::header::CONTENT_LENGTH {
            content_length = std::str::from_utf8(h.value)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
        }
        if name == http::header::TRANSFER_ENCODING
            && h.value.eq_ignore_ascii_case(b"chunked")
        {
            chunked = true;
        }
        headers.append(name, value);
    }

    let mut body = buf.split_off(headers_end);

    if chunked {
        loop {
            if let Some(decoded) = try_decode_chunked(&body) {
                body = decoded;
                break;
            }
            let n = transport.read(&mut body).await?;
            if n == 0 {
                return Err(Error::new(ErrorKind::Read, "peer closed mid-chunked-body"));
            }
        }
    } else {
        while body.len() < content_length {
            let n = transport.read(&mut body).await?;
            if n == 0 {
                return Err(Error::new(ErrorKind::Read, "peer closed mid-body"));
            }
        }
        body.truncate(content_length);
    }

    Ok(Response {
        status: status_code,
        version,
        headers,
        body: Bytes::from(body),
    })
}

fn find_header_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

/// Attempts a full chunked-transfer decode of `buf`; returns `None` if more
/// data is still needed.
fn try_decode_chunked(buf: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    let mut rest = buf;
    loop {
        let line_end = rest.windows(2).position(|w| w == b"\r\n")?;
        let size_str = std::str::from_utf8(&rest[..line_end]).ok()?;
        let size = usize::from_str_radix(size_str.trim(), 16).ok()?;
        rest = &rest[line_end + 2..];
        if size == 0 {
            return Some(out);
        }
        if rest.len() < size + 2 {
            return None;
        }
        out.extend_from_slice(&rest[..size]);
        rest = &rest[size + 2..];
    }
}
