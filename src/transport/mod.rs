//! Transport (C1): resolve → connect → (handshake) → write → read → shutdown,
//! over either a plain TCP socket or a TLS 1.2+ client connection.
//!
//! Only the cooperative-suspendable execution mode (spec §4.1, §9) is
//! implemented: every step is an `async fn` suspension point, matching the
//! design note's recommendation over the callback-chained alternative. This
//! localizes error handling in [`crate::session::Session`] instead of
//! spreading it across a continuation chain.

mod tcp;
#[cfg(feature = "rustls-tls")]
mod tls;

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Error, ErrorKind};

pub use tcp::TcpTransport;
#[cfg(feature = "rustls-tls")]
pub use tls::{TlsConfig, TlsTransport};

/// Connect has a 30s operation deadline (spec §4.1); `shutdown` for TLS is
/// bounded the same way.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// A byte stream abstraction covering both transport kinds. Held by
/// [`crate::session::Session`], which is the only owner (spec §3 ownership
/// summary).
pub enum Transport {
    Plain(TcpTransport),
    #[cfg(feature = "rustls-tls")]
    Tls(Box<TlsTransport>),
}

impl Transport {
    pub fn plain() -> Self {
        Transport::Plain(TcpTransport::new())
    }

    #[cfg(feature = "rustls-tls")]
    pub fn tls(config: TlsConfig) -> Self {
        Transport::Tls(Box::new(TlsTransport::new(config)))
    }

    /// `connect_timeout` bounds resolve and each connect attempt; callers
    /// typically pass [`crate::config::ClientConfig::connect_timeout`]
    /// rather than the [`CONNECT_TIMEOUT`] default.
    pub async fn connect(&mut self, host: &str, port: u16, connect_timeout: Duration) -> Result<(), Error> {
        let resolved = tokio::time::timeout(connect_timeout, tokio::net::lookup_host((host, port)))
            .await
            .map_err(|_| Error::new(ErrorKind::Resolve, "DNS resolution timed out"))?
            .map_err(|e| Error::new(ErrorKind::Resolve, e.to_string()))?
            .collect::<Vec<_>>();

        if resolved.is_empty() {
            return Err(Error::new(ErrorKind::Resolve, "no addresses found"));
        }

        let mut last_err = None;
        let mut stream = None;
        for addr in resolved {
            match tokio::time::timeout(connect_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(s)) => {
                    stream = Some(s);
                    break;
                }
                Ok(Err(e)) => last_err = Some(e.to_string()),
                Err(_) => last_err = Some("connect timed out".to_owned()),
            }
        }
        let stream = stream.ok_or_else(|| {
            Error::new(
                ErrorKind::Connect,
                last_err.unwrap_or_else(|| "no endpoint reachable".to_owned()),
            )
        })?;

        match self {
            Transport::Plain(t) => t.set_stream(stream),
            #[cfg(feature = "rustls-tls")]
            Transport::Tls(t) => {
                t.handshake(stream, host).await?;
            }
        }
        Ok(())
    }

    pub async fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        match self {
            Transport::Plain(t) => t
                .stream()?
                .write_all(bytes)
                .await
                .map_err(|e| Error::new(ErrorKind::Write, e.to_string())),
            #[cfg(feature = "rustls-tls")]
            Transport::Tls(t) => t
                .stream()?
                .write_all(bytes)
                .await
                .map_err(|e| Error::new(ErrorKind::Write, e.to_string())),
        }
    }

    /// Reads into `buf` until the connection reports readiness has produced
    /// at least one byte, or EOF. Callers loop this until a full HTTP message
    /// has been parsed out of `buf` (spec: reads have no deadline, §5).
    pub async fn read(&mut self, buf: &mut Vec<u8>) -> Result<usize, Error> {
        let mut chunk = [0u8; 8192];
        let n = match self {
            Transport::Plain(t) => t
                .stream()?
                .read(&mut chunk)
                .await
                .map_err(|e| Error::new(ErrorKind::Read, e.to_string()))?,
            #[cfg(feature = "rustls-tls")]
            Transport::Tls(t) => t
                .stream()?
                .read(&mut chunk)
                .await
                .map_err(|e| Error::new(ErrorKind::Read, e.to_string()))?,
        };
        buf.extend_from_slice(&chunk[..n]);
        Ok(n)
    }

    /// Idempotent. TLS performs a graceful close bounded by
    /// [`CONNECT_TIMEOUT`], treating end-of-stream as success, then closes
    /// the socket; subsequent operations are no-ops (spec §4.1).
    pub async fn shutdown(&mut self) {
        match self {
            Transport::Plain(t) => t.shutdown().await,
            #[cfg(feature = "rustls-tls")]
            Transport::Tls(t) => t.shutdown().await,
        }
    }

    /// Reports whether the peer has already closed the connection or sent
    /// unsolicited data while it sat idle, without blocking on a new
    /// readiness event (spec §4.1 `monitor_for_error`, §7 `idle wait`).
    /// Used when reusing a pooled session so `Pool::acquire` never blocks on
    /// a peer that is simply quiet (spec §4.3).
    pub fn poll_idle_closed(&self) -> Result<bool, Error> {
        match self {
            Transport::Plain(t) => t.idle_peer_closed(),
            #[cfg(feature = "rustls-tls")]
            Transport::Tls(t) => t.idle_peer_closed(),
        }
        .map_err(|e| Error::new(ErrorKind::IdleWait, e.to_string()))
    }
}
