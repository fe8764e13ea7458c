//! Error taxonomy for the transport/session/retry layers.
//!
//! Transport failures are not exceptions: they travel through the same
//! `(Request, Result<Response, Error>)` channel a successful exchange would
//! use, so the retry layer can reconstruct the original request (spec §7).

use derive_more::{Display, From};

/// The point in the exchange where an [`Error`] originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[non_exhaustive]
pub enum ErrorKind {
    #[display("resolve")]
    Resolve,
    #[display("connect")]
    Connect,
    #[display("handshake")]
    Handshake,
    #[display("write")]
    Write,
    #[display("read")]
    Read,
    #[display("shutdown")]
    Shutdown,
    #[display("idle wait")]
    IdleWait,
    #[display("bad value")]
    BadValue,
}

/// A transport- or value-level error, carrying the [`ErrorKind`] and a
/// human-readable message. Never thrown across an `await` boundary inside
/// the session state machine — delivered to the response handler instead.
#[derive(Debug, Clone, Display)]
#[display("{kind}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
        }
    }

    pub fn resolve(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Resolve, message)
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Connect, message)
    }

    pub fn handshake(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Handshake, message)
    }

    pub fn write(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Write, message)
    }

    pub fn read(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Read, message)
    }

    pub fn bad_value(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::BadValue, message)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Read, err.to_string())
    }
}

/// Errors that can occur while parsing a `WebClient` endpoint URL.
#[derive(Debug, Display, From)]
#[non_exhaustive]
pub enum InvalidUrl {
    #[display("missing host name")]
    MissingHost,

    #[display("unknown or unsupported URL scheme")]
    UnknownScheme,

    #[display("URL parse error: {_0}")]
    Parse(url::ParseError),
}

impl std::error::Error for InvalidUrl {}
