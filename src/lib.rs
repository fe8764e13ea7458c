//! A reactive HTTP client toolkit: `Mono`/`Flux` publishers backed by a
//! pooled, retrying, TLS-capable HTTP/1.1 session.
//!
//! [`WebClient`] builds one-shot or repeated exchanges over a [`Session`];
//! [`HttpSubscriber`] pushes outbound events through a pool with at-least-once
//! retry semantics. The reactive core in [`reactive`] is transport-agnostic —
//! `Flux`/`Mono` work over any [`reactive::Source`], not just HTTP.

pub mod config;
pub mod error;
pub mod http_sink;
pub mod http_source;
pub mod pool;
pub mod reactive;
pub mod request;
pub mod response;
pub mod retry;
pub mod session;
pub mod subscriber;
pub mod transport;
pub mod url;
pub mod web_client;

pub use config::ClientConfig;
pub use error::{Error, ErrorKind, InvalidUrl};
pub use http_sink::HttpSink;
pub use http_source::{HttpFlux, HttpMono, HttpSource};
pub use pool::Pool;
pub use reactive::{AsyncSink, Broadcaster, Flux, Lazy, Mono, Source, SyncGroup, SyncSink};
pub use request::Request;
pub use response::Response;
pub use retry::{RetryController, RetryPolicy};
pub use session::{Session, SessionState};
pub use subscriber::{EventQueue, HttpSubscriber};
pub use transport::Transport;
pub use web_client::WebClient;
