//! HttpSource / HttpFlux / HttpMono (C6): bridges HTTP exchanges to the
//! reactive core.

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt as _;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::reactive::{Flux, Source};
use crate::request::Request;
use crate::response::Response;
use crate::retry::{RetryController, RetryPolicy};
use crate::session::Session;

/// A [`Source`] backed by an HTTP session: `next` drives exactly one
/// exchange. `has_next` collapses into `remaining == Some(0)` returning
/// `None` (spec §4.6); `remaining = None` means `forever = true`
/// (streaming).
pub struct HttpSource {
    session: Session,
    remaining: Option<u32>,
}

impl HttpSource {
    pub fn new(session: Session, remaining: Option<u32>) -> Self {
        HttpSource { session, remaining }
    }

    pub fn forever(session: Session) -> Self {
        HttpSource {
            session,
            remaining: None,
        }
    }

    pub fn request(&self) -> Request {
        self.session.request().clone()
    }
}

impl Source for HttpSource {
    type Item = Result<Response, Error>;

    fn next(&mut self) -> LocalBoxFuture<'_, Option<Result<Response, Error>>> {
        async move {
            if self.remaining == Some(0) {
                return None;
            }
            if let Some(n) = self.remaining {
                self.remaining = Some(n - 1);
            }
            let (_, result) = self.session.run().await;
            Some(result)
        }
        .boxed_local()
    }
}

/// Default delay used by `HttpFlux::retry`/`HttpMono::retry` (spec §4.6).
const RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(15);

/// Wraps an HTTP exchange budget over a [`Session`], adding retry and JSON
/// decoding on top of the plain reactive [`Flux`] (spec §4.6).
pub struct HttpFlux {
    session: Session,
    remaining: Option<u32>,
    retry_policy: Option<RetryPolicy>,
}

impl HttpFlux {
    pub fn new(session: Session, count: u32) -> Self {
        HttpFlux {
            session,
            remaining: Some(count),
            retry_policy: None,
        }
    }

    pub fn forever(session: Session) -> Self {
        HttpFlux {
            session,
            remaining: None,
            retry_policy: None,
        }
    }

    /// Attaches a `RetryPolicy { max_retries = n, delay = 15s }` (spec §4.6).
    pub fn retry(mut self, n: i32) -> Self {
        self.retry_policy = Some(RetryPolicy::new(n, RETRY_DELAY));
        self
    }

    /// Attaches an explicit [`RetryPolicy`] instead of the 15s default.
    pub fn retry_with_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Converts to a plain [`Flux`] over `HttpSource` — map/filter/subscribe
    /// without retry semantics.
    pub fn into_flux(self) -> Flux<HttpSource> {
        Flux::new(HttpSource::new(self.session, self.remaining))
    }

    /// Drives exchanges until exhausted, invoking `handler` on each value.
    /// No retry: equivalent to [`Flux::subscribe_sync`] over an `HttpSource`.
    pub async fn subscribe(self, handler: impl FnMut(Result<Response, Error>)) {
        self.into_flux().subscribe_sync(handler).await
    }

    /// On each attempt, invokes `handler` with that attempt's outcome — a
    /// failed attempt is delivered to `handler` just like a successful one,
    /// not swallowed into a single merged result (spec §4.6
    /// `subscribe_with_retry`: "on value, invokes `handler(value)`"). A
    /// failure is then retried through a cloned session bound to the
    /// captured request; once the retry budget is exhausted the stream ends
    /// (the completion token is effectively called with `false`).
    pub async fn subscribe_with_retry(mut self, mut handler: impl FnMut(&Result<Response, Error>)) {
        loop {
            if self.remaining == Some(0) {
                break;
            }
            if let Some(n) = self.remaining {
                self.remaining = Some(n - 1);
            }

            let (request, result) = self.session.run().await;
            match result {
                Ok(response) => handler(&Ok(response)),
                Err(err) => {
                    if !self.retry_attempts(request, err, &mut handler).await {
                        break;
                    }
                }
            }
        }
    }

    /// Retries a failed exchange, calling `handler` on every attempt
    /// (including the one that got us here) until one succeeds or the
    /// retry budget is exhausted. Returns whether the stream should keep
    /// going (spec §8 S3: 3 attempts, each seeing an error, before giving
    /// up).
    async fn retry_attempts(
        &self,
        request: Request,
        first_error: Error,
        handler: &mut impl FnMut(&Result<Response, Error>),
    ) -> bool {
        handler(&Err(first_error));
        let Some(policy) = self.retry_policy else {
            return false;
        };
        let mut controller = RetryController::new(request, policy);
        loop {
            if !controller.wait_and_retry().await {
                return false;
            }
            let mut retry_session = self.session.clone_blank();
            let (req, result) = retry_session.run_with(controller.request().clone()).await;
            match result {
                Ok(response) => {
                    handler(&Ok(response));
                    return true;
                }
                Err(e) => {
                    controller.set_request(req);
                    handler(&Err(e));
                }
            }
        }
    }

    /// Attempts to parse each successful body as JSON, delivering either the
    /// parsed value or a `bad_value` error through the same value channel
    /// (spec §4.6, §7). Routed through `subscribe_with_retry` rather than
    /// `subscribe` so an attached retry policy actually applies (spec §8
    /// S3 pairs `with_retry` with `as_json`).
    pub async fn as_json<T: DeserializeOwned>(self, mut handler: impl FnMut(Result<T, Error>)) {
        self.subscribe_with_retry(move |result| handler(result.clone().and_then(|r| r.as_json::<T>())))
            .await
    }
}

/// Single-exchange counterpart of [`HttpFlux`].
pub struct HttpMono {
    inner: HttpFlux,
}

impl HttpMono {
    pub fn new(session: Session) -> Self {
        HttpMono {
            inner: HttpFlux::new(session, 1),
        }
    }

    pub fn retry(self, n: i32) -> Self {
        HttpMono {
            inner: self.inner.retry(n),
        }
    }

    /// Attaches an explicit [`RetryPolicy`] instead of the 15s default.
    pub fn retry_with_policy(self, policy: RetryPolicy) -> Self {
        HttpMono {
            inner: self.inner.retry_with_policy(policy),
        }
    }

    pub async fn subscribe(self, handler: impl FnMut(Result<Response, Error>)) {
        self.inner.subscribe(handler).await
    }

    pub async fn subscribe_with_retry(self, handler: impl FnMut(&Result<Response, Error>)) {
        self.inner.subscribe_with_retry(handler).await
    }

    pub async fn as_json<T: DeserializeOwned>(self, handler: impl FnMut(Result<T, Error>)) {
        self.inner.as_json(handler).await
    }

    /// Pulls the single value directly.
    pub async fn value(self) -> Result<Response, Error> {
        let mut source = HttpSource::new(self.inner.session, Some(1));
        source.next().await.expect("Mono always yields exactly one value")
    }
}
