//! HttpSubscriber (C7): an outbound event pusher — pool + retry + a bounded
//! in-memory event queue, grounded on `http_subscriber.hpp`.

use std::collections::VecDeque;

use bytes::Bytes;
use http::{HeaderMap, Method};

use crate::config::ClientConfig;
use crate::error::InvalidUrl;
use crate::pool::Pool;
use crate::request::Request;
use crate::response::Response;
use crate::retry::{RetryController, RetryPolicy};
use crate::session::Session;
use crate::url::Endpoint;

#[cfg(feature = "rustls-tls")]
use crate::transport::TlsConfig;

type SuccessHandler = Box<dyn FnMut(&Request, &Response)>;

/// Default capacity 100; overflow drops the oldest pending payload (spec
/// §6, §3). [`EventQueue::push`] returns the dropped payload so the caller
/// can surface it instead of silently losing it — spec §9 Open Question 5
/// flags the original's silent drop as something "a production rewrite
/// should surface."
pub struct EventQueue {
    capacity: usize,
    buf: VecDeque<Bytes>,
    dropped_total: u64,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        EventQueue {
            capacity,
            buf: VecDeque::new(),
            dropped_total: 0,
        }
    }

    pub fn push(&mut self, data: Bytes) -> Option<Bytes> {
        let dropped = if self.buf.len() >= self.capacity {
            self.dropped_total += 1;
            self.buf.pop_front()
        } else {
            None
        };
        self.buf.push_back(data);
        dropped
    }

    pub fn pop(&mut self) -> Option<Bytes> {
        self.buf.pop_front()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn dropped_total(&self) -> u64 {
        self.dropped_total
    }
}

pub struct HttpSubscriber {
    endpoint: Endpoint,
    pool: Pool,
    retry_policy: RetryPolicy,
    queue: EventQueue,
    default_headers: HeaderMap,
    connect_timeout: std::time::Duration,
    success_handler: Option<SuccessHandler>,
    overflow_handler: Option<Box<dyn FnMut(Bytes)>>,
    #[cfg(feature = "rustls-tls")]
    tls_config: Option<TlsConfig>,
}

impl HttpSubscriber {
    pub fn new(destination_url: &str) -> Result<Self, InvalidUrl> {
        let endpoint = crate::url::parse(destination_url)?;
        Ok(HttpSubscriber {
            endpoint,
            pool: Pool::new(5),
            retry_policy: RetryPolicy::default(),
            queue: EventQueue::new(100),
            default_headers: HeaderMap::new(),
            connect_timeout: crate::transport::CONNECT_TIMEOUT,
            success_handler: None,
            overflow_handler: None,
            #[cfg(feature = "rustls-tls")]
            tls_config: None,
        })
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    #[cfg(feature = "rustls-tls")]
    pub fn with_ssl_context(mut self, config: TlsConfig) -> Self {
        self.tls_config = Some(config);
        self
    }

    /// Applies pool capacity, connect timeout, TLS verification mode, and
    /// default headers from one [`ClientConfig`] (spec §3 ambient stack).
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.pool.with_pool_size(config.get_pool_capacity());
        self.connect_timeout = config.get_connect_timeout();
        self.default_headers = config.get_default_headers().clone();
        #[cfg(feature = "rustls-tls")]
        {
            self.tls_config = Some(config.tls_config());
        }
        self
    }

    pub fn with_success_handler(mut self, handler: impl FnMut(&Request, &Response) + 'static) -> Self {
        self.success_handler = Some(Box::new(handler));
        self
    }

    /// Called with the oldest pending payload whenever the event queue
    /// overflows (supplement to spec §9 Open Question 5).
    pub fn with_overflow_handler(mut self, handler: impl FnMut(Bytes) + 'static) -> Self {
        self.overflow_handler = Some(Box::new(handler));
        self
    }

    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool.with_pool_size(size);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn queued_events(&self) -> usize {
        self.queue.len()
    }

    fn build_session(secure: bool, #[cfg(feature = "rustls-tls")] tls_config: &Option<TlsConfig>) -> Session {
        #[cfg(feature = "rustls-tls")]
        if secure {
            return Session::new_tls(tls_config.clone().unwrap_or_default());
        }
        #[cfg(not(feature = "rustls-tls"))]
        let _ = secure;
        Session::new_plain()
    }

    /// Acquires a session from the pool; on first creation the initializer
    /// sets URL/verb/keep-alive (spec §4.7 step 1).
    fn acquire_session(&mut self) -> Option<Session> {
        let host = self.endpoint.host.clone();
        let port = self.endpoint.port;
        let target = self.endpoint.target();
        let headers = self.default_headers.clone();
        let secure = self.endpoint.secure;
        let connect_timeout = self.connect_timeout;
        #[cfg(feature = "rustls-tls")]
        let tls_config = self.tls_config.clone();

        self.pool.acquire(
            || {
                #[cfg(feature = "rustls-tls")]
                {
                    Self::build_session(secure, &tls_config)
                }
                #[cfg(not(feature = "rustls-tls"))]
                {
                    Self::build_session(secure)
                }
            },
            |session| {
                session.set_connect_timeout(connect_timeout);
                session
                    .set_host(host)
                    .set_port(port)
                    .set_target(target)
                    .set_method(Method::POST)
                    .set_keep_alive(true)
                    .set_content_type("application/json");
                for (name, value) in headers.iter() {
                    session.set_header(name.clone(), value.clone());
                }
            },
        )
    }

    fn handle_overflow(&mut self, dropped: Bytes) {
        log::warn!(
            "HttpSubscriber event queue overflow, dropped oldest pending payload ({} bytes)",
            dropped.len()
        );
        if let Some(handler) = self.overflow_handler.as_mut() {
            handler(dropped);
        }
    }

    /// Enqueues an outbound POST (spec §4.7). Drains the event queue as
    /// space frees up from completed sends.
    pub async fn send_event(&mut self, data: impl Into<Bytes>) {
        self.pump(data.into()).await;
    }

    async fn pump(&mut self, mut data: Bytes) {
        loop {
            let Some(mut session) = self.acquire_session() else {
                if let Some(dropped) = self.queue.push(data) {
                    self.handle_overflow(dropped);
                }
                return;
            };

            session.set_body(data);
            let (request, result) = session.run().await;

            match result {
                Ok(response) => {
                    if let Some(handler) = self.success_handler.as_mut() {
                        handler(&request, &response);
                    }
                    if response.keep_alive() {
                        self.pool.put_back(session);
                    } else {
                        self.pool.release(session).await;
                    }
                    match self.queue.pop() {
                        Some(next) => {
                            data = next;
                            continue;
                        }
                        None => return,
                    }
                }
                Err(err) => {
                    log::error!("HttpSubscriber send failed: {err}");
                    self.pool.release(session).await;
                    match self.retry_until_resolved(request).await {
                        Some(next) => {
                            data = next;
                            continue;
                        }
                        None => return,
                    }
                }
            }
        }
    }

    /// Schedules `wait_and_retry()` whose continuation re-acquires a
    /// session. If re-acquisition fails, doesn't consume a retry attempt —
    /// just reschedules (spec §4.7 step 5, §9 Open Question 3).
    async fn retry_until_resolved(&mut self, request: Request) -> Option<Bytes> {
        if !self.retry_policy.retry_needed() {
            return None;
        }
        let mut controller = RetryController::new(request, self.retry_policy);
        while controller.wait_and_retry().await {
            match self.acquire_session() {
                Some(mut session) => {
                    let (req, result) = session.run_with(controller.request().clone()).await;
                    match result {
                        Ok(response) => {
                            if let Some(handler) = self.success_handler.as_mut() {
                                handler(&req, &response);
                            }
                            if response.keep_alive() {
                                self.pool.put_back(session);
                            } else {
                                self.pool.release(session).await;
                            }
                            return self.queue.pop();
                        }
                        Err(e) => {
                            log::error!("HttpSubscriber retry failed: {e}");
                            self.pool.release(session).await;
                            controller.set_request(req);
                        }
                    }
                }
                None => {
                    controller.policy_mut().decrement_retry_count();
                }
            }
        }
        None
    }
}
