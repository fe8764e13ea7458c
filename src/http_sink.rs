//! HttpSink (C6): a downstream value consumer that POSTs each value onward
//! through its own [`Session`].

use bytes::Bytes;
use futures_util::future::LocalBoxFuture;

use crate::reactive::AsyncSink;
use crate::response::Response;
use crate::session::Session;

/// Default content type for broadcast sinks (spec §6).
const DEFAULT_CONTENT_TYPE: &str = "plain/text";

pub struct HttpSink {
    session: Session,
    content_type: String,
}

impl HttpSink {
    pub fn new(session: Session) -> Self {
        HttpSink {
            session,
            content_type: DEFAULT_CONTENT_TYPE.to_owned(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    async fn post(&mut self, body: Bytes) -> bool {
        self.session.set_content_type(self.content_type.clone());
        self.session.set_body(body);
        let (_, result) = self.session.run().await;
        match &result {
            Ok(response) => {
                log::debug!("HttpSink POST -> {}", response.status);
            }
            Err(e) => log::warn!("HttpSink POST failed: {e}"),
        }
        result.is_ok()
    }
}

impl AsyncSink<Response> for HttpSink {
    fn call<'a>(&'a mut self, value: &'a Response) -> LocalBoxFuture<'a, bool> {
        let body = value.body.clone();
        Box::pin(async move { self.post(body).await })
    }
}

impl AsyncSink<String> for HttpSink {
    fn call<'a>(&'a mut self, value: &'a String) -> LocalBoxFuture<'a, bool> {
        let body = Bytes::from(value.clone());
        Box::pin(async move { self.post(body).await })
    }
}
