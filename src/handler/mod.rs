//! Request handler module
//!
//! Defines the handler signature shared by functions and routes, the
//! panic-safe invocation boundary, and the host's HTTP entry point.

mod context;
pub mod entry;

use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::http::{FunctionRequest, Reply};
use crate::logger;

pub use context::FunctionContext;
pub use entry::handle_request;

pub type HandlerFuture = BoxFuture<'static, Result<Reply, HandlerError>>;

/// A function or route handler
pub type Handler = fn(FunctionRequest, Arc<FunctionContext>) -> HandlerFuture;

/// Run a handler and convert every failure into a reply
///
/// Handler errors become their status envelopes; a panic inside the handler
/// becomes a generic 500 without internal detail.
pub async fn invoke(handler: Handler, req: FunctionRequest, ctx: Arc<FunctionContext>) -> Reply {
    match AssertUnwindSafe(handler(req, ctx)).catch_unwind().await {
        Ok(Ok(reply)) => reply,
        Ok(Err(err)) => {
            if let HandlerError::Internal(message) = &err {
                logger::log_handler_failure(message);
            }
            err.into_reply()
        }
        Err(_) => {
            logger::log_handler_failure("handler panicked");
            HandlerError::internal("Internal server error").into_reply()
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for handler tests

    use super::*;
    use crate::fanout::FanOut;
    use crate::fetch::{FetchError, FetchedPage, Fetcher};
    use async_trait::async_trait;
    use hyper::body::Bytes;
    use hyper::Method;
    use serde_json::Value;
    use std::time::Duration;

    /// Fetcher answering from the URL text: hosts ending in `.invalid` fail,
    /// `slow.` hosts never answer, everything else returns 200 with the URL
    /// length as body length.
    pub struct StubFetcher;

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchedPage, FetchError> {
            if url.contains(".invalid") {
                return Err(FetchError::Request(format!("dns error: {url}")));
            }
            if url.contains("slow.") {
                futures::future::pending::<()>().await;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(FetchedPage {
                status: 200,
                body_length: url.len(),
            })
        }
    }

    pub fn context() -> Arc<FunctionContext> {
        Arc::new(FunctionContext {
            fetcher: Arc::new(StubFetcher),
            fanout: FanOut::new(20),
            fetch_timeout: Duration::from_secs(5),
            max_delay_secs: 10.0,
        })
    }

    pub fn get(path: &str, query: Option<&str>) -> FunctionRequest {
        FunctionRequest::new(Method::GET, path, query, Bytes::new())
    }

    pub fn post_json(path: &str, body: &Value) -> FunctionRequest {
        FunctionRequest::new(Method::POST, path, None, Bytes::from(body.to_string()))
    }

    pub fn post_text(path: &str, body: &str) -> FunctionRequest {
        FunctionRequest::new(Method::POST, path, None, Bytes::from(body.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{context, get};
    use super::*;
    use hyper::StatusCode;
    use serde_json::json;

    fn ok_handler(_req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
        async { Ok(Reply::text("ok")) }.boxed()
    }

    fn failing_handler(_req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
        async { Err(HandlerError::validation("bad input")) }.boxed()
    }

    fn panicking_handler(_req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
        async {
            let missing: Option<Reply> = None;
            Ok(missing.expect("secret internal state"))
        }
        .boxed()
    }

    #[tokio::test]
    async fn test_invoke_passes_reply_through() {
        let reply = invoke(ok_handler, get("/", None), context()).await;
        assert_eq!(reply, Reply::text("ok"));
    }

    #[tokio::test]
    async fn test_invoke_converts_errors() {
        let reply = invoke(failing_handler, get("/", None), context()).await;
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
        assert_eq!(reply.json_body(), Some(&json!({"error": "bad input"})));
    }

    #[tokio::test]
    async fn test_invoke_catches_panics_without_leaking_detail() {
        let reply = invoke(panicking_handler, get("/", None), context()).await;
        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            reply.json_body(),
            Some(&json!({"error": "Internal server error", "status": "error"}))
        );
        assert!(!reply.encode().contains("secret"));
    }
}
