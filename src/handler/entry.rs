//! HTTP entry point
//!
//! Answers host-level concerns (preflight, health probes, body limits) and
//! hands everything else to the configured function.

use http_body_util::Full;
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::{CONTENT_LENGTH, USER_AGENT};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::http::{self, BodyError, FunctionRequest};
use crate::logger::{self, AccessLogEntry};

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    Ok(serve(req, &state, peer_addr).await)
}

async fn serve<B>(req: Request<B>, state: &AppState, peer_addr: SocketAddr) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let started = Instant::now();
    let config = &state.config;

    // 1. Preflight
    if req.method() == Method::OPTIONS {
        return http::build_options_response(config.http.enable_cors);
    }

    // 2. Health probes
    if config.health.enabled {
        let path = req.uri().path();
        if path == config.health.liveness_path || path == config.health.readiness_path {
            return http::build_health_response("ok");
        }
    }

    // 3. Declared body size
    if let Some(resp) = check_body_size(&req, config.http.max_body_size) {
        return resp;
    }

    let mut entry = config.logging.access_log.then(|| access_entry(&req, state, peer_addr));

    // 4. Collect body and invoke the function
    let response = match FunctionRequest::from_hyper(req, config.http.max_body_size).await {
        Ok(request) => {
            let reply = state
                .function
                .call(request, Arc::clone(&state.context))
                .await;
            http::build_reply_response(&reply, &config.http)
        }
        Err(BodyError::TooLarge { limit }) => {
            logger::log_warning(&format!("Request body exceeded {limit} bytes while reading"));
            http::build_413_response(limit)
        }
        Err(e @ BodyError::Read(_)) => {
            logger::log_warning(&e.to_string());
            http::build_400_response(&e.to_string())
        }
    };

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &config.logging.access_log_format);
    }

    response
}

fn access_entry<B>(req: &Request<B>, state: &AppState, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
        state.target.clone(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = format!("{:?}", req.version())
        .trim_start_matches("HTTP/")
        .to_string();
    entry.user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: usize) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<usize>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response(max_body_size))
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', checking while reading"
                ));
                None
            }
            _ => None,
        },
    )
}
