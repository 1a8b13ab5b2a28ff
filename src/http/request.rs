//! Function request model
//!
//! Converts an incoming hyper request into the read-only view handed to
//! functions: method, path, multi-valued query and the collected body.

use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use thiserror::Error;

/// Failure while reading the request body
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("failed to read request body: {0}")]
    Read(String),
}

/// Read-only request view passed to functions
#[derive(Debug, Clone)]
pub struct FunctionRequest {
    method: Method,
    path: String,
    query: HashMap<String, Vec<String>>,
    body: Bytes,
}

impl FunctionRequest {
    pub fn new(method: Method, path: &str, query: Option<&str>, body: Bytes) -> Self {
        Self {
            method,
            path: path.to_string(),
            query: query.map(parse_query).unwrap_or_default(),
            body,
        }
    }

    /// Collect a hyper request, enforcing `max_body_size` while reading
    pub async fn from_hyper<B>(req: Request<B>, max_body_size: usize) -> Result<Self, BodyError>
    where
        B: Body,
        B::Error: std::error::Error + Send + Sync + 'static,
    {
        let (parts, body) = req.into_parts();
        let collected = Limited::new(body, max_body_size)
            .collect()
            .await
            .map_err(|e| {
                if e.is::<http_body_util::LengthLimitError>() {
                    BodyError::TooLarge {
                        limit: max_body_size,
                    }
                } else {
                    BodyError::Read(e.to_string())
                }
            })?;

        Ok(Self::new(
            parts.method,
            parts.uri.path(),
            parts.uri.query(),
            collected.to_bytes(),
        ))
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// First value for a query key
    pub fn query_first(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values for a repeatable query key, in request order
    pub fn query_all(&self, key: &str) -> &[String] {
        self.query.get(key).map_or(&[], Vec::as_slice)
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Parsed JSON body, or `None` when absent or malformed
    pub fn json(&self) -> Option<Value> {
        if self.body.is_empty() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }
}

/// Parse `application/x-www-form-urlencoded` query pairs, keeping repeated keys
fn parse_query(query: &str) -> HashMap<String, Vec<String>> {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(percent_decode(key))
            .or_default()
            .push(percent_decode(value));
    }
    params
}

/// Decode `%XX` escapes and `+` as space
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                result.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                if let Some(byte) = decoded {
                    result.push(byte);
                    i += 3;
                } else {
                    result.push(b'%');
                    i += 1;
                }
            }
            b => {
                result.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&result).into_owned()
}
