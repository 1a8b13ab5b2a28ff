//! Function reply model
//!
//! A `Reply` is what every function hands back to the host: a status code and
//! either a plain text body or a JSON envelope.

use hyper::StatusCode;
use serde_json::Value;

pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Reply body kind; the content type follows from it
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Text(String),
    Json(Value),
}

/// Immutable function reply
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    status: StatusCode,
    body: ReplyBody,
}

impl Reply {
    /// Plain text reply with implicit 200
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: ReplyBody::Text(body.into()),
        }
    }

    /// JSON envelope reply with implicit 200
    pub const fn json(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: ReplyBody::Json(body),
        }
    }

    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub const fn content_type(&self) -> &'static str {
        match self.body {
            ReplyBody::Text(_) => TEXT_CONTENT_TYPE,
            ReplyBody::Json(_) => JSON_CONTENT_TYPE,
        }
    }

    pub const fn json_body(&self) -> Option<&Value> {
        match &self.body {
            ReplyBody::Json(value) => Some(value),
            ReplyBody::Text(_) => None,
        }
    }

    pub fn text_body(&self) -> Option<&str> {
        match &self.body {
            ReplyBody::Text(text) => Some(text),
            ReplyBody::Json(_) => None,
        }
    }

    /// Serialize the body into its canonical wire encoding
    pub fn encode(&self) -> String {
        match &self.body {
            ReplyBody::Text(text) => text.clone(),
            ReplyBody::Json(value) => value.to_string(),
        }
    }
}
