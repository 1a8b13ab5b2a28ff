//! Handler error taxonomy
//!
//! Every error a function can raise is converted into a JSON envelope at the
//! handler boundary; nothing escapes to the host as a raw fault.

use hyper::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::http::Reply;

/// Errors raised by function and route handlers
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Missing or malformed parameter, optionally describing the expected shape
    #[error("{message}")]
    Validation {
        message: String,
        expected: Option<Value>,
    },

    /// Required input entirely absent, with a usage example
    #[error("{message}")]
    Missing { message: String, usage: Option<Value> },

    /// Well-formed but semantically invalid input
    #[error("{message}")]
    Domain {
        message: String,
        supported: Option<Value>,
    },

    /// Any other fault during handler execution
    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            expected: None,
        }
    }

    pub fn validation_expecting(message: impl Into<String>, expected: Value) -> Self {
        Self::Validation {
            message: message.into(),
            expected: Some(expected),
        }
    }

    pub fn missing(message: impl Into<String>, usage: impl Into<Value>) -> Self {
        Self::Missing {
            message: message.into(),
            usage: Some(usage.into()),
        }
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain {
            message: message.into(),
            supported: None,
        }
    }

    pub fn domain_supporting(message: impl Into<String>, supported: Value) -> Self {
        Self::Domain {
            message: message.into(),
            supported: Some(supported),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Missing { .. } | Self::Domain { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Build the `{error, ...}` envelope for this error
    pub fn envelope(&self) -> Value {
        let mut body = Map::new();
        body.insert("error".to_string(), Value::String(self.to_string()));
        match self {
            Self::Validation {
                expected: Some(expected),
                ..
            } => {
                body.insert("expected".to_string(), expected.clone());
            }
            Self::Missing {
                usage: Some(usage), ..
            } => {
                body.insert("usage".to_string(), usage.clone());
            }
            Self::Domain {
                supported: Some(supported),
                ..
            } => {
                body.insert("supported".to_string(), supported.clone());
            }
            Self::Internal(_) => {
                body.insert("status".to_string(), Value::from("error"));
            }
            _ => {}
        }
        Value::Object(body)
    }

    pub fn into_reply(self) -> Reply {
        Reply::json(self.envelope()).with_status(self.status())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(format!("Failed to encode response: {e}"))
    }
}
