//! Multi-endpoint function
//!
//! One deployable entry point serving a small REST-style API. Dispatch is an
//! exact `(method, path)` match against the route table below; anything else
//! gets the table's 404 catalog.

use futures::FutureExt;
use hyper::Method;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::params;
use crate::clock;
use crate::error::HandlerError;
use crate::handler::{FunctionContext, HandlerFuture};
use crate::http::{FunctionRequest, Reply};
use crate::routing::{RouteError, RouteTable};

pub const NAME: &str = "multi_endpoint_handler";

const VERSION: &str = "1.0.0";

pub fn routes() -> Result<RouteTable, RouteError> {
    RouteTable::builder()
        .route(Method::GET, "/api/hello", "Hello endpoint", &[], hello)
        .route(
            Method::POST,
            "/api/add",
            "Add two numbers",
            &[("a", "number"), ("b", "number")],
            add,
        )
        .route(Method::GET, "/api/time", "Get current time", &[], time)
        .route(
            Method::POST,
            "/api/greet",
            "Greet a user",
            &[("name", "string")],
            greet,
        )
        .route(Method::GET, "/api/status", "Get function status", &[], status)
        .route(
            Method::POST,
            "/api/calculate",
            "Perform calculation",
            &[("operation", "string"), ("a", "number"), ("b", "number")],
            calculate,
        )
        .route(Method::GET, "/api/users", "Get users list", &[], users)
        .route(Method::POST, "/api/echo", "Echo back request", &[], echo)
        .build()
}

/// JSON object body, or `None` when absent or of another kind
fn object_body(req: &FunctionRequest) -> Option<Map<String, Value>> {
    match req.json() {
        Some(Value::Object(body)) => Some(body),
        _ => None,
    }
}

fn hello(_req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async {
        Ok(Reply::json(json!({
            "message": "Hello! This is a multi-endpoint cloud function",
            "endpoint": "/api/hello",
            "method": "GET",
        })))
    }
    .boxed()
}

fn add(req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async move {
        let body = object_body(&req)
            .filter(|body| body.contains_key("a") && body.contains_key("b"))
            .ok_or_else(|| {
                HandlerError::validation_expecting(
                    "Missing parameters: a and b required",
                    json!({"a": 5, "b": 3}),
                )
            })?;
        let a = params::json_number_or(&body, "a", 0.0)?;
        let b = params::json_number_or(&body, "b", 0.0)?;
        Ok(Reply::json(json!({
            "endpoint": "/api/add",
            "a": a,
            "b": b,
            "result": a + b,
            "status": "success",
        })))
    }
    .boxed()
}

fn time(_req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async {
        Ok(Reply::json(json!({
            "endpoint": "/api/time",
            "timestamp": clock::now_iso8601(),
            "unix_time": clock::unix_time(),
            "message": "Current server time",
        })))
    }
    .boxed()
}

fn greet(req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async move {
        let name = object_body(&req).map_or_else(
            || "Guest".to_string(),
            |body| params::json_text_or(&body, "name", "Guest"),
        );
        Ok(Reply::json(json!({
            "endpoint": "/api/greet",
            "greeting": format!("Hello, {name}! Welcome to multi-endpoint cloud function"),
            "name": name,
            "timestamp": clock::now_iso8601(),
        })))
    }
    .boxed()
}

fn status(_req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async {
        Ok(Reply::json(json!({
            "endpoint": "/api/status",
            "status": "running",
            "version": VERSION,
            "uptime": "active",
            "timestamp": clock::now_iso8601(),
        })))
    }
    .boxed()
}

// ============== Calculator ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    const SUPPORTED: [&'static str; 4] = ["add", "subtract", "multiply", "divide"];

    fn parse(name: &str) -> Option<Self> {
        match name {
            "add" => Some(Self::Add),
            "subtract" => Some(Self::Subtract),
            "multiply" => Some(Self::Multiply),
            "divide" => Some(Self::Divide),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }

    fn apply(self, a: f64, b: f64) -> Result<f64, HandlerError> {
        match self {
            Self::Add => Ok(a + b),
            Self::Subtract => Ok(a - b),
            Self::Multiply => Ok(a * b),
            Self::Divide if b == 0.0 => Err(HandlerError::domain("Division by zero")),
            Self::Divide => Ok(a / b),
        }
    }
}

fn calculate(req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async move {
        let body = object_body(&req)
            .filter(|body| body.contains_key("operation"))
            .ok_or_else(|| {
                HandlerError::validation_expecting(
                    "Missing parameters",
                    json!({"operation": "add|subtract|multiply|divide", "a": 10, "b": 5}),
                )
            })?;

        let requested = params::json_text_or(&body, "operation", "").to_lowercase();
        let a = params::json_number_or(&body, "a", 0.0)?;
        let b = params::json_number_or(&body, "b", 0.0)?;
        let operation = Operation::parse(&requested).ok_or_else(|| {
            HandlerError::domain_supporting(
                format!("Unknown operation: {requested}"),
                json!(Operation::SUPPORTED),
            )
        })?;
        let result = operation.apply(a, b)?;

        Ok(Reply::json(json!({
            "endpoint": "/api/calculate",
            "operation": operation.name(),
            "a": a,
            "b": b,
            "result": result,
            "status": "success",
        })))
    }
    .boxed()
}

// ============== Users ==============

#[derive(Debug, Serialize)]
struct User {
    id: u32,
    name: &'static str,
    role: &'static str,
}

const USERS: [User; 4] = [
    User { id: 1, name: "Alice", role: "admin" },
    User { id: 2, name: "Bob", role: "user" },
    User { id: 3, name: "Charlie", role: "user" },
    User { id: 4, name: "Diana", role: "moderator" },
];

fn users(_req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async {
        Ok(Reply::json(json!({
            "endpoint": "/api/users",
            "count": USERS.len(),
            "users": serde_json::to_value(USERS)?,
            "timestamp": clock::now_iso8601(),
        })))
    }
    .boxed()
}

fn echo(req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async move {
        let (received, kind) = match req.json() {
            Some(value) => {
                let kind = params::json_kind(&value);
                (value, kind)
            }
            None => (Value::from(req.body_text().into_owned()), "text"),
        };
        Ok(Reply::json(json!({
            "endpoint": "/api/echo",
            "received": received,
            "type": kind,
            "timestamp": clock::now_iso8601(),
        })))
    }
    .boxed()
}
