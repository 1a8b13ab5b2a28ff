// Synchronous function family
// Each function computes its reply directly from the request.

use futures::FutureExt;
use serde_json::{json, Value};
use std::sync::Arc;

use super::params;
use crate::clock;
use crate::handler::{FunctionContext, Handler, HandlerFuture};
use crate::http::{FunctionRequest, Reply};

pub const FUNCTIONS: &[(&str, Handler)] = &[
    ("hello_world", hello_world),
    ("echo_request", echo_request),
    ("get_current_time", get_current_time),
    ("add_numbers", add_numbers),
    ("process_json", process_json),
    ("greet_user", greet_user),
];

fn hello_world(_req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async { Ok(Reply::text("Hello, World!")) }.boxed()
}

fn echo_request(req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async move { Ok(Reply::text(format!("You sent: {}", req.body_text()))) }.boxed()
}

fn get_current_time(_req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async {
        Ok(Reply::json(json!({
            "timestamp": clock::now_iso8601(),
            "message": "Current server time",
        })))
    }
    .boxed()
}

fn add_numbers(req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async move {
        let a = params::query_number(req.query_first("a"), "a", 0.0)?;
        let b = params::query_number(req.query_first("b"), "b", 0.0)?;
        Ok(Reply::json(json!({"a": a, "b": b, "sum": a + b})))
    }
    .boxed()
}

fn process_json(req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async move {
        let mut body = params::json_object(&req)?;
        body.insert("processed_at".to_string(), Value::from(clock::now_iso8601()));
        // Counts the stamped object, `processed_at` included
        let item_count = body.len();
        body.insert("item_count".to_string(), Value::from(item_count));
        Ok(Reply::json(Value::Object(body)))
    }
    .boxed()
}

fn greet_user(req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async move {
        let name = req.query_first("name").unwrap_or("Guest");
        Ok(Reply::json(json!({
            "greeting": format!("Hello, {name}! Welcome to Cloud Functions."),
            "name": name,
        })))
    }
    .boxed()
}
