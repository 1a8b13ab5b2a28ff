// Asynchronous function family
// Every function suspends on a timer or on network I/O before replying; the
// batch functions fan their work out through the shared executor.

use futures::FutureExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use super::params;
use crate::clock;
use crate::error::HandlerError;
use crate::fanout::{batch_envelope, FanOut};
use crate::fanout::units::{self, FIELD_TRANSFORM_DELAY, TASK_DURATION};
use crate::handler::{FunctionContext, Handler, HandlerFuture};
use crate::http::{FunctionRequest, Reply};
use crate::logger;

const FETCH_USAGE: &str = "/async_fetch_multiple_urls?url=http://example.com&url=http://google.com";
const DEFAULT_TASKS: usize = 5;
const DEFAULT_DELAY_SECS: f64 = 1.0;

pub const FUNCTIONS: &[(&str, Handler)] = &[
    ("async_hello_world", async_hello_world),
    ("async_echo_request", async_echo_request),
    ("async_get_current_time", async_get_current_time),
    ("async_add_numbers", async_add_numbers),
    ("async_process_json", async_process_json),
    ("async_greet_user", async_greet_user),
    ("async_fetch_multiple_urls", async_fetch_multiple_urls),
    ("async_concurrent_tasks", async_concurrent_tasks),
    ("async_delayed_response", async_delayed_response),
];

async fn pause(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

fn async_hello_world(_req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async {
        pause(100).await;
        Ok(Reply::text("Hello, Async World!"))
    }
    .boxed()
}

fn async_echo_request(req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async move {
        pause(50).await;
        Ok(Reply::text(format!("You sent (async): {}", req.body_text())))
    }
    .boxed()
}

fn async_get_current_time(_req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async {
        pause(100).await;
        Ok(Reply::json(json!({
            "timestamp": clock::now_iso8601(),
            "message": "Current server time (async)",
            "timezone": "UTC",
        })))
    }
    .boxed()
}

fn async_add_numbers(req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async move {
        let a = params::query_number(req.query_first("a"), "a", 0.0)?;
        let b = params::query_number(req.query_first("b"), "b", 0.0)?;
        pause(200).await;
        Ok(Reply::json(json!({
            "a": a,
            "b": b,
            "sum": a + b,
            "async": true,
            "processed_at": clock::now_iso8601(),
        })))
    }
    .boxed()
}

fn async_process_json(req: FunctionRequest, ctx: Arc<FunctionContext>) -> HandlerFuture {
    async move {
        let mut body = params::json_object(&req)?;

        let keys: Vec<String> = body.keys().cloned().collect();
        let transformed = transform_keys(&ctx.fanout, &keys).await?;
        logger::log_fields_transformed(&transformed);

        body.insert("processed_at".to_string(), Value::from(clock::now_iso8601()));
        let item_count = body.len();
        body.insert("item_count".to_string(), Value::from(item_count));
        body.insert("async_processing".to_string(), Value::Bool(true));
        Ok(Reply::json(Value::Object(body)))
    }
    .boxed()
}

/// Case-fold every key through the executor, in ceiling-sized waves
async fn transform_keys(fanout: &FanOut, keys: &[String]) -> Result<Vec<String>, HandlerError> {
    let mut transformed = Vec::with_capacity(keys.len());
    for wave in keys.chunks(fanout.max_units().max(1)) {
        let results = fanout
            .run_all(units::transform_batch(wave.to_vec(), FIELD_TRANSFORM_DELAY))
            .await?;
        transformed.extend(results.into_iter().filter_map(|r| r.outcome.ok()));
    }
    Ok(transformed)
}

fn async_greet_user(req: FunctionRequest, _ctx: Arc<FunctionContext>) -> HandlerFuture {
    async move {
        let name = req.query_first("name").unwrap_or("Guest");
        pause(150).await;
        Ok(Reply::json(json!({
            "greeting": format!("Hello, {name}! Welcome to Async Cloud Functions."),
            "name": name,
            "timestamp": clock::now_iso8601(),
            "async": true,
        })))
    }
    .boxed()
}

fn async_fetch_multiple_urls(req: FunctionRequest, ctx: Arc<FunctionContext>) -> HandlerFuture {
    async move {
        let urls = req.query_all("url");
        if urls.is_empty() {
            return Err(HandlerError::missing("No URLs provided", FETCH_USAGE));
        }
        ctx.fanout.check(urls.len())?;

        let results = ctx
            .fanout
            .run_all(units::fetch_batch(&ctx.fetcher, urls, ctx.fetch_timeout))
            .await?;
        Ok(Reply::json(batch_envelope(
            "total_urls",
            &results,
            "fetched_at",
        )?))
    }
    .boxed()
}

fn async_concurrent_tasks(req: FunctionRequest, ctx: Arc<FunctionContext>) -> HandlerFuture {
    async move {
        let tasks = params::query_count(req.query_first("tasks"), "tasks", DEFAULT_TASKS)?;
        ctx.fanout.check(tasks)?;

        let results = ctx
            .fanout
            .run_all(units::timed_batch(tasks, TASK_DURATION))
            .await?;
        Ok(Reply::json(batch_envelope(
            "total_tasks",
            &results,
            "completed_at",
        )?))
    }
    .boxed()
}

fn async_delayed_response(req: FunctionRequest, ctx: Arc<FunctionContext>) -> HandlerFuture {
    async move {
        let delay = params::query_number(req.query_first("delay"), "delay", DEFAULT_DELAY_SECS)?;
        if delay > ctx.max_delay_secs {
            return Err(HandlerError::validation(format!(
                "Delay cannot exceed {} seconds",
                ctx.max_delay_secs
            )));
        }
        if delay < 0.0 {
            return Err(HandlerError::validation("Delay cannot be negative"));
        }

        let report = units::delayed_response(Duration::from_secs_f64(delay)).await;
        Ok(Reply::json(serde_json::to_value(report)?))
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::invoke;
    use crate::handler::testing::{context, get, post_json, post_text};
    use hyper::StatusCode;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_async_hello_world() {
        let started = Instant::now();
        let reply = invoke(async_hello_world, get("/", None), context()).await;
        assert_eq!(reply.text_body(), Some("Hello, Async World!"));
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_echo_request() {
        let reply = invoke(async_echo_request, post_text("/", "ping"), context()).await;
        assert_eq!(reply.text_body(), Some("You sent (async): ping"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_get_current_time() {
        let reply = invoke(async_get_current_time, get("/", None), context()).await;
        let body = reply.json_body().unwrap();
        assert_eq!(body["message"], "Current server time (async)");
        assert_eq!(body["timezone"], "UTC");
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_add_numbers() {
        let reply = invoke(async_add_numbers, get("/", Some("a=1&b=2")), context()).await;
        let body = reply.json_body().unwrap();
        assert_eq!(body["sum"], 3.0);
        assert_eq!(body["async"], true);
        assert!(body["processed_at"].is_string());
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_process_json_transforms_concurrently() {
        let started = Instant::now();
        let req = post_json("/", &json!({"a": 1, "b": 2, "c": 3}));
        let reply = invoke(async_process_json, req, context()).await;
        let body = reply.json_body().unwrap();

        assert_eq!(body["a"], 1);
        assert_eq!(body["item_count"], 4);
        assert_eq!(body["async_processing"], true);
        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_process_json_handles_wide_objects() {
        let wide: serde_json::Map<String, Value> =
            (0..25).map(|i| (format!("k{i}"), Value::from(i))).collect();
        let reply = invoke(async_process_json, post_json("/", &Value::Object(wide)), context()).await;
        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.json_body().unwrap()["item_count"], 26);
    }

    #[tokio::test(start_paused = true)]
    async fn test_item_count_includes_processed_at() {
        let req = post_json("/", &json!({"a": 1, "b": 2}));
        let reply = invoke(async_process_json, req, context()).await;
        assert_eq!(reply.json_body().unwrap()["item_count"], 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transform_keys_keeps_order_across_waves() {
        let keys: Vec<String> = (0..5).map(|i| format!("key{i}")).collect();
        let transformed = transform_keys(&FanOut::new(2), &keys).await.unwrap();
        assert_eq!(transformed, ["KEY0", "KEY1", "KEY2", "KEY3", "KEY4"]);
    }

    #[tokio::test]
    async fn test_async_process_json_requires_data() {
        let reply = invoke(async_process_json, post_text("/", "nope"), context()).await;
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
        assert_eq!(reply.json_body().unwrap()["error"], "No JSON data provided");
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_greet_user() {
        let reply = invoke(async_greet_user, get("/", Some("name=Ada")), context()).await;
        let body = reply.json_body().unwrap();
        assert_eq!(body["greeting"], "Hello, Ada! Welcome to Async Cloud Functions.");
        assert_eq!(body["async"], true);
    }

    #[tokio::test]
    async fn test_fetch_multiple_urls_requires_url() {
        let reply = invoke(async_fetch_multiple_urls, get("/", None), context()).await;
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            reply.json_body(),
            Some(&json!({"error": "No URLs provided", "usage": FETCH_USAGE}))
        );
    }

    #[tokio::test]
    async fn test_fetch_multiple_urls_keeps_order_and_failures() {
        let query = "url=http://a.example&url=http://bad.invalid&url=http://c.example/x";
        let reply = invoke(async_fetch_multiple_urls, get("/", Some(query)), context()).await;
        let body = reply.json_body().unwrap();

        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(body["total_urls"], 3);
        assert_eq!(body["results"][0]["url"], "http://a.example");
        assert_eq!(body["results"][0]["status"], 200);
        assert_eq!(body["results"][1]["url"], "http://bad.invalid");
        assert!(body["results"][1]["error"].is_string());
        assert_eq!(body["results"][2]["content_length"], 18);
        assert!(body["fetched_at"].is_string());
    }

    #[tokio::test]
    async fn test_fetch_multiple_urls_ceiling() {
        let query = (0..21)
            .map(|i| format!("url=http://h{i}.example"))
            .collect::<Vec<_>>()
            .join("&");
        let reply = invoke(async_fetch_multiple_urls, get("/", Some(&query)), context()).await;
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            reply.json_body().unwrap()["error"],
            "Maximum 20 concurrent tasks allowed"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_tasks_default_and_timing() {
        let started = Instant::now();
        let reply = invoke(async_concurrent_tasks, get("/", None), context()).await;
        let body = reply.json_body().unwrap();

        assert_eq!(body["total_tasks"], 5);
        let results = body["results"].as_array().unwrap();
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result["task_id"], i);
            assert_eq!(result["status"], "completed");
        }
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_tasks_limits() {
        let reply = invoke(async_concurrent_tasks, get("/", Some("tasks=20")), context()).await;
        assert_eq!(reply.json_body().unwrap()["total_tasks"], 20);

        let reply = invoke(async_concurrent_tasks, get("/", Some("tasks=21")), context()).await;
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            reply.json_body(),
            Some(&json!({"error": "Maximum 20 concurrent tasks allowed"}))
        );

        let reply = invoke(async_concurrent_tasks, get("/", Some("tasks=0")), context()).await;
        assert_eq!(reply.json_body().unwrap()["total_tasks"], 0);

        let reply = invoke(async_concurrent_tasks, get("/", Some("tasks=-2")), context()).await;
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_response() {
        let reply = invoke(async_delayed_response, get("/", Some("delay=0.5")), context()).await;
        let body = reply.json_body().unwrap();
        assert_eq!(body["requested_delay"], 0.5);
        assert!(body["actual_delay"].as_f64().unwrap() >= 0.5);
        assert!(body["started_at"].is_string());
        assert!(body["completed_at"].is_string());
    }

    #[tokio::test]
    async fn test_delayed_response_bounds() {
        let reply = invoke(async_delayed_response, get("/", Some("delay=11")), context()).await;
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            reply.json_body(),
            Some(&json!({"error": "Delay cannot exceed 10 seconds"}))
        );

        let reply = invoke(async_delayed_response, get("/", Some("delay=-1")), context()).await;
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);

        let reply = invoke(async_delayed_response, get("/", Some("delay=soon")), context()).await;
        assert_eq!(reply.status(), StatusCode::BAD_REQUEST);
    }
}
