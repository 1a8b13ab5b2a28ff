//! Batch executor
//!
//! `FanOut::run_all` is a join barrier: every unit of the batch is polled
//! concurrently on the calling task, none is cancelled when a sibling
//! finishes or fails, and the caller resumes only once all have reached a
//! terminal state. Results are slotted by submission position, so the
//! returned list is index-aligned with the input whatever the completion order.

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::future::Future;
use tokio::time::Instant;

use crate::clock;
use crate::error::HandlerError;
use crate::logger;

/// Default ceiling on units per batch
pub const MAX_CONCURRENT_TASKS: usize = 20;

/// One independent unit of concurrent work
pub struct WorkUnit<T, E> {
    id: usize,
    task: BoxFuture<'static, Result<T, E>>,
}

impl<T, E> WorkUnit<T, E> {
    pub fn new<F>(id: usize, task: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            id,
            task: task.boxed(),
        }
    }
}

/// Terminal state of a unit, tagged with the unit's id
///
/// Serializes as the bare success or failure payload.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkResult<T, E> {
    pub id: usize,
    pub outcome: Result<T, E>,
}

impl<T, E> WorkResult<T, E> {
    pub const fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }
}

impl<T: Serialize, E: Serialize> Serialize for WorkResult<T, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.outcome {
            Ok(payload) => payload.serialize(serializer),
            Err(failure) => failure.serialize(serializer),
        }
    }
}

/// Fan-out executor with a fixed batch ceiling
#[derive(Debug, Clone, Copy)]
pub struct FanOut {
    max_units: usize,
}

impl Default for FanOut {
    fn default() -> Self {
        Self::new(MAX_CONCURRENT_TASKS)
    }
}

impl FanOut {
    pub const fn new(max_units: usize) -> Self {
        Self { max_units }
    }

    pub const fn max_units(&self) -> usize {
        self.max_units
    }

    /// Reject a batch larger than the ceiling before anything is scheduled
    pub fn check(&self, units: usize) -> Result<(), HandlerError> {
        if units > self.max_units {
            logger::log_batch_rejected(units, self.max_units);
            return Err(HandlerError::validation(format!(
                "Maximum {} concurrent tasks allowed",
                self.max_units
            )));
        }
        Ok(())
    }

    /// Run every unit concurrently and wait for all of them
    pub async fn run_all<T, E>(
        &self,
        units: Vec<WorkUnit<T, E>>,
    ) -> Result<Vec<WorkResult<T, E>>, HandlerError> {
        self.check(units.len())?;

        let started = Instant::now();
        let mut slots: Vec<Option<WorkResult<T, E>>> =
            std::iter::repeat_with(|| None).take(units.len()).collect();

        let mut pending: FuturesUnordered<_> = units
            .into_iter()
            .enumerate()
            .map(|(position, unit)| async move {
                let outcome = unit.task.await;
                (position, WorkResult { id: unit.id, outcome })
            })
            .collect();

        while let Some((position, result)) = pending.next().await {
            slots[position] = Some(result);
        }

        let results: Vec<_> = slots.into_iter().flatten().collect();
        let failures = results.iter().filter(|r| r.is_failure()).count();
        logger::log_batch_complete(results.len(), failures, started.elapsed());
        Ok(results)
    }
}

/// Wrap batch results into `{<total_field>, results, <timestamp_field>}`
pub fn batch_envelope<T: Serialize>(
    total_field: &str,
    results: &[T],
    timestamp_field: &str,
) -> Result<Value, HandlerError> {
    let mut body = Map::new();
    body.insert(total_field.to_string(), Value::from(results.len()));
    body.insert("results".to_string(), serde_json::to_value(results)?);
    body.insert(
        timestamp_field.to_string(),
        Value::from(clock::now_iso8601()),
    );
    Ok(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn delayed(id: usize, millis: u64) -> WorkUnit<usize, String> {
        WorkUnit::new(id, async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            Ok(id * 10)
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_follow_submission_order() {
        // Later units finish first
        let units = (0..6).map(|id| delayed(id, 600 - id as u64 * 100)).collect();
        let results = FanOut::default().run_all(units).await.unwrap();

        assert_eq!(results.len(), 6);
        for (position, result) in results.iter().enumerate() {
            assert_eq!(result.id, position);
            assert_eq!(result.outcome, Ok(position * 10));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_units_run_concurrently() {
        let started = Instant::now();
        let units = (0..20).map(|id| delayed(id, 200)).collect();
        let results = FanOut::default().run_all(units).await.unwrap();

        assert_eq!(results.len(), 20);
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_slowest_unit() {
        let started = Instant::now();
        let units = vec![delayed(0, 10), delayed(1, 1_000), delayed(2, 50)];
        let results = FanOut::default().run_all(units).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(started.elapsed() >= Duration::from_millis(1_000));
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_siblings() {
        let units = vec![
            WorkUnit::new(0, async { Ok::<_, String>("a") }),
            WorkUnit::new(1, async { Err("unit 1 failed".to_string()) }),
            WorkUnit::new(2, async { Ok("c") }),
        ];
        let results = FanOut::default().run_all(units).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].outcome, Ok("a"));
        assert!(results[1].is_failure());
        assert_eq!(results[2].outcome, Ok("c"));
    }

    #[tokio::test]
    async fn test_over_ceiling_rejected_without_scheduling() {
        let polled = Arc::new(AtomicUsize::new(0));
        let units: Vec<WorkUnit<(), String>> = (0..21)
            .map(|id| {
                let polled = Arc::clone(&polled);
                WorkUnit::new(id, async move {
                    polled.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();

        let err = FanOut::default().run_all(units).await.unwrap_err();
        assert_eq!(err.to_string(), "Maximum 20 concurrent tasks allowed");
        assert_eq!(err.status(), hyper::StatusCode::BAD_REQUEST);
        assert_eq!(polled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let results = FanOut::new(3)
            .run_all(Vec::<WorkUnit<(), String>>::new())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_custom_ceiling() {
        let fanout = FanOut::new(3);
        assert_eq!(fanout.max_units(), 3);
        assert!(fanout.check(3).is_ok());
        assert_eq!(
            fanout.check(4).unwrap_err().to_string(),
            "Maximum 3 concurrent tasks allowed"
        );
    }

    #[test]
    fn test_work_result_serializes_payload() {
        let ok: WorkResult<Value, Value> = WorkResult {
            id: 0,
            outcome: Ok(json!({"url": "http://ok.example", "status": 200})),
        };
        let err: WorkResult<Value, Value> = WorkResult {
            id: 1,
            outcome: Err(json!({"url": "http://bad.invalid", "error": "dns"})),
        };
        let value = batch_envelope("total_urls", &[ok, err], "fetched_at").unwrap();

        assert_eq!(value["total_urls"], 2);
        assert_eq!(value["results"][0]["status"], 200);
        assert_eq!(value["results"][1]["error"], "dns");
        assert!(value["fetched_at"].is_string());
    }
}
