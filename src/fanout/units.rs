//! Work unit kinds
//!
//! Each kind is a side-effect-free computation that suspends only on timers
//! or network I/O, so many of them can share one task.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::executor::WorkUnit;
use crate::clock;
use crate::fetch::{FetchError, Fetcher};

/// Duration of each simulated task
pub const TASK_DURATION: Duration = Duration::from_millis(200);

/// Artificial delay applied per transformed field
pub const FIELD_TRANSFORM_DELAY: Duration = Duration::from_millis(100);

/// Per-unit failure payload
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UnitFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub error: String,
}

// ============== Timed no-op ==============

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaskReport {
    pub task_id: usize,
    pub status: &'static str,
    /// Measured duration in seconds
    pub duration: f64,
}

pub async fn simulate_work(task_id: usize, duration: Duration) -> Result<TaskReport, UnitFailure> {
    let start = Instant::now();
    tokio::time::sleep(duration).await;
    Ok(TaskReport {
        task_id,
        status: "completed",
        duration: start.elapsed().as_secs_f64(),
    })
}

/// `count` timed units with ids `0..count`
pub fn timed_batch(count: usize, duration: Duration) -> Vec<WorkUnit<TaskReport, UnitFailure>> {
    (0..count)
        .map(|task_id| WorkUnit::new(task_id, simulate_work(task_id, duration)))
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DelayReport {
    pub requested_delay: f64,
    pub actual_delay: f64,
    pub started_at: String,
    pub completed_at: String,
}

/// Suspend for `requested` and report requested vs. measured delay
pub async fn delayed_response(requested: Duration) -> DelayReport {
    let started_at = clock::now_iso8601();
    let start = Instant::now();
    tokio::time::sleep(requested).await;
    let actual_delay = start.elapsed().as_secs_f64();
    DelayReport {
        requested_delay: requested.as_secs_f64(),
        actual_delay,
        started_at,
        completed_at: clock::now_iso8601(),
    }
}

// ============== Remote fetch ==============

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FetchReport {
    pub url: String,
    pub status: u16,
    pub content_length: usize,
}

/// Fetch one URL; any error becomes a `{url, error}` failure, never a fault
pub async fn fetch_url(
    fetcher: Arc<dyn Fetcher>,
    url: String,
    timeout: Duration,
) -> Result<FetchReport, UnitFailure> {
    let outcome = tokio::time::timeout(timeout, fetcher.fetch(&url, timeout))
        .await
        .unwrap_or(Err(FetchError::Timeout(timeout)));

    match outcome {
        Ok(page) => Ok(FetchReport {
            url,
            status: page.status,
            content_length: page.body_length,
        }),
        Err(e) => Err(UnitFailure {
            url: Some(url),
            error: e.to_string(),
        }),
    }
}

pub fn fetch_batch(
    fetcher: &Arc<dyn Fetcher>,
    urls: &[String],
    timeout: Duration,
) -> Vec<WorkUnit<FetchReport, UnitFailure>> {
    urls.iter()
        .enumerate()
        .map(|(id, url)| WorkUnit::new(id, fetch_url(Arc::clone(fetcher), url.clone(), timeout)))
        .collect()
}

// ============== Field transform ==============

/// Case-fold a field key after an artificial delay
pub async fn transform_field(key: String, delay: Duration) -> Result<String, UnitFailure> {
    tokio::time::sleep(delay).await;
    Ok(key.to_uppercase())
}

pub fn transform_batch<I>(keys: I, delay: Duration) -> Vec<WorkUnit<String, UnitFailure>>
where
    I: IntoIterator<Item = String>,
{
    keys.into_iter()
        .enumerate()
        .map(|(id, key)| WorkUnit::new(id, transform_field(key, delay)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fanout::FanOut;
    use crate::handler::testing::StubFetcher;

    fn stub() -> Arc<dyn Fetcher> {
        Arc::new(StubFetcher)
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_batch_reports_each_task() {
        let results = FanOut::default()
            .run_all(timed_batch(5, TASK_DURATION))
            .await
            .unwrap();
        assert_eq!(results.len(), 5);
        for (i, result) in results.iter().enumerate() {
            let report = result.outcome.as_ref().unwrap();
            assert_eq!(report.task_id, i);
            assert_eq!(report.status, "completed");
            assert!(report.duration >= 0.2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_response_measures_delay() {
        let report = delayed_response(Duration::from_millis(1_500)).await;
        assert!((report.requested_delay - 1.5).abs() < f64::EPSILON);
        assert!(report.actual_delay >= 1.5);
    }

    #[tokio::test]
    async fn test_fetch_batch_marks_only_failing_url() {
        let urls = vec![
            "http://ok.example".to_string(),
            "http://bad.invalid".to_string(),
            "http://also-ok.example/path".to_string(),
        ];
        let results = FanOut::default()
            .run_all(fetch_batch(&stub(), &urls, Duration::from_secs(5)))
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].outcome,
            Ok(FetchReport {
                url: "http://ok.example".to_string(),
                status: 200,
                content_length: 17,
            })
        );
        let failure = results[1].outcome.as_ref().unwrap_err();
        assert_eq!(failure.url.as_deref(), Some("http://bad.invalid"));
        assert!(failure.error.contains("dns error"));
        assert!(results[2].outcome.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_unit_times_out_independently() {
        let urls = vec![
            "http://slow.example".to_string(),
            "http://ok.example".to_string(),
        ];
        let results = FanOut::default()
            .run_all(fetch_batch(&stub(), &urls, Duration::from_secs(5)))
            .await
            .unwrap();

        let failure = results[0].outcome.as_ref().unwrap_err();
        assert_eq!(failure.error, "Request timed out after 5s");
        assert!(results[1].outcome.is_ok());
    }

    #[test]
    fn test_failure_serialization() {
        let failure = UnitFailure {
            url: Some("http://bad.invalid".to_string()),
            error: "dns error".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&failure).unwrap(),
            serde_json::json!({"url": "http://bad.invalid", "error": "dns error"})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_transform_batch_uppercases_keys() {
        let keys = vec!["name".to_string(), "city".to_string()];
        let results = FanOut::default()
            .run_all(transform_batch(keys, FIELD_TRANSFORM_DELAY))
            .await
            .unwrap();
        let upper: Vec<_> = results.into_iter().filter_map(|r| r.outcome.ok()).collect();
        assert_eq!(upper, ["NAME", "CITY"]);
    }
}
