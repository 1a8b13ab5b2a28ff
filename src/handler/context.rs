// Per-process execution context handed to every handler invocation

use std::sync::Arc;
use std::time::Duration;

use crate::fanout::FanOut;
use crate::fetch::Fetcher;

/// Read-only collaborators and limits shared by all invocations
pub struct FunctionContext {
    /// Outbound fetch capability (pooled, safe to share across units)
    pub fetcher: Arc<dyn Fetcher>,
    pub fanout: FanOut,
    /// Timeout applied to each remote fetch unit
    pub fetch_timeout: Duration,
    pub max_delay_secs: f64,
}
