// Application state module
// Built once at startup and shared read-only by every connection

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::types::Config;
use crate::fanout::FanOut;
use crate::fetch::{FetchError, Fetcher, HttpFetcher};
use crate::functions::{Function, FunctionRegistry, RegistryError};
use crate::handler::FunctionContext;

/// Errors that prevent the host from starting
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("unknown function target '{name}' (available: {})", .available.join(", "))]
    UnknownFunction {
        name: String,
        available: Vec<&'static str>,
    },
    #[error("invalid function registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] FetchError),
}

/// Application state
pub struct AppState {
    pub config: Config,
    /// Name of the function served by this host
    pub target: String,
    pub function: Function,
    pub context: Arc<FunctionContext>,
}

impl AppState {
    /// Create `AppState` with the default HTTP fetcher
    pub fn new(config: &Config) -> Result<Self, StartupError> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new()?);
        Self::with_fetcher(config, fetcher)
    }

    /// Create `AppState` around an explicit fetch capability
    pub fn with_fetcher(config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<Self, StartupError> {
        let mut registry = FunctionRegistry::standard()?;
        let target = config.functions.target.clone();
        let Some(function) = registry.take(&target) else {
            return Err(StartupError::UnknownFunction {
                name: target,
                available: registry.names(),
            });
        };

        let context = FunctionContext {
            fetcher,
            fanout: FanOut::new(config.functions.max_concurrent_tasks),
            fetch_timeout: Duration::from_secs(config.functions.fetch_timeout_secs),
            max_delay_secs: config.functions.max_delay_secs,
        };

        Ok(Self {
            config: config.clone(),
            target,
            function,
            context: Arc::new(context),
        })
    }
}
