//! Function catalog
//!
//! Every independently deployable entry point is registered here by name.
//! The host serves exactly one of them, chosen by configuration.

mod asynchronous;
mod multi_endpoint;
mod params;
mod synchronous;

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::handler::{self, FunctionContext, Handler};
use crate::http::{FunctionRequest, Reply};
use crate::routing::{RouteError, RouteTable};

/// A deployable function
pub enum Function {
    /// Single handler answering every request
    Single(Handler),
    /// One entry point dispatching to many routes
    Routed(RouteTable),
}

impl Function {
    pub async fn call(&self, req: FunctionRequest, ctx: Arc<FunctionContext>) -> Reply {
        match self {
            Self::Single(handler) => handler::invoke(*handler, req, ctx).await,
            Self::Routed(table) => table.dispatch(req, ctx).await,
        }
    }
}

/// Errors building the function registry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate function name '{0}'")]
    Duplicate(&'static str),
    #[error("invalid route table: {0}")]
    Routes(#[from] RouteError),
}

/// Name → function registry, in registration order
pub struct FunctionRegistry {
    names: Vec<&'static str>,
    functions: HashMap<&'static str, Function>,
}

impl FunctionRegistry {
    /// Registry of every function shipped with the host
    pub fn standard() -> Result<Self, RegistryError> {
        let mut registry = Self {
            names: Vec::new(),
            functions: HashMap::new(),
        };
        for (name, handler) in synchronous::FUNCTIONS.iter().chain(asynchronous::FUNCTIONS) {
            registry.register(*name, Function::Single(*handler))?;
        }
        registry.register(
            multi_endpoint::NAME,
            Function::Routed(multi_endpoint::routes()?),
        )?;
        Ok(registry)
    }

    fn register(&mut self, name: &'static str, function: Function) -> Result<(), RegistryError> {
        if self.names.contains(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.names.push(name);
        self.functions.insert(name, function);
        Ok(())
    }

    /// Registered names still available, in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.names
            .iter()
            .copied()
            .filter(|name| self.functions.contains_key(name))
            .collect()
    }

    /// Remove and return the named function
    pub fn take(&mut self, name: &str) -> Option<Function> {
        self.functions.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::testing::{context, get};
    use hyper::StatusCode;

    #[test]
    fn test_standard_registry_names() {
        let registry = FunctionRegistry::standard().unwrap();
        let names = registry.names();
        assert_eq!(names.len(), 16);
        assert_eq!(names[0], "hello_world");
        assert_eq!(names.last(), Some(&"multi_endpoint_handler"));
        assert!(names.contains(&"async_fetch_multiple_urls"));
    }

    #[test]
    fn test_take_removes_function() {
        let mut registry = FunctionRegistry::standard().unwrap();
        assert!(registry.take("hello_world").is_some());
        assert!(registry.take("hello_world").is_none());
        assert!(!registry.names().contains(&"hello_world"));
        assert!(registry.take("nope").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = FunctionRegistry::standard().unwrap();
        let err = registry
            .register("hello_world", Function::Routed(multi_endpoint::routes().unwrap()))
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("hello_world"));
        assert_eq!(registry.names().len(), 16);
    }

    #[tokio::test]
    async fn test_single_function_ignores_path() {
        let mut registry = FunctionRegistry::standard().unwrap();
        let function = registry.take("hello_world").unwrap();
        let reply = function.call(get("/any/path", None), context()).await;
        assert_eq!(reply.text_body(), Some("Hello, World!"));
    }

    #[tokio::test]
    async fn test_routed_function_dispatches() {
        let mut registry = FunctionRegistry::standard().unwrap();
        let function = registry.take("multi_endpoint_handler").unwrap();
        let reply = function.call(get("/api/nope", None), context()).await;
        assert_eq!(reply.status(), StatusCode::NOT_FOUND);
    }
}
