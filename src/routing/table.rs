//! Route table module
//!
//! Maps `(method, path)` keys to handlers. The table is built once and only
//! read afterwards; the 404 catalog is generated from it so the listed
//! endpoints always match the real ones.

use hyper::{Method, StatusCode};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::handler::{self, FunctionContext, Handler};
use crate::http::{FunctionRequest, Reply};
use crate::logger;

/// Route table construction errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("duplicate route: {method} {path}")]
    Duplicate { method: Method, path: String },
}

/// Route identity: exact method and path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub method: Method,
    pub path: String,
}

impl RouteKey {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

struct Route {
    key: RouteKey,
    description: &'static str,
    params: &'static [(&'static str, &'static str)],
    handler: Handler,
}

/// One entry of the route directory returned on a miss
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub method: String,
    pub path: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

/// Builder collecting routes in registration order
#[derive(Default)]
pub struct RouteTableBuilder {
    routes: Vec<Route>,
}

impl RouteTableBuilder {
    /// Register a route; `params` lists `(name, type)` pairs for the catalog
    #[must_use]
    pub fn route(
        mut self,
        method: Method,
        path: &str,
        description: &'static str,
        params: &'static [(&'static str, &'static str)],
        handler: Handler,
    ) -> Self {
        self.routes.push(Route {
            key: RouteKey::new(method, path),
            description,
            params,
            handler,
        });
        self
    }

    pub fn build(self) -> Result<RouteTable, RouteError> {
        let mut index = HashMap::with_capacity(self.routes.len());
        for (position, route) in self.routes.iter().enumerate() {
            if index.insert(route.key.clone(), position).is_some() {
                return Err(RouteError::Duplicate {
                    method: route.key.method.clone(),
                    path: route.key.path.clone(),
                });
            }
        }
        Ok(RouteTable {
            routes: self.routes,
            index,
        })
    }
}

/// Immutable `(method, path)` → handler table
pub struct RouteTable {
    routes: Vec<Route>,
    index: HashMap<RouteKey, usize>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Directory of every registered route, in registration order
    pub fn catalog(&self) -> Vec<CatalogEntry> {
        self.routes
            .iter()
            .map(|route| CatalogEntry {
                method: route.key.method.to_string(),
                path: route.key.path.clone(),
                description: route.description.to_string(),
                params: (!route.params.is_empty()).then(|| {
                    route
                        .params
                        .iter()
                        .map(|(name, kind)| ((*name).to_string(), Value::from(*kind)))
                        .collect()
                }),
            })
            .collect()
    }

    /// Dispatch a request to the handler bound to its exact `(method, path)`
    pub async fn dispatch(&self, req: FunctionRequest, ctx: Arc<FunctionContext>) -> Reply {
        let key = RouteKey::new(req.method().clone(), req.path());
        match self.index.get(&key) {
            Some(&position) => handler::invoke(self.routes[position].handler, req, ctx).await,
            None => self.not_found(&key),
        }
    }

    fn not_found(&self, key: &RouteKey) -> Reply {
        logger::log_route_miss(key.method.as_str(), &key.path, self.len());
        Reply::json(json!({
            "error": format!("Endpoint not found: {} {}", key.method, key.path),
            "status": 404,
            "available_endpoints": self.catalog(),
        }))
        .with_status(StatusCode::NOT_FOUND)
    }
}
