//! Routing module
//!
//! Exact `(method, path)` dispatch for multi-endpoint functions:
//! - Immutable route table built once, duplicates rejected at build time
//! - Catalog of registered routes derived from the table for 404 replies

mod table;

pub use table::{RouteError, RouteTable};
