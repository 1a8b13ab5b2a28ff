//! HTTP protocol layer module
//!
//! Request/reply models exchanged with functions and the builders that turn
//! them into hyper responses.

pub mod reply;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use reply::Reply;
pub use request::{BodyError, FunctionRequest};
pub use response::{
    build_400_response, build_413_response, build_health_response, build_options_response,
    build_reply_response,
};
