//! HTTP protocol layer module
//!
//! Query string decoding and response assembly, independent of routing.

pub mod query;
pub mod response;

// Re-export commonly used types
pub use query::decode_query;
pub use response::{
    build_error_response, build_index_response, build_redirect_response, build_results_response,
    HttpResponse,
};
