//! Request-level error taxonomy
//!
//! Every variant maps to a status code and a short message that is safe to
//! show to clients. Underlying causes stay in the error log.

use crate::store::StoreError;
use hyper::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// `query` key absent from the decoded query string
    #[error("No 'query' parameter specified")]
    MissingParameter,

    /// Query string segment without `=`, or a value that is not UTF-8 once decoded
    #[error("Malformed query string: {0}")]
    MalformedQueryString(String),

    /// Configured index file cannot be opened or read
    #[error("File not found")]
    NotFound,

    /// Backend failed to execute or encode the query
    #[error("Query execution failed")]
    Backend(#[from] StoreError),

    #[error("Unsupported method ('{0}')")]
    UnsupportedMethod(String),
}

impl ProxyError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter | Self::MalformedQueryString(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnsupportedMethod(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }
}
