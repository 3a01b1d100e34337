//! Triple store boundary
//!
//! The proxy depends on exactly one capability of a backend: executing a
//! SPARQL query. Backends declare up front which result shape they produce,
//! and [`StoreAdapter`] picks the matching encoding path from that
//! declaration.

pub mod memory;
pub mod remote;

use std::fmt;
use thiserror::Error;

pub use memory::MemoryStore;
pub use remote::RemoteStore;

/// Errors raised by a backend or while encoding its result
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected the query (syntax, unsupported form, ...)
    #[error("query rejected: {0}")]
    Query(String),

    /// The backend could not be reached or answered with a failure
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The result could not be serialized as SPARQL results JSON
    #[error("result serialization failed: {0}")]
    Serialization(String),

    #[error("backend declared {declared} results but produced {produced}")]
    ShapeMismatch {
        declared: ResultShape,
        produced: ResultShape,
    },
}

/// Result encoding requested from a [`SerializableResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFormat {
    Json,
}

impl ResultFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
        }
    }
}

/// Result objects that know how to encode themselves
pub trait SerializableResult {
    fn serialize(&self, format: ResultFormat) -> Result<String, StoreError>;
}

/// Value returned by one `execute` call
pub enum QueryResult {
    /// Plain JSON value, encoded with `serde_json`
    Native(serde_json::Value),
    /// Domain object encoded through its own `serialize`
    Serializable(Box<dyn SerializableResult>),
}

impl QueryResult {
    pub const fn shape(&self) -> ResultShape {
        match self {
            Self::Native(_) => ResultShape::Native,
            Self::Serializable(_) => ResultShape::Serializable,
        }
    }
}

impl fmt::Debug for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(value) => f.debug_tuple("Native").field(value).finish(),
            Self::Serializable(_) => f.write_str("Serializable(..)"),
        }
    }
}

/// Result variant a backend is declared to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    Native,
    Serializable,
}

impl fmt::Display for ResultShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Serializable => f.write_str("serializable"),
        }
    }
}

/// A SPARQL-capable backend
///
/// Connections are served on a `LocalSet`, so implementations need not be
/// `Send`.
#[allow(async_fn_in_trait)]
pub trait TripleStore {
    /// Short label used in the startup banner and logs
    fn name(&self) -> &'static str;

    /// Result variant every `execute` call produces
    fn result_shape(&self) -> ResultShape;

    async fn execute(&self, query: &str) -> Result<QueryResult, StoreError>;
}

/// Wraps the injected store and turns its results into response bodies
pub struct StoreAdapter<S> {
    store: S,
    shape: ResultShape,
}

impl<S: TripleStore> StoreAdapter<S> {
    pub fn new(store: S) -> Self {
        let shape = store.result_shape();
        Self { store, shape }
    }

    pub fn name(&self) -> &'static str {
        self.store.name()
    }

    pub const fn shape(&self) -> ResultShape {
        self.shape
    }

    #[cfg(test)]
    pub const fn inner(&self) -> &S {
        &self.store
    }

    /// Execute `query` and return the SPARQL results JSON document
    pub async fn execute(&self, query: &str) -> Result<String, StoreError> {
        let result = self.store.execute(query).await?;
        self.encode(result)
    }

    fn encode(&self, result: QueryResult) -> Result<String, StoreError> {
        match (self.shape, result) {
            (ResultShape::Native, QueryResult::Native(value)) => serde_json::to_string(&value)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            (ResultShape::Serializable, QueryResult::Serializable(object)) => {
                object.serialize(ResultFormat::Json)
            }
            (declared, other) => Err(StoreError::ShapeMismatch {
                declared,
                produced: other.shape(),
            }),
        }
    }
}
