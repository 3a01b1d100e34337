//! Request handler module
//!
//! Routes requests to the SPARQL endpoint or the index page and turns every
//! outcome into a complete response.

pub mod index;
pub mod router;
pub mod sparql;

// Re-export main entry point
pub use router::handle_request;
