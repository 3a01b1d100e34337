//! Index page
//!
//! Serves the configured index file byte for byte, or a generated page
//! describing the proxy.

use crate::config::ServerConfig;
use crate::error::ProxyError;
use crate::http::{self, HttpResponse};
use crate::logger;
use chrono::{DateTime, Utc};
use hyper::body::Bytes;
use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

pub const TITLE: &str = "SparqlProtocolProxy";

/// Rendered into the built-in page: blank lines separate paragraphs, lines
/// starting with `*` become bullet lines.
const DESCRIPTION: &str = "
SparqlProtocolProxy is a small proxy server exposing a SPARQL protocol
interface not so strictly following the W3C recommendation.

Queries are sent as GET requests to /sparql with the query in the 'query'
parameter, and results are returned as application/sparql-results+json.
Queries are answered by one of the following stores:

* an in-memory store holding an empty dataset
* any SPARQL protocol compliant endpoint reachable over HTTP

This server supports CORS, see http://enable-cors.org/.
";

/// Serve the index page for `/`
pub async fn serve_index(server: &ServerConfig) -> Result<HttpResponse, ProxyError> {
    let (body, last_modified) = match server.index_file.as_deref() {
        Some(path) => read_index_file(path).await?,
        None => (Bytes::from(render_builtin_page()), Utc::now()),
    };
    Ok(http::build_index_response(body, last_modified, server.enable_cors))
}

/// Read the whole file as bytes together with its modification time
///
/// The file is always read as raw bytes, so the declared length is exactly
/// what gets transmitted.
async fn read_index_file(path: &Path) -> Result<(Bytes, DateTime<Utc>), ProxyError> {
    let not_found = |e: io::Error| {
        logger::log_warning(&format!("Cannot read index file '{}': {e}", path.display()));
        ProxyError::NotFound
    };

    let mut file = File::open(path).await.map_err(not_found)?;
    let metadata = file.metadata().await.map_err(not_found)?;

    let mut content = Vec::with_capacity(usize::try_from(metadata.len()).unwrap_or_default());
    file.read_to_end(&mut content).await.map_err(not_found)?;

    let last_modified = metadata.modified().map_or_else(|_| Utc::now(), DateTime::<Utc>::from);
    Ok((Bytes::from(content), last_modified))
}

/// Generate the built-in index page
pub fn render_builtin_page() -> String {
    let description = DESCRIPTION
        .replace("\n\n", "</p>\n<p>")
        .replace("\n*", "<br/>\n*");
    format!(
        "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 3.2 Final//EN\"><html>\n\
         <title>{TITLE}</title>\n<body>\n<h2>{TITLE}</h2>\n<p>{description}</p></body>\n</html>\n"
    )
}
