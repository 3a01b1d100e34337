//! `/sparql` endpoint

use crate::config::AppState;
use crate::error::ProxyError;
use crate::http::{self, HttpResponse};
use crate::store::TripleStore;

/// Answer the SPARQL query carried in the `query` parameter
///
/// The store is not called when the parameter is missing or the query string
/// does not decode.
pub async fn serve_query<S: TripleStore>(
    state: &AppState<S>,
    raw_query: &str,
) -> Result<HttpResponse, ProxyError> {
    let params = http::decode_query(raw_query)?;
    let query = params.get("query").ok_or(ProxyError::MissingParameter)?;

    let json = state.store.execute(query).await?;
    Ok(http::build_results_response(json, state.config.server.enable_cors))
}
