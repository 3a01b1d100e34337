//! Upstream SPARQL protocol endpoint
//!
//! Forwards each query as `GET <endpoint>?query=...` over plain HTTP and hands
//! back the decoded JSON document.

use super::{QueryResult, ResultShape, StoreError, TripleStore};
use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::header::{ACCEPT, USER_AGENT};
use hyper::{Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

const RESULTS_MEDIA_TYPE: &str = "application/sparql-results+json";

pub struct RemoteStore {
    endpoint: String,
    client: Client<HttpConnector, Empty<Bytes>>,
}

impl RemoteStore {
    /// Create a store forwarding to `endpoint`, which must be an absolute `http://` URI
    pub fn new(endpoint: impl Into<String>) -> Result<Self, StoreError> {
        let endpoint = endpoint.into();
        let uri: Uri = endpoint
            .parse()
            .map_err(|e| StoreError::Unavailable(format!("invalid endpoint '{endpoint}': {e}")))?;
        if uri.scheme_str() != Some("http") || uri.host().is_none() {
            return Err(StoreError::Unavailable(format!(
                "endpoint '{endpoint}' must be an absolute http:// URI"
            )));
        }

        let client = Client::builder(TokioExecutor::new()).build_http();
        Ok(Self { endpoint, client })
    }

    fn request_uri(&self, query: &str) -> Result<Uri, StoreError> {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        let uri = format!(
            "{}{separator}query={}",
            self.endpoint,
            urlencoding::encode(query)
        );
        uri.parse()
            .map_err(|e| StoreError::Unavailable(format!("invalid request URI: {e}")))
    }
}

impl TripleStore for RemoteStore {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn result_shape(&self) -> ResultShape {
        ResultShape::Native
    }

    async fn execute(&self, query: &str) -> Result<QueryResult, StoreError> {
        let request = Request::get(self.request_uri(query)?)
            .header(ACCEPT, RESULTS_MEDIA_TYPE)
            .header(USER_AGENT, concat!("sparql_protocol_proxy/", env!("CARGO_PKG_VERSION")))
            .body(Empty::new())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| StoreError::Unavailable(format!("reading upstream body: {e}")))?
            .to_bytes();

        if status.is_client_error() {
            return Err(StoreError::Query(format!(
                "upstream answered {status}: {}",
                String::from_utf8_lossy(&body)
            )));
        }
        if !status.is_success() {
            return Err(StoreError::Unavailable(format!("upstream answered {status}")));
        }

        let value = serde_json::from_slice(&body)
            .map_err(|e| StoreError::Serialization(format!("upstream body is not JSON: {e}")))?;
        Ok(QueryResult::Native(value))
    }
}
