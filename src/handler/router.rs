//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method check, path
//! classification, dispatch and error conversion.

use crate::config::AppState;
use crate::error::ProxyError;
use crate::handler::{index, sparql};
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};
use crate::store::TripleStore;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, REFERER, USER_AGENT};
use hyper::http::uri::PathAndQuery;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Where a request path leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Sparql,
    Index,
    Redirect,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<S: TripleStore>(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState<S>>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method();
    let is_head = *method == Method::HEAD;
    let target = req
        .uri()
        .path_and_query()
        .map_or("/", PathAndQuery::as_str);

    let response = match *method {
        Method::GET | Method::HEAD => route(&state, target).await,
        _ => error_response(
            &ProxyError::UnsupportedMethod(method.to_string()),
            state.config.server.enable_cors,
        ),
    };

    if state.config.logging.access_log {
        let (path, query) = split_target(target);
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            method.to_string(),
            path.to_string(),
        );
        entry.query = (!query.is_empty()).then(|| query.to_string());
        entry.http_version = format!("{:?}", req.version())
            .trim_start_matches("HTTP/")
            .to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = if is_head { 0 } else { response.body_length() };
        entry.referer = header_string(&req, &REFERER);
        entry.user_agent = header_string(&req, &USER_AGENT);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response.into_hyper(is_head))
}

/// Produce the response for a GET/HEAD request target (path plus optional query)
pub async fn route<S: TripleStore>(state: &AppState<S>, target: &str) -> HttpResponse {
    let enable_cors = state.config.server.enable_cors;
    let (path, query) = split_target(target);

    let outcome = match classify(path) {
        Route::Sparql => sparql::serve_query(state, query).await,
        Route::Index => index::serve_index(&state.config.server).await,
        Route::Redirect => Ok(http::build_redirect_response("/", enable_cors)),
    };

    outcome.unwrap_or_else(|err| error_response(&err, enable_cors))
}

/// Split at the last `?` into path and raw query string
fn split_target(target: &str) -> (&str, &str) {
    target
        .rfind('?')
        .map_or((target, ""), |i| (&target[..i], &target[i + 1..]))
}

fn classify(path: &str) -> Route {
    match path.trim_matches('/') {
        "sparql" => Route::Sparql,
        "" => Route::Index,
        _ => Route::Redirect,
    }
}

fn error_response(err: &ProxyError, enable_cors: bool) -> HttpResponse {
    if let ProxyError::Backend(cause) = err {
        logger::log_error(&format!("Backend failure: {cause}"));
    }
    http::build_error_response(err, enable_cors)
}

fn header_string(req: &Request<hyper::body::Incoming>, name: &HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::test_support::{FailingStore, FixedStore};
    use crate::store::MemoryStore;
    use hyper::header::{
        ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED, LOCATION,
    };
    use hyper::StatusCode;
    use serde_json::json;
    use std::io::Write;
    use std::path::Path;

    fn empty_results() -> serde_json::Value {
        json!({"head": {}, "results": {"bindings": []}})
    }

    fn config(enable_cors: bool, index_file: Option<&Path>) -> Config {
        let mut cfg = Config::default();
        cfg.server.enable_cors = enable_cors;
        cfg.server.index_file = index_file.map(Path::to_path_buf);
        cfg
    }

    fn fixed_state(enable_cors: bool) -> AppState<FixedStore> {
        AppState::new(config(enable_cors, None), FixedStore::new(empty_results()))
    }

    fn body_text(response: &HttpResponse) -> &str {
        std::str::from_utf8(response.body()).unwrap()
    }

    #[test]
    fn test_split_target_uses_last_question_mark() {
        assert_eq!(split_target("/sparql?query=ASK"), ("/sparql", "query=ASK"));
        assert_eq!(split_target("/sparql"), ("/sparql", ""));
        assert_eq!(split_target("/a?b?c"), ("/a?b", "c"));
        assert_eq!(split_target("/?"), ("/", ""));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("/sparql"), Route::Sparql);
        assert_eq!(classify("//sparql/"), Route::Sparql);
        assert_eq!(classify("/"), Route::Index);
        assert_eq!(classify(""), Route::Index);
        assert_eq!(classify("/sparql/extra"), Route::Redirect);
        assert_eq!(classify("/SPARQL"), Route::Redirect);
        assert_eq!(classify("/unknown/path"), Route::Redirect);
    }

    #[tokio::test]
    async fn test_missing_query_parameter() {
        let state = fixed_state(false);
        let response = route(&state, "/sparql").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(&response).contains("No 'query' parameter specified"));
        assert_eq!(state.store.inner().calls.get(), 0);
    }

    #[tokio::test]
    async fn test_other_parameters_without_query() {
        let state = fixed_state(false);
        let response = route(&state, "/sparql?format=json").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(&response).contains("No 'query' parameter specified"));
    }

    #[tokio::test]
    async fn test_malformed_query_string() {
        let state = fixed_state(false);
        let response = route(&state, "/sparql?query=ASK%7B%7D&debug").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(&response).contains("Malformed query string"));
        assert_eq!(state.store.inner().calls.get(), 0);
    }

    #[tokio::test]
    async fn test_query_answered_with_results_json() {
        let state = fixed_state(false);
        let response = route(&state, "/sparql?query=SELECT%20*%20WHERE%20{}").await;

        let expected = serde_json::to_string(&empty_results()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.header(&CONTENT_TYPE), Some("application/sparql-results+json"));
        assert_eq!(body_text(&response), expected);
        assert_eq!(
            response.header(&CONTENT_LENGTH),
            Some(expected.len().to_string().as_str())
        );
        assert_eq!(response.header(&LAST_MODIFIED), None);
        assert_eq!(state.store.inner().calls.get(), 1);
    }

    #[tokio::test]
    async fn test_repeated_query_is_byte_identical() {
        let state = fixed_state(true);
        let target = "/sparql?query=SELECT+%3Fs+WHERE+%7B%3Fs+%3Fp+%3Fo%7D";
        let first = route(&state, target).await;
        let second = route(&state, target).await;

        assert_eq!(first.body(), second.body());
        assert_eq!(
            first.headers().collect::<Vec<_>>(),
            second.headers().collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_memory_store_end_to_end() {
        let state = AppState::new(config(false, None), MemoryStore::new());
        let response = route(&state, "/sparql?query=SELECT+%3Fs+WHERE+%7B%3Fs+%3Fp+%3Fo%7D").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(&response),
            r#"{"head":{"vars":["s"]},"results":{"bindings":[]}}"#
        );
    }

    #[tokio::test]
    async fn test_memory_store_graph_query_is_server_error() {
        let state = AppState::new(config(false, None), MemoryStore::new());
        let response = route(&state, "/sparql?query=CONSTRUCT+WHERE+%7B%3Fs+%3Fp+%3Fo%7D").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_backend_failure_is_internal_error() {
        let state = AppState::new(config(true, None), FailingStore);
        let response = route(&state, "/sparql?query=SELEKT").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(&response).contains("Query execution failed"));
        assert!(!body_text(&response).contains("cannot parse"));
        assert_eq!(response.header(&ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));
    }

    #[tokio::test]
    async fn test_unknown_path_redirects_to_root() {
        let state = fixed_state(false);
        let response = route(&state, "/unknown/path").await;

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.header(&LOCATION), Some("/"));
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn test_builtin_index_page() {
        let state = fixed_state(false);
        let response = route(&state, "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(&response).contains("SparqlProtocolProxy"));
        assert_eq!(
            response.header(&CONTENT_LENGTH),
            Some(response.body_length().to_string().as_str())
        );
    }

    #[tokio::test]
    async fn test_index_ignores_query_string() {
        let state = fixed_state(false);
        let response = route(&state, "/?utm_source=x").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_configured_index_file_length() {
        let content = b"first line\r\nsecond line\r\n\r\n";
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();

        let state = AppState::new(
            config(false, Some(file.path())),
            FixedStore::new(empty_results()),
        );
        let response = route(&state, "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.header(&CONTENT_LENGTH),
            Some(content.len().to_string().as_str())
        );
        assert_eq!(response.body().as_ref(), content);
    }

    #[tokio::test]
    async fn test_missing_index_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("index.html");
        let state = AppState::new(config(false, Some(&missing)), FixedStore::new(empty_results()));

        let response = route(&state, "/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(&response).contains("File not found"));
    }

    async fn cors_headers(enable_cors: bool) -> Vec<(StatusCode, Option<String>)> {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("index.html");
        let plain = AppState::new(config(enable_cors, None), FixedStore::new(empty_results()));
        let broken_index = AppState::new(
            config(enable_cors, Some(&missing)),
            FixedStore::new(empty_results()),
        );

        let mut responses = Vec::new();
        for target in ["/", "/sparql?query=ASK%7B%7D", "/sparql", "/sparql?x", "/elsewhere"] {
            responses.push(route(&plain, target).await);
        }
        responses.push(route(&broken_index, "/").await);

        responses
            .iter()
            .map(|r| {
                (
                    r.status(),
                    r.header(&ACCESS_CONTROL_ALLOW_ORIGIN).map(ToString::to_string),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_cors_disabled_never_sends_header() {
        let results = cors_headers(false).await;
        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|(_, header)| header.is_none()));
    }

    #[tokio::test]
    async fn test_cors_enabled_on_every_response() {
        let results = cors_headers(true).await;
        let statuses: Vec<u16> = results.iter().map(|(s, _)| s.as_u16()).collect();
        assert_eq!(statuses, vec![200, 200, 400, 400, 301, 404]);
        assert!(results.iter().all(|(_, header)| header.as_deref() == Some("*")));
    }
}
