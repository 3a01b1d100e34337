//! HTTP response building module
//!
//! Responses are assembled completely, body included, before anything is
//! handed to hyper. `Content-Length` is always taken from the finished body.

use crate::error::ProxyError;
use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderName, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED, LOCATION,
};
use hyper::{Response, StatusCode};

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";
pub const RESULTS_CONTENT_TYPE: &str = "application/sparql-results+json";

/// A fully determined response: status, ordered headers and body
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: Vec<(HeaderName, String)>,
    body: Bytes,
}

impl HttpResponse {
    /// Start a response; `Content-Length` and `Content-Type` come first
    fn new(status: StatusCode, content_type: &str, body: Bytes) -> Self {
        let headers = vec![
            (CONTENT_LENGTH, body.len().to_string()),
            (CONTENT_TYPE, content_type.to_string()),
        ];
        Self {
            status,
            headers,
            body,
        }
    }

    fn with_header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// CORS header goes last, after every other header
    fn with_cors(self, enabled: bool) -> Self {
        if enabled {
            self.with_header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        } else {
            self
        }
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[cfg(test)]
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = (&HeaderName, &str)> {
        self.headers.iter().map(|(n, v)| (n, v.as_str()))
    }

    #[cfg(test)]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn body_length(&self) -> usize {
        self.body.len()
    }

    /// Convert into a hyper response. HEAD keeps every header, including the
    /// full `Content-Length`, and drops the body.
    pub fn into_hyper(self, is_head: bool) -> Response<Full<Bytes>> {
        let mut builder = Response::builder().status(self.status);
        for (name, value) in self.headers() {
            builder = builder.header(name, value);
        }

        let body = if is_head { Bytes::new() } else { self.body };
        builder.body(Full::new(body)).unwrap_or_else(|e| {
            log_build_error(self.status, &e);
            let mut fallback = Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
    }
}

/// Build 200 index page response
pub fn build_index_response(
    body: Bytes,
    last_modified: DateTime<Utc>,
    enable_cors: bool,
) -> HttpResponse {
    HttpResponse::new(StatusCode::OK, HTML_CONTENT_TYPE, body)
        .with_header(LAST_MODIFIED, format_http_date(last_modified))
        .with_cors(enable_cors)
}

/// Build 200 SPARQL results response
pub fn build_results_response(json: String, enable_cors: bool) -> HttpResponse {
    HttpResponse::new(StatusCode::OK, RESULTS_CONTENT_TYPE, Bytes::from(json)).with_cors(enable_cors)
}

/// Build 301 redirect response with an empty body
pub fn build_redirect_response(target: &str, enable_cors: bool) -> HttpResponse {
    HttpResponse::new(StatusCode::MOVED_PERMANENTLY, HTML_CONTENT_TYPE, Bytes::new())
        .with_header(LOCATION, target)
        .with_cors(enable_cors)
}

/// Build an HTML error page carrying the status code and the error message
pub fn build_error_response(err: &ProxyError, enable_cors: bool) -> HttpResponse {
    let status = err.status();
    let message = escape_html(&err.to_string());
    let page = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>Error response</title>\n</head>\n<body>\n\
         <h1>Error response</h1>\n<p>Error code: {code}</p>\n<p>Message: {message}</p>\n\
         </body>\n</html>\n",
        code = status.as_u16(),
    );
    HttpResponse::new(status, HTML_CONTENT_TYPE, Bytes::from(page)).with_cors(enable_cors)
}

/// Format a timestamp as an HTTP date, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Escape text for an HTML body; quotes are left as they are
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
