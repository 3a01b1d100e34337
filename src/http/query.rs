//! Query string decoding
//!
//! `application/x-www-form-urlencoded` rules: pairs separated by `&`, key and
//! value split at the first `=`, `+` standing for a space and `%XX` for a
//! byte. Keys are kept verbatim and the last duplicate wins.

use crate::error::ProxyError;
use std::collections::HashMap;

/// Decoded parameters of one request
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    params: HashMap<String, String>,
}

impl ParsedQuery {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Decode a raw query string (without the leading `?`)
///
/// Empty segments such as the one left by a trailing `&` are ignored. A
/// segment without `=` is rejected.
pub fn decode_query(raw: &str) -> Result<ParsedQuery, ProxyError> {
    let mut params = HashMap::new();

    for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(ProxyError::MalformedQueryString(format!(
                "'{pair}' is not a key=value pair"
            )));
        };
        params.insert(key.to_string(), decode_component(value)?);
    }

    Ok(ParsedQuery { params })
}

/// Form-decode one value: `+` becomes a space before percent escapes are resolved
fn decode_component(value: &str) -> Result<String, ProxyError> {
    let spaced = value.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8(bytes.into_owned()).map_err(|_| {
        ProxyError::MalformedQueryString(format!("value '{value}' is not valid UTF-8 once decoded"))
    })
}
