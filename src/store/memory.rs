//! In-memory store over an empty dataset
//!
//! Recognizes the query form and answers as an empty dataset would: no
//! solutions for `SELECT`, `false` for `ASK`. Graph forms cannot be written as
//! SPARQL results JSON and fail at serialization time.

use super::{QueryResult, ResultFormat, ResultShape, SerializableResult, StoreError, TripleStore};
use serde_json::json;
use std::fmt;

#[derive(Debug, Default)]
pub struct MemoryStore;

impl MemoryStore {
    pub const fn new() -> Self {
        Self
    }
}

impl TripleStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn result_shape(&self) -> ResultShape {
        ResultShape::Serializable
    }

    async fn execute(&self, query: &str) -> Result<QueryResult, StoreError> {
        let form = QueryForm::parse(query)?;
        Ok(QueryResult::Serializable(Box::new(EmptyResults { form })))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum QueryForm {
    /// Projected variable names, without the `?`/`$` sigil
    Select(Vec<String>),
    Ask,
    Construct,
    Describe,
}

impl fmt::Display for QueryForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(_) => f.write_str("SELECT"),
            Self::Ask => f.write_str("ASK"),
            Self::Construct => f.write_str("CONSTRUCT"),
            Self::Describe => f.write_str("DESCRIBE"),
        }
    }
}

impl QueryForm {
    fn parse(query: &str) -> Result<Self, StoreError> {
        let tokens = tokenize(query);
        let mut rest = skip_prologue(&tokens);

        let Some((keyword, tail)) = rest.split_first() else {
            return Err(StoreError::Query("empty query".to_string()));
        };
        rest = tail;

        match keyword.to_ascii_uppercase().as_str() {
            "SELECT" => Ok(Self::Select(projection(rest))),
            "ASK" => Ok(Self::Ask),
            "CONSTRUCT" => Ok(Self::Construct),
            "DESCRIBE" => Ok(Self::Describe),
            other => Err(StoreError::Query(format!("unsupported query form '{other}'"))),
        }
    }
}

struct EmptyResults {
    form: QueryForm,
}

impl SerializableResult for EmptyResults {
    fn serialize(&self, format: ResultFormat) -> Result<String, StoreError> {
        let document = match (&self.form, format) {
            (QueryForm::Select(vars), ResultFormat::Json) => {
                json!({"head": {"vars": vars}, "results": {"bindings": []}})
            }
            (QueryForm::Ask, ResultFormat::Json) => json!({"head": {}, "boolean": false}),
            (form @ (QueryForm::Construct | QueryForm::Describe), _) => {
                return Err(StoreError::Serialization(format!(
                    "{form} produces a graph, which has no {} results encoding",
                    format.as_str()
                )));
            }
        };
        serde_json::to_string(&document).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

/// Split a query into IRIs, literals, punctuation and words.
/// `#` comments run to the end of the line; `#` inside an IRI or a string
/// literal is content.
fn tokenize(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut rest = query;

    while let Some(c) = rest.chars().next() {
        let consumed = match c {
            '#' => {
                flush(&mut current, &mut tokens);
                rest.find('\n').unwrap_or(rest.len())
            }
            '"' | '\'' => {
                flush(&mut current, &mut tokens);
                let len = literal_len(rest, c);
                tokens.push(rest[..len].to_string());
                len
            }
            '<' => {
                flush(&mut current, &mut tokens);
                let len = iri_len(rest).unwrap_or(1);
                tokens.push(rest[..len].to_string());
                len
            }
            '(' | ')' | '{' | '}' | ',' | ';' | '=' | '!' | '>' | '*' | '+' | '/' | '|' | '&' => {
                flush(&mut current, &mut tokens);
                tokens.push(c.to_string());
                1
            }
            c if c.is_whitespace() => {
                flush(&mut current, &mut tokens);
                c.len_utf8()
            }
            c => {
                current.push(c);
                c.len_utf8()
            }
        };
        rest = &rest[consumed..];
    }
    flush(&mut current, &mut tokens);
    tokens
}

/// Byte length of the IRI reference at the start of `text`, if `<` opens one.
/// A `<` followed by whitespace or other forbidden characters before the
/// closing `>` is the less-than operator.
fn iri_len(text: &str) -> Option<usize> {
    let body = &text[1..];
    let end = body.find(|c: char| c == '>' || c.is_whitespace() || "<\"{}|^`\\".contains(c))?;
    body[end..].starts_with('>').then_some(end + 2)
}

/// Byte length of the string literal opened by `quote` at the start of
/// `text`, long (`"""`) form included. An unterminated literal runs to the end.
fn literal_len(text: &str, quote: char) -> usize {
    let long = quote.to_string().repeat(3);
    let (open, close) = if text.starts_with(&long) {
        (3, long.as_str())
    } else {
        (1, &text[..1])
    };

    let mut escaped = false;
    for (i, c) in text[open..].char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if text[open + i..].starts_with(close) {
            return open + i + close.len();
        }
    }
    text.len()
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

/// Skip `PREFIX ns: <iri>` and `BASE <iri>` declarations
fn skip_prologue(tokens: &[String]) -> &[String] {
    let mut rest = tokens;
    loop {
        match rest.first() {
            Some(t) if t.eq_ignore_ascii_case("PREFIX") => {
                // `PREFIX ex:<iri>` tokenizes the same as `PREFIX ex: <iri>`
                rest = rest.get(3..).unwrap_or_default();
            }
            Some(t) if t.eq_ignore_ascii_case("BASE") => {
                rest = rest.get(2..).unwrap_or_default();
            }
            _ => return rest,
        }
    }
}

/// Variables named by a `SELECT` clause, `*` meaning every variable of the pattern
fn projection(tokens: &[String]) -> Vec<String> {
    let mut rest = tokens;
    if rest
        .first()
        .is_some_and(|t| t.eq_ignore_ascii_case("DISTINCT") || t.eq_ignore_ascii_case("REDUCED"))
    {
        rest = &rest[1..];
    }

    let end = rest
        .iter()
        .position(|t| t == "{" || t.eq_ignore_ascii_case("WHERE") || t.eq_ignore_ascii_case("FROM"))
        .unwrap_or(rest.len());
    let (clause, pattern) = rest.split_at(end);

    let mut vars: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !vars.iter().any(|v| v == name) {
            vars.push(name.to_string());
        }
    };

    if clause.first().is_some_and(|t| t == "*") {
        pattern.iter().filter_map(|t| variable(t)).for_each(&mut push);
        return vars;
    }

    let mut depth = 0usize;
    let mut after_as = false;
    for token in clause {
        match token.as_str() {
            "(" => depth += 1,
            ")" => depth = depth.saturating_sub(1),
            t if t.eq_ignore_ascii_case("AS") => {
                after_as = true;
                continue;
            }
            t => {
                if let Some(name) = variable(t) {
                    if depth == 0 || after_as {
                        push(name);
                    }
                }
            }
        }
        after_as = false;
    }
    vars
}

fn variable(token: &str) -> Option<&str> {
    let name = token.strip_prefix('?').or_else(|| token.strip_prefix('$'))?;
    let end = name
        .char_indices()
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
        .map_or(name.len(), |(i, _)| i);
    (end > 0).then_some(&name[..end])
}
