//! Request descriptor: one logical call, independent of how many times it is attempted.

use crate::error::RestError;
use crate::query;
use reqwest::header::{HeaderName, HeaderValue};
use std::fmt;

/// HTTP verbs supported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }

    /// POST and PUT send a body; GET and DELETE never do.
    pub fn carries_body(&self) -> bool {
        matches!(self, Verb::Post | Verb::Put)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one logical request.
///
/// Query parameters and headers keep insertion order. The descriptor is only read by the
/// client; retries reuse it as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    verb: Verb,
    path: String,
    query: Vec<(String, String)>,
    body: Option<String>,
    headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(verb: Verb, path: impl Into<String>) -> Self {
        Self { verb, path: path.into(), query: Vec::new(), body: None, headers: Vec::new() }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Verb::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Verb::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Verb::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Verb::Delete, path)
    }

    /// Build a descriptor from an already encoded query string such as `id=123&name=pippo`.
    pub fn with_query_string(verb: Verb, path: impl Into<String>, query_string: &str) -> Self {
        let mut request = Self::new(verb, path);
        request.query = query::split_query_single(query_string);
        request
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append several query parameters in iteration order.
    pub fn query_pairs<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn header_list(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body_content(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Check the descriptor before anything is sent.
    pub fn validate(&self) -> Result<(), RestError> {
        if self.path.trim().is_empty() {
            return Err(RestError::InvalidRequest("path must not be empty".to_string()));
        }
        if self.body.is_some() && !self.verb.carries_body() {
            return Err(RestError::InvalidRequest(format!("{} requests cannot carry a body", self.verb)));
        }
        for (name, value) in &self.headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| RestError::InvalidRequest(format!("invalid header name `{}`", name)))?;
            HeaderValue::from_str(value).map_err(|_| {
                RestError::InvalidRequest(format!("invalid value for header `{}`", name))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_render_upper_case() {
        assert_eq!(Verb::Delete.to_string(), "DELETE");
        assert!(Verb::Put.carries_body());
        assert!(!Verb::Get.carries_body());
    }

    #[test]
    fn query_and_headers_keep_insertion_order() {
        let request = RequestDescriptor::get("items")
            .query("z", "1")
            .query("a", "2")
            .header("X-B", "b")
            .header("X-A", "a");
        assert_eq!(request.query_params()[0].0, "z");
        assert_eq!(request.query_params()[1].0, "a");
        assert_eq!(request.header_list()[0].0, "X-B");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn parses_encoded_query_string() {
        let request = RequestDescriptor::with_query_string(Verb::Get, "get", "id=123&name=pippo");
        assert_eq!(
            request.query_params(),
            &[("id".to_string(), "123".to_string()), ("name".to_string(), "pippo".to_string())]
        );
    }

    #[test]
    fn rejects_empty_path() {
        let err = RequestDescriptor::get("  ").validate().unwrap_err();
        assert!(matches!(err, RestError::InvalidRequest(_)));
    }

    #[test]
    fn rejects_body_on_get_and_delete() {
        assert!(RequestDescriptor::get("x").body("{}").validate().is_err());
        assert!(RequestDescriptor::delete("x").body("{}").validate().is_err());
        assert!(RequestDescriptor::put("x").body("{}").validate().is_ok());
    }

    #[test]
    fn rejects_bad_headers() {
        assert!(RequestDescriptor::get("x").header("bad header", "v").validate().is_err());
        assert!(RequestDescriptor::get("x").header("X-Ok", "line\nbreak").validate().is_err());
    }
}
