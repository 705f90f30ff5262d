//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Uri};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::error::Error;

/// Multi-valued query or form fields, in the order they appeared.
pub type Values = HashMap<String, Vec<String>>;

/// An incoming HTTP request with its body fully read.
pub struct Request {
    method: http::Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    pub fn new(method: http::Method, uri: Uri, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self { method, uri, headers, body: body.into() }
    }

    pub(crate) async fn from_hyper(req: hyper::Request<Incoming>) -> Result<Self, Error> {
        let (parts, body) = req.into_parts();
        let body = body.collect().await?.to_bytes();
        Ok(Self::new(parts.method, parts.uri, parts.headers, body))
    }

    pub fn method(&self) -> &http::Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    // ── Query string ──────────────────────────────────────────────────────────

    pub fn query_all(&self) -> Values {
        parse_values(self.uri.query().unwrap_or_default().as_bytes())
    }

    /// Last value of `key`, or `default`.
    pub fn query_string(&self, key: &str, default: &str) -> String {
        last(&self.query_all(), key).map_or_else(|| default.to_owned(), str::to_owned)
    }

    /// Last value of `key` parsed as an integer, or `default` if absent or
    /// not a number.
    pub fn query_int(&self, key: &str, default: i64) -> i64 {
        last(&self.query_all(), key).and_then(|v| v.parse().ok()).unwrap_or(default)
    }

    pub fn query_array(&self, key: &str, default: Vec<String>) -> Vec<String> {
        self.query_all().remove(key).unwrap_or(default)
    }

    // ── Urlencoded form body ──────────────────────────────────────────────────

    /// Fields of an `application/x-www-form-urlencoded` body. Empty for any
    /// other content type.
    pub fn form_all(&self) -> Values {
        let is_form = self
            .header(CONTENT_TYPE.as_str())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
        if is_form { parse_values(&self.body) } else { Values::new() }
    }

    pub fn form_string(&self, key: &str, default: &str) -> String {
        last(&self.form_all(), key).map_or_else(|| default.to_owned(), str::to_owned)
    }

    pub fn form_int(&self, key: &str, default: i64) -> i64 {
        last(&self.form_all(), key).and_then(|v| v.parse().ok()).unwrap_or(default)
    }

    pub fn form_array(&self, key: &str, default: Vec<String>) -> Vec<String> {
        self.form_all().remove(key).unwrap_or(default)
    }

    /// Deserializes the body as JSON. The body stays available for later
    /// reads.
    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

impl Context {
    /// Shorthand for `ctx.request().bind_json()`.
    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        self.request().bind_json()
    }
}

fn parse_values(input: &[u8]) -> Values {
    let mut values = Values::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        values.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    values
}

fn last<'a>(values: &'a Values, key: &str) -> Option<&'a str> {
    values.get(key)?.last().map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn request(uri: &str, content_type: Option<&str>, body: &'static str) -> Request {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(CONTENT_TYPE, ct.parse().unwrap());
        }
        Request::new(http::Method::POST, uri.parse().unwrap(), headers, body)
    }

    #[test]
    fn query_accessors() {
        let req = request("/list?page=2&tag=a&tag=b&name=x%20y&bad=abc", None, "");
        assert_eq!(req.query_int("page", 1), 2);
        assert_eq!(req.query_int("bad", 7), 7);
        assert_eq!(req.query_int("missing", 3), 3);
        assert_eq!(req.query_string("tag", ""), "b");
        assert_eq!(req.query_string("name", ""), "x y");
        assert_eq!(req.query_array("tag", Vec::new()), vec!["a", "b"]);
        assert_eq!(req.query_array("none", vec!["d".to_owned()]), vec!["d"]);
    }

    #[test]
    fn form_requires_urlencoded_content_type() {
        let form = request("/", Some("application/x-www-form-urlencoded"), "user=ann&age=31");
        assert_eq!(form.form_string("user", ""), "ann");
        assert_eq!(form.form_int("age", 0), 31);

        let not_form = request("/", Some("text/plain"), "user=ann");
        assert!(not_form.form_all().is_empty());
        assert_eq!(not_form.form_string("user", "nobody"), "nobody");
    }

    #[test]
    fn bind_json_reads_the_body() {
        #[derive(Deserialize)]
        struct Login {
            user: String,
        }

        let req = request("/", Some("application/json"), r#"{"user":"ann"}"#);
        let login: Login = req.bind_json().unwrap();
        assert_eq!(login.user, "ann");
        assert!(matches!(request("/", None, "nope").bind_json::<Login>(), Err(Error::Json(_))));
    }
}
