//! Response writing.
//!
//! Handlers do not return a response; they write one through their
//! [`Context`]. Every write takes the context's writer lock and is silently
//! dropped once the response is closed (a timeout response went out, or the
//! response was already handed to the transport). That is what keeps a
//! handler that outlived its deadline from corrupting the reply.
//!
//! ```rust,ignore
//! async fn get_subject(ctx: Context) -> HandlerResult {
//!     let id = ctx.param("id").unwrap_or_default().to_owned();
//!     ctx.set_ok_status()
//!         .set_header("cache-control", "no-store")
//!         .json(&serde_json::json!({ "id": id }));
//!     Ok(())
//! }
//! ```

use std::fmt::Write as _;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use tracing::warn;

use crate::context::Context;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content-type values used by the response helpers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Html,         // text/html; charset=utf-8
    Javascript,   // application/javascript  (JSONP)
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html        => "text/html; charset=utf-8",
            Self::Javascript  => "application/javascript",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── ResponseWriter ────────────────────────────────────────────────────────────

/// The buffered response of one request.
///
/// Reachable only through [`Context::with_writer`], which holds the
/// context's lock for the duration of the closure.
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    timed_out: bool,
    aborted: bool,
    finished: bool,
}

impl ResponseWriter {
    pub(crate) fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            timed_out: false,
            aborted: false,
            finished: false,
        }
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn set_status(&mut self, status: StatusCode) { self.status = status; }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Appends to the body.
    pub fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    pub fn set_content_type(&mut self, content_type: ContentType) {
        self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
    }

    /// Drops everything written so far and returns to a blank `200`.
    pub fn reset(&mut self) {
        self.status = StatusCode::OK;
        self.headers.clear();
        self.body.clear();
    }

    pub(crate) fn is_timed_out(&self) -> bool {
        self.timed_out
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.timed_out || self.aborted || self.finished
    }

    /// Replaces the status and body with `status` and a JSON `body`. Headers
    /// other than the content type are kept.
    fn replace(&mut self, status: StatusCode, body: &serde_json::Value) {
        self.status = status;
        self.set_content_type(ContentType::Json);
        self.body = body.to_string().into_bytes();
    }

    pub(crate) fn finish(&mut self) -> http::Response<Full<Bytes>> {
        self.finished = true;
        let mut response = http::Response::new(Full::new(Bytes::from(std::mem::take(&mut self.body))));
        *response.status_mut() = self.status;
        *response.headers_mut() = std::mem::take(&mut self.headers);
        response
    }
}

// ── Cookie ────────────────────────────────────────────────────────────────────

/// A `Set-Cookie` value. The path defaults to `/`.
#[derive(Clone, Debug)]
pub struct Cookie {
    name: String,
    value: String,
    path: String,
    domain: Option<String>,
    max_age: Option<i64>,
    secure: bool,
    http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_owned(),
            domain: None,
            max_age: None,
            secure: false,
            http_only: false,
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Lifetime in seconds. Zero or negative asks the client to delete it.
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds.max(0));
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    fn header_value(&self) -> String {
        let mut out = format!("{}={}; Path={}", self.name, self.value, self.path);
        if let Some(domain) = &self.domain {
            let _ = write!(out, "; Domain={domain}");
        }
        if let Some(max_age) = self.max_age {
            let _ = write!(out, "; Max-Age={max_age}");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out
    }
}

// ── Context response surface ──────────────────────────────────────────────────

impl Context {
    pub fn set_status(&self, status: StatusCode) -> &Self {
        self.with_writer(|w| w.set_status(status));
        self
    }

    pub fn set_ok_status(&self) -> &Self {
        self.set_status(StatusCode::OK)
    }

    /// Appends a header. Names or values that are not valid HTTP are logged
    /// and skipped.
    pub fn set_header(&self, name: &str, value: &str) -> &Self {
        let parsed = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value));
        match parsed {
            (Ok(name), Ok(value)) => {
                self.with_writer(|w| w.headers_mut().append(name, value));
            }
            _ => warn!(header = name, "dropping invalid response header"),
        }
        self
    }

    pub fn set_cookie(&self, cookie: &Cookie) -> &Self {
        match HeaderValue::from_str(&cookie.header_value()) {
            Ok(value) => {
                self.with_writer(|w| w.headers_mut().append(SET_COOKIE, value));
            }
            Err(_) => warn!(cookie = %cookie.name, "dropping invalid cookie"),
        }
        self
    }

    /// `301 Moved Permanently` to `location`.
    pub fn redirect(&self, location: &str) -> &Self {
        let Ok(value) = HeaderValue::from_str(location) else {
            warn!(location, "dropping redirect to invalid location");
            return self;
        };
        self.with_writer(|w| {
            w.set_status(StatusCode::MOVED_PERMANENTLY);
            w.headers_mut().insert(LOCATION, value);
        });
        self
    }

    /// Serializes `value` as the JSON body. A value that fails to serialize
    /// turns the response into a `500`.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> &Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body(ContentType::Json, &bytes),
            Err(e) => {
                warn!(error = %e, "response serialization failed");
                self.set_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// JSONP: `callback(<json>)`, where the callback name comes from the
    /// `callback` query parameter (default `callback_func`) and is escaped
    /// for JavaScript.
    pub fn jsonp<T: Serialize + ?Sized>(&self, value: &T) -> &Self {
        let callback = self.request().query_string("callback", "callback_func");
        let json = match serde_json::to_vec(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "response serialization failed");
                return self.set_status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };
        self.with_writer(|w| {
            w.set_content_type(ContentType::Javascript);
            w.write(js_escape(&callback).as_bytes());
            w.write(b"(");
            w.write(&json);
            w.write(b")");
        });
        self
    }

    /// Pre-rendered XML body.
    pub fn xml(&self, body: impl AsRef<[u8]>) -> &Self {
        self.body(ContentType::Xml, body.as_ref())
    }

    /// Pre-rendered HTML body.
    pub fn html(&self, body: impl AsRef<[u8]>) -> &Self {
        self.body(ContentType::Html, body.as_ref())
    }

    pub fn text(&self, body: impl AsRef<str>) -> &Self {
        self.body(ContentType::Text, body.as_ref().as_bytes())
    }

    /// Sets the content type and appends `bytes` to the body.
    pub fn body(&self, content_type: ContentType, bytes: &[u8]) -> &Self {
        self.with_writer(|w| {
            w.set_content_type(content_type);
            w.write(bytes);
        });
        self
    }

    /// Replaces whatever was written with a JSON error response and closes
    /// the writer in the same critical section.
    pub(crate) fn abort(&self, status: StatusCode, body: &serde_json::Value) {
        self.with_writer(|w| {
            w.replace(status, body);
            w.aborted = true;
        });
    }

    /// Writes the timeout response and closes the writer in the same
    /// critical section, so nothing written later can reach the client.
    pub(crate) fn time_out(&self, status: StatusCode, body: &serde_json::Value) {
        self.with_writer(|w| {
            w.replace(status, body);
            w.timed_out = true;
        });
    }
}

/// Escapes a string for safe embedding in JavaScript source.
fn js_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '<' => out.push_str("\\u003C"),
            '>' => out.push_str("\\u003E"),
            '&' => out.push_str("\\u0026"),
            '=' => out.push_str("\\u003D"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_everything_written() {
        let mut writer = ResponseWriter::new();
        writer.set_status(StatusCode::CREATED);
        writer.set_content_type(ContentType::Text);
        writer.write(b"partial");

        writer.reset();
        assert_eq!(writer.status(), StatusCode::OK);
        assert!(writer.headers().is_empty());
        assert!(writer.body().is_empty());
    }

    #[test]
    fn finish_closes_the_writer() {
        let mut writer = ResponseWriter::new();
        writer.set_status(StatusCode::ACCEPTED);
        writer.write(b"done");

        let response = writer.finish();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(writer.is_closed());
        assert!(!writer.is_timed_out());
    }

    #[test]
    fn replace_keeps_headers_but_not_the_body() {
        let mut writer = ResponseWriter::new();
        writer.headers_mut().insert("x-request-id", HeaderValue::from_static("abc"));
        writer.set_content_type(ContentType::Text);
        writer.write(b"partial");

        writer.replace(StatusCode::GATEWAY_TIMEOUT, &serde_json::json!({ "error": "request timeout" }));
        assert_eq!(writer.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(writer.headers()["x-request-id"], "abc");
        assert_eq!(writer.headers()[CONTENT_TYPE], ContentType::Json.as_str());
        assert_eq!(writer.body(), br#"{"error":"request timeout"}"#);
    }

    #[test]
    fn cookie_header_value() {
        let cookie = Cookie::new("session", "abc")
            .domain("example.com")
            .max_age(60)
            .http_only(true)
            .secure(true);
        assert_eq!(
            cookie.header_value(),
            "session=abc; Path=/; Domain=example.com; Max-Age=60; HttpOnly; Secure"
        );
        assert_eq!(Cookie::new("gone", "").max_age(-1).header_value(), "gone=; Path=/; Max-Age=0");
    }

    #[test]
    fn js_escape_neutralises_markup() {
        assert_eq!(js_escape("cb"), "cb");
        assert_eq!(js_escape("a<b>'\"&="), "a\\u003Cb\\u003E\\'\\\"\\u0026\\u003D");
        assert_eq!(js_escape("x\ny"), "x\\u000Ay");
    }
}
