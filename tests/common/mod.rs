//! Shared helpers for the dispatch tests.

#![allow(dead_code)]

use std::sync::Arc;

use burrow::{Context, Error, Handler, Request, Router};
use bytes::Bytes;
use http::{HeaderMap, Method};
use http_body_util::BodyExt;
use parking_lot::Mutex;

pub type Log = Arc<Mutex<Vec<&'static str>>>;

pub fn request(method: Method, uri: &str) -> Request {
    Request::new(method, uri.parse().unwrap(), HeaderMap::new(), Bytes::new())
}

pub fn request_with_body(method: Method, uri: &str, content_type: &str, body: &'static str) -> Request {
    let mut headers = HeaderMap::new();
    headers.insert(http::header::CONTENT_TYPE, content_type.parse().unwrap());
    Request::new(method, uri.parse().unwrap(), headers, body)
}

/// Sends `method uri` through `router`; returns status and body text.
pub async fn send(router: &Router, method: Method, uri: &str) -> (u16, String) {
    call(router, request(method, uri)).await
}

pub async fn call(router: &Router, request: Request) -> (u16, String) {
    let response = router.handle(request).await;
    let status = response.status().as_u16();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

/// A middleware that records `name` and continues the chain.
pub fn record(log: &Log, name: &'static str) -> impl Handler {
    let log = Arc::clone(log);
    move |ctx: Context| {
        let log = Arc::clone(&log);
        async move {
            log.lock().push(name);
            ctx.next().await
        }
    }
}

/// An endpoint that records `name` and answers with it as text.
pub fn endpoint(log: &Log, name: &'static str) -> impl Handler {
    let log = Arc::clone(log);
    move |ctx: Context| {
        let log = Arc::clone(&log);
        async move {
            log.lock().push(name);
            ctx.text(name);
            Ok::<(), Error>(())
        }
    }
}

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<&'static str> {
    log.lock().clone()
}
