//! Per-request context.
//!
//! A [`Context`] is created for every inbound request and dropped once the
//! response has been handed back to the transport. It is a cheap handle
//! (`Arc` inside): every handler in the chain gets its own clone, and so does
//! the task that runs the chain under a timeout.
//!
//! Request data, path parameters and the handler list are fixed when the
//! context is built. The only state that changes during dispatch is the
//! chain cursor and the response writer; the writer sits behind a mutex so a
//! handler that outlived its deadline can never interleave its output with
//! the timeout response.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::container::{Container, Service};
use crate::handler::{BoxedHandler, HandlerResult};
use crate::request::Request;
use crate::response::ResponseWriter;

/// The state of one request as it moves through its handler chain.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    request: Request,
    params: HashMap<String, String>,
    handlers: Arc<[BoxedHandler]>,
    /// Number of handlers entered so far. Starts "before" the first one.
    cursor: AtomicUsize,
    writer: Mutex<ResponseWriter>,
    container: Container,
}

impl Context {
    pub(crate) fn new(
        request: Request,
        handlers: Arc<[BoxedHandler]>,
        params: HashMap<String, String>,
        container: Container,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                request,
                params,
                handlers,
                cursor: AtomicUsize::new(0),
                writer: Mutex::new(ResponseWriter::new()),
                container,
            }),
        }
    }

    pub fn request(&self) -> &Request {
        &self.inner.request
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `ctx.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.inner.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.inner.params
    }

    pub fn container(&self) -> &Container {
        &self.inner.container
    }

    /// Resolves a service, see [`Container::must_make`].
    ///
    /// # Panics
    ///
    /// Panics if the service cannot be made. Inside a handler the panic is
    /// caught by the dispatch boundary and answered with a `500`.
    pub fn must_make(&self, name: &str) -> Service {
        self.inner.container.must_make(name)
    }

    /// Runs the next handler in the chain and waits for it.
    ///
    /// Advances the cursor by one; if it still points inside the chain the
    /// handler there is invoked, and that handler may in turn call `next`.
    /// Past the end of the chain this is a no-op. A middleware that never
    /// calls `next` stops everything downstream of it.
    pub async fn next(&self) -> HandlerResult {
        let index = self.inner.cursor.fetch_add(1, Ordering::SeqCst);
        let Some(handler) = self.inner.handlers.get(index).cloned() else {
            return Ok(());
        };
        handler.call(self.clone()).await
    }

    /// Whether a timeout response has already been sent for this request.
    pub fn is_timed_out(&self) -> bool {
        self.inner.writer.lock().is_timed_out()
    }

    /// Runs `f` against the locked response writer.
    ///
    /// Returns `None` without calling `f` once the response is closed, i.e.
    /// after a timeout response was written or the response was handed to
    /// the transport. Use this when several writes must land together.
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut ResponseWriter) -> R) -> Option<R> {
        let mut writer = self.inner.writer.lock();
        if writer.is_closed() {
            return None;
        }
        Some(f(&mut writer))
    }

    /// Closes the writer and hands back whatever was written.
    pub(crate) fn finish(&self) -> http::Response<http_body_util::Full<bytes::Bytes>> {
        self.inner.writer.lock().finish()
    }
}
