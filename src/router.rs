//! Trie-based request router and dispatch entry point.
//!
//! One segment trie per HTTP method. Routes are registered at startup, before
//! the router is handed to [`Server::serve`](crate::Server::serve); after that
//! the tries are only read, so matching needs no lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use tracing::{debug, warn};

use crate::container::Container;
use crate::context::Context;
use crate::error::Error;
use crate::group::{Group, GroupEntry, GroupId};
use crate::guard;
use crate::handler::{BoxedHandler, Chain, IntoChain};
use crate::method::Method;
use crate::request::Request;
use crate::trie::Trie;

/// The application router.
///
/// ```rust,ignore
/// let mut router = Router::new();
/// router.middleware(middleware::recovery());
/// router.get("/user/login", user_login)?;
///
/// let mut subject = router.group("/subject");
/// subject.get("/:id", get_subject)?;
/// subject.delete("/:id", delete_subject)?;
/// ```
pub struct Router {
    trees: HashMap<Method, Trie<Arc<[BoxedHandler]>>>,
    middleware: Vec<BoxedHandler>,
    pub(crate) groups: Vec<GroupEntry>,
    container: Container,
    timeout: Option<Duration>,
}

/// The handlers and path parameters a request resolved to.
pub(crate) struct RouteMatch {
    pub(crate) handlers: Arc<[BoxedHandler]>,
    pub(crate) params: HashMap<String, String>,
}

impl Router {
    pub fn new() -> Self {
        Self::with_container(Container::new())
    }

    /// A router whose handlers resolve services from `container`.
    pub fn with_container(container: Container) -> Self {
        let trees = [Method::Get, Method::Post, Method::Put, Method::Delete]
            .into_iter()
            .map(|method| (method, Trie::new()))
            .collect();
        Self { trees, middleware: Vec::new(), groups: Vec::new(), container, timeout: None }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Runs every chain under a deadline; late requests get a `504`.
    pub fn timeout(&mut self, duration: Duration) -> &mut Self {
        self.timeout = Some(duration);
        self
    }

    /// Adds global middleware. It is placed in front of the handlers of every
    /// route registered *after* this call.
    pub fn middleware(&mut self, handlers: impl IntoChain) -> &mut Self {
        self.middleware.extend(handlers.into_chain().handlers().iter().cloned());
        self
    }

    pub fn get(&mut self, path: &str, handlers: impl IntoChain) -> Result<&mut Self, Error> {
        self.route(Method::Get, path, handlers)
    }

    pub fn post(&mut self, path: &str, handlers: impl IntoChain) -> Result<&mut Self, Error> {
        self.route(Method::Post, path, handlers)
    }

    pub fn put(&mut self, path: &str, handlers: impl IntoChain) -> Result<&mut Self, Error> {
        self.route(Method::Put, path, handlers)
    }

    pub fn delete(&mut self, path: &str, handlers: impl IntoChain) -> Result<&mut Self, Error> {
        self.route(Method::Delete, path, handlers)
    }

    /// Registers `handlers` for `method` + `path`, behind the global
    /// middleware.
    ///
    /// Fails with [`Error::RouteExists`](crate::Error::RouteExists) if a
    /// registered route would match the same requests; the existing route is
    /// kept.
    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        handlers: impl IntoChain,
    ) -> Result<&mut Self, Error> {
        let chain = handlers.into_chain().prepend(&self.middleware);
        let len = chain.len();
        self.trees.entry(method).or_default().insert(path, chain.into_shared())?;
        debug!(%method, path, handlers = len, "route registered");
        Ok(self)
    }

    /// Opens a route group under `prefix`.
    pub fn group(&mut self, prefix: &str) -> Group<'_> {
        let id = self.push_group(prefix, None);
        Group::new(self, id)
    }

    pub(crate) fn push_group(&mut self, prefix: &str, parent: Option<GroupId>) -> GroupId {
        self.groups.push(GroupEntry::new(prefix, parent));
        self.groups.len() - 1
    }

    /// Matches `method` + `path`, both case-insensitively.
    pub(crate) fn find(&self, method: &str, path: &str) -> Option<RouteMatch> {
        let method: Method = method.parse().ok()?;
        let tree = self.trees.get(&method)?;
        let node = tree.lookup(path)?;
        Some(RouteMatch {
            handlers: Arc::clone(tree.value(node)?),
            params: tree.params(node, path),
        })
    }

    /// Routes one request through its chain and returns the response.
    ///
    /// Never fails: a miss is a `404`, a handler error a `500`, a panic a
    /// `500` and an expired [`timeout`](Self::timeout) a `504`.
    pub async fn handle(&self, request: Request) -> http::Response<Full<Bytes>> {
        let found = self.find(request.method().as_str(), request.path());
        let Some(RouteMatch { handlers, params }) = found else {
            debug!(method = %request.method(), path = request.path(), "no route");
            let ctx = Context::new(request, Arc::from(Vec::new()), HashMap::new(), self.container.clone());
            ctx.set_status(StatusCode::NOT_FOUND).json("not found");
            return ctx.finish();
        };

        let ctx = Context::new(request, handlers, params, self.container.clone());
        let outcome = guard::run(ctx.clone(), self.timeout).await;
        if let Err(e) = guard::settle(&ctx, outcome) {
            warn!(path = ctx.request().path(), error = %e, "handler failed");
            ctx.abort(StatusCode::INTERNAL_SERVER_ERROR, &serde_json::Value::from("inner error"));
        }
        ctx.finish()
    }

    pub(crate) fn chain_for_group(&self, id: GroupId, handlers: Chain) -> Chain {
        let mut lineage = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            lineage.push(&self.groups[id]);
            current = self.groups[id].parent;
        }

        let mut middleware = Vec::new();
        for entry in lineage.iter().rev() {
            middleware.extend(entry.middleware.iter().cloned());
        }
        handlers.prepend(&middleware)
    }

    pub(crate) fn prefix_for_group(&self, id: GroupId) -> String {
        let mut prefixes = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            prefixes.push(self.groups[id].prefix.as_str());
            current = self.groups[id].parent;
        }
        prefixes.into_iter().rev().collect()
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
