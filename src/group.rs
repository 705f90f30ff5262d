//! Route groups: a shared path prefix and shared middleware.
//!
//! Groups are stored in an arena on the [`Router`] and point at their parent
//! by index, so a chain of nested groups can only ever go up towards a
//! top-level group. A [`Group`] is just a borrow of the router plus the
//! index of its entry; nothing is resolved until a route is registered.

use crate::error::Error;
use crate::handler::{BoxedHandler, IntoChain};
use crate::method::Method;
use crate::router::Router;

pub(crate) type GroupId = usize;

pub(crate) struct GroupEntry {
    pub(crate) prefix: String,
    pub(crate) parent: Option<GroupId>,
    pub(crate) middleware: Vec<BoxedHandler>,
}

impl GroupEntry {
    pub(crate) fn new(prefix: &str, parent: Option<GroupId>) -> Self {
        Self { prefix: prefix.to_owned(), parent, middleware: Vec::new() }
    }
}

/// A set of routes sharing a prefix and middleware.
///
/// Routes registered through a group get, in order: the router's global
/// middleware, the middleware of every enclosing group (outermost first),
/// this group's middleware, then their own handlers.
///
/// ```rust,ignore
/// let mut subject = router.group("/subject");
/// subject.get("/:id", get_subject)?;
///
/// let mut info = subject.group("/info");
/// info.middleware(require_login);
/// info.get("/name", subject_name)?;     // GET /subject/info/name
/// ```
pub struct Group<'r> {
    router: &'r mut Router,
    id: GroupId,
}

impl<'r> Group<'r> {
    pub(crate) fn new(router: &'r mut Router, id: GroupId) -> Self {
        Self { router, id }
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

    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        handlers: impl IntoChain,
    ) -> Result<&mut Self, Error> {
        let full_path = format!("{}{}", self.router.prefix_for_group(self.id), path);
        let chain = self.router.chain_for_group(self.id, handlers.into_chain());
        self.router.route(method, &full_path, chain)?;
        Ok(self)
    }

    /// Opens a nested group whose prefix and middleware stack on this one.
    pub fn group(&mut self, prefix: &str) -> Group<'_> {
        let id = self.router.push_group(prefix, Some(self.id));
        Group::new(self.router, id)
    }

    /// Adds middleware for routes registered on this group (and its nested
    /// groups) from now on. Repeated calls keep their order.
    pub fn middleware(&mut self, handlers: impl IntoChain) -> &mut Self {
        let chain = handlers.into_chain();
        self.router.groups[self.id].middleware.extend(chain.handlers().iter().cloned());
        self
    }
}
