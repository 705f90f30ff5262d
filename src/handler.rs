//! Handler trait, type erasure and handler chains.
//!
//! # How handlers are stored
//!
//! A route owns an ordered list of handlers of *different* concrete types
//! (middleware closures, `async fn` controllers). They are erased behind
//! `dyn ErasedHandler` so the list can be a single `Vec`:
//!
//! ```text
//! async fn login(ctx: Context) -> HandlerResult { … }   ← user writes this
//!        ↓ router.get("/user/login", login)
//! login.into_boxed_handler()                            ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(login))                            ← stored in a Chain
//!        ↓  at request time, from Context::next()
//! handler.call(ctx.clone())                             ← one vtable dispatch
//! ```
//!
//! Each handler receives its own clone of the [`Context`] handle. A handler
//! that awaits [`Context::next`] runs the rest of the chain inside its own
//! body, which is how middleware wraps downstream handlers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;

/// What every handler resolves to. An `Err` propagates up through the
/// middleware that awaited [`Context::next`] and ends as a `500`.
pub type HandlerResult = Result<(), Error>;

/// A heap-allocated, type-erased handler future.
///
/// `'static` so the chain can be moved onto its own task by the timeout and
/// recovery boundaries.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` because it appears in the return type of the public
/// `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, ctx: Context) -> BoxFuture;
}

/// A type-erased handler shared by every request that hits its route.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid handler.
///
/// Satisfied automatically by any function or closure of the shape
///
/// ```text
/// async fn name(ctx: Context) -> HandlerResult
/// ```
///
/// The trait is sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut> private::Sealed for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
}

impl<F, Fut> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut> ErasedHandler for FnHandler<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: Context) -> BoxFuture {
        Box::pin((self.0)(ctx))
    }
}

// ── Chains ────────────────────────────────────────────────────────────────────

/// An ordered list of handlers, run first to last through [`Context::next`].
///
/// Build one with [`chain!`](crate::chain) or [`Chain::then`]:
///
/// ```rust,ignore
/// use std::time::Duration;
/// use burrow::{chain, middleware};
///
/// router.get("/user/login", chain![middleware::timeout(Duration::from_secs(5)), login])?;
/// ```
#[derive(Clone, Default)]
pub struct Chain {
    handlers: Vec<BoxedHandler>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler. Returns `self` for chaining.
    pub fn then(mut self, handler: impl Handler) -> Self {
        self.handlers.push(handler.into_boxed_handler());
        self
    }

    pub fn len(&self) -> usize { self.handlers.len() }
    pub fn is_empty(&self) -> bool { self.handlers.is_empty() }

    /// Appends every handler of `other`, keeping its order.
    pub fn append(&mut self, other: Chain) {
        self.handlers.extend(other.handlers);
    }

    pub(crate) fn handlers(&self) -> &[BoxedHandler] {
        &self.handlers
    }

    /// `prefix` first, then `self`.
    pub(crate) fn prepend(self, prefix: &[BoxedHandler]) -> Self {
        let mut handlers = Vec::with_capacity(prefix.len() + self.handlers.len());
        handlers.extend(prefix.iter().cloned());
        handlers.extend(self.handlers);
        Self { handlers }
    }

    pub(crate) fn into_shared(self) -> Arc<[BoxedHandler]> {
        self.handlers.into()
    }
}

/// Anything that can be registered on a route: a single handler or a
/// whole [`Chain`].
pub trait IntoChain {
    fn into_chain(self) -> Chain;
}

impl IntoChain for Chain {
    fn into_chain(self) -> Chain { self }
}

impl<H: Handler> IntoChain for H {
    fn into_chain(self) -> Chain {
        Chain::new().then(self)
    }
}

/// Builds a [`Chain`] from a list of handlers, in order.
#[macro_export]
macro_rules! chain {
    ($($handler:expr),* $(,)?) => {
        $crate::Chain::new()$(.then($handler))*
    };
}
