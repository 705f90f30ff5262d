//! # burrow
//!
//! A small HTTP framework: a segment-trie router, `next()`-style middleware
//! chains with timeout and panic isolation, and a service container.
//!
//! ## The pieces
//!
//! - **Routing**: one trie per HTTP method. Literal segments match
//!   case-insensitively; `:name` segments match anything and are captured as
//!   path parameters. Duplicate routes are rejected at registration.
//! - **Chains**: a route resolves to an ordered list of handlers. Each one
//!   receives the request [`Context`] and may await [`Context::next`] to run
//!   the rest, which is all middleware is.
//! - **Isolation**: the chain runs on its own task. A panic becomes a `500`;
//!   with a deadline set, a slow chain becomes a `504` and anything it writes
//!   afterwards is discarded.
//! - **Services**: a [`Container`] of named [`ServiceProvider`]s, built once
//!   (singleton) or on demand, reachable from every handler.
//!
//! Transport (TLS, body limits, HTTP/2 details) is hyper's business.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use burrow::{Context, HandlerResult, Router, Server, chain, middleware};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), burrow::Error> {
//!     let mut router = Router::new();
//!     router.middleware(middleware::recovery());
//!     router.middleware(middleware::cost());
//!
//!     router.get("/user/login", chain![middleware::timeout(Duration::from_secs(5)), login])?;
//!
//!     let mut subject = router.group("/subject");
//!     subject.get("/:id", get_subject)?;
//!
//!     Server::bind("0.0.0.0:8080").serve(router).await
//! }
//!
//! async fn login(ctx: Context) -> HandlerResult {
//!     ctx.set_ok_status().json("ok, login");
//!     Ok(())
//! }
//!
//! async fn get_subject(ctx: Context) -> HandlerResult {
//!     let id = ctx.param("id").unwrap_or_default().to_owned();
//!     ctx.json(&serde_json::json!({ "id": id }));
//!     Ok(())
//! }
//! ```

mod container;
mod context;
mod error;
mod group;
mod guard;
mod handler;
mod method;
mod provider;
mod request;
mod response;
mod router;
mod server;
mod trie;

pub mod middleware;

pub use container::{Container, Service};
pub use context::Context;
pub use error::{BoxError, Error};
pub use group::Group;
pub use handler::{Chain, Handler, HandlerResult, IntoChain};
pub use method::Method;
pub use provider::{NewInstance, Param, ServiceProvider};
pub use request::{Request, Values};
pub use response::{ContentType, Cookie, ResponseWriter};
pub use router::Router;
pub use server::Server;
