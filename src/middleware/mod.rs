//! Built-in middleware.
//!
//! Middleware is an ordinary [`Handler`](crate::Handler) that awaits
//! [`Context::next`](crate::Context::next) somewhere in its body. Register it
//! globally with [`Router::middleware`](crate::Router::middleware), per group
//! with [`Group::middleware`](crate::Group::middleware), or in front of a
//! single route with [`chain!`](crate::chain).
//!
//! The usual global order is recovery outermost, then cost:
//!
//! ```rust,ignore
//! router.middleware(middleware::recovery());
//! router.middleware(middleware::cost());
//! ```

mod cost;
mod recovery;
mod timeout;

pub use cost::cost;
pub use recovery::recovery;
pub use timeout::timeout;
