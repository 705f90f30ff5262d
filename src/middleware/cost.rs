//! Request latency logging.

use std::time::Instant;

use tracing::info;

use crate::context::Context;
use crate::handler::Handler;

/// Logs the request URI and how long the rest of the chain took.
pub fn cost() -> impl Handler {
    |ctx: Context| async move {
        let start = Instant::now();
        let result = ctx.next().await;
        info!(uri = %ctx.request().uri(), elapsed = ?start.elapsed(), "request cost");
        result
    }
}
