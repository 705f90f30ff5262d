//! Panic recovery.

use crate::context::Context;
use crate::guard;
use crate::handler::Handler;

/// Runs the rest of the chain on its own task and answers a panic in it
/// with `500` and a JSON body carrying the panic message.
///
/// Errors returned by downstream handlers pass through unchanged.
pub fn recovery() -> impl Handler {
    |ctx: Context| async move {
        let outcome = guard::run(ctx.clone(), None).await;
        guard::settle(&ctx, outcome)
    }
}
