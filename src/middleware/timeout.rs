//! Per-route deadlines.

use std::time::Duration;

use crate::context::Context;
use crate::guard;
use crate::handler::Handler;

/// Gives the rest of the chain `duration` to finish.
///
/// On expiry the client gets `504` with `{"error":"request timeout"}` right
/// away. The late handler keeps running in the background; whatever it
/// writes afterwards is discarded, which it can detect through
/// [`Context::is_timed_out`]. A panic downstream is answered like
/// [`recovery`](super::recovery) does.
pub fn timeout(duration: Duration) -> impl Handler {
    move |ctx: Context| async move {
        let outcome = guard::run(ctx.clone(), Some(duration)).await;
        guard::settle(&ctx, outcome)
    }
}
