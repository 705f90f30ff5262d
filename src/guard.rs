//! Panic and deadline isolation for the rest of a handler chain.
//!
//! The remainder of the chain runs as its own tokio task while the caller
//! waits for whichever comes first:
//!
//! 1. the task finishes, with the chain's `Ok`/`Err`;
//! 2. the task panics, which tokio reports through the `JoinError`;
//! 3. the deadline, if any, expires.
//!
//! On a deadline the task is *not* aborted: dropping its `JoinHandle` only
//! detaches it. It keeps running until it finishes on its own, and every
//! write it attempts after the timeout response is dropped by the closed
//! response writer.

use std::any::Any;
use std::time::Duration;

use http::StatusCode;
use serde_json::json;
use tracing::{error, warn};

use crate::context::Context;
use crate::handler::HandlerResult;

pub(crate) enum Outcome {
    Completed(HandlerResult),
    Panicked(String),
    TimedOut,
}

/// Runs `ctx.next()` on a separate task and reports how it ended.
pub(crate) async fn run(ctx: Context, deadline: Option<Duration>) -> Outcome {
    let mut task = tokio::spawn(async move { ctx.next().await });

    let joined = match deadline {
        Some(deadline) => tokio::select! {
            joined = &mut task => joined,
            () = tokio::time::sleep(deadline) => return Outcome::TimedOut,
        },
        None => task.await,
    };

    match joined {
        Ok(result) => Outcome::Completed(result),
        Err(e) if e.is_panic() => Outcome::Panicked(panic_message(e.into_panic())),
        Err(e) => Outcome::Panicked(e.to_string()),
    }
}

/// Turns a panic or timeout into the matching response. A completed chain's
/// result is passed through untouched.
pub(crate) fn settle(ctx: &Context, outcome: Outcome) -> HandlerResult {
    match outcome {
        Outcome::Completed(result) => result,
        Outcome::Panicked(detail) => {
            error!(path = ctx.request().path(), %detail, "handler panicked");
            ctx.abort(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({ "error": "internal server error", "detail": detail }),
            );
            Ok(())
        }
        Outcome::TimedOut => {
            warn!(path = ctx.request().path(), "request timed out");
            ctx.time_out(StatusCode::GATEWAY_TIMEOUT, &json!({ "error": "request timeout" }));
            Ok(())
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_owned(),
            Err(_) => "unknown panic".to_owned(),
        },
    }
}
