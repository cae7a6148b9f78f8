use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;

use anyhow::anyhow;
use futures::FutureExt;

use crate::error::Error;
use crate::web::{BoxFuture, Context, HandlerResult, Middleware, Next, Params, Request};

/// Fault boundary nearest the handler. A panic anywhere below it becomes an
/// internal error carrying the panic message and a backtrace for the log.
pub struct Panics;

impl Middleware for Panics {
    fn name(&self) -> &'static str {
        "panics"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
        params: Params,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            // Stages below may panic while building their future, not only while polling it.
            let below = async move { next.run(ctx, req, params).await };
            match AssertUnwindSafe(below).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(Error::Internal(anyhow!(
                    "panic: {}\n{}",
                    panic_message(payload.as_ref()),
                    Backtrace::force_capture()
                ))),
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
