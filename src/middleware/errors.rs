use tracing::{error, Span};

use crate::web::{BoxFuture, Context, HandlerResult, Middleware, Next, Params, Request};

/// Turns a classified error into its response and records the status for the
/// logger. Shutdown errors are still recorded but passed upward so the
/// application can start shutting down.
pub struct Errors {
    log: Span,
}

impl Errors {
    pub fn new(log: Span) -> Self {
        Self { log }
    }
}

impl Middleware for Errors {
    fn name(&self) -> &'static str {
        "errors"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
        params: Params,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            match next.run(ctx, req, params).await {
                Ok(response) => {
                    ctx.set_status(response.status());
                    Ok(response)
                }
                Err(err) => {
                    self.log.in_scope(|| {
                        error!(trace_id = %ctx.trace_id(), status = err.status_code().as_u16(), "ERROR : {err:?}");
                    });

                    ctx.set_status(err.status_code());
                    if err.is_shutdown() {
                        return Err(err);
                    }
                    Ok(axum::response::IntoResponse::into_response(err))
                }
            }
        })
    }
}
