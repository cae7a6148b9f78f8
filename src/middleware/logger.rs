use tracing::{info, Span};

use crate::web::{remote_addr, BoxFuture, Context, HandlerResult, Middleware, Next, Params, Request};

/// Writes one line per request once the rest of the pipeline has finished:
/// trace id, recorded status, method, path, peer and elapsed time.
pub struct Logger {
    log: Span,
}

impl Logger {
    pub fn new(log: Span) -> Self {
        Self { log }
    }
}

impl Middleware for Logger {
    fn name(&self) -> &'static str {
        "logger"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
        params: Params,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let remote = remote_addr(&req);

        Box::pin(async move {
            let result = next.run(ctx, req, params).await;

            let status = ctx.status().map(|status| status.as_u16()).unwrap_or_default();
            self.log.in_scope(|| {
                info!(
                    trace_id = %ctx.trace_id(),
                    status,
                    method = %method,
                    path = %path,
                    remote_addr = %remote,
                    elapsed = ?ctx.elapsed(),
                    "request completed"
                );
            });

            result
        })
    }
}
