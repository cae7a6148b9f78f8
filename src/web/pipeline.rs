//! Handler and middleware contracts, and the ordered pipeline that joins them.
//!
//! A route is a flat list of middleware stages followed by a handler. Stages run
//! in list order: the first stage sees the request first and the response last.
//! The ordering is data, so it can be inspected with [`Route::stage_names`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::{Context, Params, Request, Response};
use crate::error::Error;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of a handler or middleware.
pub type HandlerResult = Result<Response, Error>;

/// Uniform endpoint contract.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
        params: Params,
    ) -> BoxFuture<'a, HandlerResult>;
}

/// A stage wrapped around everything after it in the pipeline.
pub trait Middleware: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
        params: Params,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult>;
}

/// The remainder of the pipeline after the current stage.
pub struct Next<'a> {
    stages: &'a [Arc<dyn Middleware>],
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(stages: &'a [Arc<dyn Middleware>], handler: &'a dyn Handler) -> Self {
        Self { stages, handler }
    }

    /// Run the next stage, or the handler once the stages are exhausted.
    pub fn run<'c>(self, ctx: &'c mut Context, req: Request, params: Params) -> BoxFuture<'c, HandlerResult>
    where
        'a: 'c,
    {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.handle(ctx, req, params, Next::new(rest, self.handler)),
            None => self.handler.call(ctx, req, params),
        }
    }
}

/// A handler together with its fully ordered middleware stages.
pub struct Route {
    stages: Vec<Arc<dyn Middleware>>,
    handler: Arc<dyn Handler>,
}

impl Route {
    pub fn new(stages: Vec<Arc<dyn Middleware>>, handler: Arc<dyn Handler>) -> Self {
        Self { stages, handler }
    }

    pub fn run<'a>(&'a self, ctx: &'a mut Context, req: Request, params: Params) -> BoxFuture<'a, HandlerResult> {
        Next::new(&self.stages, self.handler.as_ref()).run(ctx, req, params)
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }
}

/// Handler backed by a closure.
pub struct FnHandler<F> {
    func: F,
}

/// Wrap a closure as a [`Handler`].
///
/// ```ignore
/// let health = handler_fn(|_ctx, _req, _params| Box::pin(async { respond(&"ok", StatusCode::OK) }));
/// ```
pub fn handler_fn<F>(func: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context, Request, Params) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    FnHandler { func }
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context, Request, Params) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context, req: Request, params: Params) -> BoxFuture<'a, HandlerResult> {
        (self.func)(ctx, req, params)
    }
}

/// Handler that forwards to a method on shared state.
pub struct Bound<T, F> {
    target: Arc<T>,
    func: F,
}

/// Bind a method of `target` as a [`Handler`].
///
/// ```ignore
/// app.handle(Method::GET, "/v1/restaurant", bind(&restaurants, |r, ctx, req, p| Box::pin(r.list(ctx, req, p))), &[]);
/// ```
pub fn bind<T, F>(target: &Arc<T>, func: F) -> Bound<T, F>
where
    T: Send + Sync + 'static,
    F: for<'a> Fn(&'a T, &'a mut Context, Request, Params) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    Bound {
        target: Arc::clone(target),
        func,
    }
}

impl<T, F> Handler for Bound<T, F>
where
    T: Send + Sync + 'static,
    F: for<'a> Fn(&'a T, &'a mut Context, Request, Params) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context, req: Request, params: Params) -> BoxFuture<'a, HandlerResult> {
        (self.func)(&self.target, ctx, req, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records its name on the way in and on the way out.
    struct Trace {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Trace {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handle<'a>(
            &'a self,
            ctx: &'a mut Context,
            req: Request,
            params: Params,
            next: Next<'a>,
        ) -> BoxFuture<'a, HandlerResult> {
            Box::pin(async move {
                self.log.lock().unwrap().push(format!("{} in", self.name));
                let result = next.run(ctx, req, params).await;
                self.log.lock().unwrap().push(format!("{} out", self.name));
                result
            })
        }
    }

    #[tokio::test]
    async fn test_stages_run_in_list_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stage = |name: &'static str| -> Arc<dyn Middleware> {
            Arc::new(Trace {
                name,
                log: Arc::clone(&log),
            })
        };

        let handler_log = Arc::clone(&log);
        let handler = handler_fn(move |_ctx, _req, _params| {
            handler_log.lock().unwrap().push("handler".to_string());
            Box::pin(async { Ok(StatusCode::OK.into_response()) })
        });

        let route = Route::new(vec![stage("outer"), stage("inner")], Arc::new(handler));
        assert_eq!(route.stage_names(), vec!["outer", "inner"]);

        let mut ctx = Context::new(Duration::from_secs(1));
        let response = route.run(&mut ctx, Request::new(Body::empty()), Params::new()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["outer in", "inner in", "handler", "inner out", "outer out"]
        );
    }

    struct Greeter {
        greeting: &'static str,
    }

    impl Greeter {
        async fn greet(&self, ctx: &mut Context, _req: Request, params: Params) -> HandlerResult {
            ctx.set_status(StatusCode::ACCEPTED);
            let name = params.get("name").unwrap_or_default();
            Ok(format!("{} {}", self.greeting, name).into_response())
        }
    }

    #[tokio::test]
    async fn test_bound_method_handler() {
        let greeter = Arc::new(Greeter { greeting: "hello" });
        let handler = bind(&greeter, |g, ctx, req, p| Box::pin(g.greet(ctx, req, p)));

        let mut params = Params::new();
        params.push("name", "world");
        let mut ctx = Context::new(Duration::from_secs(1));
        let response = handler.call(&mut ctx, Request::new(Body::empty()), params).await.unwrap();

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"hello world");
        assert_eq!(ctx.status(), Some(StatusCode::ACCEPTED));
    }
}
