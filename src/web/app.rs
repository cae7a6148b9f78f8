use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;

use axum::http::Method;
use axum::response::IntoResponse;
use tracing::{debug, info_span, Instrument, Span};

use super::{BoxFuture, Context, Handler, Middleware, Params, PathPattern, Request, Response, Route};
use crate::error::Error;
use crate::server::ShutdownHandle;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

struct Entry {
    method: Method,
    pattern: PathPattern,
    route: Route,
}

/// Route table plus the middleware stages every route runs through.
///
/// Routes are registered once at startup; [`App::into_service`] freezes the
/// table for serving.
pub struct App {
    routes: Vec<Entry>,
    global: Vec<Arc<dyn Middleware>>,
    shutdown: ShutdownHandle,
    log: Span,
    request_timeout: Duration,
}

impl App {
    /// `global` stages wrap every route, first listed outermost.
    pub fn new(shutdown: ShutdownHandle, log: Span, global: Vec<Arc<dyn Middleware>>) -> Self {
        Self {
            routes: Vec::new(),
            global,
            shutdown,
            log,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Deadline given to each request's context.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Register `handler` for `method` and `pattern`. Route stages run after
    /// the global ones, in the order given.
    pub fn handle<H: Handler>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: H,
        stages: &[Arc<dyn Middleware>],
    ) -> &mut Self {
        let mut all = self.global.clone();
        all.extend(stages.iter().cloned());

        self.routes.push(Entry {
            method,
            pattern: PathPattern::parse(pattern),
            route: Route::new(all, Arc::new(handler)),
        });
        self
    }

    /// First registered route matching `method` and `path`.
    pub fn route(&self, method: &Method, path: &str) -> Option<(&Route, Params)> {
        self.routes
            .iter()
            .filter(|entry| entry.method == *method)
            .find_map(|entry| entry.pattern.matches(path).map(|params| (&entry.route, params)))
    }

    pub async fn dispatch(&self, req: Request) -> Response {
        let Some((route, params)) = self.route(req.method(), req.uri().path()) else {
            debug!(parent: &self.log, method = %req.method(), path = %req.uri().path(), "no route");
            return Error::not_found("Not Found").into_response();
        };

        let mut ctx = Context::new(self.request_timeout);
        let span = info_span!(parent: &self.log, "request", trace_id = %ctx.trace_id());

        match route.run(&mut ctx, req, params).instrument(span).await {
            Ok(response) => response,
            Err(err) => {
                if let Error::Shutdown(reason) = &err {
                    self.shutdown.integrity(reason.clone());
                }
                err.into_response()
            }
        }
    }

    pub fn into_service(self) -> AppService {
        AppService(Arc::new(self))
    }
}

/// Shareable, read-only handle to a finished [`App`].
#[derive(Clone)]
pub struct AppService(Arc<App>);

impl AppService {
    pub async fn dispatch(&self, req: Request) -> Response {
        self.0.dispatch(req).await
    }
}

impl tower::Service<Request> for AppService {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let app = Arc::clone(&self.0);
        Box::pin(async move { Ok(app.dispatch(req).await) })
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let routes: Vec<String> = self
            .routes
            .iter()
            .map(|entry| format!("{} {}", entry.method, entry.pattern))
            .collect();
        f.debug_struct("App").field("routes", &routes).finish_non_exhaustive()
    }
}
