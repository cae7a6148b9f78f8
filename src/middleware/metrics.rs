use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::web::{BoxFuture, Context, HandlerResult, Middleware, Next, Params, Request};

/// Process-wide request counters shared by every route.
#[derive(Debug, Default)]
pub struct Metrics {
    requests: AtomicU64,
    errors: AtomicU64,
    in_flight: AtomicI64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub in_flight: i64,
}

impl Metrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
        }
    }
}

/// Decrements the in-flight gauge even if the request future is dropped.
struct InFlight<'a>(&'a AtomicI64);

impl<'a> InFlight<'a> {
    fn enter(gauge: &'a AtomicI64) -> Self {
        gauge.fetch_add(1, Ordering::Relaxed);
        Self(gauge)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Counts every request and every request that failed.
pub struct RequestMetrics {
    metrics: Arc<Metrics>,
}

impl RequestMetrics {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

impl Middleware for RequestMetrics {
    fn name(&self) -> &'static str {
        "metrics"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut Context,
        req: Request,
        params: Params,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let _in_flight = InFlight::enter(&self.metrics.in_flight);
            self.metrics.requests.fetch_add(1, Ordering::Relaxed);

            let result = next.run(ctx, req, params).await;
            if result.is_err() {
                self.metrics.errors.fetch_add(1, Ordering::Relaxed);
            }
            result
        })
    }
}
