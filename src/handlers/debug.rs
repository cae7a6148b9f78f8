use std::sync::Arc;

use serde::Serialize;

use crate::middleware::{Metrics, MetricsSnapshot};
use crate::web::{Context, HandlerResult, JsonResponse, Params, Request};

#[derive(Debug, Serialize)]
struct Vars<'a> {
    build: &'a str,
    #[serde(flatten)]
    metrics: MetricsSnapshot,
}

pub struct Diagnostics {
    build: String,
    metrics: Arc<Metrics>,
}

impl Diagnostics {
    pub fn new(build: impl Into<String>, metrics: Arc<Metrics>) -> Self {
        Self {
            build: build.into(),
            metrics,
        }
    }

    /// `GET /debug/vars`
    pub async fn vars(&self, _ctx: &mut Context, _req: Request, _params: Params) -> HandlerResult {
        JsonResponse::ok(Vars {
            build: &self.build,
            metrics: self.metrics.snapshot(),
        })
        .into_result()
    }
}
