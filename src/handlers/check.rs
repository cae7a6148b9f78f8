use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use tracing::warn;

use crate::database::StatusCheck;
use crate::web::{respond, Context, HandlerResult, Params, Request};

#[derive(Debug, Serialize)]
struct Health<'a> {
    version: &'a str,
    status: &'a str,
}

pub struct Check {
    build: String,
    db: Arc<dyn StatusCheck>,
}

impl Check {
    pub fn new(build: impl Into<String>, db: Arc<dyn StatusCheck>) -> Self {
        Self { build: build.into(), db }
    }

    /// `GET /v1/health`. A failing database is reported in the body, not as
    /// a request error.
    pub async fn health(&self, ctx: &mut Context, _req: Request, _params: Params) -> HandlerResult {
        let (status, code) = match self.db.status_check(ctx.deadline()).await {
            Ok(()) => ("ok", StatusCode::OK),
            Err(err) => {
                warn!(trace_id = %ctx.trace_id(), error = %err, "health check failed");
                ("db not ready", StatusCode::INTERNAL_SERVER_ERROR)
            }
        };

        respond(
            &Health {
                version: &self.build,
                status,
            },
            code,
        )
    }
}
