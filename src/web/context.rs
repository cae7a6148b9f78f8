use std::time::{Duration, Instant};

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::Error;

/// Per-request state created by the router right before dispatch and passed by
/// reference through every middleware and the handler.
#[derive(Debug)]
pub struct Context {
    trace_id: String,
    now: DateTime<Utc>,
    started: Instant,
    deadline: tokio::time::Instant,
    status: Option<StatusCode>,
    claims: Option<Claims>,
}

impl Context {
    /// Fresh context whose deadline is `timeout` from now.
    pub fn new(timeout: Duration) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            now: Utc::now(),
            started: Instant::now(),
            deadline: tokio::time::Instant::now() + timeout,
            status: None,
            claims: None,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Wall-clock request start, used for created/updated timestamps.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Advisory deadline handed to the persistence layer.
    pub fn deadline(&self) -> tokio::time::Instant {
        self.deadline
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    pub fn set_claims(&mut self, claims: Claims) {
        self.claims = Some(claims);
    }

    /// Claims stored by the authenticate middleware. Their absence means the
    /// route was registered without it.
    pub fn claims(&self) -> Result<&Claims, Error> {
        self.claims
            .as_ref()
            .ok_or_else(|| Error::shutdown("claims missing from context"))
    }
}
