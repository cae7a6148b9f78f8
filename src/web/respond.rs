use anyhow::Context as _;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde::Serialize;

use super::Response;
use crate::error::Error;

/// JSON payload with the status it should be written with.
#[derive(Debug)]
pub struct JsonResponse<T: Serialize> {
    pub data: T,
    pub status: StatusCode,
}

impl<T: Serialize> JsonResponse<T> {
    /// 200 OK
    pub fn ok(data: T) -> Self {
        Self::with_status(data, StatusCode::OK)
    }

    /// 201 Created
    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }

    pub fn with_status(data: T, status: StatusCode) -> Self {
        Self { data, status }
    }

    /// Serialize into a response. Failure is an internal error, not a panic.
    pub fn into_result(self) -> Result<Response, Error> {
        respond(&self.data, self.status)
    }
}

impl JsonResponse<()> {
    /// 204 No Content
    pub fn no_content() -> Self {
        Self::with_status((), StatusCode::NO_CONTENT)
    }
}

/// Marshal `data` as the JSON body of a `status` response. 204 carries no body.
pub fn respond<T: Serialize + ?Sized>(data: &T, status: StatusCode) -> Result<Response, Error> {
    if status == StatusCode::NO_CONTENT {
        return Ok(status.into_response());
    }

    let body = serde_json::to_vec(data).context("marshalling response")?;
    Ok((
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response())
}
