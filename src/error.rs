// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::database::StoreError;
use crate::restaurant::RestaurantError;
use crate::user::UserError;

/// Classified request error. The error middleware is the only place that turns
/// one of these into a status code and body.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // 400 Bad Request
    #[error("field validation error")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    BadRequest(String),

    // 401 Unauthorized
    #[error("{0}")]
    Unauthorized(String),

    // 403 Forbidden
    #[error("{0}")]
    Forbidden(String),

    // 404 Not Found
    #[error("{0}")]
    NotFound(String),

    // 500, and the process begins a graceful shutdown
    #[error("shutdown requested: {0}")]
    Shutdown(String),

    // 500 Internal Server Error
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// A single field failure inside a validation error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

/// JSON body written for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl Error {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Shutdown(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, Error::Shutdown(_))
    }

    /// Client-safe body. Server errors only ever expose the reason phrase.
    pub fn to_body(&self) -> ErrorResponse {
        let status = self.status_code();
        if status.is_server_error() {
            return ErrorResponse {
                error: status.canonical_reason().unwrap_or("Internal Server Error").to_string(),
                fields: Vec::new(),
            };
        }

        match self {
            Error::Validation(fields) => ErrorResponse {
                error: self.to_string(),
                fields: fields.clone(),
            },
            _ => ErrorResponse {
                error: self.to_string(),
                fields: Vec::new(),
            },
        }
    }
}

// Static constructor methods
impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Error::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Error::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Error::Shutdown(message.into())
    }
}

// Convert domain errors to Error
impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::Internal(anyhow::Error::new(err).context("store"))
    }
}

impl From<RestaurantError> for Error {
    fn from(err: RestaurantError) -> Self {
        match err {
            RestaurantError::InvalidId => Error::bad_request(err.to_string()),
            RestaurantError::NotFound | RestaurantError::MenuNotFound => {
                Error::not_found(err.to_string())
            }
            RestaurantError::Forbidden => Error::forbidden(err.to_string()),
            RestaurantError::Store(store) => store.into(),
        }
    }
}

impl From<UserError> for Error {
    fn from(err: UserError) -> Self {
        match err {
            UserError::AuthenticationFailure => Error::unauthorized(err.to_string()),
            UserError::Store(store) => store.into(),
            UserError::Hash(_) | UserError::Token(_) => Error::Internal(anyhow::Error::new(err)),
        }
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        Error::Internal(anyhow::Error::new(err).context("token"))
    }
}

// Automatic HTTP response conversion for Axum
impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_error_text_never_reaches_client() {
        let err = Error::Internal(anyhow::anyhow!("relation \"restaurant\" does not exist"));
        let body = err.to_body();

        assert_eq!(body.error, "Internal Server Error");
        assert!(body.fields.is_empty());
    }

    #[test]
    fn test_shutdown_maps_to_500_with_generic_body() {
        let err = Error::shutdown("claims missing from context");

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_body().error, "Internal Server Error");
        assert!(err.is_shutdown());
    }

    #[test]
    fn test_simple_error_body_omits_fields() {
        let body = serde_json::to_string(&Error::bad_request("ID is not in its proper form").to_body())
            .unwrap();

        assert_eq!(body, r#"{"error":"ID is not in its proper form"}"#);
    }

    #[test]
    fn test_validation_body_lists_fields() {
        let err = Error::Validation(vec![FieldError {
            field: "name".into(),
            error: "name is a required field".into(),
        }]);
        let body = serde_json::to_value(err.to_body()).unwrap();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "field validation error");
        assert_eq!(body["fields"][0]["field"], "name");
        assert_eq!(body["fields"][0]["error"], "name is a required field");
    }

    #[test]
    fn test_restaurant_errors_are_classified() {
        assert_eq!(Error::from(RestaurantError::InvalidId).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::from(RestaurantError::NotFound).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::from(RestaurantError::Forbidden).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::from(RestaurantError::Store(StoreError::DeadlineExceeded)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
