//! Uniform HTTP error envelope
//!
//! Every error response has the shape `{"error": {"code", "message",
//! "details?"}}`. Domain errors are mapped here exactly once; unexpected
//! errors are logged and surfaced as a generic 500 with internals suppressed
//! unless the debug setting is on.

use crate::error::BiascopeError;
use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// An API-level error carrying the HTTP status and envelope fields
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// 404 with code `NOT_FOUND`
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "NOT_FOUND".to_string(),
            message: message.into(),
            details: None,
        }
    }

    /// 422 with code `VALIDATION_ERROR`, raised before any persistence access
    pub fn validation(message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            code: "VALIDATION_ERROR".to_string(),
            message: message.into(),
            details,
        }
    }

    /// 400 for state errors with a caller-supplied code
    pub fn bad_request(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    /// 500 with code `INTERNAL_SERVER_ERROR`
    pub fn internal(details: Option<serde_json::Value>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_SERVER_ERROR".to_string(),
            message: "An unexpected error occurred".to_string(),
            details,
        }
    }

    /// Map a domain error to its HTTP representation
    pub fn from_domain(err: BiascopeError, expose_details: bool) -> Self {
        match err {
            err if err.is_not_found() => Self::not_found(err.to_string()),
            BiascopeError::Validation(message) => Self::validation(message, None),
            err => {
                error!("Unhandled error in request handler: {}", err);
                Self::internal(expose_details.then(|| json!(err.to_string())))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut envelope = json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        });
        if let Some(details) = self.details {
            envelope["error"]["details"] = details;
        }

        (self.status, Json(envelope)).into_response()
    }
}

/// JSON extractor that maps body rejections into the uniform envelope
///
/// The stock `Json` rejection responds with plain text; wrapping it keeps
/// malformed and mistyped bodies on the `VALIDATION_ERROR` shape.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::validation(rejection.body_text(), None)),
        }
    }
}

/// Query extractor that maps deserialization rejections into the envelope
///
/// Same reason as [`ApiJson`]: the stock `Query` rejection is plain text, so
/// a non-numeric `limit` or similar would break the uniform error shape.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(ApiError::validation(rejection.body_text(), None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_envelope() {
        let err = ApiError::not_found("Evaluation with id x not found");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "NOT_FOUND");
    }

    #[test]
    fn test_internal_hides_details_by_default() {
        let err = ApiError::from_domain(BiascopeError::Database("boom".to_string()), false);
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.details.is_none());

        let err = ApiError::from_domain(BiascopeError::Database("boom".to_string()), true);
        assert_eq!(err.details, Some(json!("Database error: boom")));
    }

    #[test]
    fn test_validation_maps_to_422() {
        let err = ApiError::from_domain(
            BiascopeError::Validation("bad input".to_string()),
            false,
        );
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code, "VALIDATION_ERROR");
    }
}
