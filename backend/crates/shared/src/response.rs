//! Response envelope
//!
//! Every JSON endpoint answers with the same shape:
//!
//! ```json
//! { "success": true,  "data": { ... },                          "requestId": "..." }
//! { "success": false, "error": { "code": "...", "message": "..." }, "requestId": "..." }
//! ```
//!
//! Handlers pull a [`RequestId`] from the request and finish with
//! [`RequestId::respond`], so the envelope and the status mapping live in one
//! place.

use std::convert::Infallible;

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::error::app_error::AppError;

/// Header carrying the correlation id (set by the request-id layer)
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation id of the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Read the id from `x-request-id`, generating one when absent or unusable
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
            .map(|v| Self(v.to_string()))
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn ok<T>(self, data: T) -> ApiResponse<T> {
        ApiResponse {
            request_id: self,
            data,
        }
    }

    pub fn fail(self, error: impl Into<AppError>) -> ApiError {
        ApiError {
            request_id: self,
            error: error.into(),
        }
    }

    /// Render a use-case result in the envelope
    pub fn respond<T, E>(self, result: Result<T, E>) -> Response
    where
        T: Serialize,
        E: Into<AppError>,
    {
        match result {
            Ok(data) => self.ok(data).into_response(),
            Err(err) => self.fail(err).into_response(),
        }
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Successful envelope
#[derive(Debug)]
pub struct ApiResponse<T> {
    request_id: RequestId,
    data: T,
}

/// Failed envelope
#[derive(Debug)]
pub struct ApiError {
    request_id: RequestId,
    error: AppError,
}

impl ApiError {
    pub fn error(&self) -> &AppError {
        &self.error
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuccessBody<'a, T> {
    success: bool,
    data: &'a T,
    request_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    success: bool,
    error: ErrorDetail<'a>,
    request_id: &'a str,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'static str,
    message: &'a str,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = SuccessBody {
            success: true,
            data: &self.data,
            request_id: self.request_id.as_str(),
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = &self.error;
        if error.is_server_error() {
            tracing::error!(
                request_id = %self.request_id,
                code = error.code(),
                error = %error,
                source = ?std::error::Error::source(error),
                "Request failed"
            );
        } else {
            tracing::debug!(
                request_id = %self.request_id,
                code = error.code(),
                error = %error,
                "Request rejected"
            );
        }

        let status =
            StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            success: false,
            error: ErrorDetail {
                code: error.code(),
                message: error.public_message(),
            },
            request_id: self.request_id.as_str(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::kind::ErrorKind;
    use axum::http::HeaderValue;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_request_id_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-123"));
        assert_eq!(RequestId::from_headers(&headers).as_str(), "req-123");
    }

    #[test]
    fn test_request_id_generated_when_missing() {
        let id = RequestId::from_headers(&HeaderMap::new());
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let response = RequestId("req-1".into()).respond::<_, AppError>(Ok(
            serde_json::json!({ "status": "pending" }),
        ));
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["requestId"], "req-1");
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = RequestId("req-2".into())
            .respond::<(), _>(Err(AppError::new(
                ErrorKind::RateLimited,
                "Daily collect limit reached",
            )));
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "RATE_LIMITED");
        assert_eq!(body["error"]["message"], "Daily collect limit reached");
        assert_eq!(body["requestId"], "req-2");
    }

    #[tokio::test]
    async fn test_internal_error_is_masked() {
        let response = RequestId("req-3".into())
            .fail(AppError::internal("pool timed out after 5s"))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_ne!(body["error"]["message"], "pool timed out after 5s");
    }
}
