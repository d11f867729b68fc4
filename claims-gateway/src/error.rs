use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use claim_engine::{ClaimError, UpstreamError};
use serde::Serialize;

/// Error returned by every handler; renders as `{message[, reason]}`.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub ClaimError);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(ClaimError::Validation(message.into()))
    }

    pub fn not_found(id: &str) -> Self {
        Self(ClaimError::NotFound(id.to_string()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ClaimError::Validation(_) => StatusCode::BAD_REQUEST,
            ClaimError::NotFound(_) => StatusCode::NOT_FOUND,
            ClaimError::Upstream(UpstreamError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ClaimError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ClaimError::Persistence(_) | ClaimError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = match &self.0 {
            ClaimError::Upstream(upstream) => Some(upstream.reason()),
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), reason = ?reason, error = %self.0, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self.0, "Request rejected");
        }

        let body = ErrorBody {
            message: self.0.to_string(),
            reason,
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::bad_request("Query is required"), StatusCode::BAD_REQUEST),
            (ApiError::not_found("abc"), StatusCode::NOT_FOUND),
            (
                ApiError(UpstreamError::Timeout("slow".into()).into()),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                ApiError(UpstreamError::ConnectionRefused("down".into()).into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError(UpstreamError::MalformedResponse("junk".into()).into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError(ClaimError::Persistence("pool closed".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError(UpstreamError::Transport("redirect loop".into()).into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError(ClaimError::Internal("approved without amount".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{error}");
        }
    }
}
