use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nl_core::Error;
use serde::Serialize;

/// Uniform error body: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] Error),

    #[error("Invalid request body: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(e) => match e {
                Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                Error::NotFound(_) => StatusCode::NOT_FOUND,
                Error::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "❌ {}", detail);
        } else {
            tracing::debug!(status = status.as_u16(), "{}", detail);
        }
        (status, Json(ErrorBody { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nl_core::Backend;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::InvalidInput("q".into()), StatusCode::BAD_REQUEST),
            (Error::NotFound("user".into()), StatusCode::NOT_FOUND),
            (Error::StoreUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (Error::Fetch("timeout".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::backend(Backend::Llm, "429"), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Storage("locked".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
    }
}
