use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use types::errors::{EngineError, ErrorKind, ValidationError};

/// Central error type for the Gateway application
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Engine(err.into())
    }
}

impl AppError {
    fn status_and_title(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "Forbidden"),
            AppError::RateLimitExceeded(_) => (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Validation Failed"),
            AppError::Engine(err) => match err.kind() {
                ErrorKind::NotFound => (StatusCode::NOT_FOUND, "Not Found"),
                ErrorKind::ValidationFailure => (StatusCode::BAD_REQUEST, "Validation Failed"),
                ErrorKind::BusinessRuleViolation | ErrorKind::ArithmeticOverflow => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "Business Rule Violated")
                }
                ErrorKind::Conflict => (StatusCode::CONFLICT, "Conflict"),
                ErrorKind::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable"),
            },
            AppError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::RateLimitExceeded(msg)
            | AppError::BadRequest(msg) => msg.clone(),
            AppError::Engine(EngineError::Validation(err)) => err.to_string(),
            AppError::Engine(err) => err.to_string(),
            AppError::InternalError(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, title) = self.status_and_title();
        if let AppError::InternalError(err) = &self {
            tracing::error!(error = %err, "Unhandled gateway error");
        }

        let body = Json(json!({
            "title": title,
            "status": status.as_u16(),
            "detail": self.detail(),
        }));

        let mut response = (status, body).into_response();
        if let AppError::Engine(err) = &self {
            if err.is_retryable() {
                response
                    .headers_mut()
                    .insert("Retry-After", axum::http::HeaderValue::from_static("0"));
            }
        }
        response
    }
}
