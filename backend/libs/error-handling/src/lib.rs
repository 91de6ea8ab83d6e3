//! Error types shared across the dedup gateway's HTTP surface.
//!
//! The WebSocket session loop reports its own per-event outcomes inline on the
//! socket (see `dedup-processor::ProcessOutcome`); this crate covers the plain
//! HTTP paths — `/health`, `/metrics`, and upgrade rejections — where an
//! `actix_web::ResponseError` is the natural fit.

use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard error body returned on the gateway's HTTP endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
    pub code: String,
    pub timestamp: String,
}

#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal server error: {0}")]
    Internal(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("request timed out")]
    Timeout,
}

impl GatewayError {
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::BadRequest(_) => 400,
            GatewayError::Timeout => 408,
            GatewayError::ServiceUnavailable(_) => 503,
            GatewayError::Database(_) | GatewayError::Internal(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::BadRequest(_) => "BAD_REQUEST",
            GatewayError::Database(_) => "DATABASE_ERROR",
            GatewayError::Internal(_) => "INTERNAL_ERROR",
            GatewayError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            GatewayError::Timeout => "TIMEOUT",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
            status: self.status_code(),
            code: self.error_code().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => GatewayError::Timeout,
            _ => GatewayError::Database(err.to_string()),
        }
    }
}

impl ResponseError for GatewayError {
    fn error_response(&self) -> HttpResponse {
        let body = self.to_response();
        HttpResponse::build(
            actix_web::http::StatusCode::from_u16(self.status_code())
                .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR),
        )
        .json(body)
    }
}
