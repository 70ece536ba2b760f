use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Message returned to callers without the required rights
pub const INSUFFICIENT_RIGHTS: &str = "Insufficient rights";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{}", INSUFFICIENT_RIGHTS)]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let code = self.status_code();
        match self {
            // Plain text, matching what the host returns for permission failures
            AppError::Forbidden => HttpResponse::build(code)
                .content_type("text/plain; charset=utf-8")
                .body(INSUFFICIENT_RIGHTS),
            AppError::BadRequest(msg) | AppError::NotFound(msg) => {
                HttpResponse::build(code).json(ErrorResponse {
                    error: msg.clone(),
                    code: code.as_u16(),
                })
            }
            _ => HttpResponse::build(code).json(ErrorResponse {
                error: self.to_string(),
                code: code.as_u16(),
            }),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Failures of a stream operation.
///
/// None of these escape the controller: each one is turned into a status
/// event with `streaming: false` and the error text.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("{0}")]
    Configuration(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to signal process group {pgid}: {message}")]
    Signal { pgid: i32, message: String },
}
