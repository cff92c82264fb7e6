//! Translation of core errors into HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chartographer_core::Error;
use serde::Serialize;
use tokio::task::JoinError;
use tracing::{debug, error};

/// JSON error body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
}

/// Failure of an API handler
#[derive(Debug)]
pub enum ApiError {
    /// The canvas operation failed
    Canvas(Error),
    /// The blocking worker running the operation died
    Task(String),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Canvas(Error::Validation(_) | Error::NoIntersection { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::Canvas(Error::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Canvas(Error::Storage(_) | Error::Codec(_)) | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Canvas(err)
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, code) = match &self {
            Self::Canvas(err) => (err.to_string(), err.code()),
            Self::Task(msg) => (msg.clone(), "internal_error"),
        };

        if status.is_server_error() {
            error!(code, "{}", message);
        } else {
            debug!(code, "{}", message);
        }

        let body = ErrorResponse {
            success: false,
            error: message,
            code,
        };
        (status, Json(body)).into_response()
    }
}
