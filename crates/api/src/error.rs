use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub const NO_MESSAGE: &str = "No message provided";
pub const INTERNAL_ERROR: &str = "Internal server error";
pub const TOO_LARGE: &str = "Message too large";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("no message provided")]
    MissingMessage,
    #[error("request body exceeds the size limit")]
    TooLarge,
    #[error("request body is not usable: {0}")]
    InvalidBody(String),
    #[error("message field is not a string: {0}")]
    InvalidMessage(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

impl ChatError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingMessage => StatusCode::BAD_REQUEST,
            Self::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidBody(_) | Self::InvalidMessage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Callers only ever see the generic text; detail stays in the log.
impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            Self::MissingMessage => NO_MESSAGE,
            Self::TooLarge => TOO_LARGE,
            _ => INTERNAL_ERROR,
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}
