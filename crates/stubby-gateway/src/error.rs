use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use stubby_core::ShortenerError;
use thiserror::Error;
use tracing::{error, warn};

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Shortener(#[from] ShortenerError),
    #[error("invalid request body: {}", .0.body_text())]
    Body(#[from] JsonRejection),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Shortener(source) => match source {
                ShortenerError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
                ShortenerError::NotFound(_) | ShortenerError::InvalidShortCode(_) => {
                    StatusCode::NOT_FOUND
                }
                ShortenerError::AllocationExhausted { .. }
                | ShortenerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                ShortenerError::Generator(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Body(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Shortener(
                ShortenerError::NotFound(_) | ShortenerError::InvalidShortCode(_),
            ) => "not found".to_string(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "request rejected");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
