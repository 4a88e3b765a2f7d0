// Error types for the catalog client and their HTTP conversions

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::filters::FilterKind;

// Errors from fetching and decoding the listings endpoint
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to listings endpoint failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("listings endpoint answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("listings payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

// Errors from the settings repository
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

// Errors from changing the filter set
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("{kind} range is inverted: min {min} is above max {max}")]
    InvertedRange { kind: FilterKind, min: i64, max: i64 },
    #[error("{0} selection must not be empty")]
    EmptySelection(FilterKind),
    #[error("unknown filter kind '{0}'")]
    UnknownKind(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

// Application error returned by HTTP handlers
#[derive(Debug)]
pub enum AppError {
    InternalServerError(anyhow::Error),
    NotFound(String),
    BadRequest(String),
}

// Implement conversion from anyhow::Error for easier error propagation
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::InternalServerError(error)
    }
}

impl From<FilterError> for AppError {
    fn from(error: FilterError) -> Self {
        match error {
            FilterError::Store(e) => AppError::InternalServerError(anyhow::Error::new(e)),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(e) => {
                // Log the detailed error here, don't expose internals to the client
                tracing::error!("Internal server error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::NotFound(message) => {
                tracing::debug!("Not found: {}", message);
                (StatusCode::NOT_FOUND, message)
            }
            AppError::BadRequest(message) => {
                tracing::warn!("Rejected request: {}", message);
                (StatusCode::BAD_REQUEST, message)
            }
        };

        (status, error_message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
