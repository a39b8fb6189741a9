use axum::http::StatusCode;
use thiserror::Error;

use super::paths::DerivationError;
use crate::common::response::ApiError;
use crate::infrastructure::storage::media::ReserveError;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Video not found")]
    NotFound,
    #[error("Forbidden: only the owner may do this")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error("Invalid video file name: {0}")]
    Derivation(#[from] DerivationError),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Repository(#[from] anyhow::Error),
}

impl From<ReserveError> for VideoError {
    fn from(error: ReserveError) -> Self {
        match error {
            ReserveError::Derivation(e) => VideoError::Derivation(e),
            ReserveError::Io(e) => VideoError::Storage(e.to_string()),
        }
    }
}

impl From<VideoError> for ApiError {
    fn from(error: VideoError) -> Self {
        let status = match &error {
            VideoError::NotFound => StatusCode::NOT_FOUND,
            VideoError::Forbidden => StatusCode::FORBIDDEN,
            VideoError::Validation(_) | VideoError::Derivation(_) => StatusCode::BAD_REQUEST,
            VideoError::Storage(_) | VideoError::Repository(_) => {
                tracing::error!("{}", error);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError::new(status, error.to_string())
    }
}
