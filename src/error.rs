use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde::Serialize;

use crate::api::response;

/// Message shown for any failure whose cause should not reach the client.
pub const GENERIC_FAILURE: &str = "Invalid link or product unavailable";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Why a single extraction attempt failed.
///
/// `Display` is meant for logs and may carry transport or parser detail;
/// `public_message` is what the caller gets back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("Invalid {0} URL")]
    InvalidUrl(String),

    #[error("Failed to fetch page: {0}")]
    FetchFailed(String),

    #[error("Price not found. Invalid or unsupported product page.")]
    PriceNotFound,

    #[error("Price or title not found. Invalid or unsupported product page.")]
    TitleOrPriceNotFound,

    #[error("No valid product images found.")]
    NoImagesFound,

    #[error("Unexpected extraction failure: {0}")]
    Unknown(String),
}

impl ExtractionError {
    pub fn public_message(&self) -> String {
        match self {
            ExtractionError::FetchFailed(_) | ExtractionError::Unknown(_) => {
                GENERIC_FAILURE.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ExtractionError {
    fn into_response(self) -> Response {
        response::error(StatusCode::BAD_REQUEST, self.public_message()).into_response()
    }
}

impl From<reqwest::Error> for ExtractionError {
    fn from(err: reqwest::Error) -> Self {
        ExtractionError::FetchFailed(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid quote: {0}")]
    InvalidQuote(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidQuote(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        response::error(status, error_message).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
