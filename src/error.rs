//! Custom error types for the whisper-api-server.
//!
//! This module provides a centralized error handling system using the
//! `thiserror` crate to define structured, typed errors with clear messages
//! and proper conversion into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::io;
use thiserror::Error;

/// Primary error type for the application, covering all possible error cases.
#[derive(Debug, Error)]
pub enum AppError {
    /// No inference engine is available to serve the request.
    #[error("Model not loaded")]
    ModelUnavailable,

    /// Errors occurring during model loading or construction.
    #[error("Model error: {0}")]
    Model(String),

    /// Errors related to audio decoding or conversion.
    #[error("Audio processing error: {0}")]
    Audio(String),

    /// Errors raised by the inference engine.
    #[error("Inference error: {0}")]
    Inference(String),

    /// Errors from invalid user input or requests.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Errors from invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors while fetching a model file.
    #[error("Model download error: {0}")]
    Download(String),

    /// Errors from the underlying IO system.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Implementation to convert AppError into an HTTP response for Axum.
///
/// Request-validation failures map to 422 (the form never reached the
/// handler logic); everything else is a server error. The body shape is
/// `{"detail": <message>}` on every error path.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "detail": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results with AppError.
pub type Result<T> = std::result::Result<T, AppError>;
