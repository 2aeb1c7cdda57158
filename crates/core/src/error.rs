//! Error types for the thumbsmith-core library.
//!
//! This module provides granular error variants for different failure modes,
//! enabling precise error handling and user-friendly error messages.

use thiserror::Error;

/// Errors that can occur within the thumbsmith-core library.
///
/// Each variant represents a specific failure mode with contextual information
/// to help diagnose and handle errors appropriately.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing keys, invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required environment variable was not found.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// The service declined to generate an image and returned explanatory
    /// text instead. The text is surfaced to the user verbatim.
    #[error("{0}")]
    Refusal(String),

    /// The service returned neither image data nor explanatory text.
    #[error("The model returned no image data for {0}")]
    EmptyResult(String),

    /// General Gemini API error (transport, HTTP status, malformed body).
    #[error("Gemini API error: {0}")]
    GeminiApi(String),

    /// Rate limited by the Gemini API.
    #[error("Rate limited by Gemini API, please retry later")]
    RateLimited,

    /// Image decoding, resizing or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// Persisting session state failed (quota ceiling, serialization).
    /// Callers log this and keep the in-memory state authoritative.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// The payment collaborator reported a failure.
    #[error("Payment failed: {0}")]
    Payment(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An unclassified error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a Gemini API error with the given message.
    pub fn gemini(msg: impl Into<String>) -> Self {
        Self::GeminiApi(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates a persistence error with the given message.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Returns true when this error is a service refusal. Refusals are
    /// terminal: re-submitting the same request is never appropriate.
    pub fn is_refusal(&self) -> bool {
        matches!(self, Self::Refusal(_))
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
