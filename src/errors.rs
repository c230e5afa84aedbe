//! Unified error type for Sentinel.
//!
//! Every layer (core, providers, HTTP) returns [`Result`]. The API layer turns
//! an [`Error`] into a JSON response in `api::error`.

use thiserror::Error;

/// All errors that can occur inside the backend.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },

    /// A required environment variable is missing or not unicode
    #[error("Environment variable {name}: {source}")]
    EnvVar {
        /// Variable name
        name: &'static str,
        /// Underlying lookup error
        source: std::env::VarError,
    },

    /// Filesystem or process I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A money amount was zero, negative, or not a finite number
    #[error("Invalid amount: {amount}. Amount must be a positive number")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Request data failed validation
    #[error("{message}")]
    Validation {
        /// Human readable reason
        message: String,
    },

    /// The requested row does not exist for this user
    #[error("{resource} not found")]
    NotFound {
        /// Kind of resource (e.g. "Transaction")
        resource: &'static str,
    },

    /// Missing or invalid credentials
    #[error("Unauthorized: {reason}")]
    Unauthorized {
        /// Why authentication failed
        reason: String,
    },

    /// The request conflicts with existing data
    #[error("{message}")]
    Conflict {
        /// Human readable reason
        message: String,
    },

    /// Outbound HTTP request failed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// An external provider (LLM, Telegram) answered with an error
    #[error("{provider} error: {message}")]
    Provider {
        /// Provider name
        provider: &'static str,
        /// Error body or description
        message: String,
    },

    /// OCR could not read the image
    #[error("OCR failed: {message}")]
    Ocr {
        /// Failure description
        message: String,
    },

    /// The feature needs a provider that is not configured
    #[error("{feature} is not configured")]
    NotConfigured {
        /// Feature name
        feature: &'static str,
    },

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Token could not be issued or verified
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Password hashing failed
    #[error("Password hashing error: {message}")]
    PasswordHash {
        /// Failure description
        message: String,
    },

    /// Base64 payload could not be decoded
    #[error("Invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Multipart body could not be read
    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Unauthorized`] with the given reason.
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
