//! Error types shared across Lumen crates.

use std::path::PathBuf;

/// Top-level error type for export operations.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The job description is malformed and was rejected before submission.
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("No images selected for export")]
    NoTargets,

    /// A job is already running on this controller.
    #[error("An export is already in progress")]
    Busy,

    /// A watermark preview is already being generated.
    #[error("A watermark preview is already being generated")]
    PreviewBusy,

    /// Failure reported by the processing engine, message passed through verbatim.
    #[error("{message}")]
    Engine { message: String },

    #[error("Export cancelled")]
    Cancelled,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ExportError.
pub type ExportResult<T> = Result<T, ExportError>;

impl ExportError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
