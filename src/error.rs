//! Error type shared by the store, the query layer, and the front ends.
//!
//! Every variant is terminal: it is surfaced to the user and mapped to a
//! process exit code by `main`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The forecast CSV does not exist (or is not a regular file).
    #[error("Forecast file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The forecast CSV exists but cannot be normalized.
    #[error("Failed to parse '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// No row in the table belongs to the requested entity.
    #[error("No forecast rows for entity '{entity}'")]
    EntityNotFound { entity: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Terminal error: {0}")]
    Terminal(String),
}

impl AppError {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn terminal(err: impl std::fmt::Display) -> Self {
        Self::Terminal(err.to_string())
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::NotFound { .. } | AppError::EntityNotFound { .. } => 2,
            AppError::Parse { .. } => 3,
            AppError::Io { .. } | AppError::Export(_) | AppError::Terminal(_) => 4,
        }
    }
}
