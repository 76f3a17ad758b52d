//! Result and error types for fuzzcov.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for fuzzcov operations
pub type FuzzcovResult<T> = Result<T, FuzzcovError>;

/// File operation that failed while writing a report document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    /// Creating the temporary file next to the target
    Create,
    /// Writing the rendered document
    Write,
    /// Flushing buffered output and syncing to disk
    Sync,
    /// Renaming the temporary file over the target
    Persist,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            Self::Create => "open file for writing",
            Self::Write => "write",
            Self::Sync => "flush",
            Self::Persist => "move into place",
        };
        f.write_str(op)
    }
}

/// Errors that can occur in fuzzcov
#[derive(Debug, Error)]
pub enum FuzzcovError {
    /// The source coverage analyzer failed
    #[error("Coverage analysis failed: {message}")]
    Analysis {
        /// Error message
        message: String,
    },

    /// A report template could not be parsed
    #[error("could not export report, failed to parse template {name}: {message}")]
    Template {
        /// Template name
        name: String,
        /// Error message
        message: String,
    },

    /// The output directory could not be created
    #[error("could not create report directory {}: {}", .path.display(), .source)]
    Directory {
        /// Directory that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A report file could not be written
    #[error("could not export report, failed to {} {}: {}", .operation, .path.display(), .source)]
    FileIo {
        /// Target file
        path: PathBuf,
        /// Step that failed
        operation: FileOperation,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// More than one report document failed
    #[error("{} report documents failed: {}", .errors.len(), join_errors(.errors))]
    Documents {
        /// Every failure, in document order
        errors: Vec<FuzzcovError>,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl FuzzcovError {
    /// Create an analysis error
    #[must_use]
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis {
            message: message.into(),
        }
    }

    /// Create a template error
    #[must_use]
    pub fn template(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Combine per-document failures, keeping every one observable.
    ///
    /// Returns `None` when the list is empty and the single error when only
    /// one document failed.
    #[must_use]
    pub fn combine(mut errors: Vec<Self>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Documents { errors }),
        }
    }
}

fn join_errors(errors: &[FuzzcovError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
