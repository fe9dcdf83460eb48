//! Error taxonomy at the library boundary
//!
//! Internals work with `anyhow::Result` and attach context as they go; the
//! pipeline maps failures onto [`ReportError`] so callers can tell a bad
//! request from an unreadable file or a failed save.

use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Nothing usable was supplied
    #[error("Invalid input: {0}")]
    Input(String),

    /// An input workbook could not be read or has no usable structure
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A single chart failed to render; the report is still written
    #[error("Failed to render chart '{chart}': {message}")]
    Render { chart: String, message: String },

    /// The output workbook could not be built or saved
    #[error("Failed to write report {}: {message}", path.display())]
    Assembly { path: PathBuf, message: String },
}

impl ReportError {
    pub fn parse(path: &Path, err: anyhow::Error) -> Self {
        ReportError::Parse {
            path: path.to_path_buf(),
            message: format!("{:#}", err),
        }
    }

    pub fn render(chart: &str, err: impl std::fmt::Display) -> Self {
        ReportError::Render {
            chart: chart.to_string(),
            message: err.to_string(),
        }
    }

    pub fn assembly(path: &Path, err: anyhow::Error) -> Self {
        ReportError::Assembly {
            path: path.to_path_buf(),
            message: format!("{:#}", err),
        }
    }

    /// Whether the pipeline may continue after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ReportError::Render { .. })
    }
}
