//! Export error types.

use std::io;
use std::path::PathBuf;

use orbitcap_core::CoreError;
use thiserror::Error;

/// Errors produced while writing or reading a dataset.
#[derive(Error, Debug)]
pub enum ExportError {
    /// No frames were given.
    #[error("dataset is empty")]
    EmptyDataset,

    /// A frame's intrinsics differ from the first frame's.
    #[error("frame {index} ('{image_name}') has different intrinsics than frame 0")]
    IntrinsicsMismatch { index: usize, image_name: String },

    /// A frame's intrinsics cannot describe a camera.
    #[error("frame {index} ('{image_name}') has invalid intrinsics: {source}")]
    InvalidIntrinsics {
        index: usize,
        image_name: String,
        #[source]
        source: CoreError,
    },

    /// Two frames would be written under the same image file name.
    #[error("frame {index} reuses image name '{name}'")]
    DuplicateImageName { index: usize, name: String },

    /// Reading or writing a file failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A sparse model file is malformed.
    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A sparse model parsed but cannot be used.
    #[error("invalid sparse model: {0}")]
    InvalidModel(String),

    /// A required dataset file does not exist.
    #[error("missing dataset file: {}", .0.display())]
    MissingFile(PathBuf),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        ExportError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

/// A specialized Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
