//! Error types for orbitcap.

use orbitcap_capture::{CaptureError, CaptureReport, RenderError};
use orbitcap_core::{CoreError, SamplingError};
use orbitcap_export::ExportError;
use thiserror::Error;

/// The main error type for orbitcap operations.
#[derive(Error, Debug)]
pub enum OrbitcapError {
    /// Invalid camera or pose data.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Invalid sampling parameters.
    #[error("sampling error: {0}")]
    Sampling(#[from] SamplingError),

    /// A single render failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The capture session ended early.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Writing or reading the dataset failed.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Some frames failed and partial datasets were not allowed.
    #[error("{failed} of {attempted} frames failed to capture", attempted = .report.attempted)]
    PartialCapture {
        failed: usize,
        report: Box<CaptureReport>,
    },

    /// Every frame failed.
    #[error("no frames captured ({attempted} attempted)")]
    NothingCaptured { attempted: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for orbitcap operations.
pub type Result<T> = std::result::Result<T, OrbitcapError>;
