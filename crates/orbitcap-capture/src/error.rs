//! Capture error types.

use orbitcap_core::CoreError;
use thiserror::Error;

use crate::session::CaptureReport;

/// Errors a renderer (or raster handling) can produce for a single frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The renderer cannot serve any request; the session cannot continue.
    #[error("renderer unavailable: {0}")]
    Unavailable(String),

    /// The renderer failed this frame only.
    #[error("render failed: {0}")]
    Failed(String),

    /// The raster does not match the requested resolution.
    #[error("raster is {width}x{height}, expected {expected_width}x{expected_height}")]
    SizeMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },

    /// The raster buffer length does not match its declared size and layout.
    #[error("raster buffer has {actual} elements, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    /// The requested intrinsics cannot describe a camera.
    #[error("invalid intrinsics: {0}")]
    InvalidIntrinsics(#[from] CoreError),

    /// Encoding the raster into an image file failed.
    #[error("image encoding failed: {0}")]
    Encode(String),
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        RenderError::Encode(err.to_string())
    }
}

/// Errors that end a capture session.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Session intrinsics were invalid; nothing was rendered.
    #[error("invalid capture intrinsics: {0}")]
    InvalidIntrinsics(#[from] CoreError),

    /// The renderer reported itself unavailable. Frames captured before that
    /// point are kept in the report.
    #[error("renderer unavailable after {} frames: {reason}", .report.frames.len())]
    RendererUnavailable {
        reason: String,
        report: Box<CaptureReport>,
    },

    /// The caller cancelled the session. Not a failure: the frames in the
    /// report are complete and exportable.
    #[error("capture aborted after {} frames", .0.frames.len())]
    Aborted(Box<CaptureReport>),
}

impl CaptureError {
    /// The partial report carried by this error, if any.
    pub fn report(&self) -> Option<&CaptureReport> {
        match self {
            CaptureError::InvalidIntrinsics(_) => None,
            CaptureError::RendererUnavailable { report, .. } | CaptureError::Aborted(report) => {
                Some(&**report)
            }
        }
    }

    /// Consumes the error, returning its partial report, if any.
    pub fn into_report(self) -> Option<CaptureReport> {
        match self {
            CaptureError::InvalidIntrinsics(_) => None,
            CaptureError::RendererUnavailable { report, .. } | CaptureError::Aborted(report) => {
                Some(*report)
            }
        }
    }
}

/// A specialized Result type for single-frame operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
