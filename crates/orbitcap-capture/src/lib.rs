//! Frame capture for orbitcap.
//!
//! A capture session walks a list of [`Viewpoint`](orbitcap_core::Viewpoint)s,
//! asks a [`Renderer`] for color (and optionally depth) rasters, encodes them
//! in memory and returns the frames as a [`CaptureReport`]. Nothing here
//! touches the filesystem.
//!
//! Freehand capture goes through [`FrameCapture`] driven by a
//! [`CaptureTrigger`].

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod raster;
pub mod renderer;
pub mod session;
pub mod trigger;

pub use error::{CaptureError, RenderError, RenderResult};
pub use raster::{
    encode_depth, encode_rgb, DepthFormat, DepthRaster, ImageFormat, ImageHandle, PixelLayout,
    RgbRaster,
};
pub use renderer::Renderer;
pub use session::{
    capture_session, CancelToken, CaptureOptions, CaptureReport, CaptureSource, CaptureStatus,
    CapturedFrame, FrameCapture, FrameFailure,
};
pub use trigger::{CaptureTrigger, IntervalTrigger, ManualTrigger};
