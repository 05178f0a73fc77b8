//! orbitcap: capture training datasets for 3D reconstruction from any renderer.
//!
//! The pipeline has three stages:
//!
//! 1. **Sampling** places cameras on concentric rings and height levels around
//!    a subject, plus a few special views ([`generate`]).
//! 2. **Capture** renders every viewpoint through a [`Renderer`] you provide
//!    and encodes the images in memory ([`capture_session`]).
//! 3. **Export** writes a COLMAP text model with the images, ready for
//!    Gaussian splatting or NeRF training ([`DatasetExporter`]).
//!
//! # Quick Start
//!
//! ```no_run
//! use orbitcap::*;
//!
//! struct Flat;
//!
//! impl Renderer for Flat {
//!     fn render_rgb(&mut self, _: &Pose, k: &CameraIntrinsics) -> RenderResult<RgbRaster> {
//!         Ok(RgbRaster::filled(k.width, k.height, [128, 128, 128]))
//!     }
//!     fn render_depth(&mut self, _: &Pose, k: &CameraIntrinsics) -> RenderResult<DepthRaster> {
//!         Ok(DepthRaster::filled(k.width, k.height, 1.0))
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!     let config = Config::load("orbitcap.json")?;
//!     let report = run_pipeline(&config, &mut Flat, std::path::Path::new("dataset"))?;
//!     println!("{} images written", report.export.image_count);
//!     Ok(())
//! }
//! ```

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::Config;
pub use error::{OrbitcapError, Result};
pub use pipeline::{run_pipeline, run_pipeline_with_cancel, PipelineReport};

// Re-export core types
pub use orbitcap_core::{
    generate, look_rotation, CameraIntrinsics, CoreError, Pose, SamplingError, SamplingParams,
    TargetPose, Viewpoint, ViewpointKind,
};

// Re-export capture types
pub use orbitcap_capture::{
    capture_session, CancelToken, CaptureError, CaptureOptions, CaptureReport, CaptureSource,
    CaptureStatus, CaptureTrigger, CapturedFrame, DepthFormat, DepthRaster, FrameCapture,
    FrameFailure, ImageFormat, ImageHandle, IntervalTrigger, ManualTrigger, PixelLayout,
    RenderError, RenderResult, Renderer, RgbRaster,
};

// Re-export export types
pub use orbitcap_export::{
    read_sparse_text, validate_dataset, write_transforms, ByteSink, CameraPolicy, DatasetExporter,
    ExportError, ExportOptions, ExportReport, FsSink, MemorySink, SparseModel,
};

// Re-export glam types for convenience
pub use glam::{DQuat, DVec3};

/// Initializes `env_logger` from `RUST_LOG`. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
