//! Sample, capture and export in one call.

use std::path::Path;

use orbitcap_capture::{capture_session, CancelToken, CaptureReport, CaptureStatus, Renderer};
use orbitcap_core::generate;
use orbitcap_export::{DatasetExporter, ExportReport};

use crate::config::Config;
use crate::error::{OrbitcapError, Result};

/// Outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Number of planned viewpoints.
    pub viewpoints: usize,
    pub capture: CaptureReport,
    pub export: ExportReport,
}

impl PipelineReport {
    pub fn status(&self) -> CaptureStatus {
        self.capture.status()
    }
}

/// Runs the full pipeline: generate viewpoints, capture every one with
/// `renderer`, export the frames to `out_dir`.
///
/// If some frames fail, the dataset is exported only when
/// `config.allow_partial` is set; otherwise [`OrbitcapError::PartialCapture`]
/// is returned and nothing is written.
pub fn run_pipeline(config: &Config, renderer: &mut dyn Renderer, out_dir: &Path) -> Result<PipelineReport> {
    run_pipeline_with_cancel(config, renderer, out_dir, None)
}

/// [`run_pipeline`] with cooperative cancellation between frames.
///
/// A cancelled run returns [`CaptureError::Aborted`](orbitcap_capture::CaptureError::Aborted)
/// wrapped in [`OrbitcapError::Capture`]; its frames can still be exported.
pub fn run_pipeline_with_cancel(
    config: &Config,
    renderer: &mut dyn Renderer,
    out_dir: &Path,
    cancel: Option<&CancelToken>,
) -> Result<PipelineReport> {
    config.validate()?;

    let viewpoints = generate(&config.sampling)?;
    log::info!("Generated {} viewpoints", viewpoints.len());

    let capture = capture_session(&viewpoints, renderer, &config.intrinsics, &config.capture, cancel)?;
    match capture.status() {
        CaptureStatus::Complete => {}
        CaptureStatus::Partial { failed } if config.allow_partial => {
            log::warn!("Exporting partial dataset: {failed} of {} frames failed", capture.attempted);
        }
        CaptureStatus::Partial { failed } => {
            return Err(OrbitcapError::PartialCapture {
                failed,
                report: Box::new(capture),
            });
        }
        CaptureStatus::Failed => {
            return Err(OrbitcapError::NothingCaptured {
                attempted: capture.attempted,
            });
        }
    }

    let export = DatasetExporter::new(config.export.clone()).export(&capture.frames, out_dir)?;
    log::info!(
        "Dataset written to {} ({} images)",
        out_dir.display(),
        export.image_count
    );

    Ok(PipelineReport {
        viewpoints: viewpoints.len(),
        capture,
        export,
    })
}
