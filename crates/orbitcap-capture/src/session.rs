//! Capture sessions: render each viewpoint, encode the rasters, collect frames.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use orbitcap_core::{CameraIntrinsics, Pose, Viewpoint};
use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, RenderError, RenderResult};
use crate::raster::{encode_depth, encode_rgb, DepthFormat, ImageFormat, ImageHandle};
use crate::renderer::Renderer;
use crate::trigger::CaptureTrigger;

/// How rasters are captured and encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    /// Also render and store a depth image per frame.
    pub capture_depth: bool,
    /// Format of the color image.
    pub image_format: ImageFormat,
    /// JPEG quality, 1 to 100. Ignored for PNG.
    pub jpeg_quality: u8,
    /// Format of the depth image.
    pub depth_format: DepthFormat,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            capture_depth: true,
            image_format: ImageFormat::Jpeg,
            jpeg_quality: 95,
            depth_format: DepthFormat::Png16,
        }
    }
}

/// What caused a frame to be captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    /// A viewpoint from the sampler.
    Planned,
    /// An explicit user request.
    Manual,
    /// The automatic interval trigger.
    Interval,
}

impl CaptureSource {
    /// Short lowercase label, also used as the viewpoint name of freehand frames.
    pub fn label(self) -> &'static str {
        match self {
            CaptureSource::Planned => "planned",
            CaptureSource::Manual => "manual",
            CaptureSource::Interval => "interval",
        }
    }
}

/// A rendered and encoded viewpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    pub viewpoint: Viewpoint,
    /// Unique within the session, without extension.
    pub image_name: String,
    pub rgb: ImageHandle,
    pub depth: Option<ImageHandle>,
    pub intrinsics: CameraIntrinsics,
    pub source: CaptureSource,
    /// Time since the session started.
    pub timestamp: Duration,
}

impl CapturedFrame {
    /// File name of the color image, e.g. `r0_l0_a00_0000.jpg`.
    pub fn rgb_file_name(&self) -> String {
        format!("{}.{}", self.image_name, self.rgb.extension())
    }

    /// File name of the depth image, e.g. `r0_l0_a00_0000_depth.png`.
    pub fn depth_file_name(&self) -> Option<String> {
        self.depth
            .as_ref()
            .map(|depth| format!("{}_depth.{}", self.image_name, depth.extension()))
    }
}

/// A viewpoint that could not be captured.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFailure {
    pub viewpoint_index: u32,
    pub viewpoint_name: String,
    pub error: RenderError,
}

/// Overall outcome of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Complete,
    Partial { failed: usize },
    Failed,
}

/// Frames and failures collected by a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureReport {
    pub frames: Vec<CapturedFrame>,
    pub failures: Vec<FrameFailure>,
    /// Number of capture attempts, successful or not.
    pub attempted: usize,
}

impl CaptureReport {
    pub fn status(&self) -> CaptureStatus {
        if self.failures.is_empty() {
            CaptureStatus::Complete
        } else if self.frames.is_empty() {
            CaptureStatus::Failed
        } else {
            CaptureStatus::Partial {
                failed: self.failures.len(),
            }
        }
    }

    /// Viewpoint indices of failed frames, in attempt order.
    pub fn failed_indices(&self) -> Vec<u32> {
        self.failures.iter().map(|f| f.viewpoint_index).collect()
    }
}

/// Cooperative cancellation flag, checked between frames.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Accumulates frames for one session.
///
/// Used directly for freehand capture and by [`capture_session`] for
/// planned viewpoints.
#[derive(Debug)]
pub struct FrameCapture {
    options: CaptureOptions,
    started: Instant,
    sequence: u32,
    frames: Vec<CapturedFrame>,
    failures: Vec<FrameFailure>,
}

impl FrameCapture {
    pub fn new(options: CaptureOptions) -> Self {
        Self {
            options,
            started: Instant::now(),
            sequence: 0,
            frames: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    /// Time since this capture was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Renders and records one viewpoint.
    ///
    /// Per-frame errors are recorded as failures and returned.
    /// [`RenderError::Unavailable`] is returned without being recorded.
    pub fn capture_viewpoint(
        &mut self,
        renderer: &mut dyn Renderer,
        viewpoint: &Viewpoint,
        intrinsics: &CameraIntrinsics,
        source: CaptureSource,
    ) -> RenderResult<&CapturedFrame> {
        let sequence = self.sequence;
        self.sequence += 1;

        match self.render_frame(renderer, viewpoint, intrinsics, source, sequence) {
            Ok(frame) => {
                let slot = self.frames.len();
                self.frames.push(frame);
                Ok(&self.frames[slot])
            }
            Err(error) => {
                if !matches!(error, RenderError::Unavailable(_)) {
                    self.failures.push(FrameFailure {
                        viewpoint_index: viewpoint.index,
                        viewpoint_name: viewpoint.name.clone(),
                        error: error.clone(),
                    });
                }
                Err(error)
            }
        }
    }

    /// Captures an unplanned pose, e.g. from a trigger.
    pub fn capture_one(
        &mut self,
        renderer: &mut dyn Renderer,
        pose: Pose,
        intrinsics: &CameraIntrinsics,
        source: CaptureSource,
    ) -> RenderResult<&CapturedFrame> {
        let viewpoint = Viewpoint::freehand(self.sequence, source.label(), pose);
        self.capture_viewpoint(renderer, &viewpoint, intrinsics, source)
    }

    /// Polls `trigger` at the current session time and captures `pose` if it fires.
    pub fn capture_if_triggered(
        &mut self,
        renderer: &mut dyn Renderer,
        trigger: &mut dyn CaptureTrigger,
        pose: Pose,
        intrinsics: &CameraIntrinsics,
    ) -> RenderResult<Option<&CapturedFrame>> {
        if !trigger.poll(self.elapsed(), pose.position()) {
            return Ok(None);
        }
        self.capture_one(renderer, pose, intrinsics, trigger.source())
            .map(Some)
    }

    pub fn frames(&self) -> &[CapturedFrame] {
        &self.frames
    }

    pub fn failures(&self) -> &[FrameFailure] {
        &self.failures
    }

    /// Number of attempts so far.
    pub fn attempted(&self) -> usize {
        self.sequence as usize
    }

    pub fn finish(self) -> CaptureReport {
        CaptureReport {
            attempted: self.attempted(),
            frames: self.frames,
            failures: self.failures,
        }
    }

    fn render_frame(
        &self,
        renderer: &mut dyn Renderer,
        viewpoint: &Viewpoint,
        intrinsics: &CameraIntrinsics,
        source: CaptureSource,
        sequence: u32,
    ) -> RenderResult<CapturedFrame> {
        intrinsics.validate()?;
        let rgb_raster = renderer.render_rgb(&viewpoint.pose, intrinsics)?;
        check_size(intrinsics, rgb_raster.width, rgb_raster.height)?;
        let rgb = encode_rgb(&rgb_raster, self.options.image_format, self.options.jpeg_quality)?;

        let depth = if self.options.capture_depth {
            let depth_raster = renderer.render_depth(&viewpoint.pose, intrinsics)?;
            check_size(intrinsics, depth_raster.width, depth_raster.height)?;
            Some(encode_depth(
                &depth_raster,
                self.options.depth_format,
                intrinsics.near,
                intrinsics.far,
            )?)
        } else {
            None
        };

        Ok(CapturedFrame {
            viewpoint: viewpoint.clone(),
            image_name: format!("{}_{sequence:04}", viewpoint.name),
            rgb,
            depth,
            intrinsics: *intrinsics,
            source,
            timestamp: self.elapsed(),
        })
    }
}

fn check_size(intrinsics: &CameraIntrinsics, width: u32, height: u32) -> RenderResult<()> {
    if width == intrinsics.width && height == intrinsics.height {
        Ok(())
    } else {
        Err(RenderError::SizeMismatch {
            expected_width: intrinsics.width,
            expected_height: intrinsics.height,
            width,
            height,
        })
    }
}

/// Captures every viewpoint in order.
///
/// Frames that fail to render are recorded in the report and skipped. The
/// session ends early if the renderer becomes unavailable or `cancel` is set;
/// in both cases the error carries the frames captured so far.
pub fn capture_session(
    viewpoints: &[Viewpoint],
    renderer: &mut dyn Renderer,
    intrinsics: &CameraIntrinsics,
    options: &CaptureOptions,
    cancel: Option<&CancelToken>,
) -> Result<CaptureReport, CaptureError> {
    intrinsics.validate()?;
    log::info!(
        "Capturing {} viewpoints at {}x{} (depth: {})",
        viewpoints.len(),
        intrinsics.width,
        intrinsics.height,
        options.capture_depth
    );

    let mut capture = FrameCapture::new(options.clone());
    for viewpoint in viewpoints {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            log::info!("Capture cancelled after {} attempts", capture.attempted());
            return Err(CaptureError::Aborted(Box::new(capture.finish())));
        }

        match capture.capture_viewpoint(renderer, viewpoint, intrinsics, CaptureSource::Planned) {
            Ok(frame) => log::debug!(
                "Captured {} ({} bytes)",
                frame.image_name,
                frame.rgb.len()
            ),
            Err(RenderError::Unavailable(reason)) => {
                log::warn!("Renderer unavailable at viewpoint {}: {reason}", viewpoint.name);
                return Err(CaptureError::RendererUnavailable {
                    reason,
                    report: Box::new(capture.finish()),
                });
            }
            Err(err) => log::warn!("Failed to capture viewpoint {}: {err}", viewpoint.name),
        }
    }

    let report = capture.finish();
    log::info!(
        "Captured {}/{} frames ({} failed)",
        report.frames.len(),
        report.attempted,
        report.failures.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{DepthRaster, RgbRaster};
    use crate::trigger::ManualTrigger;
    use orbitcap_core::{generate, SamplingParams};
    use glam::DVec3;

    /// Renders flat rasters and fails on chosen call numbers.
    #[derive(Default)]
    struct MockRenderer {
        calls: u32,
        fail_on: Vec<u32>,
        unavailable_on: Option<u32>,
        wrong_size: bool,
    }

    impl MockRenderer {
        fn next_call(&mut self) -> RenderResult<()> {
            let call = self.calls;
            self.calls += 1;
            if self.unavailable_on == Some(call) {
                return Err(RenderError::Unavailable("device lost".into()));
            }
            if self.fail_on.contains(&call) {
                return Err(RenderError::Failed(format!("call {call}")));
            }
            Ok(())
        }
    }

    impl Renderer for MockRenderer {
        fn render_rgb(&mut self, _pose: &Pose, intrinsics: &CameraIntrinsics) -> RenderResult<RgbRaster> {
            self.next_call()?;
            let width = if self.wrong_size { intrinsics.width + 1 } else { intrinsics.width };
            Ok(RgbRaster::filled(width, intrinsics.height, [64, 128, 255]))
        }

        fn render_depth(&mut self, _pose: &Pose, intrinsics: &CameraIntrinsics) -> RenderResult<DepthRaster> {
            Ok(DepthRaster::filled(intrinsics.width, intrinsics.height, 5.0))
        }
    }

    fn small_intrinsics() -> CameraIntrinsics {
        CameraIntrinsics::new(8, 6, 60.0, 0.1, 100.0).unwrap()
    }

    fn ring(count: u32) -> Vec<Viewpoint> {
        let mut params = SamplingParams::single_ring(DVec3::ZERO, 5.0, count, 2.0);
        params.min_cameras_per_level = 1;
        params.include_special = false;
        generate(&params).unwrap()
    }

    fn png_options(capture_depth: bool) -> CaptureOptions {
        CaptureOptions {
            capture_depth,
            image_format: ImageFormat::Png,
            ..CaptureOptions::default()
        }
    }

    #[test]
    fn test_session_captures_all_in_order() {
        let viewpoints = ring(4);
        let mut renderer = MockRenderer::default();
        let report = capture_session(&viewpoints, &mut renderer, &small_intrinsics(), &png_options(true), None)
            .unwrap();

        assert_eq!(report.status(), CaptureStatus::Complete);
        assert_eq!(report.attempted, 4);
        let names: Vec<_> = report.frames.iter().map(|f| f.image_name.as_str()).collect();
        assert_eq!(
            names,
            ["r0_l0_a00_0000", "r0_l0_a01_0001", "r0_l0_a02_0002", "r0_l0_a03_0003"]
        );
        for frame in &report.frames {
            assert_eq!(frame.source, CaptureSource::Planned);
            assert_eq!(frame.rgb.extension(), "png");
            assert_eq!(frame.depth_file_name().unwrap(), format!("{}_depth.png", frame.image_name));
        }
    }

    #[test]
    fn test_depth_disabled() {
        let mut renderer = MockRenderer::default();
        let report = capture_session(&ring(2), &mut renderer, &small_intrinsics(), &png_options(false), None)
            .unwrap();
        assert!(report.frames.iter().all(|f| f.depth.is_none()));
        assert_eq!(report.frames[0].rgb_file_name(), "r0_l0_a00_0000.png");
    }

    #[test]
    fn test_frame_failure_is_skipped() {
        let mut renderer = MockRenderer {
            fail_on: vec![1],
            ..MockRenderer::default()
        };
        let report = capture_session(&ring(3), &mut renderer, &small_intrinsics(), &png_options(false), None)
            .unwrap();

        assert_eq!(report.status(), CaptureStatus::Partial { failed: 1 });
        assert_eq!(report.failed_indices(), vec![1]);
        assert_eq!(report.failures[0].viewpoint_name, "r0_l0_a01");
        // Sequence numbers stay unique across the gap
        assert_eq!(report.frames[1].image_name, "r0_l0_a02_0002");
    }

    #[test]
    fn test_all_failed() {
        let mut renderer = MockRenderer {
            fail_on: vec![0, 1],
            ..MockRenderer::default()
        };
        let report = capture_session(&ring(2), &mut renderer, &small_intrinsics(), &png_options(false), None)
            .unwrap();
        assert_eq!(report.status(), CaptureStatus::Failed);
    }

    #[test]
    fn test_size_mismatch_is_frame_failure() {
        let mut renderer = MockRenderer {
            wrong_size: true,
            ..MockRenderer::default()
        };
        let report = capture_session(&ring(1), &mut renderer, &small_intrinsics(), &png_options(false), None)
            .unwrap();
        assert_eq!(
            report.failures[0].error,
            RenderError::SizeMismatch {
                expected_width: 8,
                expected_height: 6,
                width: 9,
                height: 6
            }
        );
    }

    #[test]
    fn test_unavailable_keeps_prior_frames() {
        let mut renderer = MockRenderer {
            unavailable_on: Some(2),
            ..MockRenderer::default()
        };
        let err = capture_session(&ring(4), &mut renderer, &small_intrinsics(), &png_options(false), None)
            .unwrap_err();

        assert!(matches!(err, CaptureError::RendererUnavailable { ref reason, .. } if reason == "device lost"));
        let report = err.into_report().unwrap();
        assert_eq!(report.frames.len(), 2);
        assert!(report.failures.is_empty());
        assert_eq!(report.attempted, 3);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.clone().cancel();
        assert!(token.is_cancelled());

        let mut renderer = MockRenderer::default();
        let err = capture_session(&ring(3), &mut renderer, &small_intrinsics(), &png_options(false), Some(&token))
            .unwrap_err();
        let report = err.report().unwrap();
        assert!(report.frames.is_empty());
        assert_eq!(renderer.calls, 0);
    }

    #[test]
    fn test_invalid_intrinsics_renders_nothing() {
        let mut intrinsics = small_intrinsics();
        intrinsics.width = 0;
        let mut renderer = MockRenderer::default();
        let err = capture_session(&ring(2), &mut renderer, &intrinsics, &png_options(false), None).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidIntrinsics(_)));
        assert!(err.report().is_none());
        assert_eq!(renderer.calls, 0);
    }

    #[test]
    fn test_capture_one_rejects_zero_fov() {
        let mut intrinsics = small_intrinsics();
        intrinsics.vertical_fov_deg = 0.0;
        let mut renderer = MockRenderer::default();
        let mut capture = FrameCapture::new(png_options(false));

        let pose = Pose::look_at(DVec3::new(0.0, 1.0, -4.0), DVec3::ZERO, DVec3::Y);
        let err = capture
            .capture_one(&mut renderer, pose, &intrinsics, CaptureSource::Manual)
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidIntrinsics(_)));
        assert_eq!(renderer.calls, 0);

        let report = capture.finish();
        assert!(report.frames.is_empty());
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn test_capture_one_and_trigger() {
        let intrinsics = small_intrinsics();
        let mut renderer = MockRenderer::default();
        let mut capture = FrameCapture::new(png_options(false));

        let pose = Pose::look_at(DVec3::new(0.0, 1.0, -4.0), DVec3::ZERO, DVec3::Y);
        let frame = capture
            .capture_one(&mut renderer, pose, &intrinsics, CaptureSource::Manual)
            .unwrap();
        assert_eq!(frame.image_name, "manual_0000");
        assert!(!frame.viewpoint.is_radial());

        let mut trigger = ManualTrigger::new();
        assert!(capture
            .capture_if_triggered(&mut renderer, &mut trigger, pose, &intrinsics)
            .unwrap()
            .is_none());
        trigger.request();
        let frame = capture
            .capture_if_triggered(&mut renderer, &mut trigger, pose, &intrinsics)
            .unwrap()
            .unwrap();
        assert_eq!(frame.image_name, "manual_0001");
        assert_eq!(frame.viewpoint.index, 1);

        let report = capture.finish();
        assert_eq!(report.frames.len(), 2);
        assert_eq!(report.attempted, 2);
    }

    #[test]
    fn test_options_json_defaults() {
        let options: CaptureOptions = serde_json::from_str(r#"{"image_format": "png"}"#).unwrap();
        assert_eq!(options.image_format, ImageFormat::Png);
        assert_eq!(options.jpeg_quality, 95);
        assert!(options.capture_depth);
        assert_eq!(options.depth_format, DepthFormat::Png16);
    }
}
