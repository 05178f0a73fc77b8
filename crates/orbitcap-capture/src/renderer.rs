//! The renderer interface consumed by capture sessions.

use orbitcap_core::{CameraIntrinsics, Pose};

use crate::error::RenderResult;
use crate::raster::{DepthRaster, RgbRaster};

/// Produces rasters for a camera pose.
///
/// Implementations return [`RenderError::Unavailable`](crate::RenderError::Unavailable)
/// when they can no longer serve any request (lost device, closed window).
/// Any other error affects only the frame being rendered.
pub trait Renderer {
    /// Renders a color image at `intrinsics.width` x `intrinsics.height`.
    fn render_rgb(&mut self, pose: &Pose, intrinsics: &CameraIntrinsics) -> RenderResult<RgbRaster>;

    /// Renders eye-space depth at the same resolution as the color image.
    fn render_depth(&mut self, pose: &Pose, intrinsics: &CameraIntrinsics) -> RenderResult<DepthRaster>;
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn render_rgb(&mut self, pose: &Pose, intrinsics: &CameraIntrinsics) -> RenderResult<RgbRaster> {
        (**self).render_rgb(pose, intrinsics)
    }

    fn render_depth(&mut self, pose: &Pose, intrinsics: &CameraIntrinsics) -> RenderResult<DepthRaster> {
        (**self).render_depth(pose, intrinsics)
    }
}
