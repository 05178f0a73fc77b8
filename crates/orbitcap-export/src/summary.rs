//! Human-readable dataset summary.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Local};
use orbitcap_capture::CapturedFrame;

use crate::colmap::CameraRecord;

pub const SUMMARY_FILE: &str = "dataset_summary.txt";

/// Renders `dataset_summary.txt`.
///
/// `camera_ids` holds the camera id assigned to each frame, in the same order.
pub fn summary_text(
    frames: &[CapturedFrame],
    cameras: &[CameraRecord],
    camera_ids: &[u32],
    generated_at: DateTime<Local>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Dataset summary ===");
    let _ = writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Images: {}", frames.len());

    let mut per_source: BTreeMap<&str, usize> = BTreeMap::new();
    for frame in frames {
        *per_source.entry(frame.source.label()).or_default() += 1;
    }
    for (label, count) in &per_source {
        let _ = writeln!(out, "  {label}: {count}");
    }

    let _ = writeln!(out, "Camera model: PINHOLE");
    let _ = writeln!(out, "Cameras: {}", cameras.len());
    for camera in cameras {
        let k = &camera.intrinsics;
        let _ = writeln!(out);
        let _ = writeln!(out, "Camera {}:", camera.id);
        let _ = writeln!(out, "  Resolution: {}x{}", k.width, k.height);
        let _ = writeln!(out, "  Vertical FOV: {:.2} deg", k.vertical_fov_deg);
        let _ = writeln!(out, "  Horizontal FOV: {:.2} deg", k.horizontal_fov_deg());
        let _ = writeln!(out, "  Focal length: {:.3} px", k.focal_length_px());
        let _ = writeln!(out, "  Near clip: {:.3}", k.near);
        let _ = writeln!(out, "  Far clip: {:.3}", k.far);
        let _ = writeln!(out, "  Aspect: {:.3}", k.aspect_ratio());
    }

    let has_depth = frames.iter().any(|f| f.depth.is_some());
    let _ = writeln!(out);
    let _ = writeln!(out, "Layout:");
    let _ = writeln!(out, "  images/          color images");
    if has_depth {
        let _ = writeln!(out, "  depth/           depth images");
    }
    let _ = writeln!(out, "  sparse/0/        COLMAP text model");
    let _ = writeln!(out, "    cameras.txt    intrinsics");
    let _ = writeln!(out, "    images.txt     extrinsics");
    let _ = writeln!(out, "    points3D.txt   empty point cloud");

    let _ = writeln!(out);
    let _ = writeln!(out, "Timeline:");
    for (i, frame) in frames.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>5}  {:>9.3}s  {:<8}  cam {}  {}",
            i + 1,
            frame.timestamp.as_secs_f64(),
            frame.source.label(),
            camera_ids.get(i).copied().unwrap_or(1),
            frame.rgb_file_name()
        );
    }
    out
}
