//! `cameras.json`: per-frame capture metadata in the source frame.

use orbitcap_capture::{CaptureSource, CapturedFrame};
use orbitcap_core::ViewpointKind;
use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "cameras.json";

/// One captured frame as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub image_id: u32,
    pub camera_id: u32,
    pub image_name: String,
    pub viewpoint: String,
    pub kind: ViewpointKind,
    pub source: CaptureSource,
    /// Seconds since the session started.
    pub timestamp: f64,
    /// Source-frame position.
    pub position: [f64; 3],
    /// Source-frame rotation as `[x, y, z, w]`.
    pub rotation: [f64; 4],
    pub vertical_fov_deg: f64,
    pub near: f64,
    pub far: f64,
    pub width: u32,
    pub height: u32,
}

/// The full manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraManifest {
    pub frame_count: usize,
    pub frames: Vec<ManifestEntry>,
}

impl CameraManifest {
    /// Builds the manifest; `camera_ids[i]` is the camera of `frames[i]`.
    pub fn new(frames: &[CapturedFrame], camera_ids: &[u32]) -> Self {
        let frames: Vec<ManifestEntry> = (1u32..)
            .zip(frames.iter().zip(camera_ids))
            .map(|(image_id, (frame, &camera_id))| {
                let pose = &frame.viewpoint.pose;
                ManifestEntry {
                    image_id,
                    camera_id,
                    image_name: frame.rgb_file_name(),
                    viewpoint: frame.viewpoint.name.clone(),
                    kind: frame.viewpoint.kind,
                    source: frame.source,
                    timestamp: frame.timestamp.as_secs_f64(),
                    position: pose.position().to_array(),
                    rotation: pose.rotation().to_array(),
                    vertical_fov_deg: frame.intrinsics.vertical_fov_deg,
                    near: frame.intrinsics.near,
                    far: frame.intrinsics.far,
                    width: frame.intrinsics.width,
                    height: frame.intrinsics.height,
                }
            })
            .collect();
        Self {
            frame_count: frames.len(),
            frames,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
