//! Writes captured frames as a COLMAP-style dataset.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Local;
use orbitcap_capture::CapturedFrame;
use orbitcap_core::TargetPose;
use serde::{Deserialize, Serialize};

use crate::colmap::{
    self, cameras_text, images_text, parse_cameras_text, parse_images_text, points_text,
    CameraRecord, ImageRecord, SparseModel, CAMERAS_FILE, IMAGES_FILE, POINTS_FILE,
};
use crate::error::{ExportError, Result};
use crate::manifest::{CameraManifest, MANIFEST_FILE};
use crate::ngp::{NgpTransforms, DEFAULT_AABB_SCALE, TRANSFORMS_FILE};
use crate::storage::{ByteSink, FsSink};
use crate::summary::{summary_text, SUMMARY_FILE};

/// How frames map to camera records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraPolicy {
    /// One camera for the whole dataset; differing intrinsics are an error.
    #[default]
    Shared,
    /// One camera per distinct intrinsics value, numbered in order of first use.
    PerIntrinsics,
}

/// Which files an export produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Write color and depth image files.
    pub write_images: bool,
    /// Write `dataset_summary.txt`.
    pub write_summary: bool,
    /// Write `cameras.json`.
    pub write_manifest: bool,
    /// Write Instant-NGP `transforms.json`.
    pub write_transforms: bool,
    pub aabb_scale: u32,
    pub camera_policy: CameraPolicy,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            write_images: true,
            write_summary: true,
            write_manifest: true,
            write_transforms: false,
            aabb_scale: DEFAULT_AABB_SCALE,
            camera_policy: CameraPolicy::Shared,
        }
    }
}

/// What an export wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub out_dir: PathBuf,
    pub image_count: usize,
    pub camera_count: usize,
    /// Every written file, in write order.
    pub files: Vec<PathBuf>,
}

/// Exports frames with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct DatasetExporter {
    options: ExportOptions,
}

/// Sink plus bookkeeping for one export.
struct Output<'a> {
    root: &'a Path,
    sink: &'a mut dyn ByteSink,
    files: Vec<PathBuf>,
}

impl Output<'_> {
    fn put(&mut self, relative: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
        let path = self.root.join(relative);
        self.sink
            .write(&path, bytes)
            .map_err(|err| ExportError::io(&path, err))?;
        log::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        self.files.push(path);
        Ok(())
    }
}

impl DatasetExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Exports to `out_dir` on the local filesystem.
    pub fn export(&self, frames: &[CapturedFrame], out_dir: &Path) -> Result<ExportReport> {
        self.export_to(frames, out_dir, &mut FsSink)
    }

    /// Exports through `sink`. Nothing is written if validation fails.
    pub fn export_to(
        &self,
        frames: &[CapturedFrame],
        out_dir: &Path,
        sink: &mut dyn ByteSink,
    ) -> Result<ExportReport> {
        check_frames(frames)?;
        let (cameras, camera_ids) = assign_cameras(frames, self.options.camera_policy)?;
        log::info!(
            "Exporting {} frames with {} camera(s) to {}",
            frames.len(),
            cameras.len(),
            out_dir.display()
        );

        let mut out = Output {
            root: out_dir,
            sink,
            files: Vec::new(),
        };

        if self.options.write_images {
            for frame in frames {
                out.put(Path::new("images").join(frame.rgb_file_name()), frame.rgb.bytes())?;
                if let (Some(depth), Some(name)) = (&frame.depth, frame.depth_file_name()) {
                    out.put(Path::new("depth").join(name), depth.bytes())?;
                }
            }
        }

        let images: Vec<ImageRecord> = (1u32..)
            .zip(frames.iter().zip(&camera_ids))
            .map(|(id, (frame, &camera_id))| ImageRecord {
                id,
                pose: TargetPose::from_source(&frame.viewpoint.pose),
                camera_id,
                name: frame.rgb_file_name(),
            })
            .collect();

        let sparse = colmap::sparse_dir(Path::new(""));
        let cameras_txt = cameras_text(&cameras);
        let images_txt = images_text(&images);
        out.put(sparse.join(CAMERAS_FILE), cameras_txt.as_bytes())?;
        out.put(sparse.join(IMAGES_FILE), images_txt.as_bytes())?;
        out.put(sparse.join(POINTS_FILE), points_text().as_bytes())?;

        if self.options.write_summary {
            let summary = summary_text(frames, &cameras, &camera_ids, Local::now());
            out.put(SUMMARY_FILE, summary.as_bytes())?;
        }

        if self.options.write_manifest {
            let manifest = CameraManifest::new(frames, &camera_ids);
            out.put(MANIFEST_FILE, manifest.to_json()?.as_bytes())?;
        }

        if self.options.write_transforms {
            // Derived from the text just written so both agree to the printed precision
            let sparse_root = out_dir.join(&sparse);
            let model = SparseModel {
                cameras: parse_cameras_text(&cameras_txt, &sparse_root.join(CAMERAS_FILE))?,
                images: parse_images_text(&images_txt, &sparse_root.join(IMAGES_FILE))?,
                point_count: 0,
            };
            let transforms = NgpTransforms::from_sparse(&model, self.options.aabb_scale)?;
            out.put(TRANSFORMS_FILE, transforms.to_json()?.as_bytes())?;
        }

        log::info!("Export finished: {} files", out.files.len());
        Ok(ExportReport {
            out_dir: out_dir.to_path_buf(),
            image_count: frames.len(),
            camera_count: cameras.len(),
            files: out.files,
        })
    }
}

/// Exports with default options to the local filesystem.
pub fn export(frames: &[CapturedFrame], out_dir: &Path) -> Result<ExportReport> {
    DatasetExporter::default().export(frames, out_dir)
}

/// Rejects frames whose intrinsics are invalid or whose image file names
/// collide.
fn check_frames(frames: &[CapturedFrame]) -> Result<()> {
    let mut names = HashSet::with_capacity(frames.len());
    for (index, frame) in frames.iter().enumerate() {
        frame
            .intrinsics
            .validate()
            .map_err(|source| ExportError::InvalidIntrinsics {
                index,
                image_name: frame.image_name.clone(),
                source,
            })?;
        let name = frame.rgb_file_name();
        if names.contains(&name) {
            return Err(ExportError::DuplicateImageName { index, name });
        }
        names.insert(name);
    }
    Ok(())
}

/// Validates `frames` and returns the camera records plus the camera id of
/// each frame.
fn assign_cameras(frames: &[CapturedFrame], policy: CameraPolicy) -> Result<(Vec<CameraRecord>, Vec<u32>)> {
    let first = frames.first().ok_or(ExportError::EmptyDataset)?;

    match policy {
        CameraPolicy::Shared => {
            if let Some((index, frame)) = frames
                .iter()
                .enumerate()
                .find(|(_, frame)| frame.intrinsics != first.intrinsics)
            {
                return Err(ExportError::IntrinsicsMismatch {
                    index,
                    image_name: frame.image_name.clone(),
                });
            }
            let camera = CameraRecord {
                id: 1,
                intrinsics: first.intrinsics,
            };
            Ok((vec![camera], vec![1; frames.len()]))
        }
        CameraPolicy::PerIntrinsics => {
            let mut cameras: Vec<CameraRecord> = Vec::new();
            let mut ids = Vec::with_capacity(frames.len());
            for frame in frames {
                let id = match cameras.iter().find(|c| c.intrinsics == frame.intrinsics) {
                    Some(camera) => camera.id,
                    None => {
                        let id = cameras.len() as u32 + 1;
                        cameras.push(CameraRecord {
                            id,
                            intrinsics: frame.intrinsics,
                        });
                        id
                    }
                };
                ids.push(id);
            }
            Ok((cameras, ids))
        }
    }
}
