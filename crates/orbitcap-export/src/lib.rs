//! Dataset export for orbitcap.
//!
//! Turns captured frames into a directory that structure-from-motion and
//! radiance-field training tools can consume:
//!
//! ```text
//! <out_dir>/images/<image_name>.<ext>
//! <out_dir>/depth/<image_name>_depth.<ext>
//! <out_dir>/sparse/0/{cameras,images,points3D}.txt
//! <out_dir>/dataset_summary.txt      (optional)
//! <out_dir>/cameras.json             (optional)
//! <out_dir>/transforms.json          (optional, Instant-NGP)
//! ```
//!
//! All writes go through a [`ByteSink`], so exports can be tested in memory.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Camera and image counts fit in u32
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::float_cmp)]

pub mod colmap;
pub mod error;
pub mod exporter;
pub mod manifest;
pub mod ngp;
pub mod storage;
pub mod summary;

pub use colmap::{
    fmt6, read_cameras_text, read_images_text, read_sparse_text, validate_dataset, ColmapCamera,
    ColmapImage, SparseModel,
};
pub use error::{ExportError, Result};
pub use exporter::{export, CameraPolicy, DatasetExporter, ExportOptions, ExportReport};
pub use manifest::{CameraManifest, ManifestEntry};
pub use ngp::{write_transforms, NgpFrame, NgpTransforms};
pub use storage::{ByteSink, FsSink, MemorySink};
