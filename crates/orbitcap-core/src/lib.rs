//! Core types for orbitcap.
//!
//! This crate holds everything that does not touch a renderer or the disk:
//! - [`CameraIntrinsics`] and [`Pose`], the camera model shared by a dataset
//! - [`Viewpoint`], a planned, named pose
//! - [`sampler::generate`], the deterministic orbit sampler
//! - [`coords`], the axis flip between the source frame and the COLMAP frame

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Tuning knobs are plain floats compared against literals in tests
#![allow(clippy::float_cmp)]

pub mod camera;
pub mod coords;
pub mod error;
pub mod sampler;
pub mod viewpoint;

pub use camera::{look_rotation, CameraIntrinsics, Pose};
pub use coords::{flip_position, flip_rotation, TargetPose, AXIS_FLIP};
pub use error::{CoreError, Result, SamplingError};
pub use sampler::{generate, SamplingParams};
pub use viewpoint::{Viewpoint, ViewpointKind};

// Re-export glam types for convenience
pub use glam::{DMat3, DQuat, DVec3};
