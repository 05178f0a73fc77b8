//! Axis-flip conversion between the source frame and the COLMAP frame.
//!
//! The source frame is Y-up / Z-forward; the target is Y-down / Z-backward.
//! Both are related by `F = diag(1, -1, -1)`. Positions are mapped as points
//! (`F·p`) and rotations by conjugation (`F·R·F⁻¹`), always with the same `F`.
//! `F` is its own inverse, so the same functions also convert back.

use glam::{DMat3, DQuat, DVec3};

use crate::camera::Pose;

/// The axis-flip matrix `diag(1, -1, -1)`.
pub const AXIS_FLIP: DMat3 = DMat3::from_diagonal(DVec3::new(1.0, -1.0, -1.0));

/// Converts a position from the source frame to the target frame.
pub fn flip_position(position: DVec3) -> DVec3 {
    AXIS_FLIP * position
}

/// Converts an orientation from the source frame to the target frame.
///
/// The result is a unit quaternion with a non-negative scalar part, so equal
/// rotations always serialize identically.
pub fn flip_rotation(rotation: DQuat) -> DQuat {
    let matrix = AXIS_FLIP * DMat3::from_quat(rotation.normalize()) * AXIS_FLIP.transpose();
    canonical(DQuat::from_mat3(&matrix).normalize())
}

/// Returns `q` or `-q`, whichever has `w >= 0`.
pub fn canonical(q: DQuat) -> DQuat {
    if q.w < 0.0 {
        -q
    } else {
        q
    }
}

/// A pose expressed in the target (COLMAP) frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPose {
    /// Converted position.
    pub translation: DVec3,
    /// Converted unit rotation, `w >= 0`.
    pub rotation: DQuat,
}

impl TargetPose {
    /// Converts a source-frame pose.
    pub fn from_source(pose: &Pose) -> Self {
        Self {
            translation: flip_position(pose.position()),
            rotation: flip_rotation(pose.rotation()),
        }
    }

    /// Converts back into the source frame.
    pub fn to_source(&self) -> Pose {
        Pose {
            position: flip_position(self.translation),
            rotation: flip_rotation(self.rotation),
        }
    }

    /// Rotation as `[w, x, y, z]` (scalar first).
    pub fn wxyz(&self) -> [f64; 4] {
        [self.rotation.w, self.rotation.x, self.rotation.y, self.rotation.z]
    }
}
