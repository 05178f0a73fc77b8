//! Camera parameters (intrinsics and poses).
//!
//! Poses live in the source world frame: Y up, camera looking down +Z, with
//! +X to the right. Rotations map camera-local axes into that frame.

use glam::{DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Squared sine below which two unit vectors count as parallel.
const PARALLEL_EPSILON: f64 = 1e-12;

/// Pinhole camera intrinsics shared by a whole dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraIntrinsics {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Vertical field of view in degrees.
    pub vertical_fov_deg: f64,
    /// Near clipping distance.
    pub near: f64,
    /// Far clipping distance.
    pub far: f64,
}

impl CameraIntrinsics {
    /// Creates validated intrinsics.
    pub fn new(width: u32, height: u32, vertical_fov_deg: f64, near: f64, far: f64) -> Result<Self> {
        let intrinsics = Self {
            width,
            height,
            vertical_fov_deg,
            near,
            far,
        };
        intrinsics.validate()?;
        Ok(intrinsics)
    }

    /// Checks the invariants: non-zero size, `0 < fov < 180`, `0 < near < far`.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::InvalidIntrinsics(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.vertical_fov_deg.is_finite()
            || self.vertical_fov_deg <= 0.0
            || self.vertical_fov_deg >= 180.0
        {
            return Err(CoreError::InvalidIntrinsics(format!(
                "vertical fov must be in (0, 180) degrees, got {}",
                self.vertical_fov_deg
            )));
        }
        if !self.near.is_finite() || !self.far.is_finite() || self.near <= 0.0 || self.near >= self.far {
            return Err(CoreError::InvalidIntrinsics(format!(
                "clip planes must satisfy 0 < near < far, got near={} far={}",
                self.near, self.far
            )));
        }
        Ok(())
    }

    /// Focal length in pixels derived from the vertical field of view.
    pub fn focal_length_px(&self) -> f64 {
        let half_fov = (self.vertical_fov_deg * 0.5).to_radians();
        (f64::from(self.height) * 0.5) / half_fov.tan()
    }

    /// Principal point `(cx, cy)`, always the image center.
    pub fn principal_point(&self) -> (f64, f64) {
        (f64::from(self.width) * 0.5, f64::from(self.height) * 0.5)
    }

    /// Aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Horizontal field of view in degrees, assuming square pixels.
    pub fn horizontal_fov_deg(&self) -> f64 {
        (2.0 * (f64::from(self.width) / (2.0 * self.focal_length_px())).atan()).to_degrees()
    }
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            vertical_fov_deg: 60.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Builds the rotation whose +Z axis points along `forward` and whose +Y axis
/// is as close to `up` as possible.
///
/// When `forward` is parallel to `up` the world +Z axis (or +X, if that is
/// parallel too) is used as the up reference instead. A zero `forward`
/// yields the identity.
pub fn look_rotation(forward: DVec3, up: DVec3) -> DQuat {
    let forward = forward.normalize_or_zero();
    if forward == DVec3::ZERO {
        return DQuat::IDENTITY;
    }

    let mut right = up.normalize_or_zero().cross(forward);
    if right.length_squared() < PARALLEL_EPSILON {
        right = DVec3::Z.cross(forward);
    }
    if right.length_squared() < PARALLEL_EPSILON {
        right = DVec3::X.cross(forward);
    }
    let right = right.normalize();
    let up = forward.cross(right);

    DQuat::from_mat3(&DMat3::from_cols(right, up, forward)).normalize()
}

/// Position and orientation of a camera in the source world frame.
///
/// The rotation is kept unit-norm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPose", into = "RawPose")]
pub struct Pose {
    pub(crate) position: DVec3,
    pub(crate) rotation: DQuat,
}

impl Pose {
    /// Creates a pose, renormalizing the rotation.
    ///
    /// Rejects non-finite positions and zero-length or non-finite rotations.
    pub fn new(position: DVec3, rotation: DQuat) -> Result<Self> {
        if !position.is_finite() {
            return Err(CoreError::NonFinitePosition);
        }
        let length = rotation.length();
        if !rotation.is_finite() || length < f64::EPSILON {
            return Err(CoreError::DegenerateRotation);
        }
        Ok(Self {
            position,
            rotation: rotation / length,
        })
    }

    /// A pose at `position` with identity orientation.
    pub fn at(position: DVec3) -> Self {
        Self {
            position,
            rotation: DQuat::IDENTITY,
        }
    }

    /// A pose at `position` looking toward `target`.
    pub fn look_at(position: DVec3, target: DVec3, up: DVec3) -> Self {
        Self {
            position,
            rotation: look_rotation(target - position, up),
        }
    }

    /// Camera position.
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Unit orientation quaternion.
    pub fn rotation(&self) -> DQuat {
        self.rotation
    }

    /// Viewing direction (camera +Z).
    pub fn forward(&self) -> DVec3 {
        self.rotation * DVec3::Z
    }

    /// Camera up direction (camera +Y).
    pub fn up(&self) -> DVec3 {
        self.rotation * DVec3::Y
    }

    /// Camera right direction (camera +X).
    pub fn right(&self) -> DVec3 {
        self.rotation * DVec3::X
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(DVec3::ZERO)
    }
}

#[derive(Serialize, Deserialize)]
struct RawPose {
    position: DVec3,
    rotation: DQuat,
}

impl TryFrom<RawPose> for Pose {
    type Error = CoreError;

    fn try_from(raw: RawPose) -> Result<Self> {
        Pose::new(raw.position, raw.rotation)
    }
}

impl From<Pose> for RawPose {
    fn from(pose: Pose) -> Self {
        Self {
            position: pose.position,
            rotation: pose.rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focal_length() {
        let intrinsics = CameraIntrinsics::new(1920, 1080, 90.0, 0.1, 100.0).unwrap();
        // tan(45°) = 1, so focal = height / 2
        assert!((intrinsics.focal_length_px() - 540.0).abs() < 1e-9);
        assert_eq!(intrinsics.principal_point(), (960.0, 540.0));
    }

    #[test]
    fn test_horizontal_fov() {
        let intrinsics = CameraIntrinsics::new(1000, 1000, 60.0, 0.1, 10.0).unwrap();
        assert!((intrinsics.horizontal_fov_deg() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_intrinsics() {
        assert!(CameraIntrinsics::new(0, 1080, 60.0, 0.1, 100.0).is_err());
        assert!(CameraIntrinsics::new(1920, 1080, 0.0, 0.1, 100.0).is_err());
        assert!(CameraIntrinsics::new(1920, 1080, 180.0, 0.1, 100.0).is_err());
        assert!(CameraIntrinsics::new(1920, 1080, 60.0, 5.0, 1.0).is_err());
        assert!(CameraIntrinsics::new(1920, 1080, f64::NAN, 0.1, 100.0).is_err());
    }

    #[test]
    fn test_pose_normalizes_rotation() {
        let pose = Pose::new(DVec3::ONE, DQuat::from_xyzw(0.0, 2.0, 0.0, 0.0)).unwrap();
        assert!((pose.rotation().length() - 1.0).abs() < 1e-12);
        assert_eq!(
            Pose::new(DVec3::ZERO, DQuat::from_xyzw(0.0, 0.0, 0.0, 0.0)),
            Err(CoreError::DegenerateRotation)
        );
        assert_eq!(
            Pose::new(DVec3::new(f64::NAN, 0.0, 0.0), DQuat::IDENTITY),
            Err(CoreError::NonFinitePosition)
        );
    }

    #[test]
    fn test_look_rotation_axes() {
        let q = look_rotation(DVec3::Z, DVec3::Y);
        assert!(q.abs_diff_eq(DQuat::IDENTITY, 1e-12));

        let q = look_rotation(DVec3::X, DVec3::Y);
        assert!((q * DVec3::Z - DVec3::X).length() < 1e-12);
        assert!((q * DVec3::Y - DVec3::Y).length() < 1e-12);
    }

    #[test]
    fn test_look_rotation_straight_down_uses_fallback() {
        let q = look_rotation(DVec3::NEG_Y, DVec3::Y);
        assert!(q.is_finite());
        assert!((q.length() - 1.0).abs() < 1e-12);
        assert!((q * DVec3::Z - DVec3::NEG_Y).length() < 1e-12);
        assert!((q * DVec3::Y - DVec3::Z).length() < 1e-12);
    }

    #[test]
    fn test_look_at() {
        let pose = Pose::look_at(DVec3::new(0.0, 0.0, -5.0), DVec3::ZERO, DVec3::Y);
        assert!((pose.forward() - DVec3::Z).length() < 1e-12);
        assert!((pose.up() - DVec3::Y).length() < 1e-12);
        assert!((pose.right() - DVec3::X).length() < 1e-12);
    }

    #[test]
    fn test_pose_serde_renormalizes() {
        let json = r#"{"position":[1.0,2.0,3.0],"rotation":[0.0,0.0,0.0,2.0]}"#;
        let pose: Pose = serde_json::from_str(json).unwrap();
        assert_eq!(pose.rotation(), DQuat::IDENTITY);
        assert_eq!(pose.position(), DVec3::new(1.0, 2.0, 3.0));

        let bad = r#"{"position":[0.0,0.0,0.0],"rotation":[0.0,0.0,0.0,0.0]}"#;
        assert!(serde_json::from_str::<Pose>(bad).is_err());
    }
}
