//! Deterministic viewpoint sampling around a target.
//!
//! Cameras are placed on concentric rings at several heights, each looking at
//! the target, followed by a fixed set of special viewpoints (top-down,
//! bottom-up, close-ups). Output order is stable and defines image IDs later
//! on, so nothing here may depend on hashing or randomness.

use std::f64::consts::{FRAC_PI_2, TAU};

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::camera::{look_rotation, Pose};
use crate::error::SamplingError;
use crate::viewpoint::{Viewpoint, ViewpointKind};

/// Parameters for [`generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    /// Point every ring camera looks at.
    pub center: DVec3,

    /// Ring radii, one ring per entry.
    pub radii: Vec<f64>,

    /// Target camera count per ring. A single entry applies to every ring.
    pub cameras_per_radius: Vec<u32>,

    /// Number of height levels per ring.
    pub vertical_levels: u32,

    /// Height of the lowest level, relative to `center`.
    pub min_height: f64,

    /// Height of the highest level, relative to `center`.
    pub max_height: f64,

    /// Lower bound on cameras per level; smaller counts are raised to it.
    pub min_cameras_per_level: u32,

    /// Extra height of the top-down camera above `max_height`.
    pub top_clearance: f64,

    /// The bottom-up camera is only added when `min_height` exceeds this.
    pub bottom_min_height: f64,

    /// Height of the bottom-up camera.
    pub bottom_height: f64,

    /// Height of the close-up cameras above `min_height`.
    pub close_up_height_offset: f64,

    /// Close-up radius as a fraction of the smallest ring radius.
    pub close_up_radius_factor: f64,

    /// Whether to append the top, bottom and close-up viewpoints.
    pub include_special: bool,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            center: DVec3::ZERO,
            radii: vec![8.0],
            cameras_per_radius: vec![12],
            vertical_levels: 3,
            min_height: 1.0,
            max_height: 6.0,
            min_cameras_per_level: 6,
            top_clearance: 2.0,
            bottom_min_height: 0.5,
            bottom_height: 0.3,
            close_up_height_offset: 1.0,
            close_up_radius_factor: 0.5,
            include_special: true,
        }
    }
}

impl SamplingParams {
    /// A single ring with `count` cameras at one height.
    pub fn single_ring(center: DVec3, radius: f64, count: u32, height: f64) -> Self {
        Self {
            center,
            radii: vec![radius],
            cameras_per_radius: vec![count],
            vertical_levels: 1,
            min_height: height,
            max_height: height,
            ..Self::default()
        }
    }

    /// Checks parameters that cannot be repaired by clamping.
    pub fn validate(&self) -> Result<(), SamplingError> {
        if self.radii.is_empty() {
            return Err(SamplingError::EmptyRadii);
        }
        for (index, &value) in self.radii.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(SamplingError::InvalidRadius { index, value });
            }
        }
        self.resolved_counts()?;
        if self.vertical_levels == 0 {
            return Err(SamplingError::ZeroLevels);
        }

        for (name, value) in [
            ("center.x", self.center.x),
            ("center.y", self.center.y),
            ("center.z", self.center.z),
            ("min_height", self.min_height),
            ("max_height", self.max_height),
            ("top_clearance", self.top_clearance),
            ("bottom_min_height", self.bottom_min_height),
            ("bottom_height", self.bottom_height),
            ("close_up_height_offset", self.close_up_height_offset),
        ] {
            if !value.is_finite() {
                return Err(SamplingError::InvalidParameter { name, value });
            }
        }
        if !self.close_up_radius_factor.is_finite() || self.close_up_radius_factor <= 0.0 {
            return Err(SamplingError::InvalidParameter {
                name: "close_up_radius_factor",
                value: self.close_up_radius_factor,
            });
        }
        if self.min_height > self.max_height {
            return Err(SamplingError::InvertedHeights {
                min: self.min_height,
                max: self.max_height,
            });
        }
        Ok(())
    }

    /// Per-ring camera counts after broadcasting and clamping to the floor.
    pub fn resolved_counts(&self) -> Result<Vec<u32>, SamplingError> {
        let floor = self.floor();
        let counts = match self.cameras_per_radius.len() {
            n if n == self.radii.len() => self.cameras_per_radius.clone(),
            1 => vec![self.cameras_per_radius[0]; self.radii.len()],
            n => {
                return Err(SamplingError::CountMismatch {
                    radii: self.radii.len(),
                    counts: n,
                })
            }
        };
        Ok(counts
            .into_iter()
            .map(|count| {
                if count < floor {
                    log::debug!("raising camera count {count} to floor {floor}");
                }
                count.max(floor)
            })
            .collect())
    }

    fn floor(&self) -> u32 {
        self.min_cameras_per_level.max(1)
    }

    /// Height of `level`, interpolated between `min_height` and `max_height`.
    pub fn level_height(&self, level: u32) -> f64 {
        if self.vertical_levels <= 1 {
            return self.min_height;
        }
        let t = f64::from(level) / f64::from(self.vertical_levels - 1);
        self.min_height + (self.max_height - self.min_height) * t
    }

    /// Camera count on `level` for a ring with `count` cameras: two fewer per
    /// level, never below the floor.
    pub fn level_count(&self, count: u32, level: u32) -> u32 {
        count.saturating_sub(level.saturating_mul(2)).max(self.floor())
    }
}

/// Generates the ordered viewpoint list for `params`.
///
/// Indices are contiguous from 0 and names are unique. The same parameters
/// always produce the same output.
pub fn generate(params: &SamplingParams) -> Result<Vec<Viewpoint>, SamplingError> {
    params.validate()?;
    let counts = params.resolved_counts()?;

    let mut out = Vec::new();

    let center = params.center;
    for (ring, (&radius, &count)) in (0u32..).zip(params.radii.iter().zip(&counts)) {
        for level in 0..params.vertical_levels {
            let height = params.level_height(level);
            let level_count = params.level_count(count, level);
            for slot in 0..level_count {
                let angle = TAU * f64::from(slot) / f64::from(level_count);
                let position = center + DVec3::new(radius * angle.cos(), height, radius * angle.sin());
                push(
                    &mut out,
                    format!("r{ring}_l{level}_a{slot:02}"),
                    Pose::look_at(position, center, DVec3::Y),
                    radius,
                    ViewpointKind::Radial { ring, level, slot },
                );
            }
        }
    }
    let radial = out.len();

    if params.include_special {
        let top = center + DVec3::Y * (params.max_height + params.top_clearance);
        push(
            &mut out,
            "top".to_string(),
            Pose {
                position: top,
                rotation: look_rotation(DVec3::NEG_Y, DVec3::Z),
            },
            0.0,
            ViewpointKind::Top,
        );

        if params.min_height > params.bottom_min_height {
            let bottom = center + DVec3::Y * params.bottom_height;
            push(
                &mut out,
                "bottom".to_string(),
                Pose {
                    position: bottom,
                    rotation: look_rotation(DVec3::Y, DVec3::Z),
                },
                0.0,
                ViewpointKind::Bottom,
            );
        }

        let smallest = params.radii.iter().copied().fold(f64::INFINITY, f64::min);
        let close_radius = smallest * params.close_up_radius_factor;
        let close_height = params.min_height + params.close_up_height_offset;
        for slot in 0..4u32 {
            let angle = FRAC_PI_2 * f64::from(slot);
            let position = center
                + DVec3::new(close_radius * angle.cos(), close_height, close_radius * angle.sin());
            push(
                &mut out,
                format!("close_{slot}"),
                Pose::look_at(position, center, DVec3::Y),
                0.0,
                ViewpointKind::CloseUp { slot },
            );
        }
    }

    log::debug!(
        "generated {} viewpoints ({} radial, {} special)",
        out.len(),
        radial,
        out.len() - radial
    );
    Ok(out)
}

fn push(out: &mut Vec<Viewpoint>, name: String, pose: Pose, radius: f64, kind: ViewpointKind) {
    let index = u32::try_from(out.len()).unwrap_or(u32::MAX);
    out.push(Viewpoint {
        index,
        name,
        pose,
        radius,
        kind,
    });
}
