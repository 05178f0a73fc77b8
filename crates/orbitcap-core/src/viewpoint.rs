//! Planned camera viewpoints.

use serde::{Deserialize, Serialize};

use crate::camera::Pose;

/// Where a viewpoint came from within a sampling plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewpointKind {
    /// A camera on one of the orbit rings.
    Radial {
        /// Index into `SamplingParams::radii`.
        ring: u32,
        /// Vertical level, 0 is the lowest.
        level: u32,
        /// Azimuth slot within the level.
        slot: u32,
    },
    /// Looking straight down from above the highest level.
    Top,
    /// Looking straight up from just above the ground.
    Bottom,
    /// A close-range camera at a reduced radius.
    CloseUp {
        /// Quarter-turn slot (0..4).
        slot: u32,
    },
    /// A pose supplied from outside the sampler (manual or interval capture).
    Freehand,
}

/// A planned camera pose plus metadata.
///
/// Viewpoints are value objects: the sampler creates them and nothing mutates
/// them afterwards. Their order defines exported image IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    /// Position in the generated sequence, contiguous from 0.
    pub index: u32,
    /// Unique, deterministic name.
    pub name: String,
    /// Camera pose in the source frame.
    pub pose: Pose,
    /// Orbit radius, or 0 for non-radial special poses.
    pub radius: f64,
    /// Origin of this viewpoint.
    pub kind: ViewpointKind,
}

impl Viewpoint {
    /// Creates a viewpoint for a pose that did not come from the sampler.
    pub fn freehand(index: u32, name: impl Into<String>, pose: Pose) -> Self {
        Self {
            index,
            name: name.into(),
            pose,
            radius: 0.0,
            kind: ViewpointKind::Freehand,
        }
    }

    /// Whether this viewpoint lies on an orbit ring.
    pub fn is_radial(&self) -> bool {
        matches!(self.kind, ViewpointKind::Radial { .. })
    }
}
