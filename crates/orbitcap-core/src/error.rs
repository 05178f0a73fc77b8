//! Error types for orbitcap-core.

use thiserror::Error;

/// Errors raised when constructing core camera types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Intrinsics violate one of their invariants.
    #[error("invalid camera intrinsics: {0}")]
    InvalidIntrinsics(String),

    /// A rotation quaternion had zero length or non-finite components.
    #[error("degenerate rotation quaternion")]
    DegenerateRotation,

    /// A position had non-finite components.
    #[error("non-finite camera position")]
    NonFinitePosition,
}

/// Errors raised by the viewpoint sampler for parameters it cannot repair.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplingError {
    /// No radii were given.
    #[error("sampling requires at least one radius")]
    EmptyRadii,

    /// A radius was zero, negative or not finite.
    #[error("radius #{index} must be finite and > 0, got {value}")]
    InvalidRadius { index: usize, value: f64 },

    /// `cameras_per_radius` length cannot be matched to `radii`.
    #[error("cameras_per_radius has {counts} entries but {radii} radii were given")]
    CountMismatch { radii: usize, counts: usize },

    /// `vertical_levels` was zero.
    #[error("vertical_levels must be at least 1")]
    ZeroLevels,

    /// `min_height` exceeds `max_height`.
    #[error("min_height ({min}) is greater than max_height ({max})")]
    InvertedHeights { min: f64, max: f64 },

    /// A scalar parameter was NaN, infinite or outside its allowed range.
    #[error("sampling parameter '{name}' has invalid value {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// A specialized Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
