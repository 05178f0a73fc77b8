//! Pipeline configuration, loaded from JSON.

use std::fs;
use std::path::Path;

use orbitcap_capture::CaptureOptions;
use orbitcap_core::{CameraIntrinsics, SamplingParams};
use orbitcap_export::ExportOptions;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Everything [`run_pipeline`](crate::run_pipeline) needs besides a renderer.
///
/// Every field has a default, so a config file only lists what it changes:
///
/// ```
/// let config = orbitcap::Config::from_json_str(r#"{ "sampling": { "radii": [4.0, 8.0] } }"#).unwrap();
/// assert_eq!(config.sampling.radii, vec![4.0, 8.0]);
/// assert_eq!(config.intrinsics.width, 1920);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampling: SamplingParams,
    pub intrinsics: CameraIntrinsics,
    pub capture: CaptureOptions,
    pub export: ExportOptions,
    /// Export even if some frames failed to capture.
    pub allow_partial: bool,
}

impl Config {
    /// Parses and validates a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Checks sampling parameters and intrinsics.
    pub fn validate(&self) -> Result<()> {
        self.sampling.validate()?;
        self.intrinsics.validate()?;
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
