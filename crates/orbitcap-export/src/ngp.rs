//! Instant-NGP `transforms.json`, derived from a sparse text model.

use std::path::{Path, PathBuf};

use glam::DMat3;
use serde::{Deserialize, Serialize};

use crate::colmap::{read_sparse_text, ColmapImage, SparseModel};
use crate::error::{ExportError, Result};
use crate::storage::{ByteSink, FsSink};

pub const TRANSFORMS_FILE: &str = "transforms.json";

/// Default scene bound for Instant-NGP.
pub const DEFAULT_AABB_SCALE: u32 = 32;

/// Per-frame sharpness written for every frame. Rendered images are never blurred.
const SHARPNESS: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NgpFrame {
    pub file_path: String,
    pub sharpness: f64,
    pub transform_matrix: [[f64; 4]; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NgpTransforms {
    pub camera_angle_x: f64,
    pub fl_x: f64,
    pub fl_y: f64,
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub cx: f64,
    pub cy: f64,
    pub w: u32,
    pub h: u32,
    pub aabb_scale: u32,
    pub frames: Vec<NgpFrame>,
}

impl NgpTransforms {
    /// Builds transforms from the first camera and every image of `model`.
    pub fn from_sparse(model: &SparseModel, aabb_scale: u32) -> Result<Self> {
        let camera = model
            .cameras
            .first()
            .ok_or_else(|| ExportError::InvalidModel("no camera records".into()))?;
        if model.images.is_empty() {
            return Err(ExportError::InvalidModel("no image records".into()));
        }
        if model.cameras.len() > 1 {
            log::warn!(
                "Sparse model has {} cameras; transforms use camera {} only",
                model.cameras.len(),
                camera.id
            );
        }

        let short_params = || {
            ExportError::InvalidModel(format!(
                "camera {} ({}) has {} params",
                camera.id,
                camera.model,
                camera.params.len()
            ))
        };
        let (fl_x, fl_y) = camera.focal().ok_or_else(short_params)?;
        let (cx, cy) = camera.principal_point().ok_or_else(short_params)?;
        let w = f64::from(camera.width);
        Ok(Self {
            camera_angle_x: 2.0 * (w / (2.0 * fl_x)).atan(),
            fl_x,
            fl_y,
            k1: 0.0,
            k2: 0.0,
            p1: 0.0,
            p2: 0.0,
            cx,
            cy,
            w: camera.width,
            h: camera.height,
            aabb_scale,
            frames: model.images.iter().map(frame_for).collect(),
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// `[R | t]` from the stored pose, with the third column of `R` negated to
/// turn the forward axis into the backward-looking NeRF convention.
pub fn transform_matrix(image: &ColmapImage) -> [[f64; 4]; 4] {
    let rows = DMat3::from_quat(image.rotation).transpose();
    let t = image.translation;
    let row = |i: usize| {
        let r = rows.col(i);
        [r.x, r.y, -r.z, t[i]]
    };
    [row(0), row(1), row(2), [0.0, 0.0, 0.0, 1.0]]
}

fn frame_for(image: &ColmapImage) -> NgpFrame {
    NgpFrame {
        file_path: format!("images/{}", image.name),
        sharpness: SHARPNESS,
        transform_matrix: transform_matrix(image),
    }
}

/// Reads the sparse model under `root` and writes `<root>/transforms.json`.
pub fn write_transforms(root: &Path, aabb_scale: u32) -> Result<PathBuf> {
    let model = read_sparse_text(root)?;
    let transforms = NgpTransforms::from_sparse(&model, aabb_scale)?;
    let path = root.join(TRANSFORMS_FILE);
    FsSink
        .write(&path, transforms.to_json()?.as_bytes())
        .map_err(|err| ExportError::io(&path, err))?;
    log::info!(
        "Wrote {} with {} frames",
        path.display(),
        transforms.frames.len()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colmap::ColmapCamera;
    use glam::{DQuat, DVec3};
    use std::f64::consts::FRAC_PI_2;

    fn model(images: Vec<ColmapImage>) -> SparseModel {
        SparseModel {
            cameras: vec![ColmapCamera {
                id: 1,
                model: "PINHOLE".into(),
                width: 800,
                height: 600,
                params: vec![400.0, 400.0, 400.0, 300.0],
            }],
            images,
            point_count: 0,
        }
    }

    fn image(rotation: DQuat, translation: DVec3) -> ColmapImage {
        ColmapImage {
            id: 1,
            rotation,
            translation,
            camera_id: 1,
            name: "a_0000.jpg".into(),
        }
    }

    #[test]
    fn test_header_fields() {
        let t = NgpTransforms::from_sparse(&model(vec![image(DQuat::IDENTITY, DVec3::ZERO)]), 32).unwrap();
        // w / (2 fx) = 1, atan(1) = pi/4
        assert!((t.camera_angle_x - FRAC_PI_2).abs() < 1e-12);
        assert_eq!((t.w, t.h, t.aabb_scale), (800, 600, 32));
        assert_eq!((t.cx, t.cy), (400.0, 300.0));
        assert_eq!(t.frames[0].file_path, "images/a_0000.jpg");
        assert_eq!(t.frames[0].sharpness, 50.0);
    }

    #[test]
    fn test_transform_matrix_negates_third_column() {
        let m = transform_matrix(&image(DQuat::IDENTITY, DVec3::new(1.0, -2.0, -3.0)));
        assert_eq!(
            m,
            [
                [1.0, 0.0, 0.0, 1.0],
                [0.0, 1.0, 0.0, -2.0],
                [0.0, 0.0, -1.0, -3.0],
                [0.0, 0.0, 0.0, 1.0],
            ]
        );

        // 90 degrees about Y: R = [[0,0,1],[0,1,0],[-1,0,0]]
        let m = transform_matrix(&image(DQuat::from_rotation_y(FRAC_PI_2), DVec3::ZERO));
        assert!((m[0][2] + 1.0).abs() < 1e-12);
        assert!((m[2][0] + 1.0).abs() < 1e-12);
        assert!((m[1][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_model_is_invalid() {
        assert!(matches!(
            NgpTransforms::from_sparse(&model(Vec::new()), 32),
            Err(ExportError::InvalidModel(_))
        ));
        assert!(NgpTransforms::from_sparse(&SparseModel::default(), 32).is_err());
    }

    #[test]
    fn test_short_camera_params_are_invalid() {
        let mut short = model(vec![image(DQuat::IDENTITY, DVec3::ZERO)]);
        short.cameras[0].params.truncate(3);
        match NgpTransforms::from_sparse(&short, 32) {
            Err(ExportError::InvalidModel(message)) => assert_eq!(message, "camera 1 (PINHOLE) has 3 params"),
            other => panic!("unexpected result: {other:?}"),
        }

        short.cameras[0].model = "SIMPLE_PINHOLE".into();
        let t = NgpTransforms::from_sparse(&short, 32).unwrap();
        assert_eq!((t.fl_x, t.fl_y), (400.0, 400.0));
        assert_eq!((t.cx, t.cy), (400.0, 400.0));

        short.cameras[0].params.clear();
        assert!(NgpTransforms::from_sparse(&short, 32).is_err());
    }

    #[test]
    fn test_json_shape() {
        let t = NgpTransforms::from_sparse(&model(vec![image(DQuat::IDENTITY, DVec3::ZERO)]), 16).unwrap();
        let value: serde_json::Value = serde_json::from_str(&t.to_json().unwrap()).unwrap();
        assert_eq!(value["aabb_scale"], 16);
        assert_eq!(value["k1"], 0.0);
        assert_eq!(value["frames"][0]["transform_matrix"][3][3], 1.0);
    }
}
