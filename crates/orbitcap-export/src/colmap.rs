//! COLMAP sparse text model.
//!
//! Writes and reads the three files of a text model:
//! - `cameras.txt`: one line per camera, `CAMERA_ID MODEL WIDTH HEIGHT PARAMS[]`
//! - `images.txt`: two lines per image, the pose line and an (empty) 2D point line
//! - `points3D.txt`: header only, since no points are triangulated here
//!
//! Format reference: <https://colmap.github.io/format.html>

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glam::{DQuat, DVec3};
use orbitcap_core::{CameraIntrinsics, TargetPose};

use crate::error::{ExportError, Result};

pub const CAMERAS_FILE: &str = "cameras.txt";
pub const IMAGES_FILE: &str = "images.txt";
pub const POINTS_FILE: &str = "points3D.txt";

/// Directory of the sparse model relative to a dataset root.
pub fn sparse_dir(root: &Path) -> PathBuf {
    root.join("sparse").join("0")
}

/// Formats a value with 6 fixed decimals. Negative zero, and negative
/// values that round to zero, print as `0.000000`.
pub fn fmt6(value: f64) -> String {
    let text = format!("{value:.6}");
    if text == "-0.000000" {
        "0.000000".to_string()
    } else {
        text
    }
}

/// A camera to write: id plus the intrinsics it stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRecord {
    pub id: u32,
    pub intrinsics: CameraIntrinsics,
}

/// An image to write: id, converted pose, camera and file name.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub id: u32,
    pub pose: TargetPose,
    pub camera_id: u32,
    pub name: String,
}

/// Renders `cameras.txt` with one PINHOLE line per camera.
pub fn cameras_text(cameras: &[CameraRecord]) -> String {
    let mut out = String::new();
    out.push_str("# Camera list with one line of data per camera:\n");
    out.push_str("# CAMERA_ID, MODEL, WIDTH, HEIGHT, PARAMS[]\n");
    let _ = writeln!(out, "# Number of cameras: {}", cameras.len());
    for camera in cameras {
        let k = &camera.intrinsics;
        let focal = k.focal_length_px();
        let (cx, cy) = k.principal_point();
        let _ = writeln!(
            out,
            "{} PINHOLE {} {} {} {} {} {}",
            camera.id,
            k.width,
            k.height,
            fmt6(focal),
            fmt6(focal),
            fmt6(cx),
            fmt6(cy)
        );
    }
    out
}

/// Renders `images.txt`: two header lines, then a pose line and an empty
/// line per image.
pub fn images_text(images: &[ImageRecord]) -> String {
    let mut out = String::new();
    out.push_str("# IMAGE_ID, QW, QX, QY, QZ, TX, TY, TZ, CAMERA_ID, NAME\n");
    let _ = writeln!(
        out,
        "# Number of images: {}, mean observations per image: 0",
        images.len()
    );
    for image in images {
        let [qw, qx, qy, qz] = image.pose.wxyz();
        let t = image.pose.translation;
        let _ = writeln!(
            out,
            "{} {} {} {} {} {} {} {} {} {}",
            image.id,
            fmt6(qw),
            fmt6(qx),
            fmt6(qy),
            fmt6(qz),
            fmt6(t.x),
            fmt6(t.y),
            fmt6(t.z),
            image.camera_id,
            image.name
        );
        out.push('\n');
    }
    out
}

/// Renders an empty `points3D.txt`.
pub fn points_text() -> String {
    let mut out = String::new();
    out.push_str("# 3D point list with one line of data per point:\n");
    out.push_str("# POINT3D_ID, X, Y, Z, R, G, B, ERROR, TRACK[] as (IMAGE_ID, POINT2D_IDX)\n");
    out.push_str("# Number of points: 0, mean track length: 0\n");
    out
}

/// A camera line read back from `cameras.txt`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColmapCamera {
    pub id: u32,
    pub model: String,
    pub width: u32,
    pub height: u32,
    pub params: Vec<f64>,
}

impl ColmapCamera {
    /// Focal lengths `(fx, fy)`, or `None` if `params` is too short for the model.
    pub fn focal(&self) -> Option<(f64, f64)> {
        match self.model.as_str() {
            "SIMPLE_PINHOLE" => self.param(0).map(|f| (f, f)),
            _ => Some((self.param(0)?, self.param(1)?)),
        }
    }

    /// Principal point `(cx, cy)`, or `None` if `params` is too short for the model.
    pub fn principal_point(&self) -> Option<(f64, f64)> {
        match self.model.as_str() {
            "SIMPLE_PINHOLE" => Some((self.param(1)?, self.param(2)?)),
            _ => Some((self.param(2)?, self.param(3)?)),
        }
    }

    fn param(&self, i: usize) -> Option<f64> {
        self.params.get(i).copied()
    }
}

/// A pose line read back from `images.txt`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColmapImage {
    pub id: u32,
    pub rotation: DQuat,
    pub translation: DVec3,
    pub camera_id: u32,
    pub name: String,
}

/// A sparse text model read from disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseModel {
    pub cameras: Vec<ColmapCamera>,
    pub images: Vec<ColmapImage>,
    /// Number of point lines in `points3D.txt`.
    pub point_count: usize,
}

impl SparseModel {
    pub fn camera(&self, id: u32) -> Option<&ColmapCamera> {
        self.cameras.iter().find(|c| c.id == id)
    }
}

/// Non-comment lines with their 1-based line numbers. Blank lines are kept.
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.starts_with('#'))
}

fn field<T: std::str::FromStr>(path: &Path, line: usize, token: &str, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| ExportError::parse(path, line, format!("invalid {what} '{token}'")))
}

/// Parses the content of a `cameras.txt` file. `path` is used for errors.
pub fn parse_cameras_text(text: &str, path: &Path) -> Result<Vec<ColmapCamera>> {
    let mut cameras = Vec::new();
    for (line, content) in data_lines(text) {
        if content.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = content.split_whitespace().collect();
        if tokens.len() < 4 {
            return Err(ExportError::parse(path, line, "expected CAMERA_ID MODEL WIDTH HEIGHT PARAMS[]"));
        }
        let model = tokens[1].to_string();
        let expected_params = match model.as_str() {
            "SIMPLE_PINHOLE" => 3,
            "PINHOLE" => 4,
            other => {
                return Err(ExportError::parse(path, line, format!("unsupported camera model '{other}'")))
            }
        };
        let params = tokens[4..]
            .iter()
            .map(|t| field::<f64>(path, line, t, "parameter"))
            .collect::<Result<Vec<_>>>()?;
        if params.len() != expected_params {
            return Err(ExportError::parse(
                path,
                line,
                format!("{model} needs {expected_params} parameters, found {}", params.len()),
            ));
        }
        cameras.push(ColmapCamera {
            id: field(path, line, tokens[0], "camera id")?,
            model,
            width: field(path, line, tokens[2], "width")?,
            height: field(path, line, tokens[3], "height")?,
            params,
        });
    }
    Ok(cameras)
}

/// Parses the content of an `images.txt` file. `path` is used for errors.
///
/// Each pose line is followed by a 2D point line, which is skipped.
pub fn parse_images_text(text: &str, path: &Path) -> Result<Vec<ColmapImage>> {
    let mut images = Vec::new();
    let mut expect_points = false;
    for (line, content) in data_lines(text) {
        if expect_points {
            expect_points = false;
            continue;
        }
        if content.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = content.split_whitespace().collect();
        if tokens.len() < 10 {
            return Err(ExportError::parse(
                path,
                line,
                "expected IMAGE_ID QW QX QY QZ TX TY TZ CAMERA_ID NAME",
            ));
        }
        let mut values = [0.0f64; 7];
        for (slot, token) in values.iter_mut().zip(&tokens[1..8]) {
            *slot = field(path, line, token, "pose value")?;
        }
        let [qw, qx, qy, qz, tx, ty, tz] = values;
        let rotation = DQuat::from_xyzw(qx, qy, qz, qw);
        let norm = rotation.length();
        if !norm.is_finite() || norm < 1e-9 {
            return Err(ExportError::parse(path, line, "degenerate rotation quaternion"));
        }
        images.push(ColmapImage {
            id: field(path, line, tokens[0], "image id")?,
            rotation: rotation / norm,
            translation: DVec3::new(tx, ty, tz),
            camera_id: field(path, line, tokens[8], "camera id")?,
            name: tokens[9..].join(" "),
        });
        expect_points = true;
    }
    Ok(images)
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => ExportError::MissingFile(path.to_path_buf()),
        _ => ExportError::io(path, err),
    })
}

/// Reads a `cameras.txt` file.
pub fn read_cameras_text(path: &Path) -> Result<Vec<ColmapCamera>> {
    parse_cameras_text(&read_text(path)?, path)
}

/// Reads an `images.txt` file.
pub fn read_images_text(path: &Path) -> Result<Vec<ColmapImage>> {
    parse_images_text(&read_text(path)?, path)
}

/// Reads the sparse model under `<root>/sparse/0`.
pub fn read_sparse_text(root: &Path) -> Result<SparseModel> {
    let dir = sparse_dir(root);
    let cameras = read_cameras_text(&dir.join(CAMERAS_FILE))?;
    let images = read_images_text(&dir.join(IMAGES_FILE))?;
    let points = read_text(&dir.join(POINTS_FILE))?;
    let point_count = data_lines(&points).filter(|(_, l)| !l.is_empty()).count();
    Ok(SparseModel {
        cameras,
        images,
        point_count,
    })
}

/// Checks that the three sparse model files exist under `root`.
pub fn validate_dataset(root: &Path) -> Result<()> {
    let dir = sparse_dir(root);
    for name in [CAMERAS_FILE, IMAGES_FILE, POINTS_FILE] {
        let path = dir.join(name);
        if !path.is_file() {
            log::error!("Dataset validation failed: {} is missing", path.display());
            return Err(ExportError::MissingFile(path));
        }
    }
    log::info!("Dataset at {} has a complete sparse model", root.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbitcap_core::Pose;

    #[test]
    fn test_fmt6() {
        assert_eq!(fmt6(1.0), "1.000000");
        assert_eq!(fmt6(-2.5), "-2.500000");
        assert_eq!(fmt6(-0.0), "0.000000");
        assert_eq!(fmt6(-1e-9), "0.000000");
        assert_eq!(fmt6(1234.5678901), "1234.567890");
    }

    #[test]
    fn test_identity_image_line() {
        let pose = Pose::at(DVec3::new(1.0, 2.0, 3.0));
        let text = images_text(&[ImageRecord {
            id: 1,
            pose: TargetPose::from_source(&pose),
            camera_id: 1,
            name: "frame.jpg".into(),
        }]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with('#'));
        assert!(lines[1].starts_with('#'));
        assert_eq!(
            lines[2],
            "1 1.000000 0.000000 0.000000 0.000000 1.000000 -2.000000 -3.000000 1 frame.jpg"
        );
        assert_eq!(lines[3], "");
    }

    #[test]
    fn test_camera_line() {
        let intrinsics = CameraIntrinsics::new(1920, 1080, 60.0, 0.1, 100.0).unwrap();
        let text = cameras_text(&[CameraRecord { id: 1, intrinsics }]);
        let data: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(data.len(), 1);
        // 540 / tan(30deg) = 935.307436...
        assert_eq!(
            data[0],
            "1 PINHOLE 1920 1080 935.307436 935.307436 960.000000 540.000000"
        );
    }

    #[test]
    fn test_parse_written_text() {
        let intrinsics = CameraIntrinsics::new(640, 480, 45.0, 0.1, 50.0).unwrap();
        let cameras = cameras_text(&[CameraRecord { id: 1, intrinsics }]);
        let parsed = parse_cameras_text(&cameras, Path::new("cameras.txt")).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].model, "PINHOLE");
        assert_eq!((parsed[0].width, parsed[0].height), (640, 480));
        assert_eq!(parsed[0].principal_point(), Some((320.0, 240.0)));

        let pose = Pose::look_at(DVec3::new(3.0, 2.0, -4.0), DVec3::ZERO, DVec3::Y);
        let records: Vec<_> = (1..=3)
            .map(|id| ImageRecord {
                id,
                pose: TargetPose::from_source(&pose),
                camera_id: 1,
                name: format!("img_{id:04}.png"),
            })
            .collect();
        let images = parse_images_text(&images_text(&records), Path::new("images.txt")).unwrap();
        assert_eq!(images.len(), 3);
        assert_eq!(images[2].id, 3);
        assert_eq!(images[2].name, "img_0003.png");
        assert!((images[0].translation - DVec3::new(3.0, -2.0, 4.0)).length() < 1e-6);
        assert!((images[0].rotation.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let text = "# header\n1 PINHOLE 640 480 500 500 320\n";
        match parse_cameras_text(text, Path::new("cameras.txt")) {
            Err(ExportError::Parse { line, message, .. }) => {
                assert_eq!(line, 2);
                assert!(message.contains("4 parameters"));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let text = "# a\n# b\n1 1 0 0 0 x 0 0 1 a.png\n\n";
        match parse_images_text(text, Path::new("images.txt")) {
            Err(ExportError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {other:?}"),
        }

        let text = "1 OPENCV 640 480 1 1 1 1 0 0 0 0\n";
        assert!(parse_cameras_text(text, Path::new("cameras.txt")).is_err());
    }

    #[test]
    fn test_validate_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("dataset");
        assert!(matches!(validate_dataset(&root), Err(ExportError::MissingFile(_))));

        let dir = sparse_dir(&root);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CAMERAS_FILE), cameras_text(&[])).unwrap();
        fs::write(dir.join(IMAGES_FILE), images_text(&[])).unwrap();
        match validate_dataset(&root) {
            Err(ExportError::MissingFile(path)) => assert!(path.ends_with(POINTS_FILE)),
            other => panic!("unexpected result: {other:?}"),
        }

        fs::write(dir.join(POINTS_FILE), points_text()).unwrap();
        validate_dataset(&root).unwrap();
        let model = read_sparse_text(&root).unwrap();
        assert_eq!(model, SparseModel::default());
    }
}
