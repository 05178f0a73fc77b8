#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
//! Captures an orbit dataset of a ray-traced sphere.
//!
//! Usage: `cargo run --example orbit_capture [config.json] [out_dir]`
//!
//! Without a config file a small 320x240 dataset with two rings is written to
//! `orbitcap_dataset/`, including an Instant-NGP `transforms.json`.

use std::path::PathBuf;

use orbitcap::{
    init_logging, run_pipeline, CameraIntrinsics, Config, DepthRaster, Pose, RenderResult,
    Renderer, RgbRaster, DVec3,
};

/// Ray-casts a sphere at the origin over a sky gradient.
struct SphereRenderer {
    radius: f64,
    light: DVec3,
}

impl SphereRenderer {
    /// Distance along the camera forward axis to the sphere, per pixel.
    fn trace(&self, pose: &Pose, k: &CameraIntrinsics) -> Vec<Option<(f64, DVec3)>> {
        let focal = k.focal_length_px();
        let (cx, cy) = k.principal_point();
        let origin = pose.position();
        let mut hits = Vec::with_capacity((k.width * k.height) as usize);
        for py in 0..k.height {
            for px in 0..k.width {
                // Camera space: +X right, +Y up, +Z forward
                let local = DVec3::new(
                    (f64::from(px) + 0.5 - cx) / focal,
                    (cy - f64::from(py) - 0.5) / focal,
                    1.0,
                );
                let dir = pose.rotation() * local;
                let a = dir.dot(dir);
                let b = 2.0 * origin.dot(dir);
                let c = origin.dot(origin) - self.radius * self.radius;
                let disc = b * b - 4.0 * a * c;
                let hit = (disc >= 0.0)
                    .then(|| (-b - disc.sqrt()) / (2.0 * a))
                    .filter(|&t| t > 0.0)
                    .map(|t| (t, (origin + dir * t).normalize()));
                hits.push(hit);
            }
        }
        hits
    }
}

impl Renderer for SphereRenderer {
    fn render_rgb(&mut self, pose: &Pose, k: &CameraIntrinsics) -> RenderResult<RgbRaster> {
        let mut data = Vec::with_capacity((k.width * k.height * 3) as usize);
        for (i, hit) in self.trace(pose, k).into_iter().enumerate() {
            let pixel = match hit {
                Some((_, normal)) => {
                    let lambert = normal.dot(self.light).max(0.0);
                    let checker = ((normal.x * 4.0).floor() + (normal.y * 4.0).floor()) as i64 & 1;
                    let base = if checker == 0 { [220.0, 90.0, 60.0] } else { [240.0, 220.0, 200.0] };
                    base.map(|c| (c * (0.15 + 0.85 * lambert)) as u8)
                }
                None => {
                    let row = (i as u32 / k.width) as f64 / f64::from(k.height);
                    [(120.0 + 80.0 * row) as u8, (160.0 + 60.0 * row) as u8, 230]
                }
            };
            data.extend_from_slice(&pixel);
        }
        RgbRaster::new(k.width, k.height, orbitcap::PixelLayout::Rgb8, data)
    }

    fn render_depth(&mut self, pose: &Pose, k: &CameraIntrinsics) -> RenderResult<DepthRaster> {
        let data = self
            .trace(pose, k)
            .into_iter()
            .map(|hit| hit.map_or(f32::INFINITY, |(t, _)| t as f32))
            .collect();
        DepthRaster::new(k.width, k.height, data)
    }
}

fn main() -> orbitcap::Result<()> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => Config::load(path)?,
        None => {
            let mut config = Config::default();
            config.intrinsics = CameraIntrinsics::new(320, 240, 50.0, 0.1, 40.0)?;
            config.sampling.radii = vec![6.0, 9.0];
            config.sampling.cameras_per_radius = vec![12, 16];
            config.sampling.min_height = 0.5;
            config.sampling.max_height = 5.0;
            config.export.write_transforms = true;
            config
        }
    };
    let out_dir = args.next().map_or_else(|| PathBuf::from("orbitcap_dataset"), PathBuf::from);

    let mut renderer = SphereRenderer {
        radius: 2.0,
        light: DVec3::new(0.4, 0.8, -0.45).normalize(),
    };
    let report = run_pipeline(&config, &mut renderer, &out_dir)?;

    println!(
        "Captured {} of {} viewpoints into {}",
        report.capture.frames.len(),
        report.viewpoints,
        out_dir.display()
    );
    for file in report.export.files.iter().filter(|f| f.extension().is_some_and(|e| e == "txt" || e == "json")) {
        println!("  {}", file.display());
    }
    Ok(())
}
