//! Raster buffers returned by a renderer and their encoding into image files.

use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// Channel layout of an 8-bit color raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelLayout {
    /// 3 bytes per pixel.
    #[default]
    Rgb8,
    /// 4 bytes per pixel.
    Rgba8,
    /// 4 bytes per pixel, blue first (common GPU surface format).
    Bgra8,
}

impl PixelLayout {
    /// Bytes per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Rgb8 => 3,
            PixelLayout::Rgba8 | PixelLayout::Bgra8 => 4,
        }
    }
}

/// An 8-bit color raster, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbRaster {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub data: Vec<u8>,
}

impl RgbRaster {
    /// Creates a raster, checking the buffer length against size and layout.
    pub fn new(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> RenderResult<Self> {
        let expected = pixel_count(width, height) * layout.channels();
        if data.len() != expected {
            return Err(RenderError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// A raster filled with one RGB color.
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let data = color.repeat(pixel_count(width, height));
        Self {
            width,
            height,
            layout: PixelLayout::Rgb8,
            data,
        }
    }

    /// Converts to a tightly packed RGB8 buffer.
    fn to_rgb8(&self) -> RenderResult<ImageBuffer<Rgb<u8>, Vec<u8>>> {
        let invalid = || RenderError::BufferSize {
            expected: pixel_count(self.width, self.height) * self.layout.channels(),
            actual: self.data.len(),
        };
        match self.layout {
            PixelLayout::Rgb8 => {
                ImageBuffer::from_raw(self.width, self.height, self.data.clone()).ok_or_else(invalid)
            }
            PixelLayout::Rgba8 => {
                let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(self.width, self.height, self.data.clone())
                        .ok_or_else(invalid)?;
                Ok(DynamicImage::ImageRgba8(img).to_rgb8())
            }
            PixelLayout::Bgra8 => {
                let mut rgba = self.data.clone();
                for chunk in rgba.chunks_exact_mut(4) {
                    chunk.swap(0, 2); // Swap B and R
                }
                let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(self.width, self.height, rgba).ok_or_else(invalid)?;
                Ok(DynamicImage::ImageRgba8(img).to_rgb8())
            }
        }
    }
}

/// A depth raster holding eye-space distance per pixel, rows top to bottom.
///
/// Non-finite or non-positive values mean "no surface".
#[derive(Debug, Clone, PartialEq)]
pub struct DepthRaster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl DepthRaster {
    /// Creates a depth raster, checking the buffer length.
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> RenderResult<Self> {
        let expected = pixel_count(width, height);
        if data.len() != expected {
            return Err(RenderError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// A raster with the same depth everywhere.
    pub fn filled(width: u32, height: u32, depth: f32) -> Self {
        Self {
            width,
            height,
            data: vec![depth; pixel_count(width, height)],
        }
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// Encoded image bytes plus the file extension they should be stored under.
///
/// Cloning is cheap; the bytes are shared.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageHandle {
    bytes: Arc<[u8]>,
    extension: &'static str,
}

impl ImageHandle {
    /// Wraps already-encoded bytes.
    pub fn new(bytes: impl Into<Arc<[u8]>>, extension: &'static str) -> Self {
        Self {
            bytes: bytes.into(),
            extension,
        }
    }

    /// The encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        self.extension
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the encoded buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("extension", &self.extension)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// File format for color images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    /// Lossless PNG.
    Png,
    /// JPEG at the configured quality.
    #[default]
    Jpeg,
}

/// File format for depth images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DepthFormat {
    /// 16-bit grayscale PNG, depth mapped linearly from `[near, far]` to `[0, 65535]`.
    #[default]
    Png16,
    /// Raw little-endian `f32` values, row-major, no header.
    RawF32,
}

/// Encodes a color raster.
pub fn encode_rgb(raster: &RgbRaster, format: ImageFormat, jpeg_quality: u8) -> RenderResult<ImageHandle> {
    let rgb = raster.to_rgb8()?;
    let mut buffer = Cursor::new(Vec::new());
    let extension = match format {
        ImageFormat::Png => {
            rgb.write_to(&mut buffer, image::ImageFormat::Png)?;
            "png"
        }
        ImageFormat::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality.clamp(1, 100));
            encoder.encode_image(&rgb)?;
            "jpg"
        }
    };
    Ok(ImageHandle::new(buffer.into_inner(), extension))
}

/// Encodes a depth raster, normalizing over `[near, far]` for PNG output.
pub fn encode_depth(raster: &DepthRaster, format: DepthFormat, near: f64, far: f64) -> RenderResult<ImageHandle> {
    match format {
        DepthFormat::Png16 => {
            let range = (far - near).max(f64::EPSILON);
            let levels: Vec<u16> = raster
                .data
                .iter()
                .map(|&d| {
                    let d = f64::from(d);
                    if !d.is_finite() || d <= 0.0 {
                        return u16::MAX;
                    }
                    let t = ((d - near) / range).clamp(0.0, 1.0);
                    // t is in [0, 1] so the product fits in u16
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let level = (t * f64::from(u16::MAX)).round() as u16;
                    level
                })
                .collect();
            let img: ImageBuffer<Luma<u16>, Vec<u16>> =
                ImageBuffer::from_raw(raster.width, raster.height, levels).ok_or(
                    RenderError::BufferSize {
                        expected: pixel_count(raster.width, raster.height),
                        actual: raster.data.len(),
                    },
                )?;
            let mut buffer = Cursor::new(Vec::new());
            DynamicImage::ImageLuma16(img).write_to(&mut buffer, image::ImageFormat::Png)?;
            Ok(ImageHandle::new(buffer.into_inner(), "png"))
        }
        DepthFormat::RawF32 => {
            let bytes: Vec<u8> = raster.data.iter().flat_map(|d| d.to_le_bytes()).collect();
            Ok(ImageHandle::new(bytes, "bin"))
        }
    }
}
