//! Atlas textures - power-of-two RGBA float pixel buffers
//!
//! Baked radiance is stored as linear `[f32; 4]` per texel. Export converts to
//! an `image` buffer, encoding to 8-bit sRGB when the atlas is tagged sRGB.

mod cache;

use std::path::Path;

use image::{Rgba, Rgba32FImage, RgbaImage};
use lightbake_config::ColorSpace;

use crate::constants::MAX_SUPPORTED_RESOLUTION;

pub use cache::{AtlasBinding, AtlasCache, CacheError};

#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("Atlas dimensions {width}x{height} must be non-zero powers of two")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Expected {expected} pixels, got {actual}")]
    PixelCount { expected: usize, actual: usize },

    #[error("Failed to export atlas: {0}")]
    Export(#[from] image::ImageError),
}

/// A lightmap atlas owned by the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    /// Row-major, each pixel is [r, g, b, a]
    pixels: Vec<[f32; 4]>,
}

impl AtlasTexture {
    /// Create an atlas initialized to transparent black.
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        color_space: ColorSpace,
    ) -> Result<Self, AtlasError> {
        let valid = |dim: u32| dim.is_power_of_two() && dim <= MAX_SUPPORTED_RESOLUTION;
        if !valid(width) || !valid(height) {
            return Err(AtlasError::InvalidDimensions { width, height });
        }
        Ok(Self {
            name: name.into(),
            width,
            height,
            color_space,
            pixels: vec![[0.0; 4]; width as usize * height as usize],
        })
    }

    pub fn clear(&mut self, color: [f32; 4]) {
        self.pixels.fill(color);
    }

    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Does nothing if coordinates are out of bounds
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [f32; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.pixels[index] = color;
    }

    /// Replace every pixel. The slice must cover the whole atlas.
    pub fn write_pixels(&mut self, pixels: &[[f32; 4]]) -> Result<(), AtlasError> {
        if pixels.len() != self.pixels.len() {
            return Err(AtlasError::PixelCount {
                expected: self.pixels.len(),
                actual: pixels.len(),
            });
        }
        self.pixels.copy_from_slice(pixels);
        Ok(())
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    /// Raw pixel bytes for GPU upload or hashing.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Lossless float image.
    pub fn to_image(&self) -> Rgba32FImage {
        Rgba32FImage::from_fn(self.width, self.height, |x, y| {
            Rgba(self.get_pixel(x, y).unwrap_or([0.0; 4]))
        })
    }

    /// 8-bit image, sRGB-encoded when the atlas is tagged sRGB.
    pub fn to_rgba8(&self) -> RgbaImage {
        let encode = |value: f32| -> u8 {
            let value = value.clamp(0.0, 1.0);
            let value = match self.color_space {
                ColorSpace::Srgb => linear_to_srgb(value),
                ColorSpace::Linear | ColorSpace::NonColor => value,
            };
            (value * 255.0).round() as u8
        };
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let [r, g, b, a] = self.get_pixel(x, y).unwrap_or([0.0; 4]);
            // alpha is never gamma encoded
            Rgba([
                encode(r),
                encode(g),
                encode(b),
                (a.clamp(0.0, 1.0) * 255.0).round() as u8,
            ])
        })
    }

    /// Write the atlas as an 8-bit PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), AtlasError> {
        self.to_rgba8()
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

fn linear_to_srgb(value: f32) -> f32 {
    if value <= 0.003_130_8 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_atlas() {
        let atlas = AtlasTexture::new("A", 256, 128, ColorSpace::Srgb).unwrap();
        assert_eq!(atlas.pixel_count(), 256 * 128);
        assert_eq!(atlas.get_pixel(0, 0), Some([0.0; 4]));
        assert_eq!(atlas.get_pixel(256, 0), None);
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(matches!(
            AtlasTexture::new("A", 100, 128, ColorSpace::Srgb),
            Err(AtlasError::InvalidDimensions { .. })
        ));
        assert!(AtlasTexture::new("A", 0, 0, ColorSpace::Srgb).is_err());
    }

    #[test]
    fn test_write_pixels_checks_length() {
        let mut atlas = AtlasTexture::new("A", 2, 2, ColorSpace::Linear).unwrap();
        assert!(matches!(
            atlas.write_pixels(&[[1.0; 4]; 3]),
            Err(AtlasError::PixelCount {
                expected: 4,
                actual: 3
            })
        ));
        atlas.write_pixels(&[[0.5; 4]; 4]).unwrap();
        assert_eq!(atlas.get_pixel(1, 1), Some([0.5; 4]));
    }

    #[test]
    fn test_as_bytes() {
        let atlas = AtlasTexture::new("A", 2, 2, ColorSpace::Linear).unwrap();
        // 4 pixels * 4 components * 4 bytes per f32
        assert_eq!(atlas.as_bytes().len(), 64);
    }

    #[test]
    fn test_rgba8_encoding() {
        let mut srgb = AtlasTexture::new("A", 1, 1, ColorSpace::Srgb).unwrap();
        srgb.set_pixel(0, 0, [0.5, 0.0, 2.0, 1.0]);
        let pixel = *srgb.to_rgba8().get_pixel(0, 0);
        assert_eq!(pixel, Rgba([188, 0, 255, 255]));

        let mut linear = srgb.clone();
        linear.color_space = ColorSpace::Linear;
        assert_eq!(*linear.to_rgba8().get_pixel(0, 0), Rgba([128, 0, 255, 255]));
    }

    #[test]
    fn test_float_image_is_lossless() {
        let mut atlas = AtlasTexture::new("A", 2, 1, ColorSpace::Srgb).unwrap();
        atlas.set_pixel(1, 0, [4.0, 0.25, 0.125, 1.0]);
        let image = atlas.to_image();
        assert_eq!(image.get_pixel(1, 0).0, [4.0, 0.25, 0.125, 1.0]);
    }
}
