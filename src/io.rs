//! Load and save [`ImageBuffer`]s through the `image` crate.
//!
//! Requires the `image` feature to be enabled.

use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};

use crate::buffer::ImageBuffer;
use crate::extraction::{extract_spectrum, SpectrumExtractionConfig, SpectrumExtractionResult};

impl ImageBuffer {
    /// Convert an already-loaded [`image::DynamicImage`].
    ///
    /// 8-bit gray, gray+alpha, RGB and RGBA keep their channel layout; every
    /// other format (16-bit, float) is converted to 8-bit RGB.
    pub fn from_dynamic_image(img: &DynamicImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        let (channels, data) = match img {
            DynamicImage::ImageLuma8(g) => (1, g.as_raw().clone()),
            DynamicImage::ImageLumaA8(g) => (2, g.as_raw().clone()),
            DynamicImage::ImageRgb8(rgb) => (3, rgb.as_raw().clone()),
            DynamicImage::ImageRgba8(rgba) => (4, rgba.as_raw().clone()),
            _ => (3, img.to_rgb8().into_raw()),
        };
        let buffer = ImageBuffer::from_raw(width as usize, height as usize, channels, data)?;
        Ok(buffer)
    }

    /// Convert to an [`image::DynamicImage`] with the matching 8-bit color type.
    pub fn to_dynamic_image(&self) -> Result<DynamicImage> {
        let (w, h) = (
            u32::try_from(self.width()).context("image width exceeds u32")?,
            u32::try_from(self.height()).context("image height exceeds u32")?,
        );
        let data = self.data().to_vec();
        let img = match self.channels() {
            1 => image::GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
            2 => image::GrayAlphaImage::from_raw(w, h, data).map(DynamicImage::ImageLumaA8),
            3 => image::RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
            4 => image::RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
            n => anyhow::bail!("cannot encode a {n}-channel buffer as an image"),
        };
        img.context("buffer length does not match its dimensions")
    }
}

/// Load an image file (PNG, JPEG, TIFF) into an [`ImageBuffer`].
pub fn load_image(path: impl AsRef<Path>) -> Result<ImageBuffer> {
    let path = path.as_ref();
    let img = image::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?;
    ImageBuffer::from_dynamic_image(&img)
        .with_context(|| format!("Failed to convert image: {}", path.display()))
}

/// Save `buffer` to `path`; the format follows the file extension.
pub fn save_image(buffer: &ImageBuffer, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    buffer
        .to_dynamic_image()?
        .save(path)
        .with_context(|| format!("Failed to save image: {}", path.display()))
}

/// Load an image file and run [`extract_spectrum`] on it.
pub fn extract_spectrum_from_file(
    path: impl AsRef<Path>,
    config: &SpectrumExtractionConfig,
) -> Result<SpectrumExtractionResult> {
    let path = path.as_ref();
    let img = load_image(path)?;
    let result = extract_spectrum(&img, config)
        .with_context(|| format!("Spectrum extraction failed for {}", path.display()))?;
    Ok(result)
}
