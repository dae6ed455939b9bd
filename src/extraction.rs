//! Extract a 1-D spectrum from a photograph of a dispersed spectral line.
//!
//! The pipeline runs five stages, each a pure transform over a fresh buffer:
//! 1. Crop dark margins from the raw frame
//! 2. Sum channels into an intensity matrix
//! 3. Fit the trace tilt by least squares
//! 4. Rotate the cropped frame by the fitted angle
//! 5. Sum each column of the rotated frame into the spectrum
//!
//! A failing stage stops the pipeline and its error is returned as is.
//!
//! # Example
//!
//! ```no_run
//! use stellarspec::{extract_spectrum_from_file, SpectrumExtractionConfig};
//!
//! let config = SpectrumExtractionConfig::default();
//!
//! let result = extract_spectrum_from_file("spectrum.tif", &config).unwrap();
//! println!(
//!     "trace slope {:.3}, {} spectrum samples",
//!     result.trace.line.slope,
//!     result.spectrum.len()
//! );
//! ```

use tracing::info;

use crate::buffer::{ImageBuffer, IntensityMatrix};
use crate::channel_sum::intensity_matrix;
use crate::crop::{crop_bounds, CropBounds, CropConfig};
use crate::deskew::{rotate, DeskewConfig};
use crate::error::{Result, SpectrumError};
use crate::projection::{column_totals, project_intensity, ResponseFunction, UnitResponse};
use crate::regression::{fit_trace, RegressionConfig, TraceFit};

/// Configuration for the full extraction pipeline.
#[derive(Debug, Clone, Default)]
pub struct SpectrumExtractionConfig {
    /// Border cropping of the raw frame.
    pub crop: CropConfig,
    /// Trace detection and fitting on the cropped frame.
    pub regression: RegressionConfig,
    /// Rotation of the cropped frame by the fitted angle.
    pub deskew: DeskewConfig,
    /// Project the cropped frame without rotating it. The trace is still
    /// fitted and reported. Default: false
    pub skip_deskew: bool,
}

/// Result of spectrum extraction, containing the spectrum and diagnostics.
#[derive(Debug, Clone)]
pub struct SpectrumExtractionResult {
    /// Response-scaled column totals of the deskewed frame.
    pub spectrum: Vec<f64>,
    /// Unscaled column totals of the deskewed frame.
    pub column_totals: Vec<u64>,
    /// Region of the raw frame kept by cropping.
    pub crop: CropBounds,
    /// Channel-sums of the cropped frame.
    pub intensity: IntensityMatrix,
    /// Number of channels per pixel of the source frame.
    pub channels: usize,
    /// Fitted trace of the cropped frame.
    pub trace: TraceFit,
    /// Rotation applied before projection, in degrees (0 when skipped).
    pub deskew_angle_deg: f64,
    /// Width of the frame that was projected.
    pub deskewed_width: usize,
    /// Height of the frame that was projected.
    pub deskewed_height: usize,
}

/// Extract the spectrum of `img` with a flat instrument response.
pub fn extract_spectrum(
    img: &ImageBuffer,
    config: &SpectrumExtractionConfig,
) -> Result<SpectrumExtractionResult> {
    extract_spectrum_with_response(img, config, &UnitResponse)
}

/// Extract the spectrum of `img`, scaling column `k` by `response.scale(k)`.
pub fn extract_spectrum_with_response<R: ResponseFunction + ?Sized>(
    img: &ImageBuffer,
    config: &SpectrumExtractionConfig,
    response: &R,
) -> Result<SpectrumExtractionResult> {
    // ── Step 1: crop ──
    let bounds = crop_bounds(img, config.crop.deletion_threshold);
    if bounds.is_empty() {
        return Err(SpectrumError::ExhaustedBuffer {
            threshold: config.crop.deletion_threshold,
        });
    }
    let cropped = img.copy_region(bounds.left, bounds.top, bounds.width, bounds.height);

    // ── Step 2: channel sums ──
    let intensity = intensity_matrix(&cropped);

    // ── Step 3: trace fit ──
    let trace = fit_trace(&intensity, &config.regression)?;

    // ── Step 4: deskew ──
    let deskew_angle_deg = if config.skip_deskew {
        0.0
    } else {
        trace.line.angle_deg()
    };
    let deskewed = if config.skip_deskew {
        cropped
    } else {
        rotate(&cropped, deskew_angle_deg, &config.deskew)
    };

    // ── Step 5: projection ──
    let totals = column_totals(&deskewed);
    let spectrum = project_intensity(&deskewed, response);

    info!(
        "Extracted spectrum: crop {}x{} at ({}, {}), {} trace points, angle {:.2} deg, {} columns",
        bounds.width,
        bounds.height,
        bounds.left,
        bounds.top,
        trace.points.len(),
        deskew_angle_deg,
        spectrum.len()
    );

    Ok(SpectrumExtractionResult {
        spectrum,
        column_totals: totals,
        crop: bounds,
        intensity,
        channels: img.channels(),
        trace,
        deskew_angle_deg,
        deskewed_width: deskewed.width(),
        deskewed_height: deskewed.height(),
    })
}
