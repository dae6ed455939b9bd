//! # stellarspec
//!
//! Turn a photograph of a diffraction-grating spectrum into a one-dimensional
//! intensity-vs-position spectrum suitable for photometric analysis.
//!
//! Given an 8-bit multi-channel frame, `stellarspec` isolates the exposed strip,
//! locates and straightens the spectral trace, and sums the brightness of every
//! column.
//!
//! ## Example
//!
//! ```
//! use stellarspec::{extract_spectrum, ImageBuffer, SpectrumExtractionConfig};
//!
//! // 12x12 RGB frame: dark border, two-pixel wide trace descending to the right
//! let mut img = ImageBuffer::new_fill(12, 12, &[0, 0, 0]).unwrap();
//! for row in 2..10 {
//!     for col in [row, row + 1] {
//!         if col < 10 {
//!             img.pixel_mut(col, row).unwrap().copy_from_slice(&[220, 200, 180]);
//!         }
//!     }
//! }
//!
//! let result = extract_spectrum(&img, &SpectrumExtractionConfig::default()).unwrap();
//! assert!((result.trace.line.slope - 1.0).abs() < 1e-9);
//! println!("{} spectrum samples", result.spectrum.len());
//! ```
//!
//! ## Algorithm overview
//!
//! 1. **Crop** — trim edge rows/columns whose pixels all have a channel-sum at
//!    or below the deletion threshold (top, bottom, right, left; each to a
//!    fixed point)
//! 2. **Channel sums** — collapse each pixel into the sum of its channels
//! 3. **Trace fit** — collect pixels at or above the brightness threshold in the
//!    band `row < col` and fit `row = slope·col + intercept` by least squares
//! 4. **Deskew** — rotate the cropped frame by `atan(slope)` with cubic
//!    interpolation so the trace runs horizontally
//! 5. **Projection** — sum every column over all rows and channels, optionally
//!    scaled by an instrument [`ResponseFunction`]
//!
//! Every stage is also exported on its own; each returns a new buffer and never
//! mutates its input.
//!
//! ## Features
//!
//! - `image` (default) — load and save frames with the [`image`] crate and
//!   run the pipeline straight from a file.

mod buffer;
pub mod channel_sum;
pub mod crop;
pub mod deskew;
pub mod distribution;
mod error;
pub mod extraction;
#[cfg(feature = "image")]
pub mod io;
pub mod projection;
pub mod regression;

pub use buffer::{ImageBuffer, IntensityMatrix};
pub use channel_sum::{channel_sum, intensity_matrix};
pub use crop::{crop, crop_bounds, crop_checked, CropBounds, CropConfig};
pub use deskew::{rotate, DeskewConfig, Interpolation, Rotatable};
pub use distribution::{distribution_quantile, pixel_distribution};
pub use error::{Result, SpectrumError};
pub use extraction::{
    extract_spectrum, extract_spectrum_with_response, SpectrumExtractionConfig,
    SpectrumExtractionResult,
};
#[cfg(feature = "image")]
pub use io::{extract_spectrum_from_file, load_image, save_image};
pub use projection::{column_totals, project_intensity, ResponseFunction, UnitResponse};
pub use regression::{fit_line, fit_trace, LineFit, RegressionConfig, TraceFit, TracePoint};
