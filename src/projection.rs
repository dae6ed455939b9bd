//! Collapse a (deskewed) image into a 1-D spectrum by summing each column.

use tracing::debug;

use crate::buffer::ImageBuffer;

/// Per-position scale factor applied to a projected spectrum.
///
/// Intended to correct for instrument sensitivity across the spectrum once a
/// calibrated response curve is available. Closures `Fn(usize) -> f64` can be
/// used directly.
pub trait ResponseFunction {
    /// Scale factor for column `position`.
    fn scale(&self, position: usize) -> f64;
}

/// Flat response: every position scales by 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitResponse;

impl ResponseFunction for UnitResponse {
    fn scale(&self, _position: usize) -> f64 {
        1.0
    }
}

impl<F> ResponseFunction for F
where
    F: Fn(usize) -> f64,
{
    fn scale(&self, position: usize) -> f64 {
        self(position)
    }
}

/// Total brightness of every column: the sum over all rows and channels.
///
/// Returns one entry per column of `img`.
pub fn column_totals(img: &ImageBuffer) -> Vec<u64> {
    let mut totals = vec![0u64; img.width()];
    for row in 0..img.height() {
        for (total, pixel) in totals.iter_mut().zip(img.row_pixels(row)) {
            *total += pixel.iter().map(|&v| v as u64).sum::<u64>();
        }
    }
    totals
}

/// Column totals of `img`, each multiplied by `response` at its column index.
pub fn project_intensity<R: ResponseFunction + ?Sized>(img: &ImageBuffer, response: &R) -> Vec<f64> {
    let spectrum: Vec<f64> = column_totals(img)
        .into_iter()
        .enumerate()
        .map(|(k, total)| total as f64 * response.scale(k))
        .collect();

    debug!(
        "Projection: {} columns from {}x{}x{} buffer",
        spectrum.len(),
        img.width(),
        img.height(),
        img.channels()
    );

    spectrum
}
