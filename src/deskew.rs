//! Rotate a buffer so the spectral trace runs horizontally.
//!
//! Rotation is about the buffer center. Positive angles rotate
//! counter-clockwise as displayed (origin top-left, rows down), so a trace
//! with slope `m` becomes horizontal after rotating by
//! [`LineFit::angle_deg`](crate::LineFit::angle_deg).
//!
//! Each output pixel is mapped back into the source and interpolated there.
//! Output pixels that map outside the source take the fill value. Source
//! neighbors beyond the edge are clamped to the nearest edge pixel.

use tracing::debug;

use crate::buffer::{ImageBuffer, IntensityMatrix};

/// Interpolation used when sampling the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Nearest source pixel.
    Nearest,
    /// 2x2 bilinear.
    Bilinear,
    /// 4x4 cubic convolution (Keys, a = -0.5).
    #[default]
    Cubic,
}

/// Configuration for deskewing.
#[derive(Debug, Clone)]
pub struct DeskewConfig {
    /// Default: [`Interpolation::Cubic`]
    pub interpolation: Interpolation,
    /// Value for output pixels that map outside the source.
    /// Default: 0.0
    pub fill: f64,
    /// Grow the output so the whole rotated frame fits. When `false` the
    /// output keeps the input shape and corners are cut off.
    /// Default: true
    pub reshape: bool,
}

impl Default for DeskewConfig {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Cubic,
            fill: 0.0,
            reshape: true,
        }
    }
}

/// A pixel grid that can be resampled by [`rotate`].
pub trait Rotatable: Sized {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn channels(&self) -> usize;

    /// Value of channel `ch` at `(col, row)`; the indices are in bounds.
    fn sample(&self, col: usize, row: usize, ch: usize) -> f64;

    /// Build a grid from interleaved, row-major interpolated values.
    fn from_samples(width: usize, height: usize, channels: usize, samples: Vec<f64>) -> Self;
}

impl Rotatable for ImageBuffer {
    fn width(&self) -> usize {
        ImageBuffer::width(self)
    }

    fn height(&self) -> usize {
        ImageBuffer::height(self)
    }

    fn channels(&self) -> usize {
        ImageBuffer::channels(self)
    }

    fn sample(&self, col: usize, row: usize, ch: usize) -> f64 {
        let idx = (row * ImageBuffer::width(self) + col) * ImageBuffer::channels(self) + ch;
        self.data()[idx] as f64
    }

    fn from_samples(width: usize, height: usize, channels: usize, samples: Vec<f64>) -> Self {
        let data = samples
            .into_iter()
            .map(|v| v.round().clamp(0.0, u8::MAX as f64) as u8)
            .collect();
        ImageBuffer::from_parts(width, height, channels, data)
    }
}

impl Rotatable for IntensityMatrix {
    fn width(&self) -> usize {
        IntensityMatrix::width(self)
    }

    fn height(&self) -> usize {
        IntensityMatrix::height(self)
    }

    fn channels(&self) -> usize {
        1
    }

    fn sample(&self, col: usize, row: usize, _ch: usize) -> f64 {
        self.data()[row * IntensityMatrix::width(self) + col] as f64
    }

    fn from_samples(width: usize, height: usize, _channels: usize, samples: Vec<f64>) -> Self {
        let data = samples
            .into_iter()
            .map(|v| v.round().clamp(0.0, u32::MAX as f64) as u32)
            .collect();
        IntensityMatrix::from_parts(width, height, data)
    }
}

/// Output `(width, height)` of a reshaping rotation by `angle_deg`.
pub fn rotated_dimensions(width: usize, height: usize, angle_deg: f64) -> (usize, usize) {
    let theta = angle_deg.to_radians();
    let (sin_a, cos_a) = (theta.sin().abs(), theta.cos().abs());
    let w = width as f64;
    let h = height as f64;
    let new_w = (w * cos_a + h * sin_a + 0.5).floor() as usize;
    let new_h = (w * sin_a + h * cos_a + 0.5).floor() as usize;
    (new_w, new_h)
}

/// Rotate `buf` about its center by `angle_deg` (counter-clockwise positive).
///
/// Returns a new buffer; the input is untouched. Every channel is
/// interpolated independently and rounded back to the buffer's value type.
pub fn rotate<B: Rotatable>(buf: &B, angle_deg: f64, config: &DeskewConfig) -> B {
    let (w, h, channels) = (buf.width(), buf.height(), buf.channels());
    let (out_w, out_h) = if config.reshape {
        rotated_dimensions(w, h, angle_deg)
    } else {
        (w, h)
    };

    if w == 0 || h == 0 || out_w == 0 || out_h == 0 {
        return B::from_samples(
            out_w,
            out_h,
            channels,
            vec![config.fill; out_w * out_h * channels],
        );
    }

    let theta = angle_deg.to_radians();
    let (sin_a, cos_a) = theta.sin_cos();
    let cx = (w as f64 - 1.0) / 2.0;
    let cy = (h as f64 - 1.0) / 2.0;
    let ocx = (out_w as f64 - 1.0) / 2.0;
    let ocy = (out_h as f64 - 1.0) / 2.0;

    // Tolerance for source coordinates landing a hair outside the grid.
    const EDGE_EPS: f64 = 1e-9;
    let max_x = (w - 1) as f64 + EDGE_EPS;
    let max_y = (h - 1) as f64 + EDGE_EPS;

    let mut samples = Vec::with_capacity(out_w * out_h * channels);
    for oy in 0..out_h {
        for ox in 0..out_w {
            let dx = ox as f64 - ocx;
            let dy = oy as f64 - ocy;
            let sx = cx + dx * cos_a - dy * sin_a;
            let sy = cy + dx * sin_a + dy * cos_a;

            if sx < -EDGE_EPS || sy < -EDGE_EPS || sx > max_x || sy > max_y {
                samples.extend(std::iter::repeat(config.fill).take(channels));
                continue;
            }
            for ch in 0..channels {
                samples.push(interpolate(buf, sx, sy, ch, config.interpolation));
            }
        }
    }

    debug!(
        "Deskew: {}x{} -> {}x{}, angle {:.3} deg, {:?}",
        w, h, out_w, out_h, angle_deg, config.interpolation
    );

    B::from_samples(out_w, out_h, channels, samples)
}

/// Index `i` clamped into `0..len` (`len > 0`).
fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// Cubic convolution kernel with `a = -0.5` (Catmull-Rom).
fn cubic_weight(t: f64) -> f64 {
    const A: f64 = -0.5;
    let t = t.abs();
    if t <= 1.0 {
        (A + 2.0) * t * t * t - (A + 3.0) * t * t + 1.0
    } else if t < 2.0 {
        A * t * t * t - 5.0 * A * t * t + 8.0 * A * t - 4.0 * A
    } else {
        0.0
    }
}

fn interpolate<B: Rotatable>(buf: &B, x: f64, y: f64, ch: usize, mode: Interpolation) -> f64 {
    let (w, h) = (buf.width(), buf.height());
    match mode {
        Interpolation::Nearest => {
            let col = clamp_index(x.round() as isize, w);
            let row = clamp_index(y.round() as isize, h);
            buf.sample(col, row, ch)
        }
        Interpolation::Bilinear => {
            let x0 = x.floor();
            let y0 = y.floor();
            let fx = x - x0;
            let fy = y - y0;
            let (x0, y0) = (x0 as isize, y0 as isize);
            let c0 = clamp_index(x0, w);
            let c1 = clamp_index(x0 + 1, w);
            let r0 = clamp_index(y0, h);
            let r1 = clamp_index(y0 + 1, h);
            buf.sample(c0, r0, ch) * (1.0 - fx) * (1.0 - fy)
                + buf.sample(c1, r0, ch) * fx * (1.0 - fy)
                + buf.sample(c0, r1, ch) * (1.0 - fx) * fy
                + buf.sample(c1, r1, ch) * fx * fy
        }
        Interpolation::Cubic => {
            let x0 = x.floor();
            let y0 = y.floor();
            let fx = x - x0;
            let fy = y - y0;
            let (x0, y0) = (x0 as isize, y0 as isize);

            let mut acc = 0.0;
            for j in -1..=2isize {
                let wy = cubic_weight(j as f64 - fy);
                if wy == 0.0 {
                    continue;
                }
                let row = clamp_index(y0 + j, h);
                for i in -1..=2isize {
                    let wx = cubic_weight(i as f64 - fx);
                    if wx == 0.0 {
                        continue;
                    }
                    let col = clamp_index(x0 + i, w);
                    acc += wx * wy * buf.sample(col, row, ch);
                }
            }
            acc
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[u32]]) -> IntensityMatrix {
        IntensityMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_cubic_weight_partition_of_unity() {
        for k in 0..=10 {
            let f = k as f64 / 10.0;
            let sum: f64 = (-1..=2).map(|i| cubic_weight(i as f64 - f)).sum();
            assert!((sum - 1.0).abs() < 1e-12, "offset {f}: sum {sum}");
        }
        assert_eq!(cubic_weight(0.0), 1.0);
        assert_eq!(cubic_weight(1.0), 0.0);
        assert_eq!(cubic_weight(2.0), 0.0);
    }

    #[test]
    fn test_zero_angle_is_identity() {
        let data: Vec<u8> = (0..4 * 3 * 3).map(|v| (v * 7) as u8).collect();
        let img = ImageBuffer::from_raw(4, 3, 3, data).unwrap();
        for mode in [
            Interpolation::Nearest,
            Interpolation::Bilinear,
            Interpolation::Cubic,
        ] {
            let config = DeskewConfig {
                interpolation: mode,
                ..Default::default()
            };
            let out = rotate(&img, 0.0, &config);
            assert_eq!(out, img, "{mode:?}");
        }
    }

    #[test]
    fn test_rotated_dimensions() {
        assert_eq!(rotated_dimensions(10, 4, 0.0), (10, 4));
        assert_eq!(rotated_dimensions(10, 4, 90.0), (4, 10));
        assert_eq!(rotated_dimensions(10, 4, -90.0), (4, 10));
        assert_eq!(rotated_dimensions(6, 6, 45.0), (8, 8));
    }

    #[test]
    fn test_quarter_turn_is_counter_clockwise() {
        // Bright pixel at the right end of the top row ends up at the top of
        // the left column after a 90 degree counter-clockwise turn.
        let m = matrix(&[&[0, 0, 9], &[0, 0, 0]]);
        let out = rotate(&m, 90.0, &DeskewConfig::default());
        assert_eq!((out.width(), out.height()), (2, 3));
        assert_eq!(out.row(0), &[9, 0]);
        assert_eq!(out.row(1), &[0, 0]);
        assert_eq!(out.row(2), &[0, 0]);
    }

    #[test]
    fn test_half_turn_reverses() {
        let m = matrix(&[&[1, 2, 3], &[4, 5, 6]]);
        let out = rotate(&m, 180.0, &DeskewConfig::default());
        assert_eq!(out.row(0), &[6, 5, 4]);
        assert_eq!(out.row(1), &[3, 2, 1]);
    }

    #[test]
    fn test_diagonal_becomes_horizontal() {
        // Bright main diagonal (slope +1 as displayed) rotated by +45 degrees.
        let n = 9;
        let mut data = vec![0u32; n * n];
        for i in 0..n {
            data[i * n + i] = 1000;
        }
        let m = IntensityMatrix::from_raw(n, n, data).unwrap();
        let out = rotate(&m, 45.0, &DeskewConfig::default());

        let row_sums = out.row_sums();
        let total: u64 = row_sums.iter().sum();
        let (peak_row, _) = row_sums
            .iter()
            .enumerate()
            .max_by_key(|(_, &s)| s)
            .unwrap();
        let center = (out.height() - 1) / 2;
        assert!(
            peak_row.abs_diff(center) <= 1,
            "peak row {peak_row}, center {center}"
        );
        let band: u64 = row_sums[peak_row.saturating_sub(1)..=(peak_row + 1).min(out.height() - 1)]
            .iter()
            .sum();
        assert!(
            band as f64 > 0.8 * total as f64,
            "band {band} of total {total}"
        );
    }

    #[test]
    fn test_no_reshape_keeps_shape() {
        let img = ImageBuffer::new_fill(7, 5, &[200, 100, 50]).unwrap();
        let config = DeskewConfig {
            reshape: false,
            ..Default::default()
        };
        let out = rotate(&img, 30.0, &config);
        assert_eq!((out.width(), out.height(), out.channels()), (7, 5, 3));
        // Center pixel stays inside the source and keeps its value.
        assert_eq!(out.pixel(3, 2), Some(&[200u8, 100, 50][..]));
        // Corners fall outside the rotated source and take the fill value.
        assert_eq!(out.pixel(0, 0), Some(&[0u8, 0, 0][..]));
    }

    #[test]
    fn test_empty_input() {
        let m = IntensityMatrix::from_raw(0, 0, Vec::new()).unwrap();
        let out = rotate(&m, 30.0, &DeskewConfig::default());
        assert!(out.is_empty());
    }
}
