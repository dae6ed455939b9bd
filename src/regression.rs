//! Locate the tilt of the spectral trace.
//!
//! Bright pixels of an [`IntensityMatrix`] are collected into a point set and
//! an ordinary least-squares line `row = slope·col + intercept` is fitted
//! through them. Rows are measured top-down, so a positive slope means the
//! trace descends to the right as displayed.
//!
//! # Search band
//!
//! For column `c` only rows `0..c` are examined, i.e. the band above the main
//! diagonal. Column 0 therefore never contributes points and a trace
//! lying on or below the diagonal is not seen at all. This matches the
//! instrument's trace geometry; validate it against real frames before
//! relying on it for other setups.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::buffer::IntensityMatrix;
use crate::error::{Result, SpectrumError};

/// Channel-sum at or above which a pixel belongs to the trace.
pub const DEFAULT_BRIGHTNESS_THRESHOLD: u32 = 127;

/// Configuration for trace regression.
#[derive(Debug, Clone)]
pub struct RegressionConfig {
    /// Pixels with intensity `>=` this value are trace candidates.
    /// Default: 127
    pub threshold: u32,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_BRIGHTNESS_THRESHOLD,
        }
    }
}

/// A bright pixel, as `(col, row)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracePoint {
    pub col: usize,
    pub row: usize,
}

/// Line `row = slope·col + intercept` in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    /// Fitted row at column `col`.
    pub fn evaluate(&self, col: f64) -> f64 {
        self.slope * col + self.intercept
    }

    /// Tilt of the line from the horizontal, in degrees.
    ///
    /// Rotating the image by this angle (counter-clockwise positive, as
    /// displayed) brings the line to the horizontal.
    pub fn angle_deg(&self) -> f64 {
        self.slope.atan().to_degrees()
    }
}

/// Result of fitting the trace of an intensity matrix.
#[derive(Debug, Clone)]
pub struct TraceFit {
    /// The fitted line.
    pub line: LineFit,
    /// Bright pixels used in the fit, in scan order (column-major).
    pub points: Vec<TracePoint>,
    /// Column of each point.
    pub xs: Vec<f64>,
    /// Row of each point.
    pub ys: Vec<f64>,
    /// RMS vertical residual of the points about the line, in pixels.
    pub rmse_px: f64,
}

impl TraceFit {
    /// `(col, fitted_row)` for each point, for drawing the line over the points.
    pub fn overlay(&self) -> Vec<(f64, f64)> {
        self.xs.iter().map(|&x| (x, self.line.evaluate(x))).collect()
    }
}

/// Collect trace candidates of `matrix`: every `(c, r)` with `r < c` whose
/// intensity is `>= threshold`, scanning columns left to right.
pub fn collect_trace_points(matrix: &IntensityMatrix, threshold: u32) -> Vec<TracePoint> {
    let mut points = Vec::new();
    for col in 0..matrix.width() {
        for row in 0..col.min(matrix.height()) {
            if matrix.get(col, row).is_some_and(|v| v >= threshold) {
                points.push(TracePoint { col, row });
            }
        }
    }
    points
}

/// Least-squares line through `points`.
///
/// Solves the design matrix `[x, 1]` against the row vector via SVD.
/// Fails with [`SpectrumError::InsufficientPoints`] for fewer than 2 points and
/// with [`SpectrumError::DegenerateFit`] when every point shares one column.
pub fn fit_line(points: &[TracePoint]) -> Result<LineFit> {
    if points.len() < 2 {
        return Err(SpectrumError::InsufficientPoints {
            found: points.len(),
        });
    }
    let first_col = points[0].col;
    if points.iter().all(|p| p.col == first_col) {
        return Err(SpectrumError::DegenerateFit(format!(
            "all {} points lie in column {first_col}",
            points.len()
        )));
    }

    let n = points.len();
    let mut a_mat = DMatrix::<f64>::zeros(n, 2);
    let mut b_vec = DVector::<f64>::zeros(n);
    for (i, p) in points.iter().enumerate() {
        a_mat[(i, 0)] = p.col as f64;
        a_mat[(i, 1)] = 1.0;
        b_vec[i] = p.row as f64;
    }

    let svd = a_mat.svd(true, true);
    let coeffs = svd
        .solve(&b_vec, 1e-12)
        .map_err(|e| SpectrumError::DegenerateFit(e.to_string()))?;

    let line = LineFit {
        slope: coeffs[0],
        intercept: coeffs[1],
    };
    if !line.slope.is_finite() || !line.intercept.is_finite() {
        return Err(SpectrumError::DegenerateFit(format!(
            "non-finite solution slope={}, intercept={}",
            line.slope, line.intercept
        )));
    }
    Ok(line)
}

/// Collect trace points of `matrix` and fit a line through them.
pub fn fit_trace(matrix: &IntensityMatrix, config: &RegressionConfig) -> Result<TraceFit> {
    let points = collect_trace_points(matrix, config.threshold);
    let line = fit_line(&points).inspect_err(|e| {
        warn!(
            "Trace fit failed on {}x{} matrix at threshold {}: {}",
            matrix.width(),
            matrix.height(),
            config.threshold,
            e
        );
    })?;

    let xs: Vec<f64> = points.iter().map(|p| p.col as f64).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.row as f64).collect();
    let sum_sq: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(&x, &y)| (y - line.evaluate(x)).powi(2))
        .sum();
    let rmse_px = (sum_sq / points.len() as f64).sqrt();

    debug!(
        "Trace fit: slope={:.4}, intercept={:.3}, angle={:.2} deg, points={}, RMSE {:.3} px",
        line.slope,
        line.intercept,
        line.angle_deg(),
        points.len(),
        rmse_px
    );

    Ok(TraceFit {
        line,
        points,
        xs,
        ys,
        rmse_px,
    })
}
