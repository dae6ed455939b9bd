//! Trim dark margins from the edges of an image buffer.
//!
//! Raw spectrum frames usually carry black padding around the exposed strip.
//! Cropping removes every edge row/column whose pixels all have a channel-sum
//! at or below the deletion threshold, in four passes:
//!
//! ```text
//! Top → Bottom → Right → Left → Done
//! ```
//!
//! Each pass repeats until its edge holds at least one bright pixel, then hands
//! over to the next pass. A pass never runs again once it has converged.
//!
//! All passes check that rows and columns remain before reading an edge, so an
//! all-dark buffer shrinks to an empty buffer instead of reading past the end.

use tracing::{debug, trace};

use crate::buffer::ImageBuffer;
use crate::channel_sum::channel_sum;
use crate::error::{Result, SpectrumError};

/// Channel-sum at or below which a pixel counts as empty.
pub const DEFAULT_DELETION_THRESHOLD: u32 = 127;

/// Configuration for border cropping.
#[derive(Debug, Clone)]
pub struct CropConfig {
    /// Pixels with a channel-sum `<=` this value are treated as empty.
    /// Default: 127
    pub deletion_threshold: u32,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            deletion_threshold: DEFAULT_DELETION_THRESHOLD,
        }
    }
}

/// Region of the source buffer that survives cropping.
///
/// `left`/`top` locate the region in source coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBounds {
    pub left: usize,
    pub top: usize,
    pub width: usize,
    pub height: usize,
}

impl CropBounds {
    /// `true` when cropping removed every row or every column.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CropPass {
    Top,
    Bottom,
    Right,
    Left,
    Done,
}

/// Locate the region left after trimming dark edges from `img`.
pub fn crop_bounds(img: &ImageBuffer, deletion_threshold: u32) -> CropBounds {
    let is_dark = |p: &[u8]| channel_sum(p) <= deletion_threshold;

    // Half-open bounds: rows [top, bottom), columns [left, right).
    let mut top = 0usize;
    let mut bottom = img.height();
    let mut left = 0usize;
    let mut right = img.width();

    let row_is_dark = |row: usize, left: usize, right: usize| {
        (left..right).all(|col| img.pixel(col, row).is_some_and(is_dark))
    };
    let col_is_dark = |col: usize, top: usize, bottom: usize| {
        (top..bottom).all(|row| img.pixel(col, row).is_some_and(is_dark))
    };

    let mut pass = CropPass::Top;
    while pass != CropPass::Done {
        let remaining = top < bottom && left < right;
        pass = match pass {
            CropPass::Top => {
                if remaining && row_is_dark(top, left, right) {
                    trace!("cropping row {}", top);
                    top += 1;
                    CropPass::Top
                } else {
                    CropPass::Bottom
                }
            }
            CropPass::Bottom => {
                if remaining && row_is_dark(bottom - 1, left, right) {
                    trace!("cropping row {}", bottom - 1);
                    bottom -= 1;
                    CropPass::Bottom
                } else {
                    CropPass::Right
                }
            }
            CropPass::Right => {
                if remaining && col_is_dark(right - 1, top, bottom) {
                    trace!("cropping column {}", right - 1);
                    right -= 1;
                    CropPass::Right
                } else {
                    CropPass::Left
                }
            }
            CropPass::Left => {
                if remaining && col_is_dark(left, top, bottom) {
                    trace!("cropping column {}", left);
                    left += 1;
                    CropPass::Left
                } else {
                    CropPass::Done
                }
            }
            CropPass::Done => CropPass::Done,
        };
    }

    CropBounds {
        left,
        top,
        width: right - left,
        height: bottom - top,
    }
}

/// Trim dark margins from all four sides of `img`.
///
/// Always returns a new buffer; when no edge is dark it is an equal copy of
/// the input. An all-dark input yields an empty buffer (zero rows or zero
/// columns). Use [`crop_checked`] to treat that case as an error.
pub fn crop(img: &ImageBuffer, config: &CropConfig) -> ImageBuffer {
    let bounds = crop_bounds(img, config.deletion_threshold);
    debug!(
        "Crop: {}x{} -> {}x{} at ({}, {}), threshold {}",
        img.width(),
        img.height(),
        bounds.width,
        bounds.height,
        bounds.left,
        bounds.top,
        config.deletion_threshold
    );
    img.copy_region(bounds.left, bounds.top, bounds.width, bounds.height)
}

/// Like [`crop`], but fails with [`SpectrumError::ExhaustedBuffer`] when no
/// rows or columns remain.
pub fn crop_checked(img: &ImageBuffer, config: &CropConfig) -> Result<ImageBuffer> {
    let cropped = crop(img, config);
    if cropped.is_empty() {
        return Err(SpectrumError::ExhaustedBuffer {
            threshold: config.deletion_threshold,
        });
    }
    Ok(cropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DARK: [u8; 3] = [0, 0, 0];
    const DIM: [u8; 3] = [42, 42, 43]; // sum 127, still "empty"
    const BRIGHT: [u8; 3] = [255, 255, 255];

    /// Build a 3-channel buffer from a character map: '#' bright, '+' dim, '.' dark.
    fn scene(rows: &[&str]) -> ImageBuffer {
        let pixels: Vec<Vec<[u8; 3]>> = rows
            .iter()
            .map(|r| {
                r.chars()
                    .map(|c| match c {
                        '#' => BRIGHT,
                        '+' => DIM,
                        _ => DARK,
                    })
                    .collect()
            })
            .collect();
        ImageBuffer::from_rows(&pixels).unwrap()
    }

    #[test]
    fn test_crop_removes_dark_frame() {
        let img = scene(&[
            ".....", //
            "..#..", //
            ".###.", //
            ".....", //
            ".....", //
        ]);
        let bounds = crop_bounds(&img, DEFAULT_DELETION_THRESHOLD);
        assert_eq!(
            bounds,
            CropBounds {
                left: 1,
                top: 1,
                width: 3,
                height: 2
            }
        );

        let cropped = crop(&img, &CropConfig::default());
        assert_eq!(cropped.width(), 3);
        assert_eq!(cropped.height(), 2);
        assert_eq!(cropped.pixel(1, 0), Some(&BRIGHT[..]));
        assert_eq!(cropped.pixel(0, 0), Some(&DARK[..]));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // A row of sum-127 pixels is deleted at the default threshold ...
        let img = scene(&["+++", "###"]);
        let cropped = crop(&img, &CropConfig::default());
        assert_eq!(cropped.height(), 1);

        // ... but kept once the threshold drops below it.
        let cropped = crop(
            &img,
            &CropConfig {
                deletion_threshold: 126,
            },
        );
        assert_eq!(cropped.height(), 2);
    }

    #[test]
    fn test_single_bright_pixel_halts_pass() {
        let img = scene(&[
            "#....", //
            ".....", //
            ".....", //
        ]);
        let cropped = crop(&img, &CropConfig::default());
        // Top pass stops at row 0; bottom removes rows 2 and 1; right removes columns 4..1.
        assert_eq!((cropped.width(), cropped.height()), (1, 1));
        assert_eq!(cropped.pixel(0, 0), Some(&BRIGHT[..]));
    }

    #[test]
    fn test_bright_corner_keeps_margins() {
        let img = scene(&[
            "...#", //
            "##..", //
            "##..", //
        ]);
        let cropped = crop(&img, &CropConfig::default());
        assert_eq!(cropped, img);
    }

    #[test]
    fn test_all_bright_is_unchanged_copy() {
        let img = ImageBuffer::new_fill(4, 3, &BRIGHT).unwrap();
        let cropped = crop(&img, &CropConfig::default());
        assert_eq!(cropped, img);
        assert_ne!(cropped.data().as_ptr(), img.data().as_ptr());
    }

    #[test]
    fn test_all_dark_terminates_empty() {
        let img = ImageBuffer::new_fill(6, 4, &DARK).unwrap();
        let cropped = crop(&img, &CropConfig::default());
        assert!(cropped.is_empty());
        assert_eq!(cropped.height(), 0);

        let err = crop_checked(&img, &CropConfig::default()).unwrap_err();
        assert_eq!(err, SpectrumError::ExhaustedBuffer { threshold: 127 });
    }

    #[test]
    fn test_empty_input_terminates() {
        let img = ImageBuffer::from_raw(0, 0, 3, Vec::new()).unwrap();
        let cropped = crop(&img, &CropConfig::default());
        assert!(cropped.is_empty());

        let img = ImageBuffer::from_raw(5, 0, 3, Vec::new()).unwrap();
        assert_eq!(crop_bounds(&img, 127).width, 5);
    }

    #[test]
    fn test_crop_is_idempotent_and_monotone() {
        let img = scene(&[
            "........", //
            "...#....", //
            "..###+..", //
            ".#####..", //
            "....+...", //
            "........", //
        ]);
        let config = CropConfig::default();
        let once = crop(&img, &config);
        let twice = crop(&once, &config);
        assert_eq!(once, twice);
        assert!(once.width() <= img.width());
        assert!(once.height() <= img.height());
        assert_eq!((once.width(), once.height()), (5, 3));
    }
}
