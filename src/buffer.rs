//! Pixel containers passed between pipeline stages.
//!
//! Both containers are row-major. [`ImageBuffer`] stores interleaved `u8`
//! channels (`[r, g, b, r, g, b, ...]` for a 3-channel image);
//! [`IntensityMatrix`] stores one `u32` channel-sum per pixel.
//!
//! # Coordinate conventions
//!
//! Origin at the top-left pixel, `col` increases to the right and `row`
//! increases downward. Accessors take `(col, row)` in that order.

use crate::error::{Result, SpectrumError};

/// A rectangular grid of multi-channel 8-bit pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Wrap row-major interleaved channel data.
    ///
    /// Fails with [`SpectrumError::MalformedBuffer`] when `channels` is zero or
    /// `data.len() != width * height * channels`.
    pub fn from_raw(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Result<Self> {
        if channels == 0 {
            return Err(SpectrumError::MalformedBuffer(
                "channel count must be at least 1".to_string(),
            ));
        }
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| {
                SpectrumError::MalformedBuffer(format!(
                    "dimensions {width}x{height}x{channels} overflow usize"
                ))
            })?;
        if data.len() != expected {
            return Err(SpectrumError::MalformedBuffer(format!(
                "data length {} does not match {width}x{height}x{channels}={expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Caller guarantees `data.len() == width * height * channels` and `channels > 0`.
    pub(crate) fn from_parts(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Self {
        debug_assert!(channels > 0 && data.len() == width * height * channels);
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// Build a buffer from nested rows of pixels.
    ///
    /// Every row must hold the same number of pixels and every pixel the same
    /// number of channels.
    pub fn from_rows<R, P>(rows: &[R]) -> Result<Self>
    where
        R: AsRef<[P]>,
        P: AsRef<[u8]>,
    {
        let first_row = rows.first().map(|r| r.as_ref()).ok_or_else(|| {
            SpectrumError::MalformedBuffer("no rows supplied".to_string())
        })?;
        let width = first_row.len();
        let channels = first_row
            .first()
            .map(|p| p.as_ref().len())
            .ok_or_else(|| SpectrumError::MalformedBuffer("first row is empty".to_string()))?;

        let mut data = Vec::with_capacity(width * rows.len() * channels);
        for (row_idx, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(SpectrumError::MalformedBuffer(format!(
                    "row {row_idx} has {} pixels, expected {width}",
                    row.len()
                )));
            }
            for (col_idx, pixel) in row.iter().enumerate() {
                let pixel = pixel.as_ref();
                if pixel.len() != channels {
                    return Err(SpectrumError::MalformedBuffer(format!(
                        "pixel ({col_idx}, {row_idx}) has {} channels, expected {channels}",
                        pixel.len()
                    )));
                }
                data.extend_from_slice(pixel);
            }
        }

        Self::from_raw(width, rows.len(), channels, data)
    }

    /// A buffer with every pixel set to `pixel`.
    pub fn new_fill(width: usize, height: usize, pixel: &[u8]) -> Result<Self> {
        let data = pixel.repeat(width * height);
        Self::from_raw(width, height, pixel.len(), data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// `true` when no rows or no columns remain.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Channel values of the pixel at `(col, row)`, or `None` out of bounds.
    pub fn pixel(&self, col: usize, row: usize) -> Option<&[u8]> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let start = (row * self.width + col) * self.channels;
        self.data.get(start..start + self.channels)
    }

    /// Mutable channel values of the pixel at `(col, row)`.
    pub fn pixel_mut(&mut self, col: usize, row: usize) -> Option<&mut [u8]> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let start = (row * self.width + col) * self.channels;
        self.data.get_mut(start..start + self.channels)
    }

    /// Interleaved channel data of one row.
    pub fn row(&self, row: usize) -> &[u8] {
        assert!(row < self.height, "row index out of bounds");
        let stride = self.width * self.channels;
        &self.data[row * stride..(row + 1) * stride]
    }

    /// Iterate over the pixels of one row, left to right.
    pub fn row_pixels(&self, row: usize) -> impl Iterator<Item = &[u8]> + '_ {
        self.row(row).chunks_exact(self.channels)
    }

    /// Iterate over the pixels of one column, top to bottom.
    pub fn column_pixels(&self, col: usize) -> impl Iterator<Item = &[u8]> + '_ {
        assert!(col < self.width, "column index out of bounds");
        (0..self.height).map(move |row| {
            let start = (row * self.width + col) * self.channels;
            &self.data[start..start + self.channels]
        })
    }

    /// Copy the `width x height` region whose top-left corner is `(col, row)`.
    ///
    /// The region must lie inside the buffer.
    pub(crate) fn copy_region(&self, col: usize, row: usize, width: usize, height: usize) -> Self {
        debug_assert!(col + width <= self.width && row + height <= self.height);
        let mut data = Vec::with_capacity(width * height * self.channels);
        for r in row..row + height {
            let start = (r * self.width + col) * self.channels;
            data.extend_from_slice(&self.data[start..start + width * self.channels]);
        }
        Self {
            width,
            height,
            channels: self.channels,
            data,
        }
    }
}

/// Per-pixel channel sums of an [`ImageBuffer`].
///
/// Entries are `u32` so the sum of up to `u8::MAX` channels cannot wrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntensityMatrix {
    width: usize,
    height: usize,
    data: Vec<u32>,
}

impl IntensityMatrix {
    /// Wrap row-major intensity values.
    pub fn from_raw(width: usize, height: usize, data: Vec<u32>) -> Result<Self> {
        let expected = width.checked_mul(height).ok_or_else(|| {
            SpectrumError::MalformedBuffer(format!("dimensions {width}x{height} overflow usize"))
        })?;
        if data.len() != expected {
            return Err(SpectrumError::MalformedBuffer(format!(
                "data length {} does not match {width}x{height}={expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Caller guarantees `data.len() == width * height`.
    pub(crate) fn from_parts(width: usize, height: usize, data: Vec<u32>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    /// Build a matrix from nested rows, rejecting ragged input.
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self> {
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut data = Vec::with_capacity(width * rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(SpectrumError::MalformedBuffer(format!(
                    "row {row_idx} has {} entries, expected {width}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Self::from_raw(width, rows.len(), data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u32] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn get(&self, col: usize, row: usize) -> Option<u32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    pub fn row(&self, row: usize) -> &[u32] {
        assert!(row < self.height, "row index out of bounds");
        &self.data[row * self.width..(row + 1) * self.width]
    }

    /// Largest entry, or 0 for an empty matrix.
    pub fn max(&self) -> u32 {
        self.data.iter().copied().max().unwrap_or(0)
    }

    /// Sum of each row, top to bottom.
    pub fn row_sums(&self) -> Vec<u64> {
        (0..self.height)
            .map(|r| self.row(r).iter().map(|&v| v as u64).sum())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_interleaves_channels() {
        let rows = vec![
            vec![[1u8, 2, 3], [4, 5, 6]],
            vec![[7, 8, 9], [10, 11, 12]],
        ];
        let img = ImageBuffer::from_rows(&rows).unwrap();
        assert_eq!(img.width(), 2);
        assert_eq!(img.height(), 2);
        assert_eq!(img.channels(), 3);
        assert_eq!(img.pixel(1, 0), Some(&[4u8, 5, 6][..]));
        assert_eq!(img.pixel(0, 1), Some(&[7u8, 8, 9][..]));
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!(img.row(1), &[7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![vec![0u8, 0, 0], vec![0, 0, 0]], vec![vec![0, 0, 0]]];
        let err = ImageBuffer::from_rows(&rows).unwrap_err();
        assert!(matches!(err, SpectrumError::MalformedBuffer(_)));
    }

    #[test]
    fn test_inconsistent_channels_rejected() {
        let rows = vec![vec![vec![0u8, 0, 0], vec![0, 0]]];
        let err = ImageBuffer::from_rows(&rows).unwrap_err();
        assert!(matches!(err, SpectrumError::MalformedBuffer(_)));
    }

    #[test]
    fn test_raw_length_mismatch_rejected() {
        assert!(ImageBuffer::from_raw(2, 2, 3, vec![0; 11]).is_err());
        assert!(ImageBuffer::from_raw(2, 2, 0, vec![]).is_err());
        assert!(IntensityMatrix::from_raw(3, 2, vec![0; 5]).is_err());
    }

    #[test]
    fn test_column_pixels_and_region_copy() {
        let data: Vec<u8> = (0..12).collect();
        let img = ImageBuffer::from_raw(3, 2, 2, data).unwrap();
        let col: Vec<&[u8]> = img.column_pixels(1).collect();
        assert_eq!(col, vec![&[2u8, 3][..], &[8, 9][..]]);

        let region = img.copy_region(1, 0, 2, 2);
        assert_eq!(region.width(), 2);
        assert_eq!(region.data(), &[2, 3, 4, 5, 8, 9, 10, 11]);
    }

    #[test]
    fn test_intensity_row_sums() {
        let m = IntensityMatrix::from_rows(&[vec![1u32, 2, 3], vec![10, 20, 30]]).unwrap();
        assert_eq!(m.row_sums(), vec![6, 60]);
        assert_eq!(m.max(), 30);
        assert_eq!(m.get(2, 1), Some(30));
    }
}
