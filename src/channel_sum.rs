//! Collapse multi-channel pixels into scalar brightness.

use tracing::debug;

use crate::buffer::{ImageBuffer, IntensityMatrix};

/// Sum of a pixel's channel values.
///
/// No clamping or validation: the result for `n` channels lies in `0..=255 * n`.
pub fn channel_sum(pixel: &[u8]) -> u32 {
    pixel.iter().map(|&v| v as u32).sum()
}

/// Per-pixel channel sums of `img`, with identical row/column shape.
pub fn intensity_matrix(img: &ImageBuffer) -> IntensityMatrix {
    let data: Vec<u32> = if img.is_empty() {
        Vec::new()
    } else {
        img.data().chunks_exact(img.channels()).map(channel_sum).collect()
    };

    debug!(
        "Channel sums: {}x{} pixels, {} channels",
        img.width(),
        img.height(),
        img.channels()
    );

    IntensityMatrix::from_parts(img.width(), img.height(), data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sum_bounds() {
        assert_eq!(channel_sum(&[0, 0, 0]), 0);
        assert_eq!(channel_sum(&[255, 255, 255]), 765);
        assert_eq!(channel_sum(&[255; 4]), 1020);
        assert_eq!(channel_sum(&[12, 34, 56]), 102);
        assert_eq!(channel_sum(&[]), 0);

        for n in 1..=8usize {
            for v in [0u8, 1, 127, 128, 254, 255] {
                let s = channel_sum(&vec![v; n]);
                assert!(s <= 255 * n as u32);
                assert_eq!(s, v as u32 * n as u32);
            }
        }
    }

    #[test]
    fn test_intensity_matrix_shape() {
        let img = ImageBuffer::from_rows(&[
            vec![[10u8, 20, 30], [255, 255, 255], [0, 0, 1]],
            vec![[1, 1, 1], [2, 2, 2], [3, 3, 3]],
        ])
        .unwrap();
        let m = intensity_matrix(&img);
        assert_eq!(m.width(), 3);
        assert_eq!(m.height(), 2);
        assert_eq!(m.row(0), &[60, 765, 1]);
        assert_eq!(m.row(1), &[3, 6, 9]);
    }
}
