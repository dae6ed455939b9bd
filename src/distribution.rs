//! Histogram of channel-sums, for choosing crop and trace thresholds.

use crate::buffer::IntensityMatrix;

/// Count how many pixels of `matrix` have each channel-sum.
///
/// Returns `255 * channels + 1` bins; bin `v` counts pixels with sum `v`.
/// Sums beyond the last bin (only possible when `channels` understates the
/// source) are counted in the last bin.
pub fn pixel_distribution(matrix: &IntensityMatrix, channels: usize) -> Vec<u64> {
    let bins = 255 * channels + 1;
    let mut counts = vec![0u64; bins];
    for &v in matrix.data() {
        let idx = (v as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
}

/// Smallest channel-sum `t` such that at least `fraction` of the pixels have
/// a sum `<= t`.
///
/// Handy for picking a deletion threshold from the dark background level.
/// Returns `None` for an empty histogram.
pub fn distribution_quantile(counts: &[u64], fraction: f64) -> Option<u32> {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return None;
    }
    let target = (fraction.clamp(0.0, 1.0) * total as f64).ceil().max(1.0) as u64;
    let mut seen = 0u64;
    for (value, &count) in counts.iter().enumerate() {
        seen += count;
        if seen >= target {
            return Some(value as u32);
        }
    }
    Some(counts.len().saturating_sub(1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_counts() {
        let m = IntensityMatrix::from_rows(&[vec![0u32, 0, 765], vec![300, 0, 765]]).unwrap();
        let counts = pixel_distribution(&m, 3);
        assert_eq!(counts.len(), 766);
        assert_eq!(counts[0], 3);
        assert_eq!(counts[300], 1);
        assert_eq!(counts[765], 2);
        assert_eq!(counts.iter().sum::<u64>(), 6);
    }

    #[test]
    fn test_distribution_does_not_wrap() {
        // 8-bit counters would wrap at 256 pixels.
        let m = IntensityMatrix::from_raw(20, 20, vec![5; 400]).unwrap();
        assert_eq!(pixel_distribution(&m, 1)[5], 400);
    }

    #[test]
    fn test_quantile() {
        let mut counts = vec![0u64; 766];
        counts[10] = 90;
        counts[600] = 10;
        assert_eq!(distribution_quantile(&counts, 0.5), Some(10));
        assert_eq!(distribution_quantile(&counts, 0.9), Some(10));
        assert_eq!(distribution_quantile(&counts, 0.95), Some(600));
        assert_eq!(distribution_quantile(&counts, 0.0), Some(10));
        assert_eq!(distribution_quantile(&[0; 4], 0.5), None);
    }
}
