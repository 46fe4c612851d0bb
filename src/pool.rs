//! Cube-power energy pooling.
//!
//! One subband collapses to a scalar as the cube root of the sum of cubed
//! absolute coefficients over the interior of the band, with 10% of the
//! frame discarded on every side. A small additive term proportional to the
//! cropped area keeps near-uniform content away from degenerate zeros.

use crate::consts::ADM_BORDER_FACTOR;

/// Pooled energy of one `w` x `h` band at `stride` pixels per row.
pub(crate) fn sum_cube(band: &[i16], w: usize, h: usize, stride: usize) -> f64 {
    // Truncation towards zero matches the reference crop arithmetic; for
    // tiny bands the crop collapses to the full band.
    let left = (w as f64 * ADM_BORDER_FACTOR - 0.5).max(0.0) as usize;
    let top = (h as f64 * ADM_BORDER_FACTOR - 0.5).max(0.0) as usize;
    let right = w - left;
    let bottom = h - top;

    let mut sum = 0i64;
    for i in top..bottom {
        for j in left..right {
            let v = i64::from(band[i * stride + j].unsigned_abs());
            sum += v * v * v;
        }
    }

    let area = ((bottom - top) * (right - left)) as f64;
    (sum as f64).cbrt().ceil() + (area / 32.0).cbrt().ceil()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_band_pools_to_regularizer_only() {
        let band = vec![0i16; 64 * 64];
        let pooled = sum_cube(&band, 64, 64, 64);
        // 10% crop on each side of 64 leaves 54x54 = 2916 pixels.
        let expected = (2916.0f64 / 32.0).cbrt().ceil();
        assert_eq!(pooled, expected);
    }

    #[test]
    fn test_border_is_discarded() {
        let w = 20;
        let mut band = vec![0i16; w * w];
        // left = trunc(20 * 0.1 - 0.5) = 1, so column 0 is outside the crop.
        band[0] = i16::MAX;
        let clean = vec![0i16; w * w];
        assert_eq!(sum_cube(&band, w, w, w), sum_cube(&clean, w, w, w));
    }

    #[test]
    fn test_pooling_is_monotonic_in_magnitude() {
        let w = 16;
        let base: Vec<i16> = (0..w * w).map(|i| ((i % 13) as i16) - 6).collect();
        let scaled: Vec<i16> = base.iter().map(|&x| x * 3).collect();
        assert!(sum_cube(&scaled, w, w, w) >= sum_cube(&base, w, w, w));
    }

    #[test]
    fn test_tiny_band_crop_collapses_to_full_band() {
        let band = vec![5i16; 4];
        // w*0.1 - 0.5 is negative for w < 5; the crop must clamp to zero
        // rather than wrap.
        let pooled = sum_cube(&band, 2, 2, 2);
        let cubes = 4.0f64 * 125.0;
        assert_eq!(pooled, cubes.cbrt().ceil() + (4.0f64 / 32.0).cbrt().ceil());
    }
}
