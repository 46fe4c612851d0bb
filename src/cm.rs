//! Contrast masking.
//!
//! Distortion-induced texture masks nearby restored detail. The threshold at
//! each pixel is a small low-pass sum over the absolute CSF-weighted additive
//! bands of all three orientations; restored detail below that threshold is
//! perceptually indistinguishable from the distortion and is removed.

use crate::arena::BandQuad;
use crate::consts::{quantize_tap, BIT_SHIFT, CM_FILTER_CENTER, CM_FILTER_EDGE};

/// Reflects `idx` into `[0, len)`, folding past the far edge.
#[inline]
fn mirror(idx: isize, len: usize) -> usize {
    let mut k = idx.unsigned_abs();
    if k >= len {
        k = (2 * len).saturating_sub(k + 1);
    }
    k
}

/// Computes the per-pixel masking threshold from the weighted additive bands.
///
/// For each orientation, a 3x3 low-pass filter (center 1/15, outer taps 1/30,
/// deliberately un-normalized) runs over the absolute coefficients with
/// mirror boundary extension; the three filtered values are summed into one
/// threshold per pixel.
pub(crate) fn cm_threshold(
    src: &BandQuad<'_>,
    dst: &mut [i16],
    w: usize,
    h: usize,
    stride: usize,
) {
    let center = quantize_tap(CM_FILTER_CENTER);
    let edge = quantize_tap(CM_FILTER_EDGE);

    for i in 0..h {
        for j in 0..w {
            dst[i * stride + j] = 0;
        }

        for src_band in src.details() {
            for j in 0..w {
                let mut sum = 0i32;

                for filt_i in 0..3usize {
                    for filt_j in 0..3usize {
                        let coeff = if filt_i == 1 && filt_j == 1 { center } else { edge };

                        let src_i = mirror(i as isize - 1 + filt_i as isize, h);
                        let src_j = mirror(j as isize - 1 + filt_j as isize, w);

                        let px = i32::from(src_band[src_i * stride + src_j].unsigned_abs());
                        sum += coeff * px;
                    }
                }

                dst[i * stride + j] += (sum >> BIT_SHIFT) as i16;
            }
        }
    }
}

/// Subtracts the masking threshold from the absolute restored bands,
/// flooring at zero.
pub(crate) fn cm_mask(
    src: &BandQuad<'_>,
    dst: &mut BandQuad<'_>,
    thresh: &[i16],
    w: usize,
    h: usize,
    stride: usize,
) {
    for i in 0..h {
        for j in 0..w {
            let idx = i * stride + j;
            let thr = i32::from(thresh[idx]);

            let xh = (i32::from(src.h[idx].unsigned_abs()) - thr).max(0);
            let xv = (i32::from(src.v[idx].unsigned_abs()) - thr).max(0);
            let xd = (i32::from(src.d[idx].unsigned_abs()) - thr).max(0);

            dst.h[idx] = xh as i16;
            dst.v[idx] = xv as i16;
            dst.d[idx] = xd as i16;
        }
    }
}
