//! Contrast-sensitivity weighting.
//!
//! Each detail orientation is rescaled by the fixed-point reciprocal of the
//! Watson basis-function amplitude for its scale, making coefficients
//! comparable across scales in units of visual sensitivity. Horizontal and
//! vertical detail share one amplitude, diagonal detail has its own.

use crate::arena::BandQuad;
use crate::consts::{quantize_tap, BIT_SHIFT, Q};

/// Fixed-point reciprocal sensitivities for one scale, in (H, V, D) order.
#[inline]
pub(crate) fn csf_factors(scale: usize) -> [i32; 3] {
    let hv = quantize_tap(1.0 / Q[scale][0]);
    let diag = quantize_tap(1.0 / Q[scale][1]);
    [hv, hv, diag]
}

/// Weights the three detail orientations of `src` into `dst`.
pub(crate) fn csf(
    src: &BandQuad<'_>,
    dst: &mut BandQuad<'_>,
    scale: usize,
    w: usize,
    h: usize,
    stride: usize,
) {
    let rfactor = csf_factors(scale);

    for (theta, dst_band) in dst.details_mut().into_iter().enumerate() {
        let src_band = match theta {
            0 => &*src.h,
            1 => &*src.v,
            _ => &*src.d,
        };
        let factor = rfactor[theta];

        for i in 0..h {
            for j in 0..w {
                let idx = i * stride + j;
                dst_band[idx] = ((factor * i32::from(src_band[idx])) >> BIT_SHIFT) as i16;
            }
        }
    }
}
