//! The multi-scale driver.
//!
//! Runs the per-scale pipeline four times: DWT, decoupling, CSF weighting of
//! the reference/restored/additive quads, masking, and energy pooling, then
//! feeds each scale's approximation band forward as the next scale's working
//! image. The scales are a hard data dependency chain and run sequentially.

use crate::arena::Arena;
use crate::cm::{cm_mask, cm_threshold};
use crate::consts::NUMDEN_LIMIT_1080P;
use crate::csf::csf;
use crate::decouple::decouple;
use crate::dwt::{dwt2, DwtSample, FilterBank};
use crate::pool::sum_cube;
use crate::{AdmScore, ScaleScore};

/// Copies the top-left `w` x `h` rectangle between two arena planes sharing
/// one stride.
fn copy_band(src: &[i16], dst: &mut [i16], w: usize, h: usize, stride: usize) {
    for i in 0..h {
        let start = i * stride;
        dst[start..start + w].copy_from_slice(&src[start..start + w]);
    }
}

/// Evaluates one frame pair. `ref_buf`/`main_buf` are the scale-0 luma
/// planes, `width` x `height` samples at their own pixel strides; deeper
/// scales run on the arena's working planes.
#[allow(clippy::too_many_arguments)]
pub(crate) fn compute_adm<S: DwtSample>(
    bank: &FilterBank,
    arena: &mut Arena,
    temp_lo: &mut [i16],
    temp_hi: &mut [i16],
    width: usize,
    height: usize,
    ref_buf: &[S],
    ref_stride: usize,
    main_buf: &[S],
    main_stride: usize,
) -> AdmScore {
    let numden_limit = NUMDEN_LIMIT_1080P * (width * height) as f64 / (1920.0 * 1080.0);

    let mut ws = arena.workspace();
    let stride = ws.stride;

    let mut w = width;
    let mut h = height;

    let mut num = 0.0f64;
    let mut den = 0.0f64;
    let mut scales = [ScaleScore::default(); 4];

    for scale in 0..4 {
        if scale == 0 {
            dwt2(
                bank, ref_buf, ref_stride, &mut ws.ref_dwt2, stride, w, h, temp_lo, temp_hi,
            );
            dwt2(
                bank, main_buf, main_stride, &mut ws.main_dwt2, stride, w, h, temp_lo, temp_hi,
            );
        } else {
            dwt2(
                bank, &*ws.ref_scale, stride, &mut ws.ref_dwt2, stride, w, h, temp_lo, temp_hi,
            );
            dwt2(
                bank, &*ws.main_scale, stride, &mut ws.main_dwt2, stride, w, h, temp_lo, temp_hi,
            );
        }

        w = w.div_ceil(2);
        h = h.div_ceil(2);

        decouple(
            &ws.ref_dwt2,
            &ws.main_dwt2,
            &mut ws.decouple_r,
            &mut ws.decouple_a,
            w,
            h,
            stride,
        );

        csf(&ws.ref_dwt2, &mut ws.csf_o, scale, w, h, stride);
        csf(&ws.decouple_r, &mut ws.csf_r, scale, w, h, stride);
        csf(&ws.decouple_a, &mut ws.csf_a, scale, w, h, stride);

        cm_threshold(&ws.csf_a, ws.mta, w, h, stride);
        cm_mask(&ws.csf_r, &mut ws.cm_r, ws.mta, w, h, stride);

        let mut num_scale = 0.0f64;
        for band in ws.cm_r.details() {
            num_scale += sum_cube(band, w, h, stride);
        }
        let mut den_scale = 0.0f64;
        for band in ws.csf_o.details() {
            den_scale += sum_cube(band, w, h, stride);
        }

        num += num_scale;
        den += den_scale;
        scales[scale] = ScaleScore {
            numerator: num_scale,
            denominator: den_scale,
        };

        // The approximation bands become the next scale's input planes.
        copy_band(&*ws.ref_dwt2.a, ws.ref_scale, w, h, stride);
        copy_band(&*ws.main_dwt2.a, ws.main_scale, w, h, stride);
    }

    let num = if num < numden_limit { 0.0 } else { num };
    let den = if den < numden_limit { 0.0 } else { den };

    // A zero denominator means no detectable reference detail survived the
    // noise floor; the pair is scored as undegraded.
    let score = if den == 0.0 { 1.0 } else { num / den };

    AdmScore {
        score,
        numerator: num,
        denominator: den,
        scales,
    }
}
