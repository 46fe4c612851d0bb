//! Reference/distortion decoupling.
//!
//! Splits the distorted detail subbands into a "restored" component (detail
//! the reference can explain) and an "additive" component (everything else).
//! Per pixel, the distorted coefficient is scaled back towards the reference
//! by a gain clamped to [0, 1]; if the (H, V) detail vectors of reference and
//! distorted point within one degree of each other, the distorted value is
//! treated as fully aligned and restored verbatim in all three orientations.

use crate::arena::BandQuad;

/// Guards the gain division when a reference coefficient is zero.
const EPS: f32 = 1e-30;

/// Gain of `t` against `o`, clamped to [0, 1].
///
/// The reciprocal multiply runs in f64 and is truncated to f32, preserving
/// the rounding of the reference implementation.
#[inline]
fn clamped_gain(t: i32, o: i32) -> f32 {
    let k = (f64::from(t) * (1.0 / f64::from(o as f32 + EPS))) as f32;
    k.clamp(0.0, 1.0)
}

/// Decouples `main` against `ref_` into restored (`r`) and additive (`a`)
/// quads. All quads are `w` x `h` at `stride` pixels per row.
#[allow(clippy::too_many_arguments)]
pub(crate) fn decouple(
    ref_: &BandQuad<'_>,
    main: &BandQuad<'_>,
    r: &mut BandQuad<'_>,
    a: &mut BandQuad<'_>,
    w: usize,
    h: usize,
    stride: usize,
) {
    let cos_1deg_sq = ((std::f64::consts::PI / 180.0).cos().powi(2)) as f32;

    for i in 0..h {
        for j in 0..w {
            let idx = i * stride + j;

            let oh = i32::from(ref_.h[idx]);
            let ov = i32::from(ref_.v[idx]);
            let od = i32::from(ref_.d[idx]);
            let th = i32::from(main.h[idx]);
            let tv = i32::from(main.v[idx]);
            let td = i32::from(main.d[idx]);

            let kh = clamped_gain(th, oh);
            let kv = clamped_gain(tv, ov);
            let kd = clamped_gain(td, od);

            let mut tmph = kh * oh as f32;
            let mut tmpv = kv * ov as f32;
            let mut tmpd = kd * od as f32;

            // Angle test on the (H, V) detail vectors: a distortion within
            // one degree of the reference direction is not distortion.
            let ot_dp = (oh * th + ov * tv) as f32;
            let o_mag_sq = (oh * oh + ov * ov) as f32;
            let t_mag_sq = (th * th + tv * tv) as f32;
            let angle_flag = ot_dp >= 0.0 && ot_dp * ot_dp >= cos_1deg_sq * o_mag_sq * t_mag_sq;

            if angle_flag {
                tmph = th as f32;
                tmpv = tv as f32;
                tmpd = td as f32;
            }

            r.h[idx] = tmph.ceil() as i16;
            r.v[idx] = tmpv.ceil() as i16;
            r.d[idx] = tmpd.ceil() as i16;

            a.h[idx] = (th as f32 - tmph).ceil() as i16;
            a.v[idx] = (tv as f32 - tmpv).ceil() as i16;
            a.d[idx] = (td as f32 - tmpd).ceil() as i16;
        }
    }
}
