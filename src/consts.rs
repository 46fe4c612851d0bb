//! Constants for the ADM metric.
//!
//! Values match the reference implementation of the ADM feature used by
//! perceptual video-quality suites (VMAF family).

// ============================================================================
// Fixed-point convention
// ============================================================================

/// All fixed-point coefficients are scaled by `2^BIT_SHIFT` and every
/// multiply-accumulate is followed by an arithmetic right shift of the same
/// amount. This shift is the single source of quantization in the transform
/// and must not change.
pub(crate) const BIT_SHIFT: u32 = 15;

// ============================================================================
// Wavelet analysis filters
// ============================================================================

/// Daubechies-2 analysis low-pass taps.
pub(crate) const DWT2_DB2_COEFFS_LO: [f64; 4] = [
    0.482962913144690,
    0.836516303737469,
    0.224143868041857,
    -0.129409522550921,
];

/// Daubechies-2 analysis high-pass taps.
pub(crate) const DWT2_DB2_COEFFS_HI: [f64; 4] = [
    -0.129409522550921,
    -0.224143868041857,
    0.836516303737469,
    -0.482962913144690,
];

// ============================================================================
// Contrast sensitivity
// ============================================================================

/// DWT basis function amplitudes Q(lambda, theta), from
/// "Visibility of Wavelet Quantization Noise" by A. B. Watson, G. Y. Yang,
/// J. A. Solomon and J. Villasenor, IEEE Trans. on Image Processing,
/// Vol. 6, No 8, Aug. 1997, page 1172, Table V.
///
/// Rows are scales 0..3; column 0 is the horizontal/vertical sensitivity,
/// column 1 the diagonal sensitivity. The table is transposed relative to the
/// paper so it can be indexed as `Q[scale][theta_class]` directly. The
/// amplitudes were calculated for the 7-9 biorthogonal wavelet basis.
pub(crate) const Q: [[f64; 2]; 4] = [
    [57.534645, 169.767410],
    [31.265896, 69.937431],
    [23.056629, 40.990150],
    [21.895033, 31.936741],
];

// ============================================================================
// Contrast masking
// ============================================================================

/// Center tap of the 3x3 masking low-pass filter. The eight outer taps are
/// [`CM_FILTER_EDGE`]. The taps sum to 4/15, not 1; this matches the
/// published metric and is intentional.
pub(crate) const CM_FILTER_CENTER: f64 = 1.0 / 15.0;

/// Outer taps of the 3x3 masking low-pass filter.
pub(crate) const CM_FILTER_EDGE: f64 = 1.0 / 30.0;

// ============================================================================
// Pooling and scoring
// ============================================================================

/// Fraction of the frame discarded on each of the 4 sides before pooling.
pub(crate) const ADM_BORDER_FACTOR: f64 = 0.1;

/// Numerator/denominator sums below `NUMDEN_LIMIT_1080P * (w*h) / (1920*1080)`
/// are clamped to zero before the final ratio.
pub(crate) const NUMDEN_LIMIT_1080P: f64 = 1e-2;

/// Quantizes a floating-point filter tap to the shared fixed-point scale.
#[inline]
pub(crate) fn quantize_tap(tap: f64) -> i32 {
    (tap * f64::from(1i32 << BIT_SHIFT)).round() as i32
}
