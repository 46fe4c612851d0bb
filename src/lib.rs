//! # ADM
//!
//! ADM (Additive Detail Measure) is a full-reference video quality metric
//! used by perceptual video-quality suites such as VMAF. It compares a
//! reference luma plane against a distorted one of identical dimensions and
//! reports how much perceptually relevant detail survived.
//!
//! The pipeline runs four wavelet scales. At each scale the frames are
//! decomposed with a fixed-point Daubechies-2 DWT, the distortion is
//! decoupled into a "restored" component (detail the reference explains) and
//! an "additive" component (detail it does not), both are weighted by
//! contrast sensitivity, the restored detail is thresholded against the
//! contrast masking exerted by the additive component, and the surviving
//! energy is pooled into a per-scale numerator/denominator pair.
//!
//! ## Score interpretation
//!
//! - Score ~1.0: no detectable degradation
//! - Score < 1.0: detail was lost or corrupted; lower is worse
//!
//! ## Example
//!
//! ```rust
//! use adm_oxide::{AdmContext, BitDepth, LumaRef};
//! use imgref::Img;
//!
//! let width = 64;
//! let height = 64;
//! let luma: Vec<u8> = vec![128; width * height];
//! let plane = Img::new(luma, width, height);
//!
//! let mut ctx = AdmContext::new(width, height, BitDepth::Eight)?;
//! let result = ctx.evaluate(
//!     LumaRef::Depth8(plane.as_ref()),
//!     LumaRef::Depth8(plane.as_ref()),
//! )?;
//! assert!((result.score - 1.0).abs() <= 0.01);
//!
//! // One context serves one stream; tearing it down yields the mean score.
//! let average = ctx.finalize();
//! assert!((average - 1.0).abs() <= 0.01);
//! # Ok::<(), adm_oxide::AdmError>(())
//! ```
//!
//! ## References
//!
//! - S. Li, F. Zhang, L. Ma, K. Ngan, "Image Quality Assessment by Separately
//!   Evaluating Detail Losses and Additive Impairments", IEEE Trans. on
//!   Multimedia, Vol. 13, No 5, Oct. 2011
//! - <https://github.com/Netflix/vmaf>

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
// Allow fixed-point arithmetic patterns ported with exact numeric behavior
#![allow(clippy::many_single_char_names)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]

mod arena;
mod cm;
mod consts;
mod csf;
mod decouple;
mod dwt;
mod pool;
mod score;

use arena::Arena;
use dwt::FilterBank;

// Re-export imgref types for convenience
pub use imgref::{Img, ImgRef, ImgVec};

/// Error type for ADM operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AdmError {
    /// The arena or scratch rows could not be allocated.
    OutOfMemory,
    /// A plane's dimensions don't match the context.
    ShapeMismatch {
        /// Width the context was configured for.
        expected_w: usize,
        /// Height the context was configured for.
        expected_h: usize,
        /// Width of the offending plane.
        got_w: usize,
        /// Height of the offending plane.
        got_h: usize,
    },
    /// A plane's row stride is smaller than its width.
    StrideTooSmall {
        /// Plane width in pixels.
        width: usize,
        /// Plane stride in pixels.
        stride: usize,
    },
    /// The bit depth is not 8 or 10, or doesn't match the context.
    UnsupportedBitDepth {
        /// The offending bit depth.
        bits: u32,
    },
    /// Width or height is zero.
    InvalidDimensions {
        /// Width provided.
        width: usize,
        /// Height provided.
        height: usize,
    },
}

impl std::fmt::Display for AdmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "failed to allocate working buffers"),
            Self::ShapeMismatch {
                expected_w,
                expected_h,
                got_w,
                got_h,
            } => {
                write!(
                    f,
                    "plane is {got_w}x{got_h} but the context expects {expected_w}x{expected_h}"
                )
            }
            Self::StrideTooSmall { width, stride } => {
                write!(f, "row stride {stride} is smaller than plane width {width}")
            }
            Self::UnsupportedBitDepth { bits } => {
                write!(f, "unsupported bit depth {bits} (expected 8 or 10)")
            }
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid dimensions: {width}x{height}")
            }
        }
    }
}

impl std::error::Error for AdmError {}

/// Input sample depth of a luma plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    /// 8-bit unsigned samples.
    Eight,
    /// 10-bit unsigned samples stored in 16 bits.
    Ten,
}

impl BitDepth {
    /// Creates a `BitDepth` from a bit count.
    ///
    /// # Errors
    /// Returns [`AdmError::UnsupportedBitDepth`] unless `bits` is 8 or 10.
    pub fn new(bits: u32) -> Result<Self, AdmError> {
        match bits {
            8 => Ok(Self::Eight),
            10 => Ok(Self::Ten),
            _ => Err(AdmError::UnsupportedBitDepth { bits }),
        }
    }

    /// The number of significant bits per sample.
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::Eight => 8,
            Self::Ten => 10,
        }
    }
}

/// A borrowed single-plane luma image at a declared bit depth.
///
/// `ImgRef` carries width, height and pixel stride, so planes with row
/// padding are passed without copying.
#[derive(Clone, Copy)]
pub enum LumaRef<'a> {
    /// 8-bit samples.
    Depth8(ImgRef<'a, u8>),
    /// 10-bit samples in 16-bit storage.
    Depth10(ImgRef<'a, u16>),
}

impl LumaRef<'_> {
    /// Plane width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        match self {
            Self::Depth8(p) => p.width(),
            Self::Depth10(p) => p.width(),
        }
    }

    /// Plane height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        match self {
            Self::Depth8(p) => p.height(),
            Self::Depth10(p) => p.height(),
        }
    }

    /// Pixel stride of one row.
    #[must_use]
    pub fn stride(&self) -> usize {
        match self {
            Self::Depth8(p) => p.stride(),
            Self::Depth10(p) => p.stride(),
        }
    }

    /// Declared sample depth.
    #[must_use]
    pub fn depth(&self) -> BitDepth {
        match self {
            Self::Depth8(_) => BitDepth::Eight,
            Self::Depth10(_) => BitDepth::Ten,
        }
    }
}

/// Per-scale numerator/denominator pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScaleScore {
    /// Pooled energy of the masked restored bands.
    pub numerator: f64,
    /// Pooled energy of the weighted reference bands.
    pub denominator: f64,
}

/// Result of one frame-pair evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdmScore {
    /// Detail retention ratio in `[0, inf)`. 1.0 means no detectable
    /// degradation.
    pub score: f64,
    /// Numerator summed across all 4 scales, after the noise-floor clamp.
    pub numerator: f64,
    /// Denominator summed across all 4 scales, after the noise-floor clamp.
    pub denominator: f64,
    /// Raw per-scale pairs, finest scale first.
    pub scales: [ScaleScore; 4],
}

/// Persistent per-stream metric state.
///
/// A context is created once per distinct (width, height, bit depth) input
/// configuration, reused for every frame pair of the stream, and consumed by
/// [`AdmContext::finalize`] at stream end. The working arena is allocated
/// once here and reused in place by every call; `&mut self` on
/// [`AdmContext::evaluate`] makes the single-writer requirement explicit.
pub struct AdmContext {
    width: usize,
    height: usize,
    depth: BitDepth,
    bank: FilterBank,
    arena: Arena,
    temp_lo: Vec<i16>,
    temp_hi: Vec<i16>,
    score_sum: f64,
    frames: u64,
}

impl AdmContext {
    /// Creates a context for `width` x `height` planes of the given depth.
    ///
    /// Allocates the working arena (35 half-resolution subband buffers) and
    /// two scratch rows, and quantizes the wavelet filter bank to fixed
    /// point.
    ///
    /// # Errors
    /// [`AdmError::InvalidDimensions`] for zero width or height,
    /// [`AdmError::OutOfMemory`] if allocation fails.
    pub fn new(width: usize, height: usize, depth: BitDepth) -> Result<Self, AdmError> {
        if width == 0 || height == 0 {
            return Err(AdmError::InvalidDimensions { width, height });
        }

        let arena = Arena::new(width, height)?;
        let temp_lo = alloc_scratch_row(width)?;
        let temp_hi = alloc_scratch_row(width)?;

        Ok(Self {
            width,
            height,
            depth,
            bank: FilterBank::quantized(),
            arena,
            temp_lo,
            temp_hi,
            score_sum: 0.0,
            frames: 0,
        })
    }

    /// Configured plane width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Configured plane height.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Configured sample depth.
    #[must_use]
    pub fn depth(&self) -> BitDepth {
        self.depth
    }

    /// Number of frame pairs evaluated so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Scores one (reference, distorted) frame pair.
    ///
    /// Both planes must match the context's configured dimensions and bit
    /// depth. On success the per-call statistics are returned and the running
    /// average is updated as a side effect.
    ///
    /// # Errors
    /// [`AdmError::ShapeMismatch`], [`AdmError::StrideTooSmall`] or
    /// [`AdmError::UnsupportedBitDepth`] when a plane is inconsistent with
    /// the context. All checks run before any computation; no partial score
    /// is ever produced.
    pub fn evaluate(
        &mut self,
        reference: LumaRef<'_>,
        distorted: LumaRef<'_>,
    ) -> Result<AdmScore, AdmError> {
        self.check_shape(&reference)?;
        self.check_shape(&distorted)?;

        let result = match (reference, distorted) {
            (LumaRef::Depth8(r), LumaRef::Depth8(m)) if self.depth == BitDepth::Eight => {
                score::compute_adm(
                    &self.bank,
                    &mut self.arena,
                    &mut self.temp_lo,
                    &mut self.temp_hi,
                    self.width,
                    self.height,
                    r.buf(),
                    r.stride(),
                    m.buf(),
                    m.stride(),
                )
            }
            (LumaRef::Depth10(r), LumaRef::Depth10(m)) if self.depth == BitDepth::Ten => {
                score::compute_adm(
                    &self.bank,
                    &mut self.arena,
                    &mut self.temp_lo,
                    &mut self.temp_hi,
                    self.width,
                    self.height,
                    r.buf(),
                    r.stride(),
                    m.buf(),
                    m.stride(),
                )
            }
            (r, m) => {
                let offending = if r.depth() != self.depth { r } else { m };
                return Err(AdmError::UnsupportedBitDepth {
                    bits: offending.depth().bits(),
                });
            }
        };

        self.score_sum += result.score;
        self.frames += 1;

        Ok(result)
    }

    /// Tears the context down, releasing the arena and scratch rows.
    ///
    /// Returns the arithmetic mean of all scores seen, or `0.0` if no frame
    /// pair was ever evaluated.
    #[must_use]
    pub fn finalize(self) -> f64 {
        if self.frames > 0 {
            self.score_sum / self.frames as f64
        } else {
            0.0
        }
    }

    fn check_shape(&self, plane: &LumaRef<'_>) -> Result<(), AdmError> {
        let (w, h) = (plane.width(), plane.height());
        if w != self.width || h != self.height {
            return Err(AdmError::ShapeMismatch {
                expected_w: self.width,
                expected_h: self.height,
                got_w: w,
                got_h: h,
            });
        }
        if plane.stride() < w {
            return Err(AdmError::StrideTooSmall {
                width: w,
                stride: plane.stride(),
            });
        }
        Ok(())
    }
}

/// Scores a single frame pair with a throwaway context.
///
/// Dimensions and depth are taken from the reference plane. Prefer
/// [`AdmContext`] when evaluating a stream; it allocates once.
///
/// # Errors
/// Same conditions as [`AdmContext::new`] and [`AdmContext::evaluate`].
pub fn adm(reference: LumaRef<'_>, distorted: LumaRef<'_>) -> Result<AdmScore, AdmError> {
    let mut ctx = AdmContext::new(reference.width(), reference.height(), reference.depth())?;
    ctx.evaluate(reference, distorted)
}

fn alloc_scratch_row(width: usize) -> Result<Vec<i16>, AdmError> {
    let len = arena::align_ceil(width);
    let mut row = Vec::new();
    row.try_reserve_exact(len).map_err(|_| AdmError::OutOfMemory)?;
    row.resize(len, 0);
    Ok(row)
}
