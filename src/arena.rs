//! Working-buffer arena for the per-scale pipeline.
//!
//! One frame-pair evaluation needs 35 half-resolution i16 buffers: two
//! working scale planes, seven subband quads, one masking-threshold plane and
//! one masked-output quad. They are allocated as a single contiguous block
//! when the metric context is created and carved into named, disjoint views
//! at the start of every call. The same regions are reused in place for all
//! four scales; deeper scales simply address a smaller top-left sub-rectangle
//! through the shared stride.

use crate::AdmError;

/// Byte alignment of every buffer row.
const MAX_ALIGN: usize = 32;

/// Number of half-resolution buffers the arena must hold.
const NUM_BUFFERS: usize = 35;

/// Rounds an element count up so the row occupies a whole number of
/// [`MAX_ALIGN`]-byte blocks.
#[inline]
pub(crate) fn align_ceil(elems: usize) -> usize {
    let bytes = elems * std::mem::size_of::<i16>();
    let aligned = bytes + (MAX_ALIGN - bytes % MAX_ALIGN) % MAX_ALIGN;
    aligned / std::mem::size_of::<i16>()
}

/// One level of wavelet decomposition of one image: approximation plus the
/// three detail orientations, all sharing the arena stride.
///
/// Quads never own their storage; they are views into the arena, valid for
/// the current call only.
pub(crate) struct BandQuad<'a> {
    /// Low-pass V + low-pass H.
    pub a: &'a mut [i16],
    /// High-pass V + low-pass H.
    pub h: &'a mut [i16],
    /// Low-pass V + high-pass H.
    pub v: &'a mut [i16],
    /// High-pass V + high-pass H.
    pub d: &'a mut [i16],
}

impl<'a> BandQuad<'a> {
    /// The three detail orientations in (H, V, D) order.
    #[inline]
    pub fn details(&self) -> [&[i16]; 3] {
        [&*self.h, &*self.v, &*self.d]
    }

    /// Mutable views of the three detail orientations in (H, V, D) order.
    #[inline]
    pub fn details_mut(&mut self) -> [&mut [i16]; 3] {
        [&mut *self.h, &mut *self.v, &mut *self.d]
    }
}

/// All band views of one evaluation call, carved from the arena.
pub(crate) struct Workspace<'a> {
    /// Next scale's reference input plane (approximation copy-down target).
    pub ref_scale: &'a mut [i16],
    /// Next scale's distorted input plane.
    pub main_scale: &'a mut [i16],
    /// DWT output of the reference plane.
    pub ref_dwt2: BandQuad<'a>,
    /// DWT output of the distorted plane.
    pub main_dwt2: BandQuad<'a>,
    /// Decoupled "restored" component.
    pub decouple_r: BandQuad<'a>,
    /// Decoupled "additive" component.
    pub decouple_a: BandQuad<'a>,
    /// CSF-weighted reference bands (denominator source).
    pub csf_o: BandQuad<'a>,
    /// CSF-weighted restored bands.
    pub csf_r: BandQuad<'a>,
    /// CSF-weighted additive bands.
    pub csf_a: BandQuad<'a>,
    /// Per-pixel masking threshold.
    pub mta: &'a mut [i16],
    /// Masked restored bands (numerator source).
    pub cm_r: BandQuad<'a>,
    /// Pixel stride shared by every view above.
    pub stride: usize,
}

/// The contiguous backing block, sized once per context.
pub(crate) struct Arena {
    data: Vec<i16>,
    /// Elements in one buffer (stride * half-height).
    band_len: usize,
    /// Pixel stride of every carved view.
    stride: usize,
}

impl Arena {
    /// Allocates the arena for a full-resolution `width` x `height` frame.
    ///
    /// # Errors
    /// Returns [`AdmError::OutOfMemory`] if the block cannot be allocated.
    pub fn new(width: usize, height: usize) -> Result<Self, AdmError> {
        let stride = align_ceil(width.div_ceil(2));
        let band_len = stride * height.div_ceil(2);
        let total = band_len * NUM_BUFFERS;

        let mut data = Vec::new();
        data.try_reserve_exact(total)
            .map_err(|_| AdmError::OutOfMemory)?;
        data.resize(total, 0);

        Ok(Self {
            data,
            band_len,
            stride,
        })
    }

    /// Pixel stride shared by all carved views.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Carves the arena into the named views of one evaluation call.
    pub fn workspace(&mut self) -> Workspace<'_> {
        let n = self.band_len;
        let mut rest: &mut [i16] = &mut self.data;

        let ref_scale = take(&mut rest, n);
        let main_scale = take(&mut rest, n);
        let ref_dwt2 = take_quad(&mut rest, n);
        let main_dwt2 = take_quad(&mut rest, n);
        let decouple_r = take_quad(&mut rest, n);
        let decouple_a = take_quad(&mut rest, n);
        let csf_o = take_quad(&mut rest, n);
        let csf_r = take_quad(&mut rest, n);
        let csf_a = take_quad(&mut rest, n);
        let mta = take(&mut rest, n);
        let cm_r = take_quad(&mut rest, n);
        debug_assert!(rest.is_empty());

        Workspace {
            ref_scale,
            main_scale,
            ref_dwt2,
            main_dwt2,
            decouple_r,
            decouple_a,
            csf_o,
            csf_r,
            csf_a,
            mta,
            cm_r,
            stride: self.stride,
        }
    }
}

/// Splits `n` elements off the front of `rest`.
fn take<'a>(rest: &mut &'a mut [i16], n: usize) -> &'a mut [i16] {
    let (head, tail) = std::mem::take(rest).split_at_mut(n);
    *rest = tail;
    head
}

/// Carves one subband quad in A, H, V, D order.
fn take_quad<'a>(rest: &mut &'a mut [i16], n: usize) -> BandQuad<'a> {
    BandQuad {
        a: take(rest, n),
        h: take(rest, n),
        v: take(rest, n),
        d: take(rest, n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_ceil() {
        // 32-byte alignment means the element stride is a multiple of 16.
        assert_eq!(align_ceil(1), 16);
        assert_eq!(align_ceil(16), 16);
        assert_eq!(align_ceil(17), 32);
        assert_eq!(align_ceil(960), 960);
    }

    #[test]
    fn test_workspace_geometry() {
        let mut arena = Arena::new(65, 33).expect("small allocation");
        let stride = arena.stride();
        assert_eq!(stride, align_ceil(33));

        let ws = arena.workspace();
        let band_len = stride * 17;
        assert_eq!(ws.ref_scale.len(), band_len);
        assert_eq!(ws.main_scale.len(), band_len);
        assert_eq!(ws.ref_dwt2.a.len(), band_len);
        assert_eq!(ws.cm_r.d.len(), band_len);
        assert_eq!(ws.mta.len(), band_len);
    }

    #[test]
    fn test_workspace_views_are_disjoint() {
        let mut arena = Arena::new(16, 16).expect("small allocation");
        let ws = arena.workspace();
        ws.ref_scale.fill(1);
        ws.main_scale.fill(2);
        ws.mta.fill(3);
        assert!(ws.ref_scale.iter().all(|&x| x == 1));
        assert!(ws.main_scale.iter().all(|&x| x == 2));
        assert!(ws.mta.iter().all(|&x| x == 3));
    }

    #[test]
    fn test_workspace_reuse_without_reallocation() {
        let mut arena = Arena::new(64, 64).expect("small allocation");
        let ptr = {
            let ws = arena.workspace();
            ws.ref_scale.as_ptr()
        };
        let ws = arena.workspace();
        assert_eq!(ptr, ws.ref_scale.as_ptr());
    }
}
