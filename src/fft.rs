//! Planned forward/inverse discrete Fourier transforms.
//!
//! The multiplication kernels perform every transform through a [`FftPair`]
//! planned once at kernel construction time and reused for the lifetime of the
//! kernel. [`rustfft`] supports arbitrary transform lengths, so the kernels do
//! not restrict `n` to powers of two.
//!
//! Normalization convention: the forward transform is unnormalized and the
//! inverse transform is scaled by `1/len`, so that
//! `inverse(forward(x)) == x`. This matches the convention the kernel
//! derivations assume (a product of two unnormalized forward transforms
//! followed by a normalized inverse yields the circular convolution).

use num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// A forward/inverse transform pair for one fixed length.
///
/// The underlying plans are reference-counted and cheap to clone; the pair is
/// read-only after construction and safe to share across concurrent calls.
pub struct FftPair {
    len: usize,
    fwd: Arc<dyn Fft<f32>>,
    inv: Arc<dyn Fft<f32>>,
}

impl FftPair {
    /// Plans a transform pair for signals of length `len`.
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fwd = planner.plan_fft_forward(len);
        let inv = planner.plan_fft_inverse(len);
        Self { len, fwd, inv }
    }

    /// The transform length this pair was planned for.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// In-place unnormalized forward transform.
    ///
    /// # Panics
    ///
    /// Panics if `buf.len()` differs from the planned length.
    pub fn forward(&self, buf: &mut [Complex32]) {
        debug_assert_eq!(buf.len(), self.len);
        self.fwd.process(buf);
    }

    /// In-place inverse transform, normalized by `1/len`.
    ///
    /// # Panics
    ///
    /// Panics if `buf.len()` differs from the planned length.
    pub fn inverse(&self, buf: &mut [Complex32]) {
        debug_assert_eq!(buf.len(), self.len);
        self.inv.process(buf);
        let scale = 1.0 / self.len as f32;
        for value in buf.iter_mut() {
            *value *= scale;
        }
    }
}
