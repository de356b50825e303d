//! Elementwise complex arithmetic helpers shared by the FFT kernels.
//!
//! All frequency-domain intermediates in this crate are stored as
//! [`Complex32`] values (a `(real, imaginary)` pair per element). The helpers
//! here implement the elementwise complex product
//!
//! ```text
//! out.re = a.re * b.re - a.im * b.im
//! out.im = a.re * b.im + a.im * b.re
//! ```
//!
//! which is the single arithmetic identity the scaled-FFT kernels are built
//! from: both the eta/ieta diagonal scalings and the frequency-domain outer
//! products reduce to it.

use num_complex::Complex32;

/// Computes the complex product of two scalars.
///
/// Spelled out rather than deferring to `a * b` so that the real-part
/// extraction used by the f-circulant kernels (`re(a·b) = a.re*b.re - a.im*b.im`)
/// has a single authoritative definition next to its derivation.
#[inline]
pub fn complex_mult(a: Complex32, b: Complex32) -> Complex32 {
    Complex32::new(a.re * b.re - a.im * b.im, a.re * b.im + a.im * b.re)
}

/// Returns only the real part of the complex product `a * b`.
///
/// The f-circulant kernels discard the imaginary part of their final scaled
/// product (it is mathematically zero for real inputs, up to floating-point
/// noise), so they never need to materialize it.
#[inline]
pub fn complex_mult_re(a: Complex32, b: Complex32) -> f32 {
    a.re * b.re - a.im * b.im
}

/// Elementwise complex product of two equal-length slices, written into `out`.
///
/// # Panics
///
/// Panics if the three slices do not have the same length. Length agreement is
/// an internal invariant of the kernels (all buffers are sized from the same
/// transform length), so a violation here is a programming error, not a user
/// input error.
pub fn complex_mult_slices(a: &[Complex32], b: &[Complex32], out: &mut [Complex32]) {
    assert_eq!(a.len(), b.len(), "complex_mult_slices: operand length mismatch");
    assert_eq!(a.len(), out.len(), "complex_mult_slices: output length mismatch");
    for ((oa, ob), o) in a.iter().zip(b.iter()).zip(out.iter_mut()) {
        *o = complex_mult(*oa, *ob);
    }
}

/// Elementwise complex multiply-accumulate: `acc[k] += a[k] * b[k]`.
///
/// Used by the forward Krylov multiply, which sums frequency-domain products
/// across the rank axis before its final inverse transform.
pub fn complex_mult_acc(a: &[Complex32], b: &[Complex32], acc: &mut [Complex32]) {
    assert_eq!(a.len(), b.len(), "complex_mult_acc: operand length mismatch");
    assert_eq!(a.len(), acc.len(), "complex_mult_acc: accumulator length mismatch");
    for ((oa, ob), o) in a.iter().zip(b.iter()).zip(acc.iter_mut()) {
        *o += complex_mult(*oa, *ob);
    }
}
