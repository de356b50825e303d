//! Fast and reference multiplication kernels for displacement-structured matrices.
//!
//! This module tree contains the numerical heart of the crate:
//!
//! - **`toeplitz`**: the FFT-based transposed and forward Krylov multiplies
//!   ([`toeplitz::KtToeplitz`], [`toeplitz::KToeplitz`]) for scalar-decay
//!   subdiagonal operators `Z_f`.
//! - **`reference`**: dense O(n²) oracles (`krylov_construct`,
//!   `toeplitz_mult_slow`) and the vectorized-but-non-FFT intermediate
//!   (`toeplitz_mult_slow_fast`) used to isolate FFT error from construction
//!   error.
//! - **`recurrence`**: generic subdiagonal/tridiagonal-corner recurrence
//!   operators and their slow Krylov-decomposition multiply, for structures
//!   that do not reduce to a pure `Z_f` form.
//!
//! Shared between the fast kernels is the eta/ieta diagonal scaling
//! ([`EtaScaling`]) that conjugates a general f-circulant multiply into a pure
//! DFT-diagonalizable one.

pub mod recurrence;
pub mod reference;
pub mod toeplitz;

use crate::error::{KrylovError, KrylovErrorKind};
use faer::MatRef;
use num_complex::Complex32;
use std::f32::consts::PI;

/// Precomputed diagonal scaling vectors for the f-circulant similarity
/// transform.
///
/// For a nonzero decay parameter `f`, the shift-with-corner operator `Z_f` is
/// diagonalized by the ordinary DFT after conjugation with
/// `D = diag(eta_0, …, eta_{n-1})` where
///
/// ```text
/// eta_k = |f|^{k/n} · arg_k,
/// arg_k = 1            if f > 0,
/// arg_k = exp(iπk/n)   if f < 0.
/// ```
///
/// The `f < 0` phase factors are the odd 2n-th roots of unity, equivalently
/// the first `n` coefficients of the length-2n DFT of a unit impulse at
/// position `2n - 1`. `ieta` holds the elementwise reciprocals, so
/// `eta[k] * ieta[k] == 1` up to floating-point tolerance.
///
/// The scaling is computed once per `(n, f)` pair at kernel construction and
/// is immutable afterwards.
pub struct EtaScaling {
    pub eta: Vec<Complex32>,
    pub ieta: Vec<Complex32>,
}

impl EtaScaling {
    /// Builds the scaling for a nonzero decay parameter, or returns `None` for
    /// `f == 0` (the pure-shift case needs no similarity transform).
    pub fn for_parameter(n: usize, f: f32) -> Option<Self> {
        if f == 0.0 {
            return None;
        }
        let mut eta = Vec::with_capacity(n);
        let mut ieta = Vec::with_capacity(n);
        for k in 0..n {
            let modulus = f.abs().powf(k as f32 / n as f32);
            let value = if f > 0.0 {
                Complex32::new(modulus, 0.0)
            } else {
                Complex32::from_polar(modulus, PI * k as f32 / n as f32)
            };
            eta.push(value);
            ieta.push(value.inv());
        }
        Some(Self { eta, ieta })
    }
}

/// Verifies that `m` has exactly the shape `(rows, cols)`.
///
/// All kernel entry points route their precondition checks through this
/// helper so that shape failures carry a uniform, descriptive message and
/// occur before any transform work.
pub(crate) fn check_shape(
    subject: &'static str,
    m: MatRef<'_, f32>,
    rows: usize,
    cols: usize,
) -> Result<(), KrylovError> {
    if m.nrows() != rows || m.ncols() != cols {
        return Err(KrylovErrorKind::DimensionMismatch {
            subject,
            expected_rows: rows,
            expected_cols: cols,
            actual_rows: m.nrows(),
            actual_cols: m.ncols(),
        }
        .into());
    }
    Ok(())
}

/// Validates the `(n, batch, rank)` configuration common to both kernels.
pub(crate) fn check_config(n: usize, batch: usize, rank: usize) -> Result<(), KrylovError> {
    if n == 0 {
        return Err(
            KrylovErrorKind::InputError("the kernel length n must be at least 1".to_string())
                .into(),
        );
    }
    if batch == 0 || rank == 0 {
        return Err(KrylovErrorKind::InputError(format!(
            "batch and rank must be at least 1, got batch={batch}, rank={rank}"
        ))
        .into());
    }
    Ok(())
}
