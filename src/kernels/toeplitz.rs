//! FFT-based Krylov multiplication kernels for scalar-decay shift operators.
//!
//! ** NOTE: We recommend using the high-level entry point
//! [`crate::multiply::toeplitz_mult`] instead. This module is intended for use
//! cases where the two halves of the composition are needed separately, or
//! where one kernel instance is reused across many calls.
//!
//! For a decay parameter `f`, the operator `Z_f` acts on a vector as the
//! down-shift-by-one with the last coordinate wrapped to position 0 and scaled
//! by `f`: `Z_f v = (f·v_{n-1}, v_0, …, v_{n-2})`. The Krylov matrix
//! `K(Z_f, v)` has `Z_f^j v` as its j-th column; `f = 1` gives a circulant,
//! `f = -1` a skew-circulant, `f = 0` a triangular (nilpotent-shift) matrix.
//!
//! [`KtToeplitz`] computes `K(Z_f, v)^T u` and [`KToeplitz`] computes
//! `K(Z_f, v) w`, both batched over a batch axis and a rank axis, in
//! `O(n log n)` per rank row instead of the dense `O(n²)`:
//!
//! - `f == 0`: the product is a (reversed) linear convolution, realized by
//!   zero-padding to length `2n` and multiplying in the frequency domain.
//! - `f != 0`: `Z_f` is diagonalized by the ordinary DFT after conjugation
//!   with the eta diagonal scaling ([`EtaScaling`]), so the product becomes a
//!   scaled circular convolution at length `n`.
//!
//! Each kernel is a configuration struct built once per
//! `(n, f, batch, rank)`; construction precomputes the scaling vectors and
//! plans the transforms, and `apply` is a pure function of its inputs. The
//! built instance holds no mutable state and is safe to share across threads.

use crate::complex::{complex_mult_acc, complex_mult_re, complex_mult_slices};
use crate::error::KrylovError;
use crate::fft::FftPair;
use crate::kernels::{check_config, check_shape, EtaScaling};
use faer::{Mat, MatRef};
use num_complex::Complex32;

/// Transposed Krylov multiply: `K(Z_f, v)^T u` for every rank row of `v`
/// against every batch row of `u`.
pub struct KtToeplitz {
    n: usize,
    f: f32,
    batch: usize,
    rank: usize,
    scaling: Option<EtaScaling>,
    fft: FftPair,
}

impl KtToeplitz {
    /// Builds a kernel for the given configuration.
    ///
    /// Precomputes the eta/ieta scaling (for `f != 0`) and plans the
    /// transforms: length `n` in the scaled case, length `2n` for the
    /// zero-padded convolution of the `f == 0` case.
    pub fn new(n: usize, f: f32, batch: usize, rank: usize) -> Result<Self, KrylovError> {
        check_config(n, batch, rank)?;
        let scaling = EtaScaling::for_parameter(n, f);
        let fft_len = if scaling.is_some() { n } else { 2 * n };
        Ok(Self {
            n,
            f,
            batch,
            rank,
            scaling,
            fft: FftPair::new(fft_len),
        })
    }

    /// The configured vector length.
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    /// The configured decay parameter.
    #[inline]
    pub fn f(&self) -> f32 {
        self.f
    }

    /// Computes `out[b][r] = K(Z_f, v_r)^T u_b`.
    ///
    /// `v` must be `rank × n` and `u` must be `batch × n`; the output is one
    /// `rank × n` matrix per batch row. Shape mismatches fail before any
    /// transform work.
    pub fn apply(
        &self,
        v: MatRef<'_, f32>,
        u: MatRef<'_, f32>,
    ) -> Result<Vec<Mat<f32>>, KrylovError> {
        check_shape("generator v", v, self.rank, self.n)?;
        check_shape("input u", u, self.batch, self.n)?;
        match &self.scaling {
            Some(scaling) => Ok(self.apply_cycle(scaling, v, u)),
            None => Ok(self.apply_acyclic(v, u)),
        }
    }

    /// The scaled-FFT ("cycle") path for `f != 0`:
    /// `out = Re(eta ⊙ FFT(IFFT(ieta ⊙ u) ⊙ FFT(eta ⊙ v)))`,
    /// with the inverse transform normalized by `1/n` and the elementwise
    /// product taken as an outer product over the batch and rank axes.
    fn apply_cycle(
        &self,
        scaling: &EtaScaling,
        v: MatRef<'_, f32>,
        u: MatRef<'_, f32>,
    ) -> Vec<Mat<f32>> {
        let n = self.n;

        let v_hat: Vec<Vec<Complex32>> = (0..self.rank)
            .map(|r| {
                let mut buf: Vec<Complex32> =
                    (0..n).map(|k| scaling.eta[k] * v[(r, k)]).collect();
                self.fft.forward(&mut buf);
                buf
            })
            .collect();

        let u_hat: Vec<Vec<Complex32>> = (0..self.batch)
            .map(|b| {
                let mut buf: Vec<Complex32> =
                    (0..n).map(|k| scaling.ieta[k] * u[(b, k)]).collect();
                self.fft.inverse(&mut buf);
                buf
            })
            .collect();

        let mut product = vec![Complex32::new(0.0, 0.0); n];
        (0..self.batch)
            .map(|b| {
                let mut out = Mat::<f32>::zeros(self.rank, n);
                for r in 0..self.rank {
                    complex_mult_slices(&u_hat[b], &v_hat[r], &mut product);
                    self.fft.forward(&mut product);
                    // Only the real part of eta ⊙ product survives; the
                    // imaginary part vanishes for real inputs.
                    for k in 0..n {
                        out.as_mut()[(r, k)] = complex_mult_re(scaling.eta[k], product[k]);
                    }
                }
                out
            })
            .collect()
    }

    /// The zero-padded convolution path for `f == 0` (triangular Toeplitz):
    /// reverse `u`, pad both operands to `2n`, multiply in the frequency
    /// domain, and re-reverse the first-n window of the inverse transform.
    fn apply_acyclic(&self, v: MatRef<'_, f32>, u: MatRef<'_, f32>) -> Vec<Mat<f32>> {
        let n = self.n;
        let padded = 2 * n;
        let zero = Complex32::new(0.0, 0.0);

        let v_hat: Vec<Vec<Complex32>> = (0..self.rank)
            .map(|r| {
                let mut buf = vec![zero; padded];
                for i in 0..n {
                    buf[i] = Complex32::new(v[(r, i)], 0.0);
                }
                self.fft.forward(&mut buf);
                buf
            })
            .collect();

        let u_hat: Vec<Vec<Complex32>> = (0..self.batch)
            .map(|b| {
                let mut buf = vec![zero; padded];
                for i in 0..n {
                    buf[i] = Complex32::new(u[(b, n - 1 - i)], 0.0);
                }
                self.fft.forward(&mut buf);
                buf
            })
            .collect();

        let mut product = vec![zero; padded];
        (0..self.batch)
            .map(|b| {
                let mut out = Mat::<f32>::zeros(self.rank, n);
                for r in 0..self.rank {
                    complex_mult_slices(&u_hat[b], &v_hat[r], &mut product);
                    self.fft.inverse(&mut product);
                    for j in 0..n {
                        out.as_mut()[(r, j)] = product[n - 1 - j].re;
                    }
                }
                out
            })
            .collect()
    }
}

/// Forward Krylov multiply: `Σ_r K(Z_f, v_r) w_r`, summed across the rank
/// axis (the dual of [`KtToeplitz`], which keeps rank as an output axis).
pub struct KToeplitz {
    n: usize,
    f: f32,
    batch: usize,
    rank: usize,
    scaling: Option<EtaScaling>,
    fft: FftPair,
}

impl KToeplitz {
    /// Builds a kernel for the given configuration. See [`KtToeplitz::new`].
    pub fn new(n: usize, f: f32, batch: usize, rank: usize) -> Result<Self, KrylovError> {
        check_config(n, batch, rank)?;
        let scaling = EtaScaling::for_parameter(n, f);
        let fft_len = if scaling.is_some() { n } else { 2 * n };
        Ok(Self {
            n,
            f,
            batch,
            rank,
            scaling,
            fft: FftPair::new(fft_len),
        })
    }

    /// The configured vector length.
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    /// The configured decay parameter.
    #[inline]
    pub fn f(&self) -> f32 {
        self.f
    }

    /// Computes `out[b] = Σ_r K(Z_f, v_r) w[b][r]`.
    ///
    /// `v` must be `rank × n` and `w` must hold one `rank × n` matrix per
    /// batch row (the layout produced by [`KtToeplitz::apply`]); the output is
    /// `batch × n`. Shape mismatches fail before any transform work.
    ///
    /// The rank summation happens in the frequency domain, before the single
    /// inverse transform per batch row, which keeps the transform count at
    /// `rank + 1` per row instead of `2·rank`.
    pub fn apply(&self, v: MatRef<'_, f32>, w: &[Mat<f32>]) -> Result<Mat<f32>, KrylovError> {
        check_shape("generator v", v, self.rank, self.n)?;
        if w.len() != self.batch {
            return Err(crate::error::KrylovErrorKind::DimensionMismatch {
                subject: "input w batch",
                expected_rows: self.batch,
                expected_cols: self.n,
                actual_rows: w.len(),
                actual_cols: if w.is_empty() { 0 } else { w[0].ncols() },
            }
            .into());
        }
        for entry in w {
            check_shape("input w entry", entry.as_ref(), self.rank, self.n)?;
        }
        match &self.scaling {
            Some(scaling) => Ok(self.apply_cycle(scaling, v, w)),
            None => Ok(self.apply_acyclic(v, w)),
        }
    }

    /// The scaled-FFT path for `f != 0`:
    /// `out = Re(ieta ⊙ IFFT(Σ_r FFT(eta ⊙ w_r) ⊙ FFT(eta ⊙ v_r)))`.
    fn apply_cycle(&self, scaling: &EtaScaling, v: MatRef<'_, f32>, w: &[Mat<f32>]) -> Mat<f32> {
        let n = self.n;

        let v_hat: Vec<Vec<Complex32>> = (0..self.rank)
            .map(|r| {
                let mut buf: Vec<Complex32> =
                    (0..n).map(|k| scaling.eta[k] * v[(r, k)]).collect();
                self.fft.forward(&mut buf);
                buf
            })
            .collect();

        let mut out = Mat::<f32>::zeros(self.batch, n);
        let mut w_buf = vec![Complex32::new(0.0, 0.0); n];
        let mut acc = vec![Complex32::new(0.0, 0.0); n];
        for (b, w_b) in w.iter().enumerate() {
            acc.fill(Complex32::new(0.0, 0.0));
            for r in 0..self.rank {
                for k in 0..n {
                    w_buf[k] = scaling.eta[k] * w_b.as_ref()[(r, k)];
                }
                self.fft.forward(&mut w_buf);
                complex_mult_acc(&w_buf, &v_hat[r], &mut acc);
            }
            self.fft.inverse(&mut acc);
            for k in 0..n {
                out.as_mut()[(b, k)] = complex_mult_re(scaling.ieta[k], acc[k]);
            }
        }
        out
    }

    /// The zero-padded convolution path for `f == 0`: the product is a linear
    /// convolution truncated to the first `n` entries.
    fn apply_acyclic(&self, v: MatRef<'_, f32>, w: &[Mat<f32>]) -> Mat<f32> {
        let n = self.n;
        let padded = 2 * n;
        let zero = Complex32::new(0.0, 0.0);

        let v_hat: Vec<Vec<Complex32>> = (0..self.rank)
            .map(|r| {
                let mut buf = vec![zero; padded];
                for i in 0..n {
                    buf[i] = Complex32::new(v[(r, i)], 0.0);
                }
                self.fft.forward(&mut buf);
                buf
            })
            .collect();

        let mut out = Mat::<f32>::zeros(self.batch, n);
        let mut w_buf = vec![zero; padded];
        let mut acc = vec![zero; padded];
        for (b, w_b) in w.iter().enumerate() {
            acc.fill(zero);
            for r in 0..self.rank {
                w_buf.fill(zero);
                for i in 0..n {
                    w_buf[i] = Complex32::new(w_b.as_ref()[(r, i)], 0.0);
                }
                self.fft.forward(&mut w_buf);
                complex_mult_acc(&w_buf, &v_hat[r], &mut acc);
            }
            self.fft.inverse(&mut acc);
            for j in 0..n {
                out.as_mut()[(b, j)] = acc[j].re;
            }
        }
        out
    }
}
