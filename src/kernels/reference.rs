//! Dense reference paths for the Toeplitz-like multiply.
//!
//! Everything in this module is `O(n²)` or worse and exists to validate the
//! FFT kernels, not to be fast:
//!
//! - [`krylov_construct`] is the column-by-column recurrence oracle.
//! - [`krylov_construct_toeplitz`] is the vectorized, index-arithmetic
//!   construction batched over the rank axis; it must reproduce
//!   [`krylov_construct`] exactly.
//! - [`toeplitz_mult_slow`] is the ground-truth multiply (dense construction,
//!   dense matmul).
//! - [`toeplitz_mult_slow_fast`] uses the vectorized construction with dense
//!   matmul, isolating "construction correctness" from "FFT correctness" when
//!   the two fast paths disagree.

use crate::error::KrylovError;
use crate::kernels::check_shape;
use faer::{Mat, MatRef};

/// Builds the `n × m` Krylov matrix of the shift-with-corner operator `Z_f`
/// applied to `v`: column j is `Z_f^j v`.
///
/// Each column is the previous one shifted down by one position, with the
/// value that falls off the end scaled by `f` and wrapped into position 0.
/// `m` may be smaller than `n` for a non-square Krylov matrix; the multiply
/// kernels always use `m == n`.
pub fn krylov_construct(f: f32, v: &[f32], m: usize) -> Mat<f32> {
    let n = v.len();
    let mut out = Mat::<f32>::zeros(n, m);
    let mut col = v.to_vec();
    for j in 0..m {
        for i in 0..n {
            out.as_mut()[(i, j)] = col[i];
        }
        if j + 1 < m {
            let wrapped = f * col[n - 1];
            for i in (1..n).rev() {
                col[i] = col[i - 1];
            }
            col[0] = wrapped;
        }
    }
    out
}

/// Vectorized square Krylov construction, batched over the rank axis.
///
/// Entry `(i, j)` of the r-th matrix is `v[r][(i - j) mod n]`, scaled by `f`
/// wherever `i - j < 0` — a wrapped index means the column has cycled past the
/// end exactly once (column powers never exceed `n - 1`, so no entry wraps
/// twice). Reproduces [`krylov_construct`] column-for-column on each rank row.
pub fn krylov_construct_toeplitz(v: MatRef<'_, f32>, f: f32) -> Vec<Mat<f32>> {
    let (rank, n) = (v.nrows(), v.ncols());
    (0..rank)
        .map(|r| {
            Mat::from_fn(n, n, |i, j| {
                let value = v[(r, (i + n - j) % n)];
                if i < j { f * value } else { value }
            })
        })
        .collect()
}

/// Checks the shared `(G, H, x)` preconditions of the slow multiplies and
/// returns `(rank, n, batch)`.
fn check_generators(
    g: MatRef<'_, f32>,
    h: MatRef<'_, f32>,
    x: MatRef<'_, f32>,
) -> Result<(usize, usize, usize), KrylovError> {
    let (rank, n) = (g.nrows(), g.ncols());
    check_shape("generator H", h, rank, n)?;
    check_shape("input x", x, x.nrows(), n)?;
    Ok((rank, n, x.nrows()))
}

/// Ground-truth oracle for the displacement-structured multiply:
/// `out = (Σ_r K(Z_{f_G}, g_r) · K(Z_{f_H}, h_r)^T) x^T`, transposed back to
/// batch-rows layout. `f = (1, -1)` when `cycle` is true, `(0, 0)` otherwise.
pub fn toeplitz_mult_slow(
    g: MatRef<'_, f32>,
    h: MatRef<'_, f32>,
    x: MatRef<'_, f32>,
    cycle: bool,
) -> Result<Mat<f32>, KrylovError> {
    let (rank, n, batch) = check_generators(g, h, x)?;
    let (f_g, f_h) = if cycle { (1.0, -1.0) } else { (0.0, 0.0) };

    let xt = x.transpose();
    let mut acc = Mat::<f32>::zeros(n, batch);
    for r in 0..rank {
        let g_row: Vec<f32> = (0..n).map(|k| g[(r, k)]).collect();
        let h_row: Vec<f32> = (0..n).map(|k| h[(r, k)]).collect();
        let k_g = krylov_construct(f_g, &g_row, n);
        let k_h = krylov_construct(f_h, &h_row, n);
        let temp = k_h.as_ref().transpose() * xt;
        acc = acc + &k_g * &temp;
    }
    Ok(acc.as_ref().transpose().to_owned())
}

/// Intermediate validation path: vectorized index-based Krylov construction
/// with dense matrix multiplication instead of FFTs.
pub fn toeplitz_mult_slow_fast(
    g: MatRef<'_, f32>,
    h: MatRef<'_, f32>,
    x: MatRef<'_, f32>,
    cycle: bool,
) -> Result<Mat<f32>, KrylovError> {
    let (rank, n, batch) = check_generators(g, h, x)?;
    let (f_g, f_h) = if cycle { (1.0, -1.0) } else { (0.0, 0.0) };

    let k_g = krylov_construct_toeplitz(g, f_g);
    let k_h = krylov_construct_toeplitz(h, f_h);

    let xt = x.transpose();
    let mut acc = Mat::<f32>::zeros(n, batch);
    for r in 0..rank {
        let temp = k_h[r].as_ref().transpose() * xt;
        acc = acc + &k_g[r] * &temp;
    }
    Ok(acc.as_ref().transpose().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    #[test]
    fn test_krylov_construct_nilpotent_shift() {
        // f = 0: strictly triangular Toeplitz, nothing wraps.
        let k = krylov_construct(0.0, &[1.0, 2.0, 3.0], 3);
        let expected = mat![[1.0_f32, 0.0, 0.0], [2.0, 1.0, 0.0], [3.0, 2.0, 1.0]];
        assert_eq!(k, expected);
    }

    #[test]
    fn test_krylov_construct_skew_wrap() {
        // f = -1: the wrapped value changes sign.
        let k = krylov_construct(-1.0, &[1.0, 2.0, 3.0], 3);
        let expected = mat![[1.0_f32, -3.0, -2.0], [2.0, 1.0, -3.0], [3.0, 2.0, 1.0]];
        assert_eq!(k, expected);
    }

    #[test]
    fn test_krylov_construct_rectangular() {
        let k = krylov_construct(1.0, &[1.0, 2.0], 4);
        let expected = mat![[1.0_f32, 2.0, 1.0, 2.0], [2.0, 1.0, 2.0, 1.0]];
        assert_eq!(k, expected);
    }

    #[test]
    fn test_vectorized_matches_reference_per_rank() {
        let v = mat![[0.0_f32, 1.0, 0.0, -1.0], [0.0, 1.0, 2.0, 3.0]];
        for &f in &[-1.0_f32, 0.0, 1.0, 0.577] {
            let batched = krylov_construct_toeplitz(v.as_ref(), f);
            for r in 0..2 {
                let row: Vec<f32> = (0..4).map(|k| v.as_ref()[(r, k)]).collect();
                let reference = krylov_construct(f, &row, 4);
                assert_eq!(batched[r], reference, "mismatch for f={f}, rank row {r}");
            }
        }
    }

    #[test]
    fn test_slow_fast_matches_slow() {
        let g = mat![[0.5_f32, -1.0, 2.0, 0.0], [1.0, 1.0, -0.5, 0.25]];
        let h = mat![[1.0_f32, 0.5, 0.0, -1.5], [-0.5, 2.0, 1.0, 0.0]];
        let x = mat![[1.0_f32, 0.0, -1.0, 2.0], [0.0, 1.0, 1.0, -1.0]];
        for &cycle in &[true, false] {
            let slow = toeplitz_mult_slow(g.as_ref(), h.as_ref(), x.as_ref(), cycle).unwrap();
            let fast = toeplitz_mult_slow_fast(g.as_ref(), h.as_ref(), x.as_ref(), cycle).unwrap();
            for i in 0..2 {
                for j in 0..4 {
                    let diff = (slow.as_ref()[(i, j)] - fast.as_ref()[(i, j)]).abs();
                    assert!(diff < 1e-5, "cycle={cycle}: diff {diff} at ({i}, {j})");
                }
            }
        }
    }

    #[test]
    fn test_generator_shape_mismatch_rejected() {
        let g = Mat::<f32>::zeros(2, 4);
        let h = Mat::<f32>::zeros(3, 4);
        let x = Mat::<f32>::zeros(1, 4);
        let err = toeplitz_mult_slow(g.as_ref(), h.as_ref(), x.as_ref(), true).unwrap_err();
        assert!(err.to_string().contains("generator H"));
    }
}
