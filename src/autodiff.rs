//! Reverse-mode cross-check for the Krylov multiplies.
//!
//! The forward multiply `Σ_r K(Z_f, v_r) w_r` can be recovered from the
//! transposed multiply alone through the adjoint identity
//! `∂/∂u [Σ w ⊙ (K^T u)] = K w`: seed the transposed multiply's output
//! gradient with `w` and the gradient with respect to `u` is the forward
//! product. The original use of this path is as a correctness cross-check and
//! as a simple fallback when only one of the two kernels is trusted.
//!
//! Reverse-mode differentiation itself is not implemented here — it is an
//! injected capability. [`VjpBackend`] is the contract (a vector-Jacobian
//! product for a batched linear map), [`BasisVjp`] is a reference backend that
//! recovers the VJP by probing the map with basis vectors, and [`NoAutodiff`]
//! is the explicit absence of the capability, which fails with a descriptive
//! error rather than silently returning wrong results.

use crate::error::{KrylovError, KrylovErrorKind};
use crate::kernels::check_shape;
use crate::kernels::toeplitz::KtToeplitz;
use faer::{Mat, MatRef};

/// The forward map a backend differentiates: a batched linear function from a
/// `batch × n` input to one `rank × n` matrix per batch row.
pub type BatchedForward<'a> = dyn Fn(MatRef<'_, f32>) -> Result<Vec<Mat<f32>>, KrylovError> + 'a;

/// A reverse-mode vector-Jacobian-product capability.
///
/// Implementations compute the gradient of `Σ_{b,r,j} seed[b][r][j] ·
/// forward(u)[b][r][j]` with respect to `u`, for a `forward` that is linear
/// and acts on each batch row independently (both hold for the transposed
/// Krylov multiply). The contract is the capability's only surface; callers
/// never assume a particular differentiation engine.
pub trait VjpBackend {
    /// Computes the VJP of `forward` at the zero input with the given seed.
    ///
    /// `batch` and `n` describe the input shape; `seed` holds one `rank × n`
    /// matrix per batch row, matching the forward map's output layout.
    fn vjp(
        &self,
        forward: &BatchedForward<'_>,
        batch: usize,
        n: usize,
        seed: &[Mat<f32>],
    ) -> Result<Mat<f32>, KrylovError>;
}

/// Reference backend: recovers the VJP of a batch-diagonal linear map by
/// probing it with the `n` standard basis directions.
///
/// For a linear map the Jacobian column for input coordinate `i` is
/// `forward(e_i)`; batch-diagonality lets one probe carry all batch rows at
/// once, so the cost is `n` forward evaluations. Quadratic overall — suitable
/// for validation at small `n`, not production use.
pub struct BasisVjp;

impl VjpBackend for BasisVjp {
    fn vjp(
        &self,
        forward: &BatchedForward<'_>,
        batch: usize,
        n: usize,
        seed: &[Mat<f32>],
    ) -> Result<Mat<f32>, KrylovError> {
        let mut grad = Mat::<f32>::zeros(batch, n);
        for i in 0..n {
            // Every batch row probes coordinate i simultaneously.
            let probe = Mat::from_fn(batch, n, |_, j| if j == i { 1.0 } else { 0.0 });
            let response = forward(probe.as_ref())?;
            if response.len() != seed.len() {
                return Err(KrylovErrorKind::InputError(format!(
                    "forward map returned {} batch entries, seed has {}",
                    response.len(),
                    seed.len()
                ))
                .into());
            }
            for b in 0..batch {
                let (rank, cols) = (seed[b].nrows(), seed[b].ncols());
                check_shape("forward response", response[b].as_ref(), rank, cols)?;
                let mut dot = 0.0_f32;
                for r in 0..rank {
                    for j in 0..cols {
                        dot += seed[b].as_ref()[(r, j)] * response[b].as_ref()[(r, j)];
                    }
                }
                grad.as_mut()[(b, i)] = dot;
            }
        }
        Ok(grad)
    }
}

/// The explicit absence of a reverse-mode backend.
///
/// Every call fails with [`KrylovError`] of the "operation not supported"
/// kind; used where a configuration must make the missing capability visible
/// instead of producing incorrect output.
pub struct NoAutodiff;

impl VjpBackend for NoAutodiff {
    fn vjp(
        &self,
        _forward: &BatchedForward<'_>,
        _batch: usize,
        _n: usize,
        _seed: &[Mat<f32>],
    ) -> Result<Mat<f32>, KrylovError> {
        Err(KrylovErrorKind::Unsupported(
            "no reverse-mode backend configured for the autodiff multiply".to_string(),
        )
        .into())
    }
}

/// Computes `Σ_r K(Z_f, v_r) w_r` by differentiating through the transposed
/// Krylov multiply.
///
/// Builds a zero `batch × n` input, runs it through [`KtToeplitz`], and
/// back-propagates `w` as the upstream gradient via the injected backend.
/// Agrees with [`crate::kernels::toeplitz::KToeplitz`] within floating-point
/// tolerance; the two paths share no code beyond the transposed kernel, which
/// is what makes the agreement a meaningful cross-check.
///
/// # Arguments
/// * `v`: generator, `rank × n`.
/// * `w`: seed gradient, one `rank × n` matrix per batch row.
/// * `f`: decay parameter of the shift operator.
/// * `backend`: the reverse-mode capability.
pub fn multiply_by_autodiff(
    v: MatRef<'_, f32>,
    w: &[Mat<f32>],
    f: f32,
    backend: &impl VjpBackend,
) -> Result<Mat<f32>, KrylovError> {
    let (rank, n) = (v.nrows(), v.ncols());
    let batch = w.len();
    if batch == 0 {
        return Err(
            KrylovErrorKind::InputError("seed gradient w must not be empty".to_string()).into(),
        );
    }
    for entry in w {
        check_shape("seed gradient w entry", entry.as_ref(), rank, n)?;
    }

    let kernel = KtToeplitz::new(n, f, batch, rank)?;
    let forward = move |u: MatRef<'_, f32>| kernel.apply(v, u);
    backend.vjp(&forward, batch, n, w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::toeplitz::KToeplitz;
    use faer::mat;

    #[test]
    fn test_autodiff_agrees_with_forward_kernel() {
        let v = mat![[0.5_f32, -1.0, 2.0, 0.0], [1.0, 1.0, -0.5, 0.25]];
        let w: Vec<Mat<f32>> = vec![
            mat![[1.0_f32, 0.0, -1.0, 2.0], [0.0, 1.0, 1.0, -1.0]],
            mat![[2.0_f32, -2.0, 0.5, 0.0], [1.0, 0.0, 0.0, -0.5]],
        ];
        for &f in &[1.0_f32, -1.0, 0.0] {
            let via_grad = multiply_by_autodiff(v.as_ref(), &w, f, &BasisVjp).unwrap();
            let direct = KToeplitz::new(4, f, 2, 2)
                .unwrap()
                .apply(v.as_ref(), &w)
                .unwrap();
            for i in 0..2 {
                for j in 0..4 {
                    let diff = (via_grad.as_ref()[(i, j)] - direct.as_ref()[(i, j)]).abs();
                    assert!(diff < 1e-4, "f={f}: diff {diff} at ({i}, {j})");
                }
            }
        }
    }

    #[test]
    fn test_missing_backend_is_reported() {
        let v = mat![[1.0_f32, 0.0]];
        let w = vec![mat![[1.0_f32, 0.0]]];
        let err = multiply_by_autodiff(v.as_ref(), &w, 1.0, &NoAutodiff).unwrap_err();
        assert!(err.to_string().contains("Operation not supported"));
    }

    #[test]
    fn test_seed_shape_mismatch_rejected() {
        let v = mat![[1.0_f32, 0.0, 0.0]];
        let w = vec![mat![[1.0_f32, 0.0]]];
        let err = multiply_by_autodiff(v.as_ref(), &w, 1.0, &BasisVjp).unwrap_err();
        assert!(err.to_string().contains("seed gradient w entry"));
    }
}
