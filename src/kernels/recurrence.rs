//! Generic Krylov-recurrence multiplication for non-scalar-decay operators.
//!
//! The FFT kernels in [`crate::kernels::toeplitz`] cover operators of the
//! form `Z_f` (constant subdiagonal, scalar corner). Structures such as
//! learned subdiagonal or tridiagonal-corner operators do not reduce to that
//! form; for them the displacement-structured multiply is realized through
//! the generic Krylov decomposition
//!
//! ```text
//! M x = Σ_r K(A, g_r) · K(B, h_r)^T · x
//! ```
//!
//! with the Krylov matrices built column by column from the operator's
//! recurrence. These paths are dense and `O(r·n²)`; they trade speed for
//! generality and also serve as oracles for any future fast variant.
//!
//! The [`RecurrenceOperator`] trait is the seam: any operator that can apply
//! itself to a vector participates in the construction. The concrete
//! operators here mirror the displacement-operator menu of the structured
//! layer wrapper (subdiagonal-with-corner, tridiagonal-with-corner, diagonal,
//! and the transposed shift).

use crate::error::{KrylovError, KrylovErrorKind};
use crate::kernels::check_shape;
use faer::{Mat, MatRef};

/// A linear operator defined by its action on a vector, used as the
/// recurrence step of a Krylov construction.
pub trait RecurrenceOperator {
    /// The dimension n of the (square) operator.
    fn dim(&self) -> usize;

    /// Writes `A x` into `out`. Both slices have length [`Self::dim`].
    fn apply_to(&self, x: &[f32], out: &mut [f32]);
}

/// Subdiagonal operator with a wrap-around corner, parameterized by a
/// length-n coefficient vector: `(A x)[0] = c[0]·x[n-1]` and
/// `(A x)[i] = c[i]·x[i-1]` for `i ≥ 1`.
///
/// The coefficient layout matches the circulant-sparsity parameterization:
/// element 0 is the corner, elements 1..n the subdiagonal. `(f, 1, …, 1)`
/// recovers the scalar-decay operator `Z_f`.
pub struct SubdiagCorner {
    coeffs: Vec<f32>,
}

impl SubdiagCorner {
    pub fn new(coeffs: Vec<f32>) -> Result<Self, KrylovError> {
        if coeffs.is_empty() {
            return Err(KrylovErrorKind::InputError(
                "subdiagonal operator needs at least one coefficient".to_string(),
            )
            .into());
        }
        Ok(Self { coeffs })
    }

    /// The scalar-decay special case `Z_f`.
    pub fn scalar_decay(n: usize, f: f32) -> Result<Self, KrylovError> {
        let mut coeffs = vec![1.0; n];
        if n > 0 {
            coeffs[0] = f;
        }
        Self::new(coeffs)
    }

    pub fn coeffs(&self) -> &[f32] {
        &self.coeffs
    }
}

impl RecurrenceOperator for SubdiagCorner {
    fn dim(&self) -> usize {
        self.coeffs.len()
    }

    fn apply_to(&self, x: &[f32], out: &mut [f32]) {
        let n = self.coeffs.len();
        out[0] = self.coeffs[0] * x[n - 1];
        for i in 1..n {
            out[i] = self.coeffs[i] * x[i - 1];
        }
    }
}

/// Tridiagonal operator with a corner entry at position `(0, n-1)`.
///
/// `subdiag` and `superdiag` have length `n - 1`, `diag` has length `n`.
#[derive(Debug)]
pub struct TridiagCorner {
    subdiag: Vec<f32>,
    diag: Vec<f32>,
    superdiag: Vec<f32>,
    corner: f32,
}

impl TridiagCorner {
    pub fn new(
        subdiag: Vec<f32>,
        diag: Vec<f32>,
        superdiag: Vec<f32>,
        corner: f32,
    ) -> Result<Self, KrylovError> {
        let n = diag.len();
        if n == 0 {
            return Err(KrylovErrorKind::InputError(
                "tridiagonal operator needs at least one diagonal entry".to_string(),
            )
            .into());
        }
        if subdiag.len() + 1 != n || superdiag.len() + 1 != n {
            return Err(KrylovErrorKind::InputError(format!(
                "tridiagonal bands must have length n-1 = {}, got subdiag {} and superdiag {}",
                n - 1,
                subdiag.len(),
                superdiag.len()
            ))
            .into());
        }
        Ok(Self {
            subdiag,
            diag,
            superdiag,
            corner,
        })
    }
}

impl RecurrenceOperator for TridiagCorner {
    fn dim(&self) -> usize {
        self.diag.len()
    }

    fn apply_to(&self, x: &[f32], out: &mut [f32]) {
        let n = self.diag.len();
        for i in 0..n {
            let mut value = self.diag[i] * x[i];
            if i > 0 {
                value += self.subdiag[i - 1] * x[i - 1];
            }
            if i + 1 < n {
                value += self.superdiag[i] * x[i + 1];
            }
            out[i] = value;
        }
        out[0] += self.corner * x[n - 1];
    }
}

/// Diagonal operator `diag(d)`, the displacement operator of the
/// Vandermonde-like structure.
pub struct DiagOperator {
    diag: Vec<f32>,
}

impl DiagOperator {
    pub fn new(diag: Vec<f32>) -> Result<Self, KrylovError> {
        if diag.is_empty() {
            return Err(KrylovErrorKind::InputError(
                "diagonal operator needs at least one entry".to_string(),
            )
            .into());
        }
        Ok(Self { diag })
    }
}

impl RecurrenceOperator for DiagOperator {
    fn dim(&self) -> usize {
        self.diag.len()
    }

    fn apply_to(&self, x: &[f32], out: &mut [f32]) {
        for (o, (d, v)) in out.iter_mut().zip(self.diag.iter().zip(x.iter())) {
            *o = d * v;
        }
    }
}

/// The transpose `Z_f^T` of the shift-with-corner operator: the up-shift
/// `(A x)[i] = x[i+1]` with `(A x)[n-1] = f·x[0]`. Used by the Hankel-like
/// and Vandermonde-like structures.
pub struct UpShiftCorner {
    n: usize,
    f: f32,
}

impl UpShiftCorner {
    pub fn new(n: usize, f: f32) -> Result<Self, KrylovError> {
        if n == 0 {
            return Err(KrylovErrorKind::InputError(
                "shift operator dimension must be at least 1".to_string(),
            )
            .into());
        }
        Ok(Self { n, f })
    }
}

impl RecurrenceOperator for UpShiftCorner {
    fn dim(&self) -> usize {
        self.n
    }

    fn apply_to(&self, x: &[f32], out: &mut [f32]) {
        for i in 0..self.n - 1 {
            out[i] = x[i + 1];
        }
        out[self.n - 1] = self.f * x[0];
    }
}

/// Builds the `n × m` Krylov matrix of `op` applied to `v` by repeated
/// application of the recurrence.
pub fn krylov_construct_op(op: &impl RecurrenceOperator, v: &[f32], m: usize) -> Mat<f32> {
    let n = op.dim();
    debug_assert_eq!(v.len(), n);
    let mut out = Mat::<f32>::zeros(n, m);
    let mut col = v.to_vec();
    let mut next = vec![0.0_f32; n];
    for j in 0..m {
        for i in 0..n {
            out.as_mut()[(i, j)] = col[i];
        }
        if j + 1 < m {
            op.apply_to(&col, &mut next);
            std::mem::swap(&mut col, &mut next);
        }
    }
    out
}

/// Dense Krylov-decomposition multiply for arbitrary recurrence operators:
/// `out = (Σ_r K(A, g_r) · K(B, h_r)^T) x^T`, transposed to batch-rows
/// layout.
pub fn krylov_mult_slow(
    op_a: &impl RecurrenceOperator,
    op_b: &impl RecurrenceOperator,
    g: MatRef<'_, f32>,
    h: MatRef<'_, f32>,
    x: MatRef<'_, f32>,
) -> Result<Mat<f32>, KrylovError> {
    let n = op_a.dim();
    if op_b.dim() != n {
        return Err(KrylovErrorKind::InputError(format!(
            "operator dimensions disagree: {} vs {}",
            n,
            op_b.dim()
        ))
        .into());
    }
    let rank = g.nrows();
    check_shape("generator G", g, rank, n)?;
    check_shape("generator H", h, rank, n)?;
    check_shape("input x", x, x.nrows(), n)?;

    let xt = x.transpose();
    let mut acc = Mat::<f32>::zeros(n, x.nrows());
    for r in 0..rank {
        let g_row: Vec<f32> = (0..n).map(|k| g[(r, k)]).collect();
        let h_row: Vec<f32> = (0..n).map(|k| h[(r, k)]).collect();
        let k_a = krylov_construct_op(op_a, &g_row, n);
        let k_b = krylov_construct_op(op_b, &h_row, n);
        let temp = k_b.as_ref().transpose() * xt;
        acc = acc + &k_a * &temp;
    }
    Ok(acc.as_ref().transpose().to_owned())
}

/// Multiply by a structure whose displacement operators are two
/// subdiagonal-with-corner operators given by their coefficient vectors.
pub fn subdiag_mult_slow(
    subdiag_a: &[f32],
    subdiag_b: &[f32],
    g: MatRef<'_, f32>,
    h: MatRef<'_, f32>,
    x: MatRef<'_, f32>,
) -> Result<Mat<f32>, KrylovError> {
    let op_a = SubdiagCorner::new(subdiag_a.to_vec())?;
    let op_b = SubdiagCorner::new(subdiag_b.to_vec())?;
    krylov_mult_slow(&op_a, &op_b, g, h, x)
}

/// Multiply by a structure whose displacement operators are two
/// tridiagonal-with-corner operators.
pub fn tridiag_mult_slow(
    op_a: &TridiagCorner,
    op_b: &TridiagCorner,
    g: MatRef<'_, f32>,
    h: MatRef<'_, f32>,
    x: MatRef<'_, f32>,
) -> Result<Mat<f32>, KrylovError> {
    krylov_mult_slow(op_a, op_b, g, h, x)
}
