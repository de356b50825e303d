//! Batched linear-operator abstraction.
//!
//! The comparison tooling does not care which structure a matrix has; its
//! fundamental operation is "multiply a batch of row vectors by the
//! represented matrix". The [`BatchedOperator`] trait formalizes that
//! contract so the same harness can drive a dense matrix, any
//! [`crate::layers::StructuredMatrix`] variant, or a future operator without
//! knowing its representation.

use crate::error::KrylovError;
use crate::kernels::check_shape;
use faer::{Mat, MatRef};

/// A square linear operator applied to a batch of row vectors.
///
/// `apply_batch` computes `(M x^T)^T`: each row of `x` is multiplied by the
/// represented `n × n` matrix `M`, and the result keeps the batch-rows
/// layout. Implementations must validate the input width against [`dim`]
/// before doing any work.
///
/// [`dim`]: BatchedOperator::dim
pub trait BatchedOperator {
    /// The dimension n of the represented square matrix.
    fn dim(&self) -> usize;

    /// Multiplies every row of `x` (shape `batch × n`) by the represented
    /// matrix, returning a `batch × n` result.
    fn apply_batch(&self, x: MatRef<'_, f32>) -> Result<Mat<f32>, KrylovError>;
}

/// Dense implementation: the stored matrix is used directly.
impl BatchedOperator for Mat<f32> {
    fn dim(&self) -> usize {
        self.nrows()
    }

    fn apply_batch(&self, x: MatRef<'_, f32>) -> Result<Mat<f32>, KrylovError> {
        check_shape("input x", x, x.nrows(), self.ncols())?;
        let product = self.as_ref() * x.transpose();
        Ok(product.as_ref().transpose().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    #[test]
    fn test_dense_apply_batch() {
        let m: Mat<f32> = mat![[2.0, -1.0], [0.0, 3.0]];
        let x: Mat<f32> = mat![[1.0, 1.0], [2.0, 0.0]];
        let out = m.apply_batch(x.as_ref()).unwrap();
        // Row 0: M [1, 1]^T = [1, 3]; row 1: M [2, 0]^T = [4, 0].
        let expected = mat![[1.0_f32, 3.0], [4.0, 0.0]];
        assert_eq!(out, expected);
    }

    #[test]
    fn test_dense_apply_batch_width_mismatch() {
        let m = Mat::<f32>::zeros(3, 3);
        let x = Mat::<f32>::zeros(2, 4);
        assert!(m.apply_batch(x.as_ref()).is_err());
    }
}
