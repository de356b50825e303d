//! Fast multiplication by displacement-rank structured matrices.
//!
//! This crate implements the multiplication kernels that let structured
//! matrices from the displacement-rank family (Toeplitz-like, circulant,
//! skew-circulant, subdiagonal, tridiagonal-corner, low-rank, Hankel-like,
//! Vandermonde-like) replace dense `n × n` weight matrices: a rank-r
//! structured matrix multiplies a batch of vectors in `O(r · n log n)` via
//! FFT-based Krylov kernels instead of the dense `O(n²)`.
//!
//! Built on the [`faer`] linear algebra framework for its dense matrix types
//! and oracle paths, with transforms planned through [`rustfft`].
//!
//! ## The displacement decomposition
//!
//! For a decay parameter `f`, the shift-with-corner operator
//! `Z_f v = (f·v_{n-1}, v_0, …, v_{n-2})` generates the Krylov matrix
//! `K(Z_f, v)` whose j-th column is `Z_f^j v`. A matrix with displacement
//! rank r factors as
//!
//! ```text
//! M = Σ_{i<r} K(Z_{f_G}, g_i) · K(Z_{f_H}, h_i)^T
//! ```
//!
//! with `rank × n` generators `(G, H)`. Both Krylov factors are
//! FFT-diagonalizable, which is what the fast kernels exploit.
//!
//! ## Module map
//!
//! - [`kernels::toeplitz`]: the core [`KtToeplitz`]/[`KToeplitz`] FFT kernels.
//! - [`kernels::reference`]: dense O(n²) oracles and the vectorized
//!   intermediate used to localize bugs between construction and FFT.
//! - [`kernels::recurrence`]: generic recurrence operators for structures
//!   that do not reduce to a scalar-decay shift.
//! - [`multiply`]: the high-level [`toeplitz_mult`] entry point.
//! - [`autodiff`]: the adjoint-identity cross-check built on an injected
//!   reverse-mode capability.
//! - [`layers`]: the [`StructuredMatrix`] tagged representation and its
//!   dispatch.
//!
//! ## Example
//!
//! ```rust
//! use faer::mat;
//! use krylov_toeplitz::{toeplitz_mult, toeplitz_mult_slow};
//!
//! // Rank-2 generators and a batch of two input vectors.
//! let g = mat![[0.0f32, 1.0, 0.0, -1.0], [0.0, 1.0, 2.0, 3.0]];
//! let x = mat![[1.0f32, 1.0, 1.0, 1.0], [0.0, 1.0, 2.0, 3.0]];
//!
//! // Fast FFT path and dense oracle agree on the same product.
//! let fast = toeplitz_mult(g.as_ref(), g.as_ref(), x.as_ref(), true).unwrap();
//! let slow = toeplitz_mult_slow(g.as_ref(), g.as_ref(), x.as_ref(), true).unwrap();
//! for i in 0..2 {
//!     for j in 0..4 {
//!         assert!((fast.as_ref()[(i, j)] - slow.as_ref()[(i, j)]).abs() < 1e-3);
//!     }
//! }
//! ```
//!
//! ## Numerical validation
//!
//! Every fast path has a dense oracle and the test suite holds them together:
//! the FFT kernels against [`toeplitz_mult_slow`], the vectorized
//! construction against the column-recurrence reference, and the autodiff
//! path against the forward kernel. Tolerances are those of 32-bit FFTs
//! (about `1e-2` maximum absolute error at `n = 1024`).

// Declare the modules that form the crate's API structure.
pub mod autodiff;
pub mod complex;
pub mod error;
pub mod fft;
pub mod kernels;
pub mod layers;
pub mod multiply;
pub mod operator;
pub mod utils;

// Re-export the main API for convenient access.
pub use autodiff::{multiply_by_autodiff, BasisVjp, NoAutodiff, VjpBackend};
pub use error::KrylovError;
pub use kernels::reference::{
    krylov_construct, krylov_construct_toeplitz, toeplitz_mult_slow, toeplitz_mult_slow_fast,
};
pub use kernels::toeplitz::{KToeplitz, KtToeplitz};
pub use layers::{circulant_multiply, StructureKind, StructuredMatrix};
pub use multiply::toeplitz_mult;
pub use operator::BatchedOperator;
