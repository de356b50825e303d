//! Structured-matrix representations and their multiplication dispatch.
//!
//! A [`StructuredMatrix`] is a tagged variant over the displacement-rank
//! family: each variant carries exactly the parameter tensors its structure
//! needs, never a shared bag of optional fields. Multiplication dispatches to
//! the fastest available path for the structure:
//!
//! | variant | path |
//! |---|---|
//! | `Unconstrained` | dense matmul |
//! | `Circulant` | single FFT convolution ([`circulant_multiply`]) |
//! | `LowRank` | two thin matmuls |
//! | `Toeplitz` / `ToeplitzCorner` | FFT Krylov kernels ([`toeplitz_mult`]) |
//! | `Subdiagonal`, `TridiagonalCorner`, `HankelLike`, `VandermondeLike` | generic Krylov decomposition ([`krylov_mult_slow`]) |
//!
//! Random initialization draws every learned tensor from a centered normal
//! distribution with configurable standard deviation, from a caller-supplied
//! RNG so experiments stay reproducible.

use crate::error::{KrylovError, KrylovErrorKind};
use crate::fft::FftPair;
use crate::kernels::check_shape;
use crate::kernels::recurrence::{
    krylov_mult_slow, DiagOperator, SubdiagCorner, TridiagCorner, UpShiftCorner,
};
use crate::multiply::toeplitz_mult;
use crate::operator::BatchedOperator;
use faer::{Mat, MatRef};
use num_complex::Complex32;
use rand::Rng;
use rand_distr::StandardNormal;

/// The structure kinds a [`StructuredMatrix`] can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructureKind {
    Unconstrained,
    Circulant,
    LowRank,
    /// Toeplitz-like with the acyclic `(0, 0)` decomposition.
    Toeplitz,
    /// Toeplitz-like with the cyclic `(1, -1)` decomposition.
    ToeplitzCorner,
    Subdiagonal,
    TridiagonalCorner,
    HankelLike,
    VandermondeLike,
}

impl StructureKind {
    /// Short identifier used in experiment result names.
    pub fn abbrev(self) -> &'static str {
        match self {
            StructureKind::Unconstrained => "u",
            StructureKind::Circulant => "c",
            StructureKind::LowRank => "lr",
            StructureKind::Toeplitz => "t",
            StructureKind::ToeplitzCorner => "tc",
            StructureKind::Subdiagonal => "sd",
            StructureKind::TridiagonalCorner => "tdc",
            StructureKind::HankelLike => "h",
            StructureKind::VandermondeLike => "v",
        }
    }

    /// All kinds, in comparison order.
    pub fn all() -> [StructureKind; 9] {
        [
            StructureKind::Unconstrained,
            StructureKind::Circulant,
            StructureKind::LowRank,
            StructureKind::Toeplitz,
            StructureKind::ToeplitzCorner,
            StructureKind::Subdiagonal,
            StructureKind::TridiagonalCorner,
            StructureKind::HankelLike,
            StructureKind::VandermondeLike,
        ]
    }
}

/// An `n × n` matrix in one of the displacement-rank structured
/// representations.
pub enum StructuredMatrix {
    Unconstrained {
        w: Mat<f32>,
    },
    /// Circulant matrix given by its first column.
    Circulant {
        c: Vec<f32>,
    },
    /// `M = G^T H` with `G`, `H` both `rank × n`.
    LowRank {
        g: Mat<f32>,
        h: Mat<f32>,
    },
    /// Toeplitz-like displacement structure with generators `(G, H)`.
    Toeplitz {
        g: Mat<f32>,
        h: Mat<f32>,
        cycle: bool,
    },
    /// Learned subdiagonal-with-corner displacement operators.
    Subdiagonal {
        op_a: SubdiagCorner,
        op_b: SubdiagCorner,
        g: Mat<f32>,
        h: Mat<f32>,
    },
    /// Learned tridiagonal-with-corner displacement operators.
    TridiagonalCorner {
        op_a: TridiagCorner,
        op_b: TridiagCorner,
        g: Mat<f32>,
        h: Mat<f32>,
    },
    /// Hankel-like: displacement operators `Z_1^T` and `Z_0`.
    HankelLike {
        g: Mat<f32>,
        h: Mat<f32>,
    },
    /// Vandermonde-like: displacement operators `diag(d)` and `Z_0^T`.
    VandermondeLike {
        d: Vec<f32>,
        g: Mat<f32>,
        h: Mat<f32>,
    },
}

fn normal_mat(rows: usize, cols: usize, stddev: f32, rng: &mut impl Rng) -> Mat<f32> {
    Mat::from_fn(rows, cols, |_, _| {
        rng.sample::<f32, _>(StandardNormal) * stddev
    })
}

fn normal_vec(len: usize, stddev: f32, rng: &mut impl Rng) -> Vec<f32> {
    (0..len)
        .map(|_| rng.sample::<f32, _>(StandardNormal) * stddev)
        .collect()
}

impl StructuredMatrix {
    /// Randomly initializes an `n × n` structured matrix of the given kind
    /// and displacement rank.
    ///
    /// Generator matrices and learned diagonals are drawn from
    /// `N(0, stddev²)`; the subdiagonal recurrence coefficients start at one
    /// (the identity-like recurrence), matching how the structures are
    /// initialized for training.
    pub fn random(
        kind: StructureKind,
        n: usize,
        rank: usize,
        stddev: f32,
        rng: &mut impl Rng,
    ) -> Result<Self, KrylovError> {
        if n == 0 {
            return Err(KrylovErrorKind::InputError(
                "layer size n must be at least 1".to_string(),
            )
            .into());
        }
        if rank == 0 {
            return Err(
                KrylovErrorKind::InputError("displacement rank must be at least 1".to_string())
                    .into(),
            );
        }
        let layer = match kind {
            StructureKind::Unconstrained => StructuredMatrix::Unconstrained {
                w: normal_mat(n, n, stddev, rng),
            },
            StructureKind::Circulant => StructuredMatrix::Circulant {
                c: normal_vec(n, stddev, rng),
            },
            StructureKind::LowRank => StructuredMatrix::LowRank {
                g: normal_mat(rank, n, stddev, rng),
                h: normal_mat(rank, n, stddev, rng),
            },
            StructureKind::Toeplitz => StructuredMatrix::Toeplitz {
                g: normal_mat(rank, n, stddev, rng),
                h: normal_mat(rank, n, stddev, rng),
                cycle: false,
            },
            StructureKind::ToeplitzCorner => StructuredMatrix::Toeplitz {
                g: normal_mat(rank, n, stddev, rng),
                h: normal_mat(rank, n, stddev, rng),
                cycle: true,
            },
            StructureKind::Subdiagonal => StructuredMatrix::Subdiagonal {
                op_a: SubdiagCorner::new(vec![1.0; n])?,
                op_b: SubdiagCorner::new(vec![1.0; n])?,
                g: normal_mat(rank, n, stddev, rng),
                h: normal_mat(rank, n, stddev, rng),
            },
            StructureKind::TridiagonalCorner => StructuredMatrix::TridiagonalCorner {
                op_a: TridiagCorner::new(vec![1.0; n - 1], vec![0.0; n], vec![0.0; n - 1], 0.0)?,
                op_b: TridiagCorner::new(vec![1.0; n - 1], vec![0.0; n], vec![0.0; n - 1], 0.0)?,
                g: normal_mat(rank, n, stddev, rng),
                h: normal_mat(rank, n, stddev, rng),
            },
            StructureKind::HankelLike => StructuredMatrix::HankelLike {
                g: normal_mat(rank, n, stddev, rng),
                h: normal_mat(rank, n, stddev, rng),
            },
            StructureKind::VandermondeLike => StructuredMatrix::VandermondeLike {
                d: normal_vec(n, stddev, rng),
                g: normal_mat(rank, n, stddev, rng),
                h: normal_mat(rank, n, stddev, rng),
            },
        };
        Ok(layer)
    }

    /// The kind tag of this representation.
    pub fn kind(&self) -> StructureKind {
        match self {
            StructuredMatrix::Unconstrained { .. } => StructureKind::Unconstrained,
            StructuredMatrix::Circulant { .. } => StructureKind::Circulant,
            StructuredMatrix::LowRank { .. } => StructureKind::LowRank,
            StructuredMatrix::Toeplitz { cycle: false, .. } => StructureKind::Toeplitz,
            StructuredMatrix::Toeplitz { cycle: true, .. } => StructureKind::ToeplitzCorner,
            StructuredMatrix::Subdiagonal { .. } => StructureKind::Subdiagonal,
            StructuredMatrix::TridiagonalCorner { .. } => StructureKind::TridiagonalCorner,
            StructuredMatrix::HankelLike { .. } => StructureKind::HankelLike,
            StructuredMatrix::VandermondeLike { .. } => StructureKind::VandermondeLike,
        }
    }

    /// The displacement rank of the representation (1 for the rank-free
    /// unconstrained and circulant forms).
    pub fn rank(&self) -> usize {
        match self {
            StructuredMatrix::Unconstrained { .. } | StructuredMatrix::Circulant { .. } => 1,
            StructuredMatrix::LowRank { g, .. }
            | StructuredMatrix::Toeplitz { g, .. }
            | StructuredMatrix::Subdiagonal { g, .. }
            | StructuredMatrix::TridiagonalCorner { g, .. }
            | StructuredMatrix::HankelLike { g, .. }
            | StructuredMatrix::VandermondeLike { g, .. } => g.nrows(),
        }
    }

    /// Short experiment identifier: the kind abbreviation plus the rank.
    pub fn name(&self) -> String {
        format!("{}{}", self.kind().abbrev(), self.rank())
    }

    /// Number of learned scalar parameters in the representation.
    pub fn num_parameters(&self) -> usize {
        match self {
            StructuredMatrix::Unconstrained { w } => w.nrows() * w.ncols(),
            StructuredMatrix::Circulant { c } => c.len(),
            StructuredMatrix::LowRank { g, h }
            | StructuredMatrix::Toeplitz { g, h, .. }
            | StructuredMatrix::HankelLike { g, h } => {
                g.nrows() * g.ncols() + h.nrows() * h.ncols()
            }
            StructuredMatrix::Subdiagonal { op_a, op_b, g, h } => {
                op_a.coeffs().len()
                    + op_b.coeffs().len()
                    + g.nrows() * g.ncols()
                    + h.nrows() * h.ncols()
            }
            StructuredMatrix::TridiagonalCorner { g, h, .. } => {
                // Two operators with (n-1) + n + (n-1) + 1 parameters each.
                let n = g.ncols();
                2 * (3 * n - 1) + g.nrows() * g.ncols() + h.nrows() * h.ncols()
            }
            StructuredMatrix::VandermondeLike { d, g, h } => {
                d.len() + g.nrows() * g.ncols() + h.nrows() * h.ncols()
            }
        }
    }
}

impl BatchedOperator for StructuredMatrix {
    fn dim(&self) -> usize {
        match self {
            StructuredMatrix::Unconstrained { w } => w.nrows(),
            StructuredMatrix::Circulant { c } => c.len(),
            StructuredMatrix::LowRank { g, .. }
            | StructuredMatrix::Toeplitz { g, .. }
            | StructuredMatrix::Subdiagonal { g, .. }
            | StructuredMatrix::TridiagonalCorner { g, .. }
            | StructuredMatrix::HankelLike { g, .. }
            | StructuredMatrix::VandermondeLike { g, .. } => g.ncols(),
        }
    }

    fn apply_batch(&self, x: MatRef<'_, f32>) -> Result<Mat<f32>, KrylovError> {
        check_shape("input x", x, x.nrows(), self.dim())?;
        match self {
            StructuredMatrix::Unconstrained { w } => w.apply_batch(x),
            StructuredMatrix::Circulant { c } => circulant_multiply(c, x),
            StructuredMatrix::LowRank { g, h } => {
                // M = G^T H: two thin products instead of one n × n one.
                let xh = x * h.as_ref().transpose();
                Ok(&xh * g.as_ref())
            }
            StructuredMatrix::Toeplitz { g, h, cycle } => {
                toeplitz_mult(g.as_ref(), h.as_ref(), x, *cycle)
            }
            StructuredMatrix::Subdiagonal { op_a, op_b, g, h } => {
                krylov_mult_slow(op_a, op_b, g.as_ref(), h.as_ref(), x)
            }
            StructuredMatrix::TridiagonalCorner { op_a, op_b, g, h } => {
                krylov_mult_slow(op_a, op_b, g.as_ref(), h.as_ref(), x)
            }
            StructuredMatrix::HankelLike { g, h } => {
                let n = self.dim();
                let op_a = UpShiftCorner::new(n, 1.0)?;
                let op_b = SubdiagCorner::scalar_decay(n, 0.0)?;
                krylov_mult_slow(&op_a, &op_b, g.as_ref(), h.as_ref(), x)
            }
            StructuredMatrix::VandermondeLike { d, g, h } => {
                let n = self.dim();
                let op_a = DiagOperator::new(d.clone())?;
                let op_b = UpShiftCorner::new(n, 0.0)?;
                krylov_mult_slow(&op_a, &op_b, g.as_ref(), h.as_ref(), x)
            }
        }
    }
}

/// Multiplies every row of `x` by the circulant matrix whose first column is
/// `c`, via a single frequency-domain product:
/// `out_b = Re(IFFT(FFT(c) ⊙ FFT(x_b)))`.
pub fn circulant_multiply(c: &[f32], x: MatRef<'_, f32>) -> Result<Mat<f32>, KrylovError> {
    let n = c.len();
    if n == 0 {
        return Err(KrylovErrorKind::InputError(
            "circulant parameter vector must not be empty".to_string(),
        )
        .into());
    }
    check_shape("input x", x, x.nrows(), n)?;

    let fft = FftPair::new(n);
    let mut c_hat: Vec<Complex32> = c.iter().map(|&v| Complex32::new(v, 0.0)).collect();
    fft.forward(&mut c_hat);

    let mut out = Mat::<f32>::zeros(x.nrows(), n);
    let mut buf = vec![Complex32::new(0.0, 0.0); n];
    for b in 0..x.nrows() {
        for k in 0..n {
            buf[k] = Complex32::new(x[(b, k)], 0.0);
        }
        fft.forward(&mut buf);
        for k in 0..n {
            buf[k] *= c_hat[k];
        }
        fft.inverse(&mut buf);
        for k in 0..n {
            out.as_mut()[(b, k)] = buf[k].re;
        }
    }
    Ok(out)
}
