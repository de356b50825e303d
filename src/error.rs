//! This module defines the custom error types for the library.
//!
//! This module centralizes all possible error conditions that can arise within
//! the structured-matrix multiplication kernels into a single, comprehensive
//! enum: [`KrylovError`].
//!
//! Using the [`thiserror`] crate allows us to create idiomatic error types with
//! minimal boilerplate. Every shape precondition is checked before any FFT or
//! matrix work begins, so a [`KrylovError`] always surfaces to the immediate
//! caller without partial computation having taken place.
use thiserror::Error;

/// Represents all possible errors that can occur in the multiplication kernels.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct KrylovError(#[from] pub(crate) KrylovErrorKind);

/// Private enum containing the distinct kinds of errors.
/// This separation allows for a clean `Display` implementation via [`thiserror`]
/// while keeping the set of variants free to evolve.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum KrylovErrorKind {
    /// Indicates that the shapes of two tensors that must agree do not.
    ///
    /// The kernels never broadcast silently across the batch or rank axes, so
    /// any inconsistency between generators, inputs, and a kernel's configured
    /// dimensions is reported immediately.
    #[error(
        "Dimension mismatch: {subject} has shape ({actual_rows}, {actual_cols}) but ({expected_rows}, {expected_cols}) is required."
    )]
    DimensionMismatch {
        subject: &'static str,
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    /// Indicates that an invalid input parameter was provided to a function.
    #[error("Invalid input parameter: {0}")]
    InputError(String),

    /// Indicates that an operation requires a capability the current
    /// configuration does not provide, e.g. the autodiff-based multiply
    /// invoked without a reverse-mode backend.
    #[error("Operation not supported: {0}")]
    Unsupported(String),
}

// Manually implement PartialEq for the public error type.
// We compare the inner `KrylovErrorKind`.
impl PartialEq for KrylovError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
