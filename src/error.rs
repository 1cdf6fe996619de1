//! Error taxonomy for the filter engine.
//!
//! Every fallible entry point returns `Result<_, Error>`. There is no
//! `InvalidPointer` variant: Rust references and slices cannot be null, so
//! the cases the abstract taxonomy groups under that name are either
//! unrepresentable (rejected at compile time) or fold into one of the
//! variants below.

use core::fmt;

/// The kind of failure a fallible call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A matrix's declared shape violates a relationship the engine requires:
    /// non-square where square is needed, a row/column mismatch against the
    /// derived state/measurement/control dimensions, or a validity mask
    /// whose length does not match the number of measurements.
    InvalidDimensions,
    /// A storage descriptor's capacity is less than the minimum required for
    /// its role.
    StorageTooSmall,
    /// `predict` or `update` was called on a filter that was never
    /// successfully validated.
    NotInitialized,
    /// `predict` was given a control input, but the configuration declares
    /// no control matrix.
    ControlMatrixNotEnabled,
    /// The Cholesky factorization of the innovation covariance encountered a
    /// non-positive pivot.
    NotPositiveDefinite,
}

impl ErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidDimensions => "invalid dimensions",
            ErrorKind::StorageTooSmall => "storage too small",
            ErrorKind::NotInitialized => "filter not initialized",
            ErrorKind::ControlMatrixNotEnabled => "control matrix not enabled",
            ErrorKind::NotPositiveDefinite => "matrix not positive-definite",
        }
    }
}

/// An error returned by a fallible entry point, carrying its [`ErrorKind`]
/// plus a short static context string naming what failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    context: &'static str,
}

impl Error {
    pub fn new(kind: ErrorKind, context: &'static str) -> Self {
        Self { kind, context }
    }

    /// The kind of failure.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// A short, static description of what failed.
    pub fn context(&self) -> &'static str {
        self.context
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.context)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self { kind, context: "" }
    }
}
