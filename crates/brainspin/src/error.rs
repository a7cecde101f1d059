//! Error taxonomy shared by every module.
//!
//! - Contract violations (lengths, indices, unknown names) are errors and are
//!   raised before any expensive work starts.
//! - Numerical degeneracies are data: unreachable vertices are `+inf`,
//!   empty aggregates are NaN, exhausted duplicate retries are warnings
//!   (`spins::SpinWarning`).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{what} index {index} out of range for length {len}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
    #[error("invalid {kind} \"{value}\"; must be one of {valid:?}")]
    InvalidMethod {
        kind: &'static str,
        value: String,
        valid: &'static [&'static str],
    },
    #[error("invalid hemisphere designation \"{value}\"; must be one of [\"L\", \"R\", 0, 1]")]
    InvalidHemisphere { value: String },
    #[error(
        "cannot use `{method}` null method without a parcellation; \
         use `alexander_bloch` instead for unparcellated surface data"
    )]
    MissingParcellation { method: &'static str },
    #[error("`{method}` needs {needs}")]
    MissingInput {
        method: &'static str,
        needs: &'static str,
    },
    #[error("assignment problem is infeasible (non-finite costs)")]
    InfeasibleAssignment,
    #[error("input contains NaN")]
    NanInput,
    #[error("malformed .npy file: {reason}")]
    Npy { reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn shape(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }

    pub(crate) fn npy(reason: impl Into<String>) -> Self {
        Self::Npy {
            reason: reason.into(),
        }
    }
}

/// Fails with `ShapeMismatch` unless `actual == expected`.
#[inline]
pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::shape(what, expected, actual));
    }
    Ok(())
}
