//! Errors for configuration, integration and linear algebra

use thiserror::Error;

use crate::{Float, methods::MethodKind};

/// Coarse classification of an [`Error`].
///
/// Lets callers tell "bad input" from "numerically intractable problem" from
/// "internal defect" without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration or arguments. Never retried.
    Config,
    /// The integration could not make progress.
    Convergence,
    /// Failure reported by the linear solver.
    LinearSolver,
    /// Failure of the communicator joining row partitions.
    Communication,
    /// Broken internal invariant.
    Internal,
}

/// Errors returned by the solver and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown ODE method {0:?}")]
    UnknownMethod(String),
    #[error("unknown linear solver kind {0:?}")]
    UnknownLinSolKind(String),
    #[error("tolerances are too small: atol={atol}, rtol={rtol}")]
    ToleranceTooSmall { atol: Float, rtol: Float },
    #[error("step size must be positive (got {0})")]
    InvalidStepSize(Float),
    #[error("fixed step h={h} times {n} steps does not reach xf={xf}")]
    FixedStepMismatch { h: Float, n: usize, xf: Float },
    #[error("method {0} can only be used with fixed steps")]
    FixedStepOnly(MethodKind),
    #[error("method {0} does not support a mass matrix")]
    MassMatrixUnsupported(MethodKind),
    #[error("method {0} does not provide dense output")]
    DenseOutputUnsupported(MethodKind),
    #[error("dense output spacing must be positive (got {0})")]
    InvalidDenseStep(Float),
    #[error("xf={xf} must be greater than or equal to x={x}")]
    InvalidInterval { x: Float, xf: Float },
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("triplet entry ({i}, {j}) is outside a {m}x{n} matrix")]
    TripletIndex { i: usize, j: usize, m: usize, n: usize },

    #[error("Newton iterations did not converge after {nit} iterations at x={x}")]
    NewtonMaxIterations { nit: usize, x: Float },
    #[error("Newton iterations diverged at x={x} with a fixed step size")]
    FixedStepDiverged { x: Float },
    #[error("substepping did not reach xf after {nsteps} steps (x={x})")]
    SubstepsExceeded { nsteps: usize, x: Float },
    #[error("step size h={h} fell below hmin={hmin} at x={x}")]
    StepSizeTooSmall { h: Float, hmin: Float, x: Float },

    #[error("singular matrix: zero pivot in column {0}")]
    SingularMatrix(usize),
    #[error("linear solver used before factorization")]
    NotFactorized,
    #[error("real and complex solves both failed: {real}; {complex}")]
    LinearSolvers { real: Box<Error>, complex: Box<Error> },

    #[error("communicator failure: {0}")]
    Comm(String),

    #[error("final x={x} differs from xf={xf}")]
    Postcondition { x: Float, xf: Float },
}

impl Error {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownMethod(_)
            | Error::UnknownLinSolKind(_)
            | Error::ToleranceTooSmall { .. }
            | Error::InvalidStepSize(_)
            | Error::FixedStepMismatch { .. }
            | Error::FixedStepOnly(_)
            | Error::MassMatrixUnsupported(_)
            | Error::DenseOutputUnsupported(_)
            | Error::InvalidDenseStep(_)
            | Error::InvalidInterval { .. }
            | Error::DimensionMismatch { .. }
            | Error::TripletIndex { .. } => ErrorKind::Config,
            Error::NewtonMaxIterations { .. }
            | Error::FixedStepDiverged { .. }
            | Error::SubstepsExceeded { .. }
            | Error::StepSizeTooSmall { .. } => ErrorKind::Convergence,
            Error::SingularMatrix(_) | Error::NotFactorized | Error::LinearSolvers { .. } => {
                ErrorKind::LinearSolver
            }
            Error::Comm(_) => ErrorKind::Communication,
            Error::Postcondition { .. } => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_separate_input_from_numerics() {
        assert_eq!(
            Error::ToleranceTooSmall { atol: 0.0, rtol: 0.0 }.kind(),
            ErrorKind::Config
        );
        assert_eq!(
            Error::SubstepsExceeded { nsteps: 10, x: 0.5 }.kind(),
            ErrorKind::Convergence
        );
        let both = Error::LinearSolvers {
            real: Box::new(Error::SingularMatrix(0)),
            complex: Box::new(Error::SingularMatrix(1)),
        };
        assert_eq!(both.kind(), ErrorKind::LinearSolver);
        assert!(both.to_string().contains("column 0"));
        assert!(both.to_string().contains("column 1"));
        assert_eq!(Error::Postcondition { x: 1.0, xf: 2.0 }.kind(), ErrorKind::Internal);
    }
}
