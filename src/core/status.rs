//! Status codes for integrators

/// How a successful call to [`crate::Solver::solve`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Reached `xf`.
    Success,
    /// An output sink returned [`crate::ControlFlag::Interrupt`].
    Interrupted,
    /// The stiffness test of an explicit method fired repeatedly.
    ProbablyStiff,
}
