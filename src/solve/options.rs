//! Options of the high-level [`solve`](super::solve) entry point.

use std::sync::Arc;

use bon::Builder;

use crate::{Float, comm::Communicator, methods::MethodKind};

/// Options for [`solve`](super::solve).
///
/// Everything not listed here keeps the [`Config`](crate::Config) default;
/// build a `Config` directly for full control.
///
/// ```
/// use odesolve::{MethodKind, solve::SolveOptions};
///
/// let opts = SolveOptions::builder()
///     .method(MethodKind::Radau5)
///     .rtol(1e-6)
///     .dense_dx(0.1)
///     .build();
/// assert_eq!(opts.atol, 1e-4);
/// assert!(opts.save_steps);
/// ```
#[derive(Builder, Clone)]
pub struct SolveOptions {
    /// Integration method. Default: Dormand-Prince 5(4).
    #[builder(default = MethodKind::Dopri5)]
    pub method: MethodKind,
    #[builder(default = 1e-4)]
    pub atol: Float,
    #[builder(default = 1e-4)]
    pub rtol: Float,
    /// Runs with constant steps of about this size instead of adapting.
    pub fixed_h: Option<Float>,
    /// Records the solution at `x0, x0 + dx, ...` through dense output.
    pub dense_dx: Option<Float>,
    /// Initial step size of adaptive runs.
    pub ini_h: Option<Float>,
    /// Maximum number of steps.
    pub nmax_ss: Option<usize>,
    /// Differentiates the right-hand side numerically even when `ODE::jac`
    /// is implemented.
    #[builder(default = false)]
    pub num_jac: bool,
    /// Records every accepted step.
    #[builder(default = true)]
    pub save_steps: bool,
    /// Row-partitioned execution over this communicator.
    pub comm: Option<Arc<dyn Communicator>>,
}
