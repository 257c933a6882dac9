//! Solver configuration

use std::sync::Arc;

use crate::{
    ControlFlag, Error, Float, MethodKind,
    comm::Communicator,
    matrix::LinSolKind,
    methods::ErrorEstimate,
};

/// Per-step output sink: `(istep, h, x, y)`.
pub type StepOutFn = Box<dyn FnMut(usize, Float, Float, &[Float]) -> ControlFlag>;

/// Dense output sink: `(istep, h, x, y, xout, yout)`.
pub type DenseOutFn = Box<dyn FnMut(usize, Float, Float, &[Float], Float, &[Float]) -> ControlFlag>;

/// Configuration of a [`crate::Solver`].
///
/// Public fields may be changed freely before the configuration is handed to
/// the solver. Tolerances, fixed stepping and output sinks go through setters
/// because they are validated or derived.
pub struct Config {
    /// Minimum step size allowed after a rejection or a divergence.
    pub hmin: Float,
    /// Initial step size for variable stepping.
    pub ini_h: Float,
    /// Maximum number of Newton iterations.
    pub nmax_it: usize,
    /// Maximum number of substeps per call to `solve`.
    pub nmax_ss: usize,
    /// Step multipliers satisfy `mmin <= hnew/h <= mmax`.
    pub mmin: Float,
    pub mmax: Float,
    /// Safety factor in step-size prediction.
    pub mfac: Float,
    /// Multiplier applied to `h` when the very first step is rejected.
    pub mfirst_rej: Float,
    /// Use the predictive (Gustafsson) step controller.
    pub pred_ctrl: bool,
    /// Smallest number satisfying `1 + eps > 1`.
    pub eps: Float,
    /// Jacobian is reused while the Newton contraction stays below this.
    pub theta_max: Float,
    /// Keep `h` and the factorizations when `c1h <= hnew/h <= c2h`.
    pub c1h: Float,
    pub c2h: Float,
    /// Local error estimator of Radau IIA.
    pub lerr_strat: ErrorEstimate,
    /// Solve the real and complex Radau systems concurrently.
    pub parallel: bool,
    /// Backward Euler: compute the Jacobian once and keep it.
    pub cte_tg: bool,
    /// Backward Euler: RMS residual norm instead of the Euclidean one.
    pub use_rms_norm: bool,
    /// Always start the Newton iterations from zero increments.
    pub zero_trial: bool,
    /// Differentiate the right-hand side numerically even if `ODE::jac` is provided.
    pub num_jac: bool,
    /// Lund stabilization factor (dopri5 only).
    pub stab_beta: Float,
    /// Number of accepted steps between stiffness tests. `0` disables them.
    pub stiff_nstp: usize,
    /// Stiffness ratio above which a step counts as stiff.
    pub stiff_rs_max: Float,
    /// Consecutive stiff tests before giving up.
    pub stiff_nyes: usize,
    /// Consecutive non-stiff tests that clear the stiff count.
    pub stiff_nnot: usize,
    /// Floor for the previous relative error of the Lund-stabilized explicit controller.
    pub rerr_prev_min: Float,
    /// Floor for the previous relative error of the predictive (Gustafsson) controller.
    pub rerr_prev_min_pred: Float,

    method: MethodKind,
    lin_sol: LinSolKind,
    comm: Option<Arc<dyn Communicator>>,

    atol: Float,
    rtol: Float,
    fnewt: Float,

    fixed: bool,
    fixed_h: Float,
    fixed_nsteps: usize,

    pub(crate) step_save: bool,
    pub(crate) step_out: Option<StepOutFn>,
    pub(crate) dense_save: bool,
    pub(crate) dense_dx: Float,
    pub(crate) dense_xf: Float,
    pub(crate) dense_out: Option<DenseOutFn>,
}

impl Config {
    /// Configuration for the method called `method`.
    ///
    /// An empty `lin_sol` selects the dense solver. Passing a communicator
    /// turns on row-partitioned execution.
    pub fn new(
        method: &str,
        lin_sol: &str,
        comm: Option<Arc<dyn Communicator>>,
    ) -> Result<Self, Error> {
        let method = method.parse::<MethodKind>()?;
        let lin_sol = lin_sol.parse::<LinSolKind>()?;
        let mut conf = Self::with_method(method);
        conf.lin_sol = lin_sol;
        conf.comm = comm;
        Ok(conf)
    }

    /// Serial configuration with the dense linear solver.
    pub fn with_method(method: MethodKind) -> Self {
        let mut conf = Self {
            hmin: 1.0e-10,
            ini_h: 1.0e-4,
            nmax_it: 7,
            nmax_ss: 1000,
            mmin: 0.125,
            mmax: 5.0,
            mfac: 0.9,
            mfirst_rej: 0.1,
            pred_ctrl: true,
            eps: 1.0e-16,
            theta_max: 1.0e-3,
            c1h: 1.0,
            c2h: 1.2,
            lerr_strat: ErrorEstimate::Corrected,
            parallel: true,
            cte_tg: false,
            use_rms_norm: true,
            zero_trial: false,
            num_jac: false,
            stab_beta: 0.04,
            stiff_nstp: 1000,
            stiff_rs_max: 3.25,
            stiff_nyes: 15,
            stiff_nnot: 6,
            rerr_prev_min: 1.0e-4,
            rerr_prev_min_pred: 1.0e-2,
            method,
            lin_sol: LinSolKind::Dense,
            comm: None,
            atol: 0.0,
            rtol: 0.0,
            fnewt: 0.0,
            fixed: false,
            fixed_h: 0.0,
            fixed_nsteps: 0,
            step_save: false,
            step_out: None,
            dense_save: false,
            dense_dx: 0.0,
            dense_xf: 0.0,
            dense_out: None,
        };
        conf.apply_tols(1.0e-4, 1.0e-4);
        conf
    }

    /// Sets absolute and relative tolerances.
    ///
    /// The stored values are corrected for the method order and the Newton
    /// tolerance is derived from them.
    pub fn set_tols(&mut self, atol: Float, rtol: Float) -> Result<(), Error> {
        let tiny = 10.0 * self.eps;
        if !(atol > tiny) || !(rtol > tiny) {
            return Err(Error::ToleranceTooSmall { atol, rtol });
        }
        self.apply_tols(atol, rtol);
        Ok(())
    }

    fn apply_tols(&mut self, atol: Float, rtol: Float) {
        let quot = atol / rtol;
        self.rtol = 0.1 * rtol.powf(2.0 / 3.0);
        self.atol = self.rtol * quot;
        self.fnewt = Float::max(10.0 * self.eps / self.rtol, Float::min(0.03, self.rtol.sqrt()));
    }

    /// Switches to fixed steps: `n = ceil(xf/dx_approx)` steps of size `xf/n`.
    pub fn set_fixed_h(&mut self, dx_approx: Float, xf: Float) -> Result<(), Error> {
        if !(dx_approx > 0.0) || !(xf > 0.0) {
            return Err(Error::InvalidStepSize(dx_approx));
        }
        let n = (xf / dx_approx).ceil() as usize;
        let h = xf / n as Float;
        if ((n as Float) * h - xf).abs() > 1.0e-14 {
            return Err(Error::FixedStepMismatch { h, n, xf });
        }
        self.fixed = true;
        self.fixed_h = h;
        self.fixed_nsteps = n;
        Ok(())
    }

    /// Runs row-partitioned over `comm`. A single-rank communicator behaves
    /// like serial execution.
    pub fn set_comm(&mut self, comm: Arc<dyn Communicator>) {
        self.comm = Some(comm);
    }

    /// Records accepted steps (`save`) and/or forwards them to `out`.
    pub fn set_step_out(&mut self, save: bool, out: Option<StepOutFn>) {
        self.step_save = save;
        self.step_out = out;
    }

    /// Records (`save`) and/or forwards to `out` the solution at `0, dx, 2dx, ...`
    /// up to `xf`.
    pub fn set_dense_out(
        &mut self,
        save: bool,
        dx: Float,
        xf: Float,
        out: Option<DenseOutFn>,
    ) -> Result<(), Error> {
        if !(dx > 0.0) {
            return Err(Error::InvalidDenseStep(dx));
        }
        self.dense_save = save;
        self.dense_dx = dx;
        self.dense_xf = xf;
        self.dense_out = out;
        Ok(())
    }

    pub fn method(&self) -> MethodKind {
        self.method
    }

    pub fn lin_sol(&self) -> LinSolKind {
        self.lin_sol
    }

    pub fn comm(&self) -> Option<&Arc<dyn Communicator>> {
        self.comm.as_ref()
    }

    /// Row partitioning is active.
    pub fn distributed(&self) -> bool {
        self.comm.as_ref().is_some_and(|c| c.size() > 1)
    }

    pub fn atol(&self) -> Float {
        self.atol
    }

    pub fn rtol(&self) -> Float {
        self.rtol
    }

    /// Newton convergence tolerance.
    pub fn fnewt(&self) -> Float {
        self.fnewt
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn fixed_h(&self) -> Float {
        self.fixed_h
    }

    pub fn fixed_nsteps(&self) -> usize {
        self.fixed_nsteps
    }

    pub(crate) fn dense_enabled(&self) -> bool {
        self.dense_save || self.dense_out.is_some()
    }
}
