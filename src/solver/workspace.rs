//! Mutable state of one call to `Solver::solve`.

use crate::Float;

/// Buffers and flags shared between the driver and the active method.
///
/// Allocated at the start of every solve and dropped when it returns.
pub(crate) struct Workspace {
    pub ndim: usize,

    /// Stage abscissae.
    pub u: Vec<Float>,
    /// Stage states.
    pub v: Vec<Vec<Float>>,
    /// Stage derivatives.
    pub f: Vec<Vec<Float>>,

    /// Current and previous step sizes.
    pub h: Float,
    pub h_prev: Float,
    /// `f(x, y)` at the start of the step.
    pub f0: Vec<Float>,
    /// Error weights `atol + rtol·|y|`.
    pub scal: Vec<Float>,

    /// Relative error of the trial step; accepted when below one.
    pub rerr: Float,
    pub rerr_prev: Float,

    pub first: bool,
    pub reject: bool,
    /// Newton iterations diverged; the step must be retried with `h·dvfac`.
    pub diverg: bool,
    pub dvfac: Float,

    // Newton state
    pub eta: Float,
    pub theta: Float,
    pub nit: usize,
    pub jac_is_ok: bool,
    pub reuse_jac_and_dec_once: bool,
    pub reuse_jac_once: bool,

    // stiffness detection
    pub rs: Float,
    pub stiff_yes: usize,
    pub stiff_not: usize,
}

impl Workspace {
    pub fn new(nstg: usize, ndim: usize) -> Self {
        Self {
            ndim,
            u: vec![0.0; nstg],
            v: vec![vec![0.0; ndim]; nstg],
            f: vec![vec![0.0; ndim]; nstg],
            h: 0.0,
            h_prev: 0.0,
            f0: vec![0.0; ndim],
            scal: vec![0.0; ndim],
            rerr: 0.0,
            rerr_prev: 0.0,
            first: true,
            reject: false,
            diverg: false,
            dvfac: 0.0,
            eta: 1.0,
            theta: 0.0,
            nit: 0,
            jac_is_ok: false,
            reuse_jac_and_dec_once: false,
            reuse_jac_once: false,
            rs: 0.0,
            stiff_yes: 0,
            stiff_not: 0,
        }
    }

    /// `scal := atol + rtol·|y|`.
    pub fn update_scal(&mut self, atol: Float, rtol: Float, y: &[Float]) {
        for (s, yi) in self.scal.iter_mut().zip(y) {
            *s = atol + rtol * yi.abs();
        }
    }

    /// Weighted root-mean-square of `v` against `scal`.
    pub fn rms_norm(&self, v: &[Float]) -> Float {
        let sum: Float = v
            .iter()
            .zip(&self.scal)
            .map(|(vi, si)| {
                let r = vi / si;
                r * r
            })
            .sum();
        (sum / self.ndim as Float).sqrt()
    }
}
