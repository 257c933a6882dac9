//! The stepping driver.

mod output;
mod stat;
pub(crate) mod system;
pub(crate) mod workspace;

use std::time::Instant;

use crate::{
    Config, ControlFlag, Error, Float, ODE, Status,
    methods::{MethodInfo, RkMethod, new_method},
};

pub use output::Output;
pub use stat::Stat;

use system::System;
use workspace::Workspace;

/// Integrates `M·y' = f(x, y)` with the method selected in the [`Config`].
///
/// The solver owns the configuration, the method, the statistics and the
/// output records, and may be reused for several calls to [`Solver::solve`].
///
/// # Example
///
/// ```
/// use odesolve::{Config, MethodKind, Solver, Status, problems::HwEq11};
///
/// let prob = HwEq11::default();
/// let conf = Config::with_method(MethodKind::Radau5);
/// let mut solver = Solver::new(conf, 1, &prob).unwrap();
/// let mut y = [0.0];
/// let status = solver.solve(&mut y, 0.0, 1.5).unwrap();
/// assert_eq!(status, Status::Success);
/// assert!((y[0] - prob.solution(1.5)).abs() < 1e-4);
/// ```
pub struct Solver<'a> {
    conf: Config,
    sys: System<'a>,
    method: Box<dyn RkMethod>,
    info: MethodInfo,
    stat: Stat,
    out: Output,
    /// Abscissa reached by the last solve.
    x: Float,
}

impl<'a> Solver<'a> {
    /// Creates a solver for an `ndim`-dimensional system.
    pub fn new(mut conf: Config, ndim: usize, f: &'a dyn ODE) -> Result<Self, Error> {
        let kind = conf.method();
        let method = new_method(kind)?;
        let info = method.info();
        if info.fixed_only && !conf.is_fixed() {
            return Err(Error::FixedStepOnly(kind));
        }
        let sys = System::new(f, ndim, &conf)?;
        if sys.has_mass() && !info.mass {
            return Err(Error::MassMatrixUnsupported(kind));
        }
        if conf.dense_enabled() && !info.dense {
            return Err(Error::DenseOutputUnsupported(kind));
        }
        let out = Output::new(&mut conf, ndim);
        Ok(Self {
            conf,
            sys,
            method,
            info,
            stat: Stat::default(),
            out,
            x: 0.0,
        })
    }

    /// Integrates from `(x, y)` to `xf`, overwriting `y` with the final state.
    pub fn solve(&mut self, y: &mut [Float], x: Float, xf: Float) -> Result<Status, Error> {
        if xf < x {
            return Err(Error::InvalidInterval { x, xf });
        }
        if y.len() != self.sys.ndim() {
            return Err(Error::DimensionMismatch { expected: self.sys.ndim(), got: y.len() });
        }
        let start = Instant::now();
        self.stat.reset();
        self.out.reset(&self.conf, x);
        self.x = x;
        self.method.init(&self.conf, &self.sys)?;
        let mut work = Workspace::new(self.info.nstg, self.sys.ndim());
        log::debug!(
            "{}: solving {} equations from x={x} to xf={xf} ({} steps, distributed: {})",
            self.conf.method(),
            self.sys.ndim(),
            if self.conf.is_fixed() { "fixed" } else { "variable" },
            self.sys.distributed(),
        );

        let status = if self.conf.is_fixed() {
            self.solve_fixed(&mut work, y, x, xf)
        } else {
            self.solve_variable(&mut work, y, x, xf)
        };
        self.stat.time_total = start.elapsed();
        status
    }

    fn solve_fixed(
        &mut self,
        work: &mut Workspace,
        y: &mut [Float],
        x0: Float,
        xf: Float,
    ) -> Result<Status, Error> {
        let h = self.conf.fixed_h();
        let n = self.conf.fixed_nsteps();
        if (x0 + n as Float * h - xf).abs() > 1.0e-14 * Float::max(1.0, xf.abs()) {
            return Err(Error::FixedStepMismatch { h, n, xf });
        }
        work.h = h;
        work.h_prev = h;
        work.theta = self.conf.theta_max;

        let method = self.method.as_ref();
        if self.out.execute(method, 1, false, 0.0, 0.0, h, x0, y) == ControlFlag::Interrupt {
            return Ok(Status::Interrupted);
        }

        let mut x = x0;
        for step in 0..n {
            work.update_scal(self.conf.atol(), self.conf.rtol(), y);
            if self.info.needs_f0 {
                self.stat.nfeval += 1;
                self.sys.eval(h, x, y, &mut work.f0)?;
                work.jac_is_ok = false;
                work.reuse_jac_once = false;
                work.reuse_jac_and_dec_once = false;
            }
            work.first = step == 0;

            let t = Instant::now();
            self.method.step(&self.conf, &self.sys, work, &mut self.stat, x, y)?;
            self.stat.time_step += t.elapsed();
            if work.diverg {
                return Err(Error::FixedStepDiverged { x });
            }
            self.stat.nsteps += 1;
            self.method.accept(&self.conf, work, &self.stat, y, x);

            let last = step + 1 == n;
            x = if last { xf } else { x0 + (step + 1) as Float * h };
            self.x = x;
            let method = self.method.as_ref();
            let flag = self.out.execute(method, step + 2, last, work.rerr, work.rs, h, x, y);
            if flag == ControlFlag::Interrupt {
                return Ok(Status::Interrupted);
            }
        }
        Ok(Status::Success)
    }

    fn solve_variable(
        &mut self,
        work: &mut Workspace,
        y: &mut [Float],
        mut x: Float,
        xf: Float,
    ) -> Result<Status, Error> {
        let conf = &self.conf;
        if !(conf.ini_h > 0.0) {
            return Err(Error::InvalidStepSize(conf.ini_h));
        }

        work.h = Float::min(xf - x, conf.ini_h);
        work.h_prev = work.h;
        work.theta = conf.theta_max;
        work.eta = 1.0;
        let rerr_floor =
            if self.info.implicit { conf.rerr_prev_min_pred } else { conf.rerr_prev_min };
        work.rerr_prev = rerr_floor;
        work.update_scal(conf.atol(), conf.rtol(), y);
        self.stat.nfeval += 1;
        self.sys.eval(work.h, x, y, &mut work.f0)?;
        self.stat.hopt = work.h;

        let method = self.method.as_ref();
        if self.out.execute(method, 1, false, 0.0, 0.0, work.h, x, y) == ControlFlag::Interrupt {
            return Ok(Status::Interrupted);
        }

        let mut last = false;
        while x < xf {
            if self.stat.nsteps == conf.nmax_ss {
                return Err(Error::SubstepsExceeded { nsteps: self.stat.nsteps, x });
            }
            self.stat.nsteps += 1;

            let t = Instant::now();
            self.method.step(conf, &self.sys, work, &mut self.stat, x, y)?;
            self.stat.time_step += t.elapsed();

            if work.diverg {
                work.diverg = false;
                work.reject = true;
                last = false;
                work.h *= work.dvfac;
                log::debug!("step at x={x} diverged; retrying with h={:e}", work.h);
                if work.h < conf.hmin {
                    return Err(Error::StepSizeTooSmall { h: work.h, hmin: conf.hmin, x });
                }
                continue;
            }

            if work.rerr < 1.0 {
                self.stat.naccepted += 1;
                work.first = false;
                work.jac_is_ok = false;

                if self.info.stiff_ratio
                    && conf.stiff_nstp > 0
                    && (self.stat.naccepted % conf.stiff_nstp == 0 || work.stiff_yes > 0)
                {
                    if work.rs > conf.stiff_rs_max {
                        work.stiff_not = 0;
                        work.stiff_yes += 1;
                        if work.stiff_yes == conf.stiff_nyes {
                            log::warn!(
                                "{}: problem seems to be stiff at x={x} (stiffness ratio {:.3})",
                                conf.method(),
                                work.rs
                            );
                            return Ok(Status::ProbablyStiff);
                        }
                    } else {
                        work.stiff_not += 1;
                        if work.stiff_not == conf.stiff_nnot {
                            work.stiff_yes = 0;
                        }
                    }
                }

                let dxnew = self.method.accept(conf, work, &self.stat, y, x);
                x += work.h;
                self.x = x;
                self.stat.hopt = dxnew;

                let istep = self.stat.naccepted + 1;
                let method = self.method.as_ref();
                let flag =
                    self.out.execute(method, istep, last, work.rerr, work.rs, work.h, x, y);
                if flag == ControlFlag::Interrupt {
                    return Ok(Status::Interrupted);
                }
                if last {
                    break;
                }

                work.h_prev = work.h;
                work.rerr_prev = Float::max(rerr_floor, work.rerr);

                if self.info.implicit {
                    work.update_scal(conf.atol(), conf.rtol(), y);
                    self.stat.nfeval += 1;
                    self.sys.eval(work.h, x, y, &mut work.f0)?;
                }

                let mut dxnew = Float::min(dxnew, xf - x);
                if work.reject {
                    dxnew = Float::min(work.h, dxnew);
                }
                work.reject = false;
                work.reuse_jac_and_dec_once = false;

                if x + dxnew - xf >= 0.0 {
                    last = true;
                    work.h = xf - x;
                } else {
                    let ratio = dxnew / work.h;
                    work.reuse_jac_and_dec_once = self.info.implicit
                        && work.theta <= conf.theta_max
                        && ratio >= conf.c1h
                        && ratio <= conf.c2h;
                    if !work.reuse_jac_and_dec_once {
                        work.h = dxnew;
                    }
                }
                if !work.reuse_jac_and_dec_once {
                    work.reuse_jac_once = work.theta <= conf.theta_max;
                }
            } else {
                if self.stat.naccepted > 0 {
                    self.stat.nrejected += 1;
                }
                work.reject = true;
                last = false;
                let dxnew = self.method.reject(conf, work);
                work.h = if work.first { conf.mfirst_rej * work.h } else { dxnew };
                if x + work.h > xf {
                    work.h = xf - x;
                }
                log::debug!("step rejected at x={x} (rerr={:e}); new h={:e}", work.rerr, work.h);
                if work.h < conf.hmin {
                    return Err(Error::StepSizeTooSmall { h: work.h, hmin: conf.hmin, x });
                }
            }
        }

        if (x - xf).abs() > 1.0e-15 * Float::max(1.0, xf.abs()) {
            return Err(Error::Postcondition { x, xf });
        }
        Ok(Status::Success)
    }

    /// Abscissa reached by the last call to [`Solver::solve`]: `xf` on
    /// success, the last accepted step otherwise.
    pub fn x(&self) -> Float {
        self.x
    }

    pub fn stat(&self) -> &Stat {
        &self.stat
    }

    pub fn out(&self) -> &Output {
        &self.out
    }

    pub fn conf(&self) -> &Config {
        &self.conf
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::{
        MethodKind,
        matrix::Triplet,
        problems::{HwEq11, MassDecay, SimpleNdim2},
    };

    /// `y' = -1000·y` whose Jacobian has the wrong sign, so that Radau's
    /// Newton iterations diverge for any step larger than about 1e-3.
    struct WrongSignJacobian;

    impl ODE for WrongSignJacobian {
        fn ode(&self, _h: Float, _x: Float, y: &[Float], dydx: &mut [Float]) {
            dydx[0] = -1000.0 * y[0];
        }

        fn jac(&self, _h: Float, _x: Float, _y: &[Float], dfdy: &mut Triplet) -> bool {
            dfdy.put(0, 0, 1000.0);
            true
        }
    }

    #[test]
    fn construction_checks_method_capabilities() {
        let prob = HwEq11::default();
        let err = Solver::new(Config::with_method(MethodKind::FwEuler), 1, &prob).err();
        assert!(matches!(err, Some(Error::FixedStepOnly(MethodKind::FwEuler))));

        let decay = MassDecay::new(vec![2.0], vec![1.0]);
        let err = Solver::new(Config::with_method(MethodKind::Dopri5), 1, &decay).err();
        assert!(matches!(err, Some(Error::MassMatrixUnsupported(MethodKind::Dopri5))));

        let mut conf = Config::with_method(MethodKind::Fehlberg4);
        conf.set_dense_out(true, 0.1, 1.5, None).unwrap();
        let err = Solver::new(conf, 1, &prob).err();
        assert!(matches!(err, Some(Error::DenseOutputUnsupported(MethodKind::Fehlberg4))));
    }

    #[test]
    fn rejects_bad_arguments() {
        let prob = HwEq11::default();
        let mut solver = Solver::new(Config::with_method(MethodKind::Dopri5), 1, &prob).unwrap();
        let mut y = [0.0];
        assert!(matches!(
            solver.solve(&mut y, 1.0, 0.5),
            Err(Error::InvalidInterval { .. })
        ));
        let mut y2 = [0.0, 0.0];
        assert!(matches!(
            solver.solve(&mut y2, 0.0, 1.0),
            Err(Error::DimensionMismatch { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn empty_interval_only_records_the_initial_state() {
        let prob = HwEq11::default();
        let mut conf = Config::with_method(MethodKind::Radau5);
        conf.set_step_out(true, None);
        let mut solver = Solver::new(conf, 1, &prob).unwrap();
        let mut y = [0.25];
        assert_eq!(solver.solve(&mut y, 0.5, 0.5).unwrap(), Status::Success);
        assert_eq!(y, [0.25]);
        assert_eq!(solver.stat().nsteps, 0);
        assert_eq!(solver.out().step_x(), &[0.5]);
    }

    #[test]
    fn substep_limit_is_an_error() {
        let prob = HwEq11::default();
        let mut conf = Config::with_method(MethodKind::Dopri5);
        conf.nmax_ss = 3;
        let mut solver = Solver::new(conf, 1, &prob).unwrap();
        let mut y = [0.0];
        let err = solver.solve(&mut y, 0.0, HwEq11::XF).unwrap_err();
        assert!(matches!(err, Error::SubstepsExceeded { nsteps: 3, .. }));
        assert_eq!(err.kind(), crate::ErrorKind::Convergence);
    }

    #[test]
    fn step_sink_can_interrupt() {
        let prob = SimpleNdim2;
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut conf = Config::with_method(MethodKind::Dopri5);
        conf.set_step_out(
            false,
            Some(Box::new(move |istep, _h, x, _y| {
                sink.borrow_mut().push((istep, x));
                if istep == 4 { ControlFlag::Interrupt } else { ControlFlag::Continue }
            })),
        );
        let mut solver = Solver::new(conf, 2, &prob).unwrap();
        let mut y = prob.y0();
        let status = solver.solve(&mut y, 0.0, SimpleNdim2::XF).unwrap();
        assert_eq!(status, Status::Interrupted);

        let seen = seen.borrow();
        assert_eq!(seen.iter().map(|s| s.0).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(seen[0].1, 0.0);
        assert!(seen.windows(2).all(|w| w[1].1 > w[0].1));
        assert_eq!(solver.stat().naccepted, 3);
        assert!(solver.out().step_x().is_empty());
        assert_eq!(solver.x(), seen[3].1);
    }

    #[test]
    fn detects_stiffness_with_explicit_method() {
        let prob = HwEq11 { lambda: -1.0e4 };
        let last_x = Rc::new(RefCell::new(0.0));
        let sink = Rc::clone(&last_x);
        let mut conf = Config::with_method(MethodKind::Dopri5);
        conf.stiff_nstp = 1;
        conf.stiff_rs_max = 2.0;
        conf.nmax_ss = 100_000;
        conf.set_step_out(
            false,
            Some(Box::new(move |_istep, _h, x, _y| {
                *sink.borrow_mut() = x;
                ControlFlag::Continue
            })),
        );
        let mut solver = Solver::new(conf, 1, &prob).unwrap();
        let mut y = [0.0];
        let status = solver.solve(&mut y, 0.0, HwEq11::XF).unwrap();
        assert_eq!(status, Status::ProbablyStiff);
        assert!(solver.stat().naccepted < 100_000);
        // the stiff step is not taken
        assert!(solver.x() > 0.0 && solver.x() < HwEq11::XF);
        assert_eq!(solver.x(), *last_x.borrow());
    }

    #[test]
    fn newton_divergence_halves_the_step_until_hmin() {
        let prob = WrongSignJacobian;
        let mut conf = Config::with_method(MethodKind::Radau5);
        conf.ini_h = 1.0;
        conf.hmin = 0.01;
        let mut solver = Solver::new(conf, 1, &prob).unwrap();
        let mut y = [1.0];
        let err = solver.solve(&mut y, 0.0, 2.0).unwrap_err();
        // h = 1, 1/2, ..., 1/64 all diverge; 1/128 is below hmin
        assert!(matches!(err, Error::StepSizeTooSmall { h, x, .. } if h == 1.0 / 128.0 && x == 0.0));
        let stat = solver.stat();
        assert_eq!(stat.nsteps, 7);
        assert_eq!(stat.naccepted, 0);
        assert_eq!(stat.nrejected, 0);
        assert_eq!(stat.njeval, 1);
        assert_eq!(stat.ndecomp, 7);
        assert_eq!(stat.nfeval, 1 + 7 * 6);
        assert_eq!(y, [1.0]);
    }

    #[test]
    fn rejection_below_hmin_is_an_error() {
        let prob = HwEq11::default();
        let mut conf = Config::with_method(MethodKind::Dopri5);
        conf.ini_h = 1.0;
        conf.hmin = 0.5;
        let mut solver = Solver::new(conf, 1, &prob).unwrap();
        let mut y = [0.0];
        let err = solver.solve(&mut y, 0.0, HwEq11::XF).unwrap_err();
        // the first rejection scales h by mfirst_rej
        assert!(matches!(err, Error::StepSizeTooSmall { x, .. } if x == 0.0));
        assert_eq!(err.kind(), crate::ErrorKind::Convergence);
        assert_eq!(solver.stat().nsteps, 1);
        assert_eq!(solver.stat().naccepted, 0);
    }

    #[test]
    fn fixed_step_divergence_is_an_error() {
        let prob = WrongSignJacobian;
        let mut conf = Config::with_method(MethodKind::Radau5);
        conf.set_fixed_h(0.1, 1.0).unwrap();
        let mut solver = Solver::new(conf, 1, &prob).unwrap();
        let mut y = [1.0];
        let err = solver.solve(&mut y, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, Error::FixedStepDiverged { x } if x == 0.0));
        assert_eq!(solver.stat().nsteps, 0);
    }

    #[test]
    fn fixed_steps_land_on_xf() {
        let prob = SimpleNdim2;
        let mut conf = Config::with_method(MethodKind::Rk4);
        conf.set_fixed_h(SimpleNdim2::DX, SimpleNdim2::XF).unwrap();
        conf.set_step_out(true, None);
        let mut solver = Solver::new(conf, 2, &prob).unwrap();
        let mut y = prob.y0();
        assert_eq!(solver.solve(&mut y, 0.0, SimpleNdim2::XF).unwrap(), Status::Success);

        let out = solver.out();
        assert_eq!(out.step_x().len(), 11);
        assert_eq!(out.step_x().last(), Some(&SimpleNdim2::XF));
        assert_eq!(solver.stat().nsteps, 10);
        assert_eq!(solver.stat().nfeval, 40);
        let exact = prob.solution(SimpleNdim2::XF);
        assert_abs_diff_eq!(y[0], exact[0], epsilon = 2e-4);
        assert_abs_diff_eq!(y[1], exact[1], epsilon = 2e-4);
    }

    #[test]
    fn fixed_step_count_must_match_interval() {
        let prob = SimpleNdim2;
        let mut conf = Config::with_method(MethodKind::Rk4);
        conf.set_fixed_h(SimpleNdim2::DX, SimpleNdim2::XF).unwrap();
        let mut solver = Solver::new(conf, 2, &prob).unwrap();
        let mut y = prob.y0();
        assert!(matches!(
            solver.solve(&mut y, 0.0, 2.0),
            Err(Error::FixedStepMismatch { n: 10, .. })
        ));
    }
}
