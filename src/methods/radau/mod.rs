//! Radau IIA: 3-stage, order-5 implicit Runge-Kutta method.
//!
//! Solves stiff ODEs `M·y' = f(x, y)` with simplified Newton iterations on the
//! transformed stage system. Each iteration solves one real and one complex
//! `n × n` system; the factorizations and the Jacobian are reused across steps
//! while the iterations contract fast enough.
//!
//! Reference: E. Hairer, G. Wanner, Solving Ordinary Differential Equations II,
//! Stiff and Differential-Algebraic Problems, section IV.8.

mod coefficients;

use num_complex::Complex;

use crate::{
    Config, Error, ErrorEstimate, Float,
    matrix::{LinSol, Triplet, TripletC},
    solver::{Stat, system::System, workspace::Workspace},
};

use super::{MethodInfo, RkMethod};

use coefficients::{Coefficients, T, TI};

pub(crate) struct Radau5 {
    cf: Coefficients,
    ndim: usize,

    /// Stage increments `z = Y - y0`.
    z: [Vec<Float>; 3],
    /// Transformed increments `w = T⁻¹·z`.
    w: [Vec<Float>; 3],
    dw: [Vec<Float>; 3],
    /// `M·w`.
    mw: [Vec<Float>; 3],
    /// Collocation polynomial of the last accepted step.
    ycol: [Vec<Float>; 3],

    rhs_r: Vec<Float>,
    rhs_c: Vec<Complex<Float>>,
    dw_c: Vec<Complex<Float>>,

    ez: Vec<Float>,
    mez: Vec<Float>,
    lerr: Vec<Float>,
    rhs: Vec<Float>,

    jac: Triplet,
    kmat_r: Triplet,
    kmat_c: TripletC,
    lsol_r: Option<Box<dyn LinSol<Float>>>,
    lsol_c: Option<Box<dyn LinSol<Complex<Float>>>>,
}

impl Radau5 {
    pub fn new() -> Self {
        Self {
            cf: Coefficients::new(),
            ndim: 0,
            z: Default::default(),
            w: Default::default(),
            dw: Default::default(),
            mw: Default::default(),
            ycol: Default::default(),
            rhs_r: Vec::new(),
            rhs_c: Vec::new(),
            dw_c: Vec::new(),
            ez: Vec::new(),
            mez: Vec::new(),
            lerr: Vec::new(),
            rhs: Vec::new(),
            jac: Triplet::new(0, 0),
            kmat_r: Triplet::new(0, 0),
            kmat_c: TripletC::new(0, 0),
            lsol_r: None,
            lsol_c: None,
        }
    }

    /// Assembles and factorizes `γM - J` and `(α+βi)M - J`.
    fn decompose(
        &mut self,
        conf: &Config,
        sys: &System,
        stat: &mut Stat,
        h: Float,
    ) -> Result<(), Error> {
        let alpha = self.cf.alp / h;
        let beta = self.cf.bet / h;
        let gamma = self.cf.gam / h;
        self.kmat_r.combine(gamma, sys.mass(), -1.0, &self.jac);
        self.kmat_c
            .combine(Complex::new(alpha, beta), sys.mass(), Complex::new(-1.0, 0.0), &self.jac);

        let (Some(lsol_r), Some(lsol_c)) = (self.lsol_r.as_mut(), self.lsol_c.as_mut()) else {
            return Err(Error::NotFactorized);
        };
        stat.ndecomp += 1;
        let (kmat_r, kmat_c) = (&self.kmat_r, &self.kmat_c);
        pair(
            conf.parallel && !sys.distributed(),
            || lsol_r.fact(kmat_r),
            || lsol_c.fact(kmat_c),
        )
    }

    /// Solves `(γM - J)·lerr = rhs` and returns the RMS of `lerr`.
    fn filtered_error(&mut self, work: &Workspace) -> Result<Float, Error> {
        let lsol_r = self.lsol_r.as_ref().ok_or(Error::NotFactorized)?;
        lsol_r.solve(&mut self.lerr, &self.rhs)?;
        Ok(Float::max(work.rms_norm(&self.lerr), 1.0e-10))
    }

    fn error_estimate(
        &mut self,
        conf: &Config,
        sys: &System,
        work: &mut Workspace,
        stat: &mut Stat,
        x0: Float,
        y0: &[Float],
    ) -> Result<Float, Error> {
        let h = work.h;
        let cf = &self.cf;
        for m in 0..self.ndim {
            self.ez[m] = cf.e0 * self.z[0][m] + cf.e1 * self.z[1][m] + cf.e2 * self.z[2][m];
        }

        if conf.lerr_strat == ErrorEstimate::Explicit {
            for m in 0..self.ndim {
                self.lerr[m] = cf.gam0 * h * work.f0[m] + self.ez[m];
            }
            return Ok(Float::max(work.rms_norm(&self.lerr), 1.0e-10));
        }

        let gamma = cf.gam / h;
        sys.mass_times(&mut self.mez, &self.ez)?;
        for m in 0..self.ndim {
            self.rhs[m] = work.f0[m] + gamma * self.mez[m];
        }
        let mut rerr = self.filtered_error(work)?;

        if conf.lerr_strat == ErrorEstimate::Corrected && !(rerr < 1.0) && (work.first || work.reject) {
            for m in 0..self.ndim {
                work.v[0][m] = y0[m] + self.lerr[m];
            }
            stat.nfeval += 1;
            sys.eval(h, x0, &work.v[0], &mut work.f[0])?;
            for m in 0..self.ndim {
                self.rhs[m] = work.f[0][m] + gamma * self.mez[m];
            }
            rerr = self.filtered_error(work)?;
            log::debug!("radau5: corrected error estimate at x={x0}: rerr={rerr:e}");
        }
        Ok(rerr)
    }

    /// Step-size divisor `h/hnew` from the error and the Newton effort.
    fn divisor(&self, conf: &Config, work: &Workspace) -> Float {
        let nmax = conf.nmax_it as Float;
        let fac = Float::min(conf.mfac, conf.mfac * (1.0 + 2.0 * nmax) / (work.nit as Float + 2.0 * nmax));
        let div = work.rerr.powf(0.25) / fac;
        div.clamp(conf.mmin, conf.mmax)
    }
}

/// Runs the real and complex halves, concurrently when allowed.
fn pair<A, B>(parallel: bool, real: A, complex: B) -> Result<(), Error>
where
    A: FnOnce() -> Result<(), Error> + Send,
    B: FnOnce() -> Result<(), Error> + Send,
{
    let (r, c) = if parallel {
        rayon::join(real, complex)
    } else {
        (real(), complex())
    };
    match (r, c) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        (Err(real), Err(complex)) => Err(Error::LinearSolvers {
            real: Box::new(real),
            complex: Box::new(complex),
        }),
    }
}

impl RkMethod for Radau5 {
    fn info(&self) -> MethodInfo {
        MethodInfo {
            fixed_only: false,
            implicit: true,
            nstg: 3,
            dense: true,
            mass: true,
            needs_f0: true,
            stiff_ratio: false,
        }
    }

    fn init(&mut self, conf: &Config, sys: &System) -> Result<(), Error> {
        let n = sys.ndim();
        self.ndim = n;
        for k in 0..3 {
            self.z[k] = vec![0.0; n];
            self.w[k] = vec![0.0; n];
            self.dw[k] = vec![0.0; n];
            self.mw[k] = vec![0.0; n];
            self.ycol[k] = vec![0.0; n];
        }
        self.rhs_r = vec![0.0; n];
        self.rhs_c = vec![Complex::new(0.0, 0.0); n];
        self.dw_c = vec![Complex::new(0.0, 0.0); n];
        self.ez = vec![0.0; n];
        self.mez = vec![0.0; n];
        self.lerr = vec![0.0; n];
        self.rhs = vec![0.0; n];
        self.jac = Triplet::new(n, n);
        self.kmat_r = Triplet::new(n, n);
        self.kmat_c = TripletC::new(n, n);

        let mut lsol_r = conf.lin_sol().build::<Float>();
        let mut lsol_c = conf.lin_sol().build::<Complex<Float>>();
        lsol_r.init(n, sys.comm().cloned())?;
        lsol_c.init(n, sys.comm().cloned())?;
        self.lsol_r = Some(lsol_r);
        self.lsol_c = Some(lsol_c);
        Ok(())
    }

    fn step(
        &mut self,
        conf: &Config,
        sys: &System,
        work: &mut Workspace,
        stat: &mut Stat,
        x0: Float,
        y0: &[Float],
    ) -> Result<(), Error> {
        let n = self.ndim;
        let h = work.h;
        let alpha = self.cf.alp / h;
        let beta = self.cf.bet / h;
        let gamma = self.cf.gam / h;

        // Jacobian and decompositions
        if work.reuse_jac_and_dec_once {
            work.reuse_jac_and_dec_once = false;
        } else {
            if work.reuse_jac_once {
                work.reuse_jac_once = false;
            } else if !work.jac_is_ok {
                sys.jacobian(&mut self.jac, h, x0, y0, &work.f0, stat)?;
                work.jac_is_ok = true;
            }
            self.decompose(conf, sys, stat, h)?;
        }

        for i in 0..3 {
            work.u[i] = x0 + self.cf.c[i] * h;
        }

        // starting values
        if work.first || conf.zero_trial {
            for k in 0..3 {
                self.z[k].fill(0.0);
                self.w[k].fill(0.0);
            }
        } else {
            let c3q = h / work.h_prev;
            let cf = &self.cf;
            for k in 0..3 {
                let ckq = cf.c[k] * c3q;
                for m in 0..n {
                    self.z[k][m] = ckq
                        * (self.ycol[0][m]
                            + (ckq - cf.mu4) * (self.ycol[1][m] + (ckq - cf.mu3) * self.ycol[2][m]));
                }
            }
            for k in 0..3 {
                for m in 0..n {
                    self.w[k][m] =
                        TI[k][0] * self.z[0][m] + TI[k][1] * self.z[1][m] + TI[k][2] * self.z[2][m];
                }
            }
        }

        // simplified Newton iterations
        work.nit = 0;
        work.eta = Float::max(work.eta, conf.eps).powf(0.8);
        work.theta = conf.theta_max;
        work.diverg = false;
        let nmax = conf.nmax_it as Float;
        let mut ldw_old = 0.0;
        let mut thq_old = 0.0;
        let mut converged = false;
        for it in 0..conf.nmax_it {
            work.nit = it + 1;
            stat.nitmax = stat.nitmax.max(work.nit);

            for i in 0..3 {
                for m in 0..n {
                    work.v[i][m] = y0[m] + self.z[i][m];
                }
                stat.nfeval += 1;
                sys.eval(h, work.u[i], &work.v[i], &mut work.f[i])?;
            }

            for k in 0..3 {
                sys.mass_times(&mut self.mw[k], &self.w[k])?;
            }
            let f = &work.f;
            for m in 0..n {
                let tif = |k: usize| TI[k][0] * f[0][m] + TI[k][1] * f[1][m] + TI[k][2] * f[2][m];
                self.rhs_r[m] = tif(0) - gamma * self.mw[0][m];
                let re = tif(1) - alpha * self.mw[1][m] + beta * self.mw[2][m];
                let im = tif(2) - beta * self.mw[1][m] - alpha * self.mw[2][m];
                self.rhs_c[m] = Complex::new(re, im);
            }

            stat.nlinsol += 1;
            {
                let (Some(lsol_r), Some(lsol_c)) = (self.lsol_r.as_ref(), self.lsol_c.as_ref()) else {
                    return Err(Error::NotFactorized);
                };
                let (dw_r, rhs_r) = (&mut self.dw[0], &self.rhs_r);
                let (dw_c, rhs_c) = (&mut self.dw_c, &self.rhs_c);
                pair(
                    conf.parallel && !sys.distributed(),
                    || lsol_r.solve(dw_r, rhs_r),
                    || lsol_c.solve(dw_c, rhs_c),
                )?;
            }
            for m in 0..n {
                self.dw[1][m] = self.dw_c[m].re;
                self.dw[2][m] = self.dw_c[m].im;
            }

            let mut ldw = 0.0;
            for m in 0..n {
                for k in 0..3 {
                    self.w[k][m] += self.dw[k][m];
                    let r = self.dw[k][m] / work.scal[m];
                    ldw += r * r;
                }
                for k in 0..3 {
                    self.z[k][m] =
                        T[k][0] * self.w[0][m] + T[k][1] * self.w[1][m] + T[k][2] * self.w[2][m];
                }
            }
            let ldw = (ldw / (3 * n) as Float).sqrt();
            log::trace!("radau5: x={x0} it={it} ldw={ldw:e} theta={:e}", work.theta);

            if it > 0 {
                let thq = ldw / ldw_old;
                work.theta = if it == 1 { thq } else { (thq * thq_old).sqrt() };
                thq_old = thq;
                if work.theta < 0.99 {
                    work.eta = work.theta / (1.0 - work.theta);
                    let nit = work.nit as Float;
                    let iterr = ldw * work.theta.powf(nmax - nit) / (1.0 - work.theta);
                    let qnewt = iterr / conf.fnewt();
                    if qnewt >= 1.0 {
                        let qnewt = qnewt.clamp(1.0e-4, 20.0);
                        work.dvfac = 0.8 * qnewt.powf(-1.0 / (4.0 + nmax - 1.0 - nit));
                        work.diverg = true;
                        break;
                    }
                } else {
                    work.dvfac = 0.5;
                    work.diverg = true;
                    break;
                }
            }

            ldw_old = ldw;
            if work.eta * ldw < conf.fnewt() {
                converged = true;
                break;
            }
        }

        if work.diverg {
            log::debug!("radau5: Newton iterations diverged at x={x0} (h={h:e}, theta={:e})", work.theta);
            work.rerr = 2.0;
            return Ok(());
        }
        if !converged {
            return Err(Error::NewtonMaxIterations { nit: conf.nmax_it, x: x0 });
        }

        work.rerr = self.error_estimate(conf, sys, work, stat, x0, y0)?;
        Ok(())
    }

    fn accept(
        &mut self,
        conf: &Config,
        work: &mut Workspace,
        stat: &Stat,
        y0: &mut [Float],
        _x0: Float,
    ) -> Float {
        let cf = &self.cf;
        for m in 0..self.ndim {
            y0[m] += self.z[2][m];
            let (z0, z1, z2) = (self.z[0][m], self.z[1][m], self.z[2][m]);
            self.ycol[0][m] = (z1 - z2) / cf.mu4;
            self.ycol[1][m] = ((z0 - z1) / cf.mu5 - self.ycol[0][m]) / cf.mu3;
            self.ycol[2][m] = self.ycol[1][m] - ((z0 - z1) / cf.mu5 - z0 / cf.mu1) / cf.mu2;
        }

        let h = work.h;
        let mut div = self.divisor(conf, work);
        if conf.pred_ctrl && stat.naccepted > 1 {
            let r2 = work.rerr * work.rerr;
            let fgus = (work.h_prev / h) * (r2 / work.rerr_prev).powf(0.25) / conf.mfac;
            div = Float::max(div, fgus.clamp(conf.mmin, conf.mmax));
        }
        h / div
    }

    fn reject(&mut self, conf: &Config, work: &mut Workspace) -> Float {
        work.h / self.divisor(conf, work)
    }

    fn dense_out(&self, yout: &mut [Float], h: Float, x: Float, y: &[Float], xout: Float) {
        let cf = &self.cf;
        let s = (xout - x) / h;
        for m in 0..self.ndim {
            yout[m] = y[m]
                + s * (self.ycol[0][m]
                    + (s - cf.mu4) * (self.ycol[1][m] + (s - cf.mu3) * self.ycol[2][m]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MethodKind, ODE, problems::HwEq11};

    /// `y' = -1000·y` whose Jacobian has the wrong sign.
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

    /// Runs one step of size `h` from `y0` with the given flags and returns the
    /// number of function evaluations it took.
    fn one_step(first: bool, reject: bool) -> (usize, Float) {
        let prob = HwEq11::default();
        let mut conf = Config::with_method(MethodKind::Radau5);
        conf.zero_trial = true;
        let sys = System::new(&prob, 1, &conf).unwrap();
        let mut radau = Radau5::new();
        radau.init(&conf, &sys).unwrap();
        let mut work = Workspace::new(3, 1);
        let mut stat = Stat::default();

        // large step from a state far off the smooth solution
        let (x0, y0) = (0.0, [5.0]);
        work.h = 0.2;
        work.h_prev = 0.2;
        work.first = first;
        work.reject = reject;
        work.update_scal(conf.atol(), conf.rtol(), &y0);
        sys.eval(work.h, x0, &y0, &mut work.f0).unwrap();
        radau.step(&conf, &sys, &mut work, &mut stat, x0, &y0).unwrap();
        (stat.nfeval, work.rerr)
    }

    #[test]
    fn corrected_estimate_only_on_first_or_rejected_steps() {
        let (plain, rerr) = one_step(false, false);
        assert!(!(rerr < 1.0));
        let (first, _) = one_step(true, false);
        let (rejected, _) = one_step(false, true);
        assert_eq!(first, plain + 1);
        assert_eq!(rejected, plain + 1);
    }

    #[test]
    fn dense_output_reproduces_step_end() {
        let prob = HwEq11::default();
        let conf = Config::with_method(MethodKind::Radau5);
        let sys = System::new(&prob, 1, &conf).unwrap();
        let mut radau = Radau5::new();
        radau.init(&conf, &sys).unwrap();
        let mut work = Workspace::new(3, 1);
        let mut stat = Stat::default();

        let mut y = [0.0];
        work.h = 1.0e-3;
        work.update_scal(conf.atol(), conf.rtol(), &y);
        sys.eval(work.h, 0.0, &y, &mut work.f0).unwrap();
        radau.step(&conf, &sys, &mut work, &mut stat, 0.0, &y).unwrap();
        assert!(work.rerr < 1.0);
        stat.naccepted = 1;
        radau.accept(&conf, &mut work, &stat, &mut y, 0.0);

        let mut yout = [0.0];
        radau.dense_out(&mut yout, 1.0e-3, 1.0e-3, &y, 1.0e-3);
        assert_eq!(yout[0], y[0]);
        radau.dense_out(&mut yout, 1.0e-3, 1.0e-3, &y, 0.0);
        assert!(yout[0].abs() < 1.0e-12);
        assert_eq!(stat.njeval, 1);
        assert_eq!(stat.ndecomp, 1);
    }

    #[test]
    fn newton_divergence_is_recoverable() {
        let prob = WrongSignJacobian;
        let conf = Config::with_method(MethodKind::Radau5);
        let sys = System::new(&prob, 1, &conf).unwrap();
        let mut radau = Radau5::new();
        radau.init(&conf, &sys).unwrap();
        let mut work = Workspace::new(3, 1);
        let mut stat = Stat::default();

        let y0 = [1.0];
        work.h = 0.1;
        work.h_prev = 0.1;
        work.update_scal(conf.atol(), conf.rtol(), &y0);
        sys.eval(work.h, 0.0, &y0, &mut work.f0).unwrap();
        radau.step(&conf, &sys, &mut work, &mut stat, 0.0, &y0).unwrap();

        // the iteration error grows by about 2 per iteration
        assert!(work.diverg);
        assert!(work.theta > 0.99);
        assert_eq!(work.rerr, 2.0);
        assert_eq!(work.dvfac, 0.5);
        assert_eq!(work.nit, 2);
        assert_eq!(stat.nfeval, 6);
    }

    #[test]
    fn newton_iteration_limit_is_an_error() {
        let prob = HwEq11::default();
        let mut conf = Config::with_method(MethodKind::Radau5);
        conf.nmax_it = 1;
        let sys = System::new(&prob, 1, &conf).unwrap();
        let mut radau = Radau5::new();
        radau.init(&conf, &sys).unwrap();
        let mut work = Workspace::new(3, 1);
        let mut stat = Stat::default();

        let y0 = [0.0];
        work.h = 1.0e-4;
        work.h_prev = 1.0e-4;
        work.update_scal(conf.atol(), conf.rtol(), &y0);
        sys.eval(work.h, 0.0, &y0, &mut work.f0).unwrap();
        let err = radau.step(&conf, &sys, &mut work, &mut stat, 0.0, &y0).unwrap_err();
        assert!(matches!(err, Error::NewtonMaxIterations { nit: 1, .. }));
        assert!(!work.diverg);
    }
}
