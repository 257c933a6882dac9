//! Backward (implicit) Euler with Newton iterations.

use crate::{
    Config, Error, Float,
    matrix::{LinSol, Triplet},
    solver::{Stat, system::System, workspace::Workspace},
};

use super::{MethodInfo, RkMethod};

/// First-order implicit method. Fixed steps only.
pub(crate) struct BwEuler {
    ndim: usize,
    /// Newton iterate.
    w: Vec<Float>,
    /// Residual.
    r: Vec<Float>,
    dw: Vec<Float>,
    yold: Vec<Float>,
    jac: Triplet,
    kmat: Triplet,
    lsol: Option<Box<dyn LinSol<Float>>>,
    /// A factorization of `I - h·J` is available.
    factorized: bool,
}

impl BwEuler {
    pub fn new() -> Self {
        Self {
            ndim: 0,
            w: Vec::new(),
            r: Vec::new(),
            dw: Vec::new(),
            yold: Vec::new(),
            jac: Triplet::new(0, 0),
            kmat: Triplet::new(0, 0),
            lsol: None,
            factorized: false,
        }
    }

    fn residual_norm(&self, conf: &Config, work: &Workspace) -> Float {
        if conf.use_rms_norm {
            work.rms_norm(&self.r)
        } else {
            self.r.iter().map(|r| r * r).sum::<Float>().sqrt()
        }
    }
}

impl RkMethod for BwEuler {
    fn info(&self) -> MethodInfo {
        MethodInfo {
            fixed_only: true,
            implicit: true,
            nstg: 1,
            dense: true,
            mass: false,
            needs_f0: false,
            stiff_ratio: false,
        }
    }

    fn init(&mut self, conf: &Config, sys: &System) -> Result<(), Error> {
        let n = sys.ndim();
        self.ndim = n;
        self.w = vec![0.0; n];
        self.r = vec![0.0; n];
        self.dw = vec![0.0; n];
        self.yold = vec![0.0; n];
        self.jac = Triplet::new(n, n);
        self.kmat = Triplet::new(n, n);
        let mut lsol = conf.lin_sol().build::<Float>();
        lsol.init(n, sys.comm().cloned())?;
        self.lsol = Some(lsol);
        self.factorized = false;
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
        let h = work.h;
        let x = x0 + h;
        self.w.copy_from_slice(y0);

        for it in 0..conf.nmax_it {
            work.nit = it + 1;
            stat.nitmax = stat.nitmax.max(work.nit);

            stat.nfeval += 1;
            sys.eval(h, x, &self.w, &mut work.f[0])?;
            for i in 0..self.ndim {
                self.r[i] = self.w[i] - y0[i] - h * work.f[0][i];
            }
            let norm = self.residual_norm(conf, work);
            log::trace!("backward Euler: x={x} it={it} residual={norm:e} (tol={:e})", conf.fnewt());
            if norm < conf.fnewt() {
                work.rerr = 0.0;
                return Ok(());
            }

            if !self.factorized || !conf.cte_tg {
                sys.jacobian(&mut self.jac, h, x, &self.w, &work.f[0], stat)?;
                self.kmat.combine(1.0, sys.mass(), -h, &self.jac);
                let lsol = self.lsol.as_mut().ok_or(Error::NotFactorized)?;
                stat.ndecomp += 1;
                lsol.fact(&self.kmat)?;
                self.factorized = true;
            }

            let lsol = self.lsol.as_ref().ok_or(Error::NotFactorized)?;
            stat.nlinsol += 1;
            lsol.solve(&mut self.dw, &self.r)?;
            for (w, dw) in self.w.iter_mut().zip(&self.dw) {
                *w -= dw;
            }
        }
        Err(Error::NewtonMaxIterations { nit: conf.nmax_it, x: x0 })
    }

    fn accept(
        &mut self,
        _conf: &Config,
        work: &mut Workspace,
        _stat: &Stat,
        y0: &mut [Float],
        _x0: Float,
    ) -> Float {
        self.yold.copy_from_slice(y0);
        y0.copy_from_slice(&self.w);
        work.h
    }

    fn reject(&mut self, _conf: &Config, work: &mut Workspace) -> Float {
        work.h
    }

    fn dense_out(&self, yout: &mut [Float], h: Float, x: Float, y: &[Float], xout: Float) {
        let s = (xout - (x - h)) / h;
        for ((yo, yn), y0) in yout.iter_mut().zip(y).zip(&self.yold) {
            *yo = y0 + s * (yn - y0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MethodKind, problems::HwEq11};

    #[test]
    fn constant_tangent_factorizes_once() {
        let prob = HwEq11::default();
        let mut conf = Config::with_method(MethodKind::BwEuler);
        conf.cte_tg = true;
        let sys = System::new(&prob, 1, &conf).unwrap();
        let mut bw = BwEuler::new();
        bw.init(&conf, &sys).unwrap();
        let mut work = Workspace::new(1, 1);
        let mut stat = Stat::default();

        let mut y = [0.0];
        let mut x = 0.0;
        work.h = 0.0375;
        for _ in 0..3 {
            work.update_scal(conf.atol(), conf.rtol(), &y);
            bw.step(&conf, &sys, &mut work, &mut stat, x, &y).unwrap();
            bw.accept(&conf, &mut work, &stat, &mut y, x);
            x += work.h;
        }
        assert_eq!(stat.njeval, 1);
        assert_eq!(stat.ndecomp, 1);
        assert_eq!(stat.nlinsol, 3);
    }

    #[test]
    fn iteration_cap_is_an_error() {
        let prob = HwEq11::default();
        let mut conf = Config::with_method(MethodKind::BwEuler);
        conf.nmax_it = 1;
        let sys = System::new(&prob, 1, &conf).unwrap();
        let mut bw = BwEuler::new();
        bw.init(&conf, &sys).unwrap();
        let mut work = Workspace::new(1, 1);
        let mut stat = Stat::default();
        work.h = 0.0375;
        work.update_scal(conf.atol(), conf.rtol(), &[0.0]);
        let err = bw.step(&conf, &sys, &mut work, &mut stat, 0.0, &[0.0]).unwrap_err();
        assert!(matches!(err, Error::NewtonMaxIterations { nit: 1, .. }));
    }
}
