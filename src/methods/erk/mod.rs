//! Explicit Runge-Kutta methods driven by a Butcher tableau.

mod tableau;

pub use tableau::Tableau;

use crate::{
    Config, Error, Float, MethodKind,
    solver::{Stat, system::System, workspace::Workspace},
};

use super::{MethodInfo, RkMethod};

pub(crate) fn tableau(kind: MethodKind) -> Option<&'static Tableau> {
    let t = match kind {
        MethodKind::MoEuler => &tableau::MOEULER,
        MethodKind::Rk2 => &tableau::RK2,
        MethodKind::Rk3 => &tableau::RK3,
        MethodKind::Heun3 => &tableau::HEUN3,
        MethodKind::Rk4 => &tableau::RK4,
        MethodKind::Rk4ThreeEighths => &tableau::RK4_THREE_EIGHTHS,
        MethodKind::Merson4 => &tableau::MERSON4,
        MethodKind::Zonneveld4 => &tableau::ZONNEVELD4,
        MethodKind::Fehlberg4 => &tableau::FEHLBERG4,
        MethodKind::Dopri5 => &tableau::DOPRI5,
        MethodKind::Verner6 => &tableau::VERNER6,
        MethodKind::Fehlberg7 => &tableau::FEHLBERG7,
        MethodKind::Dopri8 => &tableau::DOPRI8,
        MethodKind::FwEuler | MethodKind::BwEuler | MethodKind::Radau5 => return None,
    };
    Some(t)
}

/// Explicit embedded (or fixed-step) Runge-Kutta method.
pub(crate) struct ExplicitRk {
    kind: MethodKind,
    tab: &'static Tableau,
    ndim: usize,
    /// Solution at the end of the trial step.
    w: Vec<Float>,
    /// Lund stabilization factor.
    beta: Float,
    /// Exponent of `rerr` in the step-size formula.
    n: Float,
    dmin: Float,
    dmax: Float,
    /// Dense output coefficients of the last accepted step.
    cont: Vec<Float>,
    xold: Float,
    hold: Float,
}

impl ExplicitRk {
    pub fn new(kind: MethodKind, tab: &'static Tableau) -> Self {
        Self {
            kind,
            tab,
            ndim: 0,
            w: Vec::new(),
            beta: 0.0,
            n: 0.0,
            dmin: 0.0,
            dmax: 0.0,
            cont: Vec::new(),
            xold: 0.0,
            hold: 0.0,
        }
    }
}

impl RkMethod for ExplicitRk {
    fn info(&self) -> MethodInfo {
        let embedded = self.tab.e.is_some();
        MethodInfo {
            fixed_only: !embedded,
            implicit: false,
            nstg: self.tab.nstg(),
            dense: self.tab.d.is_some(),
            mass: false,
            needs_f0: false,
            stiff_ratio: embedded && self.tab.nstg() >= 2,
        }
    }

    fn init(&mut self, conf: &Config, sys: &System) -> Result<(), Error> {
        self.ndim = sys.ndim();
        self.w = vec![0.0; self.ndim];
        self.beta = if self.kind == MethodKind::Dopri5 { conf.stab_beta } else { 0.0 };
        self.n = 1.0 / (self.tab.q + 1) as Float - 0.75 * self.beta;
        self.dmin = 1.0 / conf.mmin;
        self.dmax = 1.0 / conf.mmax;
        if self.tab.d.is_some() {
            self.cont = vec![0.0; 5 * self.ndim];
        }
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
        let tab = self.tab;
        let h = work.h;
        let nstg = tab.nstg();

        for i in 0..nstg {
            work.u[i] = x0 + h * tab.c[i];
        }

        // k0 is kept from the previous step when the tableau allows it
        work.v[0].copy_from_slice(y0);
        if work.first || !tab.fsal {
            stat.nfeval += 1;
            sys.eval(h, work.u[0], y0, &mut work.f[0])?;
        }

        for i in 1..nstg {
            let (done, rest) = work.f.split_at_mut(i);
            let vi = &mut work.v[i];
            vi.copy_from_slice(y0);
            for (j, kj) in done.iter().enumerate() {
                let haij = h * tab.a[i][j];
                if haij != 0.0 {
                    vi.iter_mut().zip(kj).for_each(|(v, k)| *v += haij * k);
                }
            }
            stat.nfeval += 1;
            sys.eval(h, work.u[i], vi, &mut rest[0])?;
        }

        let Some(e) = tab.e else {
            for m in 0..self.ndim {
                self.w[m] = y0[m];
                for i in 0..nstg {
                    self.w[m] += tab.b[i] * work.f[i][m] * h;
                }
            }
            work.rerr = 0.0;
            return Ok(());
        };

        // update and error estimate
        let mut sum = 0.0;
        let mut sum_low = 0.0;
        for m in 0..self.ndim {
            self.w[m] = y0[m];
            let mut lerrm = 0.0;
            let mut lerr_low = 0.0;
            for i in 0..nstg {
                let kh = work.f[i][m] * h;
                self.w[m] += tab.b[i] * kh;
                lerrm += e[i] * kh;
                if let Some(el) = tab.e_low {
                    lerr_low += el[i] * kh;
                }
            }
            let sk = conf.atol() + conf.rtol() * Float::max(y0[m].abs(), self.w[m].abs());
            work.scal[m] = sk;
            let ratio = lerrm / sk;
            sum += ratio * ratio;
            let ratio = lerr_low / sk;
            sum_low += ratio * ratio;
        }
        let nd = self.ndim as Float;
        let rerr = if tab.e_low.is_some() {
            let deno = sum + 0.01 * sum_low;
            let deno = if deno > 0.0 { deno } else { 1.0 };
            sum / (nd * deno).sqrt()
        } else {
            (sum / nd).sqrt()
        };
        work.rerr = Float::max(rerr, 1.0e-10);

        // stiffness ratio from the last two stages
        if nstg >= 2 {
            let (s1, s2) = (nstg - 1, nstg - 2);
            let mut num = 0.0;
            let mut den = 0.0;
            for m in 0..self.ndim {
                let dk = work.f[s1][m] - work.f[s2][m];
                let dv = work.v[s1][m] - work.v[s2][m];
                num += dk * dk;
                den += dv * dv;
            }
            work.rs = if den > 0.0 { h * (num / den).sqrt() } else { 0.0 };
        }
        Ok(())
    }

    fn accept(
        &mut self,
        conf: &Config,
        work: &mut Workspace,
        _stat: &Stat,
        y0: &mut [Float],
        x0: Float,
    ) -> Float {
        let tab = self.tab;
        let h = work.h;
        let n = self.ndim;
        let last = tab.nstg() - 1;

        if let Some(d) = tab.d {
            for m in 0..n {
                let ydiff = self.w[m] - y0[m];
                let bspl = h * work.f[0][m] - ydiff;
                self.cont[m] = y0[m];
                self.cont[n + m] = ydiff;
                self.cont[2 * n + m] = bspl;
                self.cont[3 * n + m] = ydiff - h * work.f[last][m] - bspl;
                let dk: Float = d.iter().zip(&work.f).map(|(di, ki)| di * ki[m]).sum();
                self.cont[4 * n + m] = h * dk;
            }
            self.xold = x0;
            self.hold = h;
        }

        y0.copy_from_slice(&self.w);

        if tab.fsal {
            let (first, rest) = work.f.split_at_mut(1);
            first[0].copy_from_slice(&rest[last - 1]);
        }

        if tab.e.is_none() {
            return h;
        }
        let mut d = work.rerr.powf(self.n);
        if self.beta > 0.0 {
            d /= work.rerr_prev.powf(self.beta);
        }
        d = Float::max(self.dmax, Float::min(self.dmin, d / conf.mfac));
        h / d
    }

    fn reject(&mut self, conf: &Config, work: &mut Workspace) -> Float {
        let d = work.rerr.powf(self.n) / conf.mfac;
        work.h / Float::min(self.dmin, d)
    }

    fn dense_out(&self, yout: &mut [Float], _h: Float, _x: Float, _y: &[Float], xout: Float) {
        let n = self.ndim;
        let theta = (xout - self.xold) / self.hold;
        let theta1 = 1.0 - theta;
        for (m, ym) in yout.iter_mut().enumerate() {
            *ym = self.cont[m]
                + theta
                    * (self.cont[n + m]
                        + theta1
                            * (self.cont[2 * n + m]
                                + theta * (self.cont[3 * n + m] + theta1 * self.cont[4 * n + m])));
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::problems::HwEq11;

    fn setup(kind: MethodKind, sys: &System, conf: &Config) -> (ExplicitRk, Workspace) {
        let mut rk = ExplicitRk::new(kind, tableau(kind).unwrap());
        rk.init(conf, sys).unwrap();
        let work = Workspace::new(rk.info().nstg, sys.ndim());
        (rk, work)
    }

    #[test]
    fn scal_uses_both_ends_of_the_step() {
        let prob = HwEq11::default();
        let conf = Config::with_method(MethodKind::Dopri5);
        let sys = System::new(&prob, 1, &conf).unwrap();
        let (mut rk, mut work) = setup(MethodKind::Dopri5, &sys, &conf);
        let mut stat = Stat::default();

        let y0 = [0.5];
        work.h = 0.01;
        rk.step(&conf, &sys, &mut work, &mut stat, 0.0, &y0).unwrap();
        assert_eq!(stat.nfeval, 7);
        let expected = conf.atol() + conf.rtol() * Float::max(y0[0].abs(), rk.w[0].abs());
        assert_eq!(work.scal[0], expected);
        assert!(work.rerr >= 1.0e-10);
    }

    #[test]
    fn fsal_reuses_last_stage() {
        let prob = HwEq11::default();
        let conf = Config::with_method(MethodKind::Dopri5);
        let sys = System::new(&prob, 1, &conf).unwrap();
        let (mut rk, mut work) = setup(MethodKind::Dopri5, &sys, &conf);
        let mut stat = Stat::default();

        let mut y = [0.0];
        work.h = 1.0e-3;
        work.rerr_prev = 1.0e-4;
        rk.step(&conf, &sys, &mut work, &mut stat, 0.0, &y).unwrap();
        rk.accept(&conf, &mut work, &stat, &mut y, 0.0);
        work.first = false;

        let mut f = [0.0];
        sys.eval(0.0, 1.0e-3, &y, &mut f).unwrap();
        assert_abs_diff_eq!(work.f[0][0], f[0], epsilon = 1e-12);
        rk.step(&conf, &sys, &mut work, &mut stat, 1.0e-3, &y).unwrap();
        assert_eq!(stat.nfeval, 7 + 6);
    }

    #[test]
    fn dense_output_hits_both_ends() {
        let prob = HwEq11::default();
        let conf = Config::with_method(MethodKind::Dopri5);
        let sys = System::new(&prob, 1, &conf).unwrap();
        let (mut rk, mut work) = setup(MethodKind::Dopri5, &sys, &conf);
        let mut stat = Stat::default();

        let mut y = [0.2];
        work.h = 0.02;
        work.rerr_prev = 1.0e-4;
        rk.step(&conf, &sys, &mut work, &mut stat, 0.1, &y).unwrap();
        rk.accept(&conf, &mut work, &stat, &mut y, 0.1);

        let mut yout = [0.0];
        rk.dense_out(&mut yout, 0.02, 0.12, &y, 0.1);
        assert_abs_diff_eq!(yout[0], 0.2, epsilon = 1e-15);
        rk.dense_out(&mut yout, 0.02, 0.12, &y, 0.12);
        assert_abs_diff_eq!(yout[0], y[0], epsilon = 1e-15);
    }
}
