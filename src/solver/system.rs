//! The caller's ODE as seen by the methods: row partitioning, reduction and
//! numerical differentiation.

use std::{ops::Range, sync::Arc, time::Instant};

use crate::{
    Config, Error, Float, ODE,
    comm::{Communicator, Partition},
    matrix::Triplet,
};

use super::Stat;

/// Right-hand side, Jacobian and mass matrix of one solve.
pub(crate) struct System<'a> {
    f: &'a dyn ODE,
    ndim: usize,
    comm: Option<Arc<dyn Communicator>>,
    rows: Range<usize>,
    /// Partition rows of `M`; the identity when the caller gives none.
    mass: Triplet,
    has_mass: bool,
    num_jac: bool,
    eps: Float,
}

impl<'a> System<'a> {
    pub fn new(f: &'a dyn ODE, ndim: usize, conf: &Config) -> Result<Self, Error> {
        let comm = conf.comm().filter(|c| c.size() > 1).cloned();
        let rows = match &comm {
            Some(c) => Partition::of(c.as_ref()).rows(ndim),
            None => 0..ndim,
        };
        let mut mass = Triplet::new(ndim, ndim);
        let has_mass = f.mass(&mut mass);
        if has_mass {
            mass.check()?;
        } else {
            mass = Triplet::identity(ndim);
        }
        mass.retain_rows(&rows);
        Ok(Self {
            f,
            ndim,
            comm,
            rows,
            mass,
            has_mass,
            num_jac: conf.num_jac,
            eps: conf.eps,
        })
    }

    pub fn ndim(&self) -> usize {
        self.ndim
    }

    pub fn comm(&self) -> Option<&Arc<dyn Communicator>> {
        self.comm.as_ref()
    }

    pub fn distributed(&self) -> bool {
        self.comm.is_some()
    }

    pub fn has_mass(&self) -> bool {
        self.has_mass
    }

    pub fn mass(&self) -> &Triplet {
        &self.mass
    }

    /// `dydx := f(x, y)`, assembled from the partition rows of every rank.
    pub fn eval(&self, h: Float, x: Float, y: &[Float], dydx: &mut [Float]) -> Result<(), Error> {
        self.f.ode(h, x, y, dydx);
        self.reduce(dydx)
    }

    /// Zeroes the rows this rank does not own and sums over all ranks.
    fn reduce(&self, v: &mut [Float]) -> Result<(), Error> {
        let Some(comm) = &self.comm else {
            return Ok(());
        };
        for (i, vi) in v.iter_mut().enumerate() {
            if !self.rows.contains(&i) {
                *vi = 0.0;
            }
        }
        comm.all_reduce_sum(v)
    }

    /// `out := M·v`, replicated on every rank.
    pub fn mass_times(&self, out: &mut [Float], v: &[Float]) -> Result<(), Error> {
        if !self.has_mass {
            out.copy_from_slice(v);
            return Ok(());
        }
        self.mass.mat_vec_mul(out, v);
        self.reduce(out)
    }

    /// Fills `jac` with the partition rows of ∂f/∂y at `(x, y)`.
    ///
    /// Uses `ODE::jac` unless numerical differentiation is requested or the
    /// caller does not provide it. `fxy` must hold `f(x, y)`; it is the base of
    /// the forward differences.
    pub fn jacobian(
        &self,
        jac: &mut Triplet,
        h: Float,
        x: Float,
        y: &[Float],
        fxy: &[Float],
        stat: &mut Stat,
    ) -> Result<(), Error> {
        let start = Instant::now();
        stat.njeval += 1;
        jac.start();
        let analytical = !self.num_jac && self.f.jac(h, x, y, jac);
        if analytical {
            jac.check()?;
            jac.retain_rows(&self.rows);
        } else {
            jac.start();
            self.numerical_jacobian(jac, h, x, y, fxy, stat)?;
        }
        stat.time_jacobian += start.elapsed();
        Ok(())
    }

    fn numerical_jacobian(
        &self,
        jac: &mut Triplet,
        h: Float,
        x: Float,
        y: &[Float],
        fxy: &[Float],
        stat: &mut Stat,
    ) -> Result<(), Error> {
        let mut yp = y.to_vec();
        let mut fp = vec![0.0; self.ndim];
        for j in 0..self.ndim {
            let yj = y[j];
            let delta = (self.eps * Float::max(1.0e-5, yj.abs())).sqrt();
            yp[j] = yj + delta;
            stat.nfeval += 1;
            self.eval(h, x, &yp, &mut fp)?;
            for i in self.rows.clone() {
                let dfdy = (fp[i] - fxy[i]) / delta;
                if dfdy != 0.0 {
                    jac.put(i, j, dfdy);
                }
            }
            yp[j] = yj;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{MethodKind, comm::ThreadComm, problems::VanDerPol};

    #[test]
    fn numerical_jacobian_matches_analytical() {
        let vdp = VanDerPol::new(0.1);
        let mut conf = Config::with_method(MethodKind::Radau5);
        let y = [2.0, -0.6];
        let mut fxy = [0.0; 2];
        let mut stat = Stat::default();

        let sys = System::new(&vdp, 2, &conf).unwrap();
        sys.eval(0.0, 0.0, &y, &mut fxy).unwrap();
        let mut analytical = Triplet::new(2, 2);
        sys.jacobian(&mut analytical, 0.0, 0.0, &y, &fxy, &mut stat).unwrap();
        assert_eq!(stat.nfeval, 0);

        conf.num_jac = true;
        let sys = System::new(&vdp, 2, &conf).unwrap();
        let mut numerical = Triplet::new(2, 2);
        sys.jacobian(&mut numerical, 0.0, 0.0, &y, &fxy, &mut stat).unwrap();
        assert_eq!(stat.nfeval, 2);
        assert_eq!(stat.njeval, 2);

        let a = analytical.to_dense().unwrap();
        let n = numerical.to_dense().unwrap();
        for k in 0..4 {
            assert_relative_eq!(a[k], n[k], epsilon = 1e-5, max_relative = 1e-5);
        }
    }

    #[test]
    fn partitioned_eval_is_replicated() {
        let vdp = VanDerPol::new(0.1);
        let y = [2.0, -0.6];
        let mut serial = [0.0; 2];
        vdp.ode(0.0, 0.0, &y, &mut serial);

        let results = ThreadComm::run(2, |comm| {
            let conf = Config::new("radau5", "", Some(comm)).unwrap();
            let sys = System::new(&vdp, 2, &conf).unwrap();
            let mut dydx = [0.0; 2];
            sys.eval(0.0, 0.0, &y, &mut dydx).unwrap();
            let mut mw = [0.0; 2];
            sys.mass_times(&mut mw, &[3.0, 4.0]).unwrap();
            (dydx, mw, sys.mass().len())
        });
        for (dydx, mw, nmass) in results {
            assert_eq!(dydx, serial);
            assert_eq!(mw, [3.0, 4.0]);
            assert_eq!(nmass, 1);
        }
    }
}
