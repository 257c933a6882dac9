//! Forward Euler.

use crate::{
    Config, Error, Float,
    solver::{Stat, system::System, workspace::Workspace},
};

use super::{MethodInfo, RkMethod};

/// First-order explicit method. Fixed steps only.
pub(crate) struct FwEuler {
    /// Slope of the last accepted step.
    slope: Vec<Float>,
}

impl FwEuler {
    pub fn new() -> Self {
        Self { slope: Vec::new() }
    }
}

impl RkMethod for FwEuler {
    fn info(&self) -> MethodInfo {
        MethodInfo {
            fixed_only: true,
            implicit: false,
            nstg: 1,
            dense: true,
            mass: false,
            needs_f0: false,
            stiff_ratio: false,
        }
    }

    fn init(&mut self, _conf: &Config, sys: &System) -> Result<(), Error> {
        self.slope = vec![0.0; sys.ndim()];
        Ok(())
    }

    fn step(
        &mut self,
        _conf: &Config,
        sys: &System,
        work: &mut Workspace,
        stat: &mut Stat,
        x0: Float,
        y0: &[Float],
    ) -> Result<(), Error> {
        stat.nfeval += 1;
        sys.eval(work.h, x0, y0, &mut work.f[0])?;
        work.rerr = 0.0;
        Ok(())
    }

    fn accept(
        &mut self,
        _conf: &Config,
        work: &mut Workspace,
        _stat: &Stat,
        y0: &mut [Float],
        _x0: Float,
    ) -> Float {
        let h = work.h;
        for ((y, s), f) in y0.iter_mut().zip(self.slope.iter_mut()).zip(&work.f[0]) {
            *y += h * f;
            *s = *f;
        }
        h
    }

    fn reject(&mut self, _conf: &Config, work: &mut Workspace) -> Float {
        work.h
    }

    fn dense_out(&self, yout: &mut [Float], _h: Float, x: Float, y: &[Float], xout: Float) {
        for ((yo, yi), s) in yout.iter_mut().zip(y).zip(&self.slope) {
            *yo = yi + (xout - x) * s;
        }
    }
}
