//! Counters and timings of a solve.

use std::{fmt, time::Duration};

use crate::Float;

/// Statistics collected by [`crate::Solver`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stat {
    /// Right-hand-side evaluations.
    pub nfeval: usize,
    /// Jacobian evaluations.
    pub njeval: usize,
    /// Total steps, accepted or not.
    pub nsteps: usize,
    pub naccepted: usize,
    pub nrejected: usize,
    /// Matrix decompositions.
    pub ndecomp: usize,
    /// Linear solves.
    pub nlinsol: usize,
    /// Largest number of Newton iterations in one step.
    pub nitmax: usize,
    /// Step size proposed after the last accepted step.
    pub hopt: Float,

    pub time_total: Duration,
    pub time_step: Duration,
    pub time_jacobian: Duration,
}

impl Stat {
    pub fn reset(&mut self) {
        *self = Stat::default();
    }

    /// Emits the summary at `info` level.
    pub fn log_summary(&self) {
        for line in self.to_string().lines() {
            log::info!("{line}");
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "number of F evaluations   = {:>8}", self.nfeval)?;
        writeln!(f, "number of J evaluations   = {:>8}", self.njeval)?;
        writeln!(f, "total number of steps     = {:>8}", self.nsteps)?;
        writeln!(f, "number of accepted steps  = {:>8}", self.naccepted)?;
        writeln!(f, "number of rejected steps  = {:>8}", self.nrejected)?;
        writeln!(f, "number of decompositions  = {:>8}", self.ndecomp)?;
        writeln!(f, "number of linear solutions= {:>8}", self.nlinsol)?;
        writeln!(f, "max number of iterations  = {:>8}", self.nitmax)?;
        writeln!(f, "optimal step size Hopt    = {:e}", self.hopt)?;
        writeln!(f, "elapsed time: total       = {:?}", self.time_total)?;
        writeln!(f, "elapsed time: steps       = {:?}", self.time_step)?;
        write!(f, "elapsed time: jacobian    = {:?}", self.time_jacobian)
    }
}
