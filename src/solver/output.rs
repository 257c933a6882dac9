//! Recording and forwarding of accepted steps and dense output.

use crate::{Config, ControlFlag, DenseOutFn, Float, StepOutFn, methods::RkMethod};

/// Accepted-step records and dense (interpolated) records of the last solve.
///
/// Records are stored only when requested through [`Config::set_step_out`]
/// and [`Config::set_dense_out`]; the sinks registered there are called for
/// every record whether or not it is stored.
pub struct Output {
    ndim: usize,

    step_out: Option<StepOutFn>,
    step_save: bool,
    step_cap: usize,
    step_rerr: Vec<Float>,
    step_rs: Vec<Float>,
    step_h: Vec<Float>,
    step_x: Vec<Float>,
    step_y: Vec<Vec<Float>>,

    dense_out: Option<DenseOutFn>,
    dense_save: bool,
    dense_enabled: bool,
    dense_dx: Float,
    dense_cap: usize,
    dense_s: Vec<usize>,
    dense_x: Vec<Float>,
    dense_y: Vec<Vec<Float>>,
    xout: Float,
    yout: Vec<Float>,

    overflow_warned: bool,
}

impl Output {
    /// Takes the sinks out of `conf`.
    pub(crate) fn new(conf: &mut Config, ndim: usize) -> Self {
        Self {
            ndim,
            step_out: conf.step_out.take(),
            step_save: conf.step_save,
            step_cap: 0,
            step_rerr: Vec::new(),
            step_rs: Vec::new(),
            step_h: Vec::new(),
            step_x: Vec::new(),
            step_y: Vec::new(),
            dense_out: conf.dense_out.take(),
            dense_save: conf.dense_save,
            dense_enabled: conf.dense_enabled(),
            dense_dx: conf.dense_dx,
            dense_cap: 0,
            dense_s: Vec::new(),
            dense_x: Vec::new(),
            dense_y: Vec::new(),
            xout: 0.0,
            yout: vec![0.0; ndim],
            overflow_warned: false,
        }
    }

    /// Clears the records of a previous solve starting at `x0`.
    pub(crate) fn reset(&mut self, conf: &Config, x0: Float) {
        self.step_cap = if self.step_save {
            conf.nmax_ss.max(conf.fixed_nsteps()) + 1
        } else {
            0
        };
        self.dense_cap = if self.dense_save {
            let span = Float::max(conf.dense_xf - x0, 0.0);
            (span / self.dense_dx).ceil() as usize + 1
        } else {
            0
        };
        for v in [
            &mut self.step_rerr,
            &mut self.step_rs,
            &mut self.step_h,
            &mut self.step_x,
            &mut self.dense_x,
        ] {
            v.clear();
        }
        self.step_y.clear();
        self.dense_s.clear();
        self.dense_y.clear();
        self.step_rerr.reserve(self.step_cap);
        self.step_rs.reserve(self.step_cap);
        self.step_h.reserve(self.step_cap);
        self.step_x.reserve(self.step_cap);
        self.step_y.reserve(self.step_cap);
        self.dense_s.reserve(self.dense_cap);
        self.dense_x.reserve(self.dense_cap);
        self.dense_y.reserve(self.dense_cap);
        self.overflow_warned = false;
    }

    /// Processes the state after accepted step `istep` (`istep == 1` is the
    /// initial state). `rerr` and `rs` are the relative error and stiffness
    /// ratio of that step.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn execute(
        &mut self,
        method: &dyn RkMethod,
        istep: usize,
        last: bool,
        rerr: Float,
        rs: Float,
        h: Float,
        x: Float,
        y: &[Float],
    ) -> ControlFlag {
        if let Some(out) = self.step_out.as_mut() {
            if out(istep, h, x, y) == ControlFlag::Interrupt {
                return ControlFlag::Interrupt;
            }
        }
        if self.step_save {
            if self.step_x.len() < self.step_cap {
                self.step_rerr.push(rerr);
                self.step_rs.push(rs);
                self.step_h.push(h);
                self.step_x.push(x);
                self.step_y.push(y.to_vec());
            } else {
                self.warn_overflow("step");
            }
        }

        if !self.dense_enabled {
            return ControlFlag::Continue;
        }
        if istep == 1 {
            self.xout = x;
            let flag = self.emit(istep, h, x, y, None);
            self.xout = x + self.dense_dx;
            return flag;
        }

        let mut yout = std::mem::take(&mut self.yout);
        let mut flag = ControlFlag::Continue;
        if last {
            let tol = self.dense_dx * 1.0e-8;
            while self.xout < x - tol {
                method.dense_out(&mut yout, h, x, y, self.xout);
                flag = self.emit(istep, h, x, y, Some(&yout));
                if flag == ControlFlag::Interrupt {
                    break;
                }
                self.xout += self.dense_dx;
            }
            if flag == ControlFlag::Continue {
                self.xout = x;
                flag = self.emit(istep, h, x, y, None);
            }
        } else {
            while self.xout <= x {
                method.dense_out(&mut yout, h, x, y, self.xout);
                flag = self.emit(istep, h, x, y, Some(&yout));
                if flag == ControlFlag::Interrupt {
                    break;
                }
                self.xout += self.dense_dx;
            }
        }
        self.yout = yout;
        flag
    }

    /// Sends `(xout, yout)` to the dense sink and stores it. `yout == None`
    /// means the step end itself.
    fn emit(
        &mut self,
        istep: usize,
        h: Float,
        x: Float,
        y: &[Float],
        yout: Option<&[Float]>,
    ) -> ControlFlag {
        let xout = self.xout;
        let yout = yout.unwrap_or(y);
        if let Some(out) = self.dense_out.as_mut() {
            if out(istep, h, x, y, xout, yout) == ControlFlag::Interrupt {
                return ControlFlag::Interrupt;
            }
        }
        if self.dense_save {
            if self.dense_x.len() < self.dense_cap {
                self.dense_s.push(istep);
                self.dense_x.push(xout);
                self.dense_y.push(yout.to_vec());
            } else {
                self.warn_overflow("dense");
            }
        }
        ControlFlag::Continue
    }

    fn warn_overflow(&mut self, what: &str) {
        if !self.overflow_warned {
            log::warn!("{what} output capacity exhausted; further records are dropped");
            self.overflow_warned = true;
        }
    }

    /// Step sizes of the recorded steps.
    pub fn step_h(&self) -> &[Float] {
        &self.step_h
    }

    pub fn step_x(&self) -> &[Float] {
        &self.step_x
    }

    pub fn step_y(&self) -> &[Vec<Float>] {
        &self.step_y
    }

    /// Relative errors of the recorded steps. The initial state records `0`.
    pub fn step_rerr(&self) -> &[Float] {
        &self.step_rerr
    }

    /// Stiffness ratios of the recorded steps.
    pub fn step_rs(&self) -> &[Float] {
        &self.step_rs
    }

    /// Component `i` of every recorded step.
    pub fn step_yi(&self, i: usize) -> Vec<Float> {
        self.step_y.iter().map(|y| y[i]).collect()
    }

    /// Step index each dense record was produced in.
    pub fn dense_s(&self) -> &[usize] {
        &self.dense_s
    }

    pub fn dense_x(&self) -> &[Float] {
        &self.dense_x
    }

    pub fn dense_y(&self) -> &[Vec<Float>] {
        &self.dense_y
    }

    pub fn dense_yi(&self, i: usize) -> Vec<Float> {
        self.dense_y.iter().map(|y| y[i]).collect()
    }

    pub fn ndim(&self) -> usize {
        self.ndim
    }
}
