//! One-call integration on top of [`Solver`](crate::Solver).

mod options;
mod solution;

pub use options::SolveOptions;
pub use solution::Solution;

use crate::{Config, Error, Float, ODE, Solver};

/// Integrates `f` from `(x0, y0)` to `xf`.
///
/// # Example
///
/// ```
/// use odesolve::{problems::SimpleNdim2, solve::{SolveOptions, solve}};
///
/// let prob = SimpleNdim2;
/// let opts = SolveOptions::builder().rtol(1e-8).atol(1e-8).build();
/// let sol = solve(&prob, 0.0, 1.0, &prob.y0(), opts).unwrap();
/// let exact = prob.solution(1.0);
/// assert!((sol.y[0] - exact[0]).abs() < 1e-6);
/// assert_eq!(sol.step_x.last(), Some(&1.0));
/// ```
pub fn solve(
    f: &dyn ODE,
    x0: Float,
    xf: Float,
    y0: &[Float],
    options: SolveOptions,
) -> Result<Solution, Error> {
    let mut conf = Config::with_method(options.method);
    conf.set_tols(options.atol, options.rtol)?;
    conf.num_jac = options.num_jac;
    if let Some(comm) = options.comm {
        conf.set_comm(comm);
    }
    if let Some(h) = options.ini_h {
        conf.ini_h = h;
    }
    if let Some(n) = options.nmax_ss {
        conf.nmax_ss = n;
    }
    if let Some(h) = options.fixed_h {
        conf.set_fixed_h(h, xf - x0)?;
    }
    conf.set_step_out(options.save_steps, None);
    if let Some(dx) = options.dense_dx {
        conf.set_dense_out(true, dx, xf, None)?;
    }

    let mut solver = Solver::new(conf, y0.len(), f)?;
    let mut y = y0.to_vec();
    let status = solver.solve(&mut y, x0, xf)?;
    let out = solver.out();
    Ok(Solution {
        x: solver.x(),
        y,
        step_x: out.step_x().to_vec(),
        step_y: out.step_y().to_vec(),
        dense_x: out.dense_x().to_vec(),
        dense_y: out.dense_y().to_vec(),
        stat: solver.stat().clone(),
        status,
    })
}
