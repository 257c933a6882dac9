#![allow(dead_code)]

use odesolve::{Config, Float, ODE, Solver, Stat, Status};

/// Installs a test logger once; `RUST_LOG=debug cargo test` shows the solver logs.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Result of one solve.
pub struct Run {
    pub y: Vec<Float>,
    pub stat: Stat,
    pub status: Status,
    pub step_x: Vec<Float>,
    pub step_h: Vec<Float>,
    /// Relative error of every recorded step (zero for the initial state).
    pub step_rerr: Vec<Float>,
    pub dense_x: Vec<Float>,
    pub dense_y: Vec<Vec<Float>>,
}

/// Integrates `f` from `(0, y0)` to `xf` with `conf`, recording every step.
pub fn run(mut conf: Config, f: &dyn ODE, y0: &[Float], xf: Float) -> Run {
    init_logger();
    conf.set_step_out(true, None);
    let mut solver = Solver::new(conf, y0.len(), f).unwrap();
    let mut y = y0.to_vec();
    let status = solver.solve(&mut y, 0.0, xf).unwrap();
    solver.stat().log_summary();
    let out = solver.out();
    Run {
        y,
        stat: solver.stat().clone(),
        status,
        step_x: out.step_x().to_vec(),
        step_h: out.step_h().to_vec(),
        step_rerr: out.step_rerr().to_vec(),
        dense_x: out.dense_x().to_vec(),
        dense_y: out.dense_y().to_vec(),
    }
}

/// Asserts the counters the regression tests pin down.
#[track_caller]
#[allow(clippy::too_many_arguments)]
pub fn check_counts(
    stat: &Stat,
    nfeval: usize,
    njeval: usize,
    nsteps: usize,
    naccepted: usize,
    nrejected: usize,
    ndecomp: usize,
    nlinsol: usize,
    nitmax: usize,
) {
    let got = [
        stat.nfeval,
        stat.njeval,
        stat.nsteps,
        stat.naccepted,
        stat.nrejected,
        stat.ndecomp,
        stat.nlinsol,
        stat.nitmax,
    ];
    let want = [nfeval, njeval, nsteps, naccepted, nrejected, ndecomp, nlinsol, nitmax];
    assert_eq!(got, want, "\n{stat}");
}
