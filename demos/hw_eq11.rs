//! # Example: Hairer-Wanner equation (1.1)
//!
//! `y' = -50·(y - cos x)`, `y(0) = 0`, integrated with every method that
//! supports it and compared with the closed-form solution at `x = 1.5`.
//!
//! Run with `RUST_LOG=info` to see the statistics of each solve.

use odesolve::{prelude::*, problems::HwEq11};

fn main() -> Result<(), Error> {
    env_logger::init();

    let prob = HwEq11::default();
    let exact = prob.solution(HwEq11::XF);
    println!("{:>12} {:>8} {:>8} {:>14}", "method", "steps", "fevals", "error");
    for kind in MethodKind::ALL {
        let mut conf = Config::with_method(kind);
        if kind.fixed_only() {
            conf.set_fixed_h(HwEq11::DX, HwEq11::XF)?;
        }
        let mut solver = Solver::new(conf, 1, &prob)?;
        let mut y = prob.y0();
        let status = solver.solve(&mut y, 0.0, HwEq11::XF)?;
        solver.stat().log_summary();
        let stat = solver.stat();
        println!(
            "{:>12} {:>8} {:>8} {:>14.6e} {}",
            kind.name(),
            stat.nsteps,
            stat.nfeval,
            (y[0] - exact).abs(),
            if status == Status::Success { "" } else { "(stopped early)" },
        );
    }
    Ok(())
}
