//! # Example: dense output
//!
//! Samples the solution of a linear system on a regular grid with the
//! continuous extension of Dormand-Prince, independently of the steps taken.

use odesolve::{prelude::*, problems::SimpleNdim2};

fn main() -> Result<(), Error> {
    env_logger::init();

    let prob = SimpleNdim2;
    let opts = SolveOptions::builder()
        .method(MethodKind::Dopri5)
        .rtol(1e-8)
        .atol(1e-8)
        .dense_dx(0.05)
        .build();
    let sol = solve(&prob, 0.0, SimpleNdim2::XF, &prob.y0(), opts)?;

    println!("{} accepted steps, {} dense points", sol.stat.naccepted, sol.dense_x.len());
    println!("{:>6} {:>14} {:>14} {:>10}", "x", "y0", "y1", "error");
    for (x, y) in sol.iter_dense() {
        let exact = prob.solution(x);
        let err = Float::max((y[0] - exact[0]).abs(), (y[1] - exact[1]).abs());
        println!("{x:>6.2} {:>14.8} {:>14.8} {err:>10.2e}", y[0], y[1]);
    }
    Ok(())
}
