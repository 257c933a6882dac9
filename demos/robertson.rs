//! # Example: Robertson chemical kinetics
//!
//! A classic stiff system. Explicit Dormand-Prince detects the stiffness
//! and stops; Radau IIA integrates it with a handful of Jacobians.

use odesolve::{prelude::*, problems::Robertson};

fn main() -> Result<(), Error> {
    env_logger::init();

    let prob = Robertson;
    let xf = 100.0;

    let mut conf = Config::with_method(MethodKind::Dopri5);
    conf.nmax_ss = 200_000;
    conf.stiff_nstp = 100;
    let mut explicit = Solver::new(conf, 3, &prob)?;
    let mut y = prob.y0();
    match explicit.solve(&mut y, 0.0, xf) {
        Ok(status) => println!("dopri5: {status:?} after {} steps", explicit.stat().nsteps),
        Err(e) => println!("dopri5: {e}"),
    }

    let opts = SolveOptions::builder()
        .method(MethodKind::Radau5)
        .ini_h(1.0e-6)
        .save_steps(false)
        .build();
    let sol = solve(&prob, 0.0, xf, &prob.y0(), opts)?;
    println!("radau5: {:?} at x = {}", sol.status, sol.x);
    println!("  y = {:?} (sum = {:.15})", sol.y, sol.y.iter().sum::<Float>());
    println!("{}", sol.stat);
    Ok(())
}
