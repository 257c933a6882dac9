//! # Example: Van der Pol oscillator
//!
//! The stiff form `ε·y1' = (1 - y0²)·y1 - y0` with `ε = 1e-6`, solved with
//! Radau IIA. Dense output every 0.2 is printed as it is produced.

use odesolve::{prelude::*, problems::VanDerPol};

fn main() -> Result<(), Error> {
    env_logger::init();

    let prob = VanDerPol::new(1.0e-6);
    let mut y = prob.y0();
    y[1] = -0.66;

    let mut conf = Config::with_method(MethodKind::Radau5);
    conf.ini_h = 1.0e-6;
    conf.set_tols(1.0e-4, 1.0e-4)?;
    conf.set_dense_out(
        false,
        0.2,
        VanDerPol::XF,
        Some(Box::new(|istep, _h, _x, _y, xout, yout| {
            println!("{istep:>5} {xout:>7.3} {:>23.15e} {:>23.15e}", yout[0], yout[1]);
            ControlFlag::Continue
        })),
    )?;

    let mut solver = Solver::new(conf, 2, &prob)?;
    println!("{:>5} {:>7} {:>23} {:>23}", "s", "x", "y0", "y1");
    let status = solver.solve(&mut y, 0.0, VanDerPol::XF)?;
    println!("\nstatus: {status:?}\n{}", solver.stat());
    Ok(())
}
