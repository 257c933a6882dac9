//! # Example: row-partitioned execution
//!
//! Runs the Van der Pol problem on an in-process group of ranks. Each rank
//! owns a block of rows of `f`, `J` and `M`; the pieces are joined by an
//! all-reduce-sum so every rank ends with the same state.

use odesolve::{comm::ThreadComm, prelude::*, problems::VanDerPol};

fn main() {
    env_logger::init();

    let prob = VanDerPol::new(1.0e-3);
    let results = ThreadComm::run(2, |comm| -> Result<(usize, Vec<Float>, Stat), Error> {
        let rank = comm.rank();
        let mut conf = Config::new("radau5", "dense", Some(comm))?;
        conf.set_tols(1.0e-6, 1.0e-6)?;
        let mut solver = Solver::new(conf, 2, &prob)?;
        let mut y = prob.y0();
        solver.solve(&mut y, 0.0, VanDerPol::XF)?;
        Ok((rank, y, solver.stat().clone()))
    });

    for res in results {
        match res {
            Ok((rank, y, stat)) => println!(
                "rank {rank}: y = [{:.12}, {:.12}] ({} steps, {} Jacobians)",
                y[0], y[1], stat.nsteps, stat.njeval
            ),
            Err(e) => eprintln!("rank failed: {e}"),
        }
    }
}
