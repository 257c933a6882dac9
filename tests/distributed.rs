use std::sync::Arc;

use approx::assert_relative_eq;
use odesolve::{
    Config, Float, MethodKind, ODE, Solver, Stat, Status,
    comm::{Communicator, SerialComm, ThreadComm},
    problems::{Arenstorf, MassDecay, Robertson, VanDerPol},
};

mod common;

fn solve_with(
    kind: MethodKind,
    comm: Option<Arc<dyn Communicator>>,
    f: &dyn ODE,
    y0: &[Float],
    xf: Float,
    num_jac: bool,
) -> (Vec<Float>, Stat) {
    common::init_logger();
    let mut conf = Config::with_method(kind);
    conf.num_jac = num_jac;
    if let Some(comm) = comm {
        conf.set_comm(comm);
    }
    let mut solver = Solver::new(conf, y0.len(), f).unwrap();
    let mut y = y0.to_vec();
    assert_eq!(solver.solve(&mut y, 0.0, xf).unwrap(), Status::Success);
    (y, solver.stat().clone())
}

#[track_caller]
fn assert_same(serial: &(Vec<Float>, Stat), ranks: &[(Vec<Float>, Stat)]) {
    for (y, stat) in ranks {
        assert_eq!(stat.nsteps, serial.1.nsteps);
        assert_eq!(stat.nfeval, serial.1.nfeval);
        assert_eq!(stat.njeval, serial.1.njeval);
        assert_eq!(stat.ndecomp, serial.1.ndecomp);
        for (a, b) in y.iter().zip(&serial.0) {
            assert_relative_eq!(*a, *b, max_relative = 1e-12);
        }
    }
}

#[test]
fn serial_comm_is_not_distributed() {
    let conf = Config::new("radau5", "dense", Some(Arc::new(SerialComm))).unwrap();
    assert!(!conf.distributed());
}

#[test]
fn radau5_two_ranks_match_serial() {
    let prob = VanDerPol::new(1.0e-3);
    let y0 = prob.y0();
    let serial = solve_with(MethodKind::Radau5, None, &prob, &y0, 0.5, false);
    let ranks = ThreadComm::run(2, |comm| {
        assert!(comm.size() == 2);
        solve_with(MethodKind::Radau5, Some(comm), &prob, &y0, 0.5, false)
    });
    assert_same(&serial, &ranks);
}

#[test]
fn radau5_numerical_jacobian_three_ranks() {
    let prob = Robertson;
    let y0 = prob.y0();
    let serial = solve_with(MethodKind::Radau5, None, &prob, &y0, Robertson::XF, true);
    let ranks = ThreadComm::run(3, |comm| {
        solve_with(MethodKind::Radau5, Some(comm), &prob, &y0, Robertson::XF, true)
    });
    assert_same(&serial, &ranks);
}

#[test]
fn mass_matrix_rows_are_partitioned() {
    let prob = MassDecay::new(vec![2.0, 0.5, 1.0, 4.0], vec![1.0, 1.0, 3.0, 0.5]);
    let y0 = prob.y0();
    let serial = solve_with(MethodKind::Radau5, None, &prob, &y0, MassDecay::XF, false);
    let ranks = ThreadComm::run(2, |comm| {
        solve_with(MethodKind::Radau5, Some(comm), &prob, &y0, MassDecay::XF, false)
    });
    assert_same(&serial, &ranks);
}

#[test]
fn explicit_method_over_more_ranks_than_rows() {
    let prob = Arenstorf::default();
    let y0 = prob.y0();
    let serial = solve_with(MethodKind::Dopri5, None, &prob, &y0, 2.0, false);
    let ranks = ThreadComm::run(5, |comm| {
        solve_with(MethodKind::Dopri5, Some(comm), &prob, &y0, 2.0, false)
    });
    assert_same(&serial, &ranks);
}
