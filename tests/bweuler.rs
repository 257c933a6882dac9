use approx::assert_abs_diff_eq;
use odesolve::{Config, Float, MethodKind, Status, problems::HwEq11};

mod common;
use common::{check_counts, run};

fn fixed_conf() -> Config {
    let mut conf = Config::with_method(MethodKind::BwEuler);
    conf.set_fixed_h(HwEq11::DX, HwEq11::XF).unwrap();
    conf
}

#[test]
fn hw_eq11_analytical_jacobian() {
    let prob = HwEq11::default();
    let res = run(fixed_conf(), &prob, &prob.y0(), HwEq11::XF);
    assert_eq!(res.status, Status::Success);
    check_counts(&res.stat, 80, 40, 40, 0, 0, 40, 40, 2);
    assert_abs_diff_eq!(res.y[0], prob.solution(HwEq11::XF), epsilon = 1e-2);
}

#[test]
fn hw_eq11_numerical_jacobian() {
    let prob = HwEq11::default();
    let mut conf = fixed_conf();
    conf.num_jac = true;
    let res = run(conf, &prob, &prob.y0(), HwEq11::XF);
    assert_eq!(res.status, Status::Success);
    check_counts(&res.stat, 120, 40, 40, 0, 0, 40, 40, 2);
}

#[test]
fn step_records_use_fixed_spacing() {
    let prob = HwEq11::default();
    let res = run(fixed_conf(), &prob, &prob.y0(), HwEq11::XF);
    assert_eq!(res.step_x.len(), 41);
    for (i, x) in res.step_x.iter().enumerate() {
        assert_abs_diff_eq!(*x, i as Float * HwEq11::DX, epsilon = 1e-14);
    }
    assert_eq!(*res.step_x.last().unwrap(), HwEq11::XF);
}
