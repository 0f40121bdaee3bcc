use float_eq::assert_float_eq;
use olas::prelude::*;
use olas::*;

type La = FloatGeneric<f64>;

type AMatBuild = MatBuild<f64>;
type AQProblem = QProblem<La>;

//

fn mpc_problem(vec_g: &[f64]) -> AQProblem
{
    let n = 4;
    let m = 2;

    let mat_h = AMatBuild::new(n, n).iter_rowmaj(&[
        4., 1., 0., 0.,
        1., 4., 1., 0.,
        0., 1., 4., 1.,
        0., 0., 1., 4.,
    ]);
    let mat_a = AMatBuild::new(m, n).iter_rowmaj(&[
        1.,  1., 1.,  1.,
        1., -1., 1., -1.,
    ]);

    let mut qp = AQProblem::new(n, m);
    qp.set_h(mat_h.as_ref()).unwrap();
    qp.set_g(vec_g).unwrap();
    qp.set_a(mat_a.as_ref()).unwrap();
    qp.set_bounds(&[-1.; 4], &[1.; 4]).unwrap();
    qp.set_constraint_bounds(&[-2., -1.], &[2., 1.]).unwrap();
    qp
}

fn mpc_gradient(k: usize) -> [f64; 4]
{
    let t = k as f64;
    [
        6. * (0.4 * t).sin(),
        6. * (0.4 * t).cos(),
        -4. * (0.7 * t).sin(),
        4. * (0.3 * t).cos(),
    ]
}

//

#[test]
fn test_hotstart1()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut qp = mpc_problem(&mpc_gradient(0));
    qp.init(20, NoCallback).unwrap();

    let x = qp.x().to_vec();
    let y = qp.y().to_vec();

    // nothing changed
    let nwsr = qp.hotstart(20, PrintIteration).unwrap();
    assert_eq!(nwsr, 1);
    assert_float_eq!(qp.x(), &x[..], abs_all <= 1e-12);
    assert_float_eq!(qp.y(), &y[..], abs_all <= 1e-12);
}

//

#[test]
fn test_hotstart2()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut qp = mpc_problem(&mpc_gradient(0));
    qp.init(20, NoCallback).unwrap();

    let mut nwsr_hot = 0;
    let mut nwsr_cold = 0;

    for k in 1.. 30 {
        let vec_g = mpc_gradient(k);

        qp.set_g(&vec_g).unwrap();
        nwsr_hot += qp.hotstart(20, LogIteration).unwrap();
        qp.check_kkt().unwrap();

        let mut qp_cold = mpc_problem(&vec_g);
        nwsr_cold += qp_cold.init(20, NoCallback).unwrap();

        assert_float_eq!(qp.x(), qp_cold.x(), abs_all <= 1e-8);
        assert_float_eq!(qp.y(), qp_cold.y(), abs_all <= 1e-8);
    }

    log::info!("nwsr hot {} cold {}", nwsr_hot, nwsr_cold);
}

//

#[test]
fn test_hotstart3()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut qp = AQProblem::new(2, 1);
    qp.set_h(&[1., 0., 0., 1.]).unwrap();
    qp.set_a(&[1., 1.]).unwrap();
    qp.set_bounds(&[-1., -1.], &[1., 1.]).unwrap();
    qp.set_constraint_bounds(&[-1.], &[10.]).unwrap();
    qp.init(10, NoCallback).unwrap();
    assert_float_eq!(qp.x(), [0., 0.].as_ref(), abs_all <= 1e-12);

    // x0 + x1 >= 3 cannot hold in the box
    qp.set_lba(&[3.]).unwrap();
    let rslt = qp.hotstart(10, LogIteration).unwrap_err();
    println!("{}", rslt);

    assert_eq!(rslt, QpError::HotstartStoppedInfeasibility);
    assert!(qp.is_infeasible());
    assert_eq!(qp.status(), QpStatus::HomotopyQpSolved);

    // back to feasible data from the intermediate QP
    qp.set_lba(&[-1.]).unwrap();
    qp.hotstart(10, LogIteration).unwrap();

    assert!(!qp.is_infeasible());
    assert!(qp.is_solved());
    assert_float_eq!(qp.x(), [0., 0.].as_ref(), abs_all <= 1e-9);
    qp.check_kkt().unwrap();
}

//

#[test]
fn test_hotstart4()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut qp = mpc_problem(&mpc_gradient(0));
    qp.init(20, NoCallback).unwrap();

    let mut buf = Vec::new();
    qp.set_g(&mpc_gradient(5)).unwrap();
    let nwsr = qp.hotstart(20, IoWriteIteration::new(&mut buf)).unwrap();

    let out = String::from_utf8(buf).unwrap();
    print!("{}", out);
    assert_eq!(out.lines().count(), nwsr);
    assert!(out.lines().last().unwrap().contains("full step"));
}
