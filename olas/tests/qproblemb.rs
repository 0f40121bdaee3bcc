use std::ops::ControlFlow;
use float_eq::assert_float_eq;
use olas::prelude::*;

type La = FloatGeneric<f64>;

type AQProblemB = QProblemB<La>;

//

#[test]
fn test_qpb1()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut qp = AQProblemB::new(2);
    qp.set_h(&[1., 0., 0., 1.]).unwrap();
    qp.set_g(&[-1., -1.]).unwrap();
    qp.set_bounds(&[0., 0.], &[10., 10.]).unwrap();

    let nwsr = qp.init(10, LogIteration).unwrap();
    println!("{}", nwsr);

    assert!(qp.is_solved());
    assert_float_eq!(qp.x(), [1., 1.].as_ref(), abs_all <= 1e-9);
    assert_float_eq!(qp.y(), [0., 0.].as_ref(), abs_all <= 1e-9);
    assert_eq!(qp.n_fx(), 0);
    assert_eq!(qp.bounds().status(0), SubjectToStatus::Inactive);
    assert_eq!(qp.bounds().status(1), SubjectToStatus::Inactive);
    qp.check_kkt().unwrap();
}

//

#[test]
fn test_qpb2()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut qp = AQProblemB::new(2);
    qp.set_h(&[1., 0., 0., 1.]).unwrap();
    qp.set_g(&[-1., -1.]).unwrap();
    qp.set_bounds(&[0., 0.], &[0.3, 10.]).unwrap();

    qp.init(10, LogIteration).unwrap();

    assert_float_eq!(qp.x(), [0.3, 1.].as_ref(), abs_all <= 1e-9);
    assert_eq!(qp.bounds().status(0), SubjectToStatus::Upper);
    assert_eq!(qp.bounds().status(1), SubjectToStatus::Inactive);
    assert!(qp.y()[0] < -1e-3);
    assert_float_eq!(qp.obj_val(), 0.3 * 0.3 / 2. - 0.3 + 0.5 - 1., abs <= 1e-9);
    qp.check_kkt().unwrap();
}

//

#[test]
fn test_qpb3()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut qp = AQProblemB::new(2);
    qp.set_h(&[1., 0., 0., 1.]).unwrap();
    qp.set_g(&[-1., -1.]).unwrap();

    let rslt = qp.set_bounds(&[1., 1.], &[0., 0.]).unwrap_err();
    println!("{}", rslt);

    assert_eq!(rslt, QpError::SetupBoundFailed);
    assert_eq!(qp.status(), QpStatus::NotInitialised);
    assert_eq!(qp.hotstart(10, NoCallback), Err(QpError::HotstartFailedAsQpNotInitialised));
}

//

#[test]
fn test_qpb4()
{
    let _ = env_logger::builder().is_test(true).try_init();

    // every variable ends at its upper bound, one per step
    let n = 5;
    let mut qp = AQProblemB::new(n);
    qp.set_h(&[
        2., 0., 0., 0., 0.,
        0., 2., 0., 0., 0.,
        0., 0., 2., 0., 0.,
        0., 0., 0., 2., 0.,
        0., 0., 0., 0., 2.,
    ]).unwrap();
    qp.set_g(&[-1., -2., -3., -4., -5.]).unwrap();
    qp.set_bounds(&[-1.; 5], &[0.1; 5]).unwrap();

    let mut solved_at = None;
    for k in 1..= 10 {
        match qp.init(k, NoCallback) {
            Ok(nwsr) => {
                assert!(nwsr <= k);
                assert_float_eq!(qp.x(), [0.1; 5].as_ref(), abs_all <= 1e-9);
                solved_at.get_or_insert(k);
            },
            Err(e) => {
                // budget exhaustion only, and never after a success
                assert_eq!(e, QpError::MaxNwsrReached);
                assert!(solved_at.is_none());
                assert_eq!(qp.status(), QpStatus::HomotopyQpSolved);
            },
        }
    }

    assert!(solved_at.unwrap() > 1);
}

//

#[test]
fn test_qpb5()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut qp = AQProblemB::new(2);
    qp.set_h(&[1., 0., 0., 1.]).unwrap();
    qp.set_g(&[-1., -1.]).unwrap();
    qp.set_bounds(&[0., 0.], &[0.3, 10.]).unwrap();

    let mut calls = 0;
    let rslt = qp.init(10, |it: &Iteration<f64>| {
        calls += 1;
        if it.iter == 0 {
            ControlFlow::Break(())
        }
        else {
            ControlFlow::Continue(())
        }
    });

    assert_eq!(rslt, Err(QpError::UserAbortRequested));
    assert_eq!(calls, 1);
    assert!(!qp.is_solved());

    // resumable from the intermediate QP
    qp.hotstart(10, NoCallback).unwrap();
    assert_float_eq!(qp.x(), [0.3, 1.].as_ref(), abs_all <= 1e-9);
}

//

#[test]
fn test_qpb6()
{
    let _ = env_logger::builder().is_test(true).try_init();

    // linear program over a box
    let mut qp = AQProblemB::new(1);
    qp.set_hessian_type(HessianType::Semidef).unwrap();
    qp.set_h(&[0.]).unwrap();
    qp.set_g(&[1.]).unwrap();
    qp.set_bounds(&[-1.], &[1.]).unwrap();

    qp.init(10, NoCallback).unwrap();

    assert_float_eq!(qp.x(), [-1.].as_ref(), abs_all <= 1e-9);
    assert_float_eq!(qp.y(), [1.].as_ref(), abs_all <= 1e-9);
    assert_eq!(qp.set_hessian_type(HessianType::Posdef), Err(QpError::QpAlreadyInitialised));
}
