use float_eq::assert_float_eq;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256StarStar;
use olas::prelude::*;
use olas::*;

type La = FloatGeneric<f64>;

type AMatBuild = MatBuild<f64>;
type AQProblem = QProblem<La>;
type AQProblemB = QProblemB<La>;

//

#[test]
fn test_qp1()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let n = 2; // x0, x1
    let m = 1;

    // (1/2)(x - a)^2 + const
    let mat_h = AMatBuild::identity(n);
    let vec_g = [
        -(-1.), // -a0
        -(-2.), // -a1
    ];

    // x0/b0 + x1/b1 >= 1
    let mut mat_a = AMatBuild::new(m, n);
    mat_a[(0, 0)] = 1. / 2.; // 1/b0
    mat_a[(0, 1)] = 1. / 3.; // 1/b1

    let mut qp = AQProblem::new(n, m);
    qp.set_h(mat_h.as_ref()).unwrap();
    qp.set_g(&vec_g).unwrap();
    qp.set_a(mat_a.as_ref()).unwrap();
    qp.set_constraint_bounds(&[1.], &[f64::INFINITY]).unwrap();

    let nwsr = qp.init(10, LogIteration).unwrap();
    println!("{} {:?}", nwsr, qp.x());

    // a perpendicular from (-1, -2) to the line meets at (2, 0)
    assert_float_eq!(qp.x(), [2., 0.].as_ref(), abs_all <= 1e-9);
    assert_eq!(qp.constraints().status(0), SubjectToStatus::Lower);
    assert!(qp.y()[2] > 0.);
    assert_eq!(qp.n_ac(), 1);
    assert_eq!(qp.n_iac(), 0);
    assert_eq!(qp.n_z(), 1);
    qp.check_kkt().unwrap();
}

//

#[test]
fn test_qp2()
{
    let _ = env_logger::builder().is_test(true).try_init();

    // same box QP by both flavours
    let n = 4;
    let mat_h = AMatBuild::new(n, n).by_fn(|r, c| {
        if r == c {4.} else {1.}
    });
    let vec_g = [-3., 5., -7., 1.];
    let vec_lb = [-1., -1., -1., -1.];
    let vec_ub = [1., 1., 1., 1.];

    let mut qpb = AQProblemB::new(n);
    qpb.set_h(mat_h.as_ref()).unwrap();
    qpb.set_g(&vec_g).unwrap();
    qpb.set_bounds(&vec_lb, &vec_ub).unwrap();
    qpb.init(20, NoCallback).unwrap();

    let mut qp = AQProblem::new(n, 0);
    qp.set_h(mat_h.as_ref()).unwrap();
    qp.set_g(&vec_g).unwrap();
    qp.set_bounds(&vec_lb, &vec_ub).unwrap();
    qp.init(20, NoCallback).unwrap();

    assert_float_eq!(qp.x(), qpb.x(), abs_all <= 1e-9);
    assert_float_eq!(qp.y(), qpb.y(), abs_all <= 1e-9);
    assert_float_eq!(qp.obj_val(), qpb.obj_val(), abs <= 1e-9);
    assert_eq!(qp.n_fx(), qpb.n_fx());
    qp.check_kkt().unwrap();
}

//

#[test]
fn test_qp3()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let n = 6;
    let m = 4;
    let mut rng = Xoshiro256StarStar::seed_from_u64(0);

    for _ in 0.. 20 {
        // H = M^T M + I
        let mat_m = AMatBuild::new(n, n).by_fn(|_, _| rng.gen_range(-1.0..1.0));
        let mat_h = AMatBuild::new(n, n).by_fn(|r, c| {
            let mut s = if r == c {1.} else {0.};
            for k in 0.. n {
                s += mat_m[(k, r)] * mat_m[(k, c)];
            }
            s
        });
        let mat_a = AMatBuild::new(m, n).by_fn(|_, _| rng.gen_range(-1.0..1.0));
        let vec_g: Vec<f64> = (0.. n).map(|_| rng.gen_range(-5.0..5.0)).collect();

        // x = 0 is feasible
        let mut qp = AQProblem::new(n, m);
        qp.set_h(mat_h.as_ref()).unwrap();
        qp.set_g(&vec_g).unwrap();
        qp.set_a(mat_a.as_ref()).unwrap();
        qp.set_bounds(&[-1.; 6], &[1.; 6]).unwrap();
        qp.set_constraint_bounds(&[-0.5; 4], &[0.5; 4]).unwrap();

        let nwsr = qp.init(100, NoCallback).unwrap();
        log::info!("nwsr {}, kkt {:.3e}", nwsr, qp.kkt_violation());

        qp.check_kkt().unwrap();
        assert!(qp.n_ac() + qp.n_fx() <= n);
    }
}

//

#[test]
fn test_qp4()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let n = 3;
    let m = 2;
    let mat_h = AMatBuild::new(n, n).iter_rowmaj(&[
        2., 0., 1.,
        0., 2., 0.,
        1., 0., 2.,
    ]);
    let mat_a = AMatBuild::new(m, n).iter_rowmaj(&[
        1., 1., 1.,
        1., -1., 0.,
    ]);

    let mut qp = AQProblem::new(n, m);
    qp.set_h(mat_h.as_ref()).unwrap();
    qp.set_g(&[-1., -6., 2.]).unwrap();
    qp.set_a(mat_a.as_ref()).unwrap();
    qp.set_bounds(&[0., 0., 0.], &[10., 2., 10.]).unwrap();
    qp.set_constraint_bounds(&[1., -0.5], &[1., 10.]).unwrap();

    qp.init(20, NoCallback).unwrap();
    qp.check_kkt().unwrap();
    assert_eq!(qp.constraints().kind(0), SubjectToType::Equality);
    assert_float_eq!(qp.x(), [0.25, 0.75, 0.].as_ref(), abs_all <= 1e-9);
    assert_float_eq!(qp.y(), [0., 0., 4.75, -2.5, 2.].as_ref(), abs_all <= 1e-9);

    let x_opt = qp.x().to_vec();
    let y_opt = qp.y().to_vec();

    // cold start from the optimal primal-dual pair
    let mut qp2 = AQProblem::new(n, m);
    qp2.set_h(mat_h.as_ref()).unwrap();
    qp2.set_g(&[-1., -6., 2.]).unwrap();
    qp2.set_a(mat_a.as_ref()).unwrap();
    qp2.set_bounds(&[0., 0., 0.], &[10., 2., 10.]).unwrap();
    qp2.set_constraint_bounds(&[1., -0.5], &[1., 10.]).unwrap();

    let nwsr = qp2.init_with_guess(20, Some(&x_opt[..]), Some(&y_opt[..]), NoCallback).unwrap();
    assert!(nwsr <= 2);
    assert_float_eq!(qp2.x(), &x_opt[..], abs_all <= 1e-9);
    qp2.check_kkt().unwrap();
}

//

#[test]
fn test_qp5()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let mut qp = AQProblem::new(2, 1);
    qp.set_h(&[1., 0., 0., 1.]).unwrap();
    qp.set_g(&[-1., -1.]).unwrap();
    qp.set_a(&[1., 1.]).unwrap();
    qp.set_constraint_bounds(&[-1.], &[1.]).unwrap();

    assert_eq!(qp.hotstart(10, NoCallback), Err(QpError::HotstartFailedAsQpNotInitialised));
    assert_eq!(qp.set_lba(&[0., 0.]), Err(QpError::InvalidArguments));
    assert_eq!(qp.init_with_guess(10, Some(&[0.][..]), None, NoCallback), Err(QpError::InvalidArguments));

    qp.init(10, NoCallback).unwrap();
    assert!(qp.is_initialised());

    // a new constraint matrix invalidates the factorization
    qp.set_a(&[1., -1.]).unwrap();
    assert_eq!(qp.status(), QpStatus::NotInitialised);
    assert_eq!(qp.hotstart(10, NoCallback), Err(QpError::HotstartFailedAsQpNotInitialised));

    qp.init(10, NoCallback).unwrap();
    assert_float_eq!(qp.x(), [1., 1.].as_ref(), abs_all <= 1e-9);

    qp.reset();
    assert_eq!(qp.status(), QpStatus::NotInitialised);
    assert_eq!(qp.n_ac(), 0);
}

//

#[test]
fn test_qp6()
{
    let _ = env_logger::builder().is_test(true).try_init();

    // more rows than variables; the vertex (0, 0) holds two of them
    let n = 2;
    let m = 3;
    let mat_a = AMatBuild::new(m, n).iter_rowmaj(&[
        1., 0.,
        0., 1.,
        1., 1.,
    ]);

    let mut qp = AQProblem::new(n, m);
    qp.set_h(&[1., 0., 0., 1.]).unwrap();
    qp.set_g(&[-1., -1.]).unwrap();
    qp.set_a(mat_a.as_ref()).unwrap();
    qp.set_uba(&[0., 0., 5.]).unwrap();

    qp.init(10, NoCallback).unwrap();
    assert_float_eq!(qp.x(), [0., 0.].as_ref(), abs_all <= 1e-9);
    assert_eq!(qp.n_ac(), 2);
    assert_eq!(qp.n_z(), 0);

    // the third row joins while dependent on the other two
    qp.set_uba(&[0., 0., -1.]).unwrap();
    qp.hotstart(10, LogIteration).unwrap();

    assert_float_eq!(qp.x(), [-0.5, -0.5].as_ref(), abs_all <= 1e-9);
    assert_float_eq!(qp.y(), [0., 0., 0., 0., -1.5].as_ref(), abs_all <= 1e-9);
    assert_eq!(qp.constraints().status(2), SubjectToStatus::Upper);
    qp.check_kkt().unwrap();

    let mut qp_cold = AQProblem::new(n, m);
    qp_cold.set_h(&[1., 0., 0., 1.]).unwrap();
    qp_cold.set_g(&[-1., -1.]).unwrap();
    qp_cold.set_a(mat_a.as_ref()).unwrap();
    qp_cold.set_uba(&[0., 0., -1.]).unwrap();
    qp_cold.init(10, NoCallback).unwrap();
    assert_float_eq!(qp.x(), qp_cold.x(), abs_all <= 1e-9);
}

//

fn random_limits(rng: &mut Xoshiro256StarStar, m: usize) -> (Vec<f64>, Vec<f64>)
{
    let mut lba = vec![0.; m];
    let mut uba = vec![0.; m];

    // x = 0 stays strictly inside every inequality
    for i in 0.. m {
        let (l, u) = match i % 4 {
            0 => (f64::NEG_INFINITY, rng.gen_range(0.1..1.0)),
            1 => (rng.gen_range(-1.0..-0.1), f64::INFINITY),
            2 => (rng.gen_range(-1.0..-0.1), rng.gen_range(0.1..1.0)),
            _ => (0., 0.),
        };
        lba[i] = l;
        uba[i] = u;
    }
    (lba, uba)
}

#[test]
fn test_qp7()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let n = 4;
    let m = 8;
    let mut rng = Xoshiro256StarStar::seed_from_u64(7);

    let vec_lb = [-1., -1., f64::NEG_INFINITY, -1.];
    let vec_ub = [1., f64::INFINITY, f64::INFINITY, 1.];

    for _ in 0.. 20 {
        let mat_m = AMatBuild::new(n, n).by_fn(|_, _| rng.gen_range(-1.0..1.0));
        let mat_h = AMatBuild::new(n, n).by_fn(|r, c| {
            let mut s = if r == c {0.5} else {0.};
            for k in 0.. n {
                s += mat_m[(k, r)] * mat_m[(k, c)];
            }
            s
        });
        let mat_a = AMatBuild::new(m, n).by_fn(|_, _| rng.gen_range(-1.0..1.0));
        let vec_g: Vec<f64> = (0.. n).map(|_| rng.gen_range(-5.0..5.0)).collect();
        let (lba, uba) = random_limits(&mut rng, m);

        let mut qp = AQProblem::new(n, m);
        qp.set_h(mat_h.as_ref()).unwrap();
        qp.set_g(&vec_g).unwrap();
        qp.set_a(mat_a.as_ref()).unwrap();
        qp.set_bounds(&vec_lb, &vec_ub).unwrap();
        qp.set_constraint_bounds(&lba, &uba).unwrap();

        let nwsr = qp.init(100, NoCallback).unwrap();
        log::info!("init nwsr {}, n_ac {}, n_fx {}", nwsr, qp.n_ac(), qp.n_fx());
        qp.check_kkt().unwrap();
        assert!(qp.n_ac() + qp.n_fx() <= n);

        // new gradient and limits, same types
        let vec_g2: Vec<f64> = (0.. n).map(|_| rng.gen_range(-5.0..5.0)).collect();
        let (lba2, uba2) = random_limits(&mut rng, m);
        qp.set_g(&vec_g2).unwrap();
        qp.set_constraint_bounds(&lba2, &uba2).unwrap();

        let nwsr = qp.hotstart(100, NoCallback).unwrap();
        log::info!("hotstart nwsr {}, n_ac {}, n_fx {}", nwsr, qp.n_ac(), qp.n_fx());
        qp.check_kkt().unwrap();

        let mut qp_cold = AQProblem::new(n, m);
        qp_cold.set_h(mat_h.as_ref()).unwrap();
        qp_cold.set_g(&vec_g2).unwrap();
        qp_cold.set_a(mat_a.as_ref()).unwrap();
        qp_cold.set_bounds(&vec_lb, &vec_ub).unwrap();
        qp_cold.set_constraint_bounds(&lba2, &uba2).unwrap();
        qp_cold.init(100, NoCallback).unwrap();

        assert_float_eq!(qp.x(), qp_cold.x(), abs_all <= 1e-7);
    }
}
