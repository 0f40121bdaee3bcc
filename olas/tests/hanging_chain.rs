use float_eq::assert_float_eq;
use olas::prelude::*;
use olas::*;

type La = FloatGeneric<f64>;

type AMatBuild = MatBuild<f64>;
type AQProblem = QProblem<La>;

//

/// Chain of `nodes` unit masses linked by unit springs,
/// both ends hung at height `1`, each link midpoint kept above the ground at height `ground`.
fn chain(nodes: usize, gravity: f64, ground: f64) -> AQProblem
{
    let n = nodes;
    let m = nodes - 1;

    // spring energy sum_j (z_{j+1} - z_j)^2 / 2
    let mut mat_h = AMatBuild::new(n, n);
    for j in 0.. m {
        mat_h[(j, j)] += 1.;
        mat_h[(j + 1, j + 1)] += 1.;
        mat_h[(j, j + 1)] -= 1.;
        mat_h[(j + 1, j)] -= 1.;
    }
    log::debug!("H: {}", mat_h);

    let vec_g = vec![gravity; n];

    let mut vec_lb = vec![-10.; n];
    let mut vec_ub = vec![10.; n];
    vec_lb[0] = 1.;
    vec_ub[0] = 1.;
    vec_lb[n - 1] = 1.;
    vec_ub[n - 1] = 1.;

    // (z_j + z_{j+1}) / 2 >= ground
    let mat_a = AMatBuild::new(m, n).by_fn(|r, c| {
        if c == r || c == r + 1 {0.5} else {0.}
    });

    let mut qp = AQProblem::new(n, m);
    qp.set_h(mat_h.as_ref()).unwrap();
    qp.set_g(&vec_g).unwrap();
    qp.set_a(mat_a.as_ref()).unwrap();
    qp.set_bounds(&vec_lb, &vec_ub).unwrap();
    qp.set_constraint_bounds(&vec![ground; m], &vec![f64::INFINITY; m]).unwrap();
    qp
}

//

#[test]
fn test_chain1()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let n = 10;
    let m = 9;
    let mut qp = chain(n, 0.1, 0.5);

    // hanging freely the chain would sag down to 0
    let nwsr = qp.init(n + m, LogIteration).unwrap();
    println!("nwsr {}", nwsr);

    assert!(qp.is_solved());
    assert!(nwsr <= n + m);
    qp.check_kkt().unwrap();

    assert_eq!(qp.bounds().kind(0), SubjectToType::Equality);
    assert_eq!(qp.bounds().kind(n - 1), SubjectToType::Equality);

    let z_ref = [
        1., 11. / 15., 17. / 30., 0.5, 0.5,
        0.5, 0.5, 17. / 30., 11. / 15., 1.,
    ];
    assert_float_eq!(qp.x(), z_ref.as_ref(), abs_all <= 1e-9);

    // the three middle links rest on the ground
    for j in 0.. m {
        let expected = if (3..= 5).contains(&j) {SubjectToStatus::Lower} else {SubjectToStatus::Inactive};
        assert_eq!(qp.constraints().status(j), expected);
    }
    assert_eq!(qp.n_ac(), 3);
    assert_float_eq!(&qp.y()[n + 3.. n + 6], [1. / 15., 2. / 15., 1. / 15.].as_ref(), abs_all <= 1e-9);
}

//

#[test]
fn test_chain2()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let n = 10;
    let m = 9;
    let mut qp = chain(n, 0.1, 0.5);
    qp.init(n + m, NoCallback).unwrap();

    // lowering the ground releases the chain step by step
    for k in 1..= 6 {
        let ground = 0.55 - 0.1 * k as f64;
        qp.set_lba(&vec![ground; m]).unwrap();

        let nwsr = qp.hotstart(n + m, LogIteration).unwrap();
        log::info!("ground {:.2}: nwsr {}, n_ac {}", ground, nwsr, qp.n_ac());

        qp.check_kkt().unwrap();
        for j in 0.. m {
            let mid = (qp.x()[j] + qp.x()[j + 1]) / 2.;
            assert!(mid >= ground - 1e-9);
        }
    }

    // ground far below: free parabola
    assert_eq!(qp.n_ac(), 0);
    for i in 0.. n {
        let z = 1. + 0.05 * (i * i) as f64 - 0.45 * i as f64;
        assert_float_eq!(qp.x()[i], z, abs <= 1e-9);
    }
}
