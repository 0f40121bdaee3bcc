use num_traits::{Float, Zero, One};
use crate::{LinAlg, QpError, QpResult};

/// Maximum violation of the KKT conditions by a primal-dual pair.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// Returns the largest of
/// * stationarity \\(\\|Hx + g - y_B - A^T y_C\\|_\infty\\),
/// * primal infeasibility of \\(l_b \le x \le u_b\\) and \\(l_{bA} \le Ax \le u_{bA}\\),
/// * complementarity, a multiplier of the lower (upper) side scaled by its slack clipped at \\(1\\),
///   so that a nonzero multiplier of a side far from active counts in full.
///
/// * `h` is \\(H\\), row-major \\(n \times n\\).
/// * `a` is \\(A\\), row-major \\(m \times n\\).
/// * `y` has length \\(n + m\\), bound multipliers first.
pub fn kkt_violation<L: LinAlg>(
    n: usize, m: usize,
    h: &[L::F], g: &[L::F], a: &[L::F],
    lb: &[L::F], ub: &[L::F], lba: &[L::F], uba: &[L::F],
    x: &[L::F], y: &[L::F]) -> L::F
{
    assert_eq!(h.len(), n * n);
    assert_eq!(a.len(), m * n);
    assert_eq!(y.len(), n + m);

    let f0 = L::F::zero();
    let f1 = L::F::one();

    let mut viol = f0;

    for i in 0.. n {
        let mut s = L::inner_prod(&h[i * n.. (i + 1) * n], x) + g[i] - y[i];
        for c in 0.. m {
            s = s - a[c * n + i] * y[n + c];
        }
        viol = viol.max(s.abs());

        viol = viol.max(side_violation(x[i], lb[i], ub[i], y[i], f0, f1));
    }

    for c in 0.. m {
        let ax = L::inner_prod(&a[c * n.. (c + 1) * n], x);

        viol = viol.max(side_violation(ax, lba[c], uba[c], y[n + c], f0, f1));
    }

    viol
}

fn side_violation<F: Float>(v: F, lo: F, up: F, yv: F, f0: F, f1: F) -> F
{
    let mut viol = (lo - v).max(v - up).max(f0);

    if yv > f0 {
        viol = viol.max(yv * (v - lo).abs().min(f1));
    }
    else if yv < f0 {
        viol = viol.max(-yv * (up - v).abs().min(f1));
    }
    viol
}

/// Classifies a KKT violation against `eps_kkt`.
///
/// `Ok` up to `eps_kkt`, [`QpError::InaccurateSolution`] up to `100 * eps_kkt`,
/// [`QpError::NoSolution`] beyond.
pub fn kkt_result<F: Float>(viol: F, eps_kkt: F) -> QpResult
{
    let critical = eps_kkt * F::from(100).unwrap();

    if viol <= eps_kkt {
        Ok(())
    }
    else if viol <= critical {
        Err(QpError::InaccurateSolution)
    }
    else {
        Err(QpError::NoSolution)
    }
}

//

#[test]
fn test_kkt1()
{
    use float_eq::assert_float_eq;

    type L = crate::FloatGeneric<f64>;

    let h = [1., 0., 0., 1.];
    let g = [-1., -1.];
    let a = [1., 1.];

    // min (x0-1)^2/2 + (x1-1)^2/2 s.t. x0 + x1 <= 1
    let x = [0.5, 0.5];
    let y = [0., 0., -0.5];
    let v = kkt_violation::<L>(2, 1, &h, &g, &a, &[-10., -10.], &[10., 10.], &[-10.], &[1.], &x, &y);
    assert_float_eq!(v, 0., abs <= 1e-15);
    assert_eq!(kkt_result(v, 1e-6), Ok(()));

    // wrong sign of the multiplier
    let y = [0., 0., 0.5];
    let v = kkt_violation::<L>(2, 1, &h, &g, &a, &[-10., -10.], &[10., 10.], &[-10.], &[1.], &x, &y);
    assert!(v >= 0.5);
    assert_eq!(kkt_result(v, 1e-6), Err(QpError::NoSolution));

    assert_eq!(kkt_result(1e-5, 1e-6), Err(QpError::InaccurateSolution));
}
