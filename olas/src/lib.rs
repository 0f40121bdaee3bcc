/*!
Olas (waves in Spanish) follows a moving QP.

<script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>

This crate for Rust provides **parametric convex QP** solving by the online active set strategy of [`olas_core`],
with a dense matrix builder and `std`-backed diagnostics.

# General usage

1. A sequence of QPs is assumed to share the Hessian \\(H\\) and the constraint matrix \\(A\\),
   while the gradient \\(g\\) and the bounds \\(l_b, u_b, l_{bA}, u_{bA}\\) change from one QP to the next.
   Refer to [`prelude::QProblem`] about the mathematical formulation.
1. Construct \\(H\\) and \\(A\\) using [`MatBuild`].
1. Create a [`prelude::QProblem`] (or [`prelude::QProblemB`] without \\(A\\)) instance
   and optionally set its parameters.
1. Load the first QP and invoke `init`.
1. Load each following QP and invoke `hotstart`, which starts from the previous working set.

# Examples

A projection onto a half-plane which moves:
\\[
\begin{array}{ll}
{\rm minimize} & {(x_0 - 2)^2 + (x_1 - 2)^2 \over 2} \\\\
{\rm subject \ to} & x_0 + x_1 \le u_{bA}
\end{array}
\\]

The optimal solution is \\((u_{bA} / 2, u_{bA} / 2)\\) for \\(u_{bA} \le 4\\).

```
use float_eq::assert_float_eq;
use olas::prelude::*;
use olas::*;

//env_logger::init(); // Use any logger crate as `olas` uses `log` crate.

type La = FloatGeneric<f64>;
type AQProblem = QProblem<La>;

let n = 2; // x0, x1
let m = 1;

let mat_h = MatBuild::<f64>::identity(n);
let mat_a = MatBuild::<f64>::new(m, n).iter_rowmaj(&[
    1., 1.,
]);

let mut qp = AQProblem::new(n, m).par(|p| {
    p.eps_kkt = 1e-9;
});
qp.set_h(mat_h.as_ref()).unwrap();
qp.set_a(mat_a.as_ref()).unwrap();
qp.set_g(&[-2., -2.]).unwrap();
qp.set_constraint_bounds(&[-1e20], &[2.]).unwrap();

qp.init(10, NoCallback).unwrap();
assert_float_eq!(qp.x(), [1., 1.].as_ref(), abs_all <= 1e-9);

for k in 1..= 4 {
    let uba = 2. - 0.5 * k as f64;
    qp.set_uba(&[uba]).unwrap();
    qp.hotstart(10, NoCallback).unwrap();
    qp.check_kkt().unwrap();
    assert_float_eq!(qp.x(), [uba / 2., uba / 2.].as_ref(), abs_all <= 1e-9);
}
```

## Other examples

You can find other [tests](https://github.com/convexbrain/Totsu/tree/master/olas/tests) of the solvers.
*/

mod matbuild;

pub use matbuild::*;

//

mod diagnostics;

pub use diagnostics::*;

//

/// Prelude
pub mod prelude
{
    pub use olas_core::{QProblem, QProblemB, QpParam, QpError, QpResult, QpStatus, HessianType};
    pub use olas_core::{SubjectToType, SubjectToStatus, Iteration, IterationCallback, NoCallback, LogIteration};
    pub use olas_core::FloatGeneric;
}
