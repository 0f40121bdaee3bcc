/*!
Olas core library

<script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>

This crate for Rust provides an **online active set strategy** solving a sequence of convex quadratic programs
\\[
\begin{array}{ll}
{\rm minimize} & {1 \over 2} x^T H x + g^T x \\\\
{\rm subject \ to} & l_b \le x \le u_b \\\\
& l_{bA} \le A x \le u_{bA}
\end{array}
\\]
whose gradient and bounds change from one QP to the next, as in model predictive control.

A solution is moved along the straight line from the QP it solves to the newly loaded one,
changing one bound or constraint of the working set per step.
Each change updates the factorizations by Givens rotations instead of rebuilding them.

* [`QProblemB`] solves a QP with simple bounds only.
* [`QProblem`] solves a QP with simple bounds and general linear constraints.

All storage is allocated when a solver is created; `init` and `hotstart` allocate nothing.

# Examples

```
use float_eq::assert_float_eq;
use olas_core::*;

type L = FloatGeneric<f64>;

// minimize (x0 - 1)^2 / 2 + (x1 - 1)^2 / 2 subject to x0 + x1 <= 1
let mut qp = QProblem::<L>::new(2, 1);
qp.set_h(&[1., 0., 0., 1.]).unwrap();
qp.set_g(&[-1., -1.]).unwrap();
qp.set_a(&[1., 1.]).unwrap();
qp.set_constraint_bounds(&[-1e20], &[1.]).unwrap();

qp.init(10, NoCallback).unwrap();
assert_float_eq!(qp.x(), [0.5, 0.5].as_ref(), abs_all <= 1e-9);

// shift the gradient and solve again from the previous working set
qp.set_g(&[-2., 0.]).unwrap();
qp.hotstart(10, NoCallback).unwrap();
assert_float_eq!(qp.x(), [1.5, -0.5].as_ref(), abs_all <= 1e-9);
```
*/

#![no_std]

extern crate alloc;

//

mod linalg;

pub use linalg::*;

//

mod floatgeneric;

pub use floatgeneric::*;

//

mod qp_error;
mod types;

pub use qp_error::*;
pub use types::*;

//

mod index_partition;
mod subject_to;

pub use index_partition::*;
pub use subject_to::*;

//

mod cholesky;
mod tq;

pub use cholesky::Cholesky;
pub use tq::*;

//

mod homotopy;
mod qp_base;

pub use homotopy::{QpParam, StepEvent, Iteration, IterationCallback, NoCallback, LogIteration};

//

mod qproblemb;
mod qproblem;
mod kkt;

pub use qproblemb::*;
pub use qproblem::*;
pub use kkt::*;
