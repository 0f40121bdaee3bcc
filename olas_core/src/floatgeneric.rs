use num_traits::{Float, Zero};
use core::marker::PhantomData;
use crate::LinAlg;

/// `num::Float`-generic [`LinAlg`] implementation
///
/// All numeric operations are written in pure Rust.
#[derive(Clone)]
pub struct FloatGeneric<F>
{
    ph_f: PhantomData<F>,
}

impl<F: Float> LinAlg for FloatGeneric<F>
{
    type F = F;

    fn norm(x: &[F]) -> F
    {
        // scaled to avoid overflow of squares
        let mut amax = F::zero();
        for u in x {
            amax = amax.max(u.abs());
        }

        if amax == F::zero() {
            amax
        }
        else {
            let mut sum = F::zero();
            for u in x {
                let v = *u / amax;
                sum = sum + v * v;
            }
            amax * sum.sqrt()
        }
    }

    fn inner_prod(x: &[F], y: &[F]) -> F
    {
        assert_eq!(x.len(), y.len());

        let mut sum = F::zero();
        for (u, v) in x.iter().zip(y) {
            sum = sum + *u * *v;
        }
        sum
    }

    fn copy(x: &[F], y: &mut[F])
    {
        assert_eq!(x.len(), y.len());

        for (u, v) in x.iter().zip(y) {
            *v = *u;
        }
    }

    fn scale(alpha: F, x: &mut[F])
    {
        for u in x {
            *u = alpha * *u;
        }
    }

    fn add(alpha: F, x: &[F], y: &mut[F])
    {
        assert_eq!(x.len(), y.len());

        for (u, v) in x.iter().zip(y) {
            *v = *v + alpha * *u;
        }
    }

    // y = a*mat*x + b*y
    fn transform_ge(transpose: bool, n_row: usize, n_col: usize, alpha: F, mat: &[F], x: &[F], beta: F, y: &mut[F])
    {
        assert_eq!(mat.len(), n_row * n_col);
        if transpose {
            assert_eq!(x.len(), n_row);
            assert_eq!(y.len(), n_col);

            // each output is a contiguous column
            for (c, v) in y.iter_mut().enumerate() {
                let col = &mat[c * n_row.. (c + 1) * n_row];
                let mat_x = Self::inner_prod(col, x);
                *v = alpha * mat_x + beta * *v;
            }
        }
        else {
            assert_eq!(x.len(), n_col);
            assert_eq!(y.len(), n_row);

            Self::scale(beta, y);
            for (c, u) in x.iter().enumerate() {
                let col = &mat[c * n_row.. (c + 1) * n_row];
                Self::add(alpha * *u, col, y);
            }
        }
    }
}

//

#[test]
fn test_floatgeneric1()
{
    use float_eq::assert_float_eq;

    type L = FloatGeneric<f64>;

    // row-major 2x3, i.e. column-major 3x2 transposed
    let mat = &[
        1., 2., 3.,
        4., 5., 6.,
    ];
    let x = &[1., 0., -1.];
    let y = &mut[1., 1.];

    // y = 2 * M x + y, M x = [-2, -2]
    L::transform_ge(true, 3, 2, 2., mat, x, 1., y);
    assert_float_eq!(y.as_ref(), [-3., -3.].as_ref(), abs_all <= 1e-12);

    // z = M^T w
    let w = &[1., 1.];
    let z = &mut[0.; 3];
    L::transform_ge(false, 3, 2, 1., mat, w, 0., z);
    assert_float_eq!(z.as_ref(), [5., 7., 9.].as_ref(), abs_all <= 1e-12);

    assert_float_eq!(L::norm(&[3e200, 4e200]), 5e200, r2nd <= 1e-12);
    assert_float_eq!(L::inner_prod(x, &[2., 2., 2.]), 0., abs <= 1e-12);
}
