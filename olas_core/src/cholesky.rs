use alloc::vec::Vec;
use core::marker::PhantomData;
use num_traits::{Float, Zero, One, ToPrimitive};
use crate::{LinAlg, QpError, QpResult};

/// Givens rotation \\((c, s)\\) with \\(c a + s b = r\\) and \\(-s a + c b = 0\\).
///
/// Returns `(c, s, r)`.
pub(crate) fn givens<F: Float>(a: F, b: F) -> (F, F, F)
{
    let f0 = F::zero();
    let f1 = F::one();

    if b == f0 {
        (f1, f0, a)
    }
    else if a == f0 {
        (f0, f1, b)
    }
    else {
        let r = a.hypot(b);
        (a / r, b / r, r)
    }
}

/// Applies a rotation made by [`givens`] to a pair `(u, v)`.
pub(crate) fn rotate<F: Float>(c: F, s: F, u: F, v: F) -> (F, F)
{
    (c * u + s * v, c * v - s * u)
}

//

/// Upper triangular Cholesky factor \\(R\\) of a reduced Hessian \\(R^T R\\).
///
/// Storage is allocated once for the maximum dimension;
/// the current dimension grows and shrinks by one with the working set.
#[derive(Debug, Clone)]
pub struct Cholesky<L: LinAlg>
{
    ph_l: PhantomData<L>,
    n: usize,
    dim: usize,
    r: Vec<L::F>,
}

impl<L: LinAlg> Cholesky<L>
{
    pub fn new(n: usize) -> Self
    {
        Cholesky {
            ph_l: PhantomData,
            n,
            dim: 0,
            r: alloc::vec![L::F::zero(); n * n],
        }
    }

    pub fn reset(&mut self)
    {
        L::scale(L::F::zero(), &mut self.r);
        self.dim = 0;
    }

    pub fn dim(&self) -> usize
    {
        self.dim
    }

    /// Element \\(R_{ij}\\).
    pub fn at(&self, i: usize, j: usize) -> L::F
    {
        self.r[i * self.n + j]
    }

    fn at_mut(&mut self, i: usize, j: usize) -> &mut L::F
    {
        &mut self.r[i * self.n + j]
    }

    /// Sets \\(R = I\\) of dimension `dim`.
    pub fn identity(&mut self, dim: usize)
    {
        assert!(dim <= self.n);

        L::scale(L::F::zero(), &mut self.r);
        for i in 0.. dim {
            *self.at_mut(i, i) = L::F::one();
        }
        self.dim = dim;
    }

    /// Factorizes a symmetric matrix of dimension `dim` in place.
    ///
    /// `mat(i, j)` is called for the upper triangle \\(i \le j\\) only.
    /// Fails with [`QpError::HessianNotSpd`] if a pivot is not above `eps_pd`.
    pub fn factorize<M>(&mut self, dim: usize, mat: M, eps_pd: L::F) -> QpResult
    where M: Fn(usize, usize) -> L::F
    {
        assert!(dim <= self.n);

        L::scale(L::F::zero(), &mut self.r);
        self.dim = 0;

        for j in 0.. dim {
            for i in 0..= j {
                let mut s = mat(i, j);
                for k in 0.. i {
                    s = s - self.at(k, i) * self.at(k, j);
                }

                if i == j {
                    if s <= eps_pd {
                        log::debug!("cholesky pivot {} = {:?}", j, s.to_f64());
                        return Err(QpError::HessianNotSpd);
                    }
                    *self.at_mut(j, j) = s.sqrt();
                }
                else {
                    *self.at_mut(i, j) = s / self.at(i, i);
                }
            }
        }

        self.dim = dim;
        Ok(())
    }

    /// Solves \\(R x = b\\) in place.
    pub fn solve_r(&self, x: &mut[L::F], eps_zero: L::F) -> QpResult
    {
        assert_eq!(x.len(), self.dim);

        for i in (0.. self.dim).rev() {
            let mut s = x[i];
            for j in i + 1.. self.dim {
                s = s - self.at(i, j) * x[j];
            }

            let d = self.at(i, i);
            if d.abs() <= eps_zero {
                return Err(QpError::DivByZero);
            }
            x[i] = s / d;
        }
        Ok(())
    }

    /// Solves \\(R^T x = b\\) in place.
    pub fn solve_rt(&self, x: &mut[L::F], eps_zero: L::F) -> QpResult
    {
        assert_eq!(x.len(), self.dim);

        for i in 0.. self.dim {
            let mut s = x[i];
            for j in 0.. i {
                s = s - self.at(j, i) * x[j];
            }

            let d = self.at(i, i);
            if d.abs() <= eps_zero {
                return Err(QpError::DivByZero);
            }
            x[i] = s / d;
        }
        Ok(())
    }

    /// Appends a column \\(r\\) and a diagonal \\(\rho\\) so that the factor stays valid
    /// after the reduced Hessian gains a row and a column.
    ///
    /// * `col` is \\(Z^T H z\\) on entry and \\(r\\) on exit, where \\(z\\) is the new basis vector.
    /// * `diag_sq` is \\(z^T H z\\).
    ///
    /// Fails with [`QpError::HessianNotSpd`] if \\(\rho^2 = z^T H z - r^T r\\) is not above `eps_pd`.
    pub fn append(&mut self, col: &mut[L::F], diag_sq: L::F, eps_pd: L::F, eps_zero: L::F) -> QpResult
    {
        assert_eq!(col.len(), self.dim);
        assert!(self.dim < self.n);

        self.solve_rt(col, eps_zero)?;

        let rho_sq = diag_sq - L::inner_prod(col, col);
        if rho_sq <= eps_pd {
            log::debug!("cholesky append pivot {:?}", rho_sq.to_f64());
            return Err(QpError::HessianNotSpd);
        }

        let d = self.dim;
        for (i, v) in col.iter().enumerate() {
            *self.at_mut(i, d) = *v;
            *self.at_mut(d, i) = L::F::zero();
        }
        *self.at_mut(d, d) = rho_sq.sqrt();
        self.dim += 1;
        Ok(())
    }

    /// Removes column `p`, i.e. the reduced Hessian loses row and column `p`.
    pub fn remove_column(&mut self, p: usize)
    {
        assert!(p < self.dim);

        let f0 = L::F::zero();
        let d = self.dim;

        // rows i-1 and i share a subdiagonal once column p is gone
        for i in p + 1.. d {
            let (c, s, r) = givens(self.at(i - 1, i), self.at(i, i));
            *self.at_mut(i - 1, i) = r;
            *self.at_mut(i, i) = f0;
            for k in i + 1.. d {
                let (u, v) = rotate(c, s, self.at(i - 1, k), self.at(i, k));
                *self.at_mut(i - 1, k) = u;
                *self.at_mut(i, k) = v;
            }
        }

        for i in 0.. d {
            for k in p.. d - 1 {
                *self.at_mut(i, k) = self.at(i, k + 1);
            }
            *self.at_mut(i, d - 1) = f0;
        }
        for k in 0.. d {
            *self.at_mut(d - 1, k) = f0;
        }

        self.dim -= 1;
    }

    /// Applies the basis rotation `(c, s)` of columns `(j + 1, j)`
    /// and restores the triangular shape by a row rotation.
    pub fn rotate_columns(&mut self, j: usize, c: L::F, s: L::F)
    {
        assert!(j + 1 < self.dim);

        let f0 = L::F::zero();

        for i in 0..= j + 1 {
            let (u, v) = rotate(c, s, self.at(i, j + 1), self.at(i, j));
            *self.at_mut(i, j + 1) = u;
            *self.at_mut(i, j) = v;
        }

        let (c, s, r) = givens(self.at(j, j), self.at(j + 1, j));
        *self.at_mut(j, j) = r;
        *self.at_mut(j + 1, j) = f0;
        for k in j + 1.. self.dim {
            let (u, v) = rotate(c, s, self.at(j, k), self.at(j + 1, k));
            *self.at_mut(j, k) = u;
            *self.at_mut(j + 1, k) = v;
        }
    }

    /// Drops the last row and column.
    pub fn drop_last(&mut self)
    {
        assert!(self.dim > 0);

        let d = self.dim - 1;
        for k in 0.. self.dim {
            *self.at_mut(k, d) = L::F::zero();
            *self.at_mut(d, k) = L::F::zero();
        }
        self.dim = d;
    }
}

//

#[cfg(test)]
fn rtr(ch: &Cholesky<crate::FloatGeneric<f64>>, i: usize, j: usize) -> f64
{
    let mut s = 0.;
    for k in 0.. ch.dim() {
        s += ch.at(k, i) * ch.at(k, j);
    }
    s
}

#[test]
fn test_cholesky1()
{
    use float_eq::assert_float_eq;

    type L = crate::FloatGeneric<f64>;

    let h = [
        4., 2., 0.,
        2., 5., 1.,
        0., 1., 3.,
    ];
    let mut ch = Cholesky::<L>::new(3);
    ch.factorize(3, |i, j| h[i * 3 + j], 1e-14).unwrap();

    for i in 0.. 3 {
        for j in 0.. 3 {
            assert_float_eq!(rtr(&ch, i, j), h[i * 3 + j], abs <= 1e-12);
        }
    }

    // R^T R x = b
    let mut x = [1., 2., 3.];
    ch.solve_rt(&mut x, 1e-16).unwrap();
    ch.solve_r(&mut x, 1e-16).unwrap();
    let b: [f64; 3] = core::array::from_fn(|i| (0.. 3).map(|j| h[i * 3 + j] * x[j]).sum());
    assert_float_eq!(b, [1., 2., 3.], abs_all <= 1e-12);

    // drop variable 1
    ch.remove_column(1);
    assert_eq!(ch.dim(), 2);
    let idx = [0, 2];
    for i in 0.. 2 {
        for j in 0.. 2 {
            assert_float_eq!(rtr(&ch, i, j), h[idx[i] * 3 + idx[j]], abs <= 1e-12);
        }
    }
    assert_float_eq!(ch.at(1, 0), 0., abs <= 1e-15);

    // bring it back at the end
    let mut col = [h[0 * 3 + 1], h[2 * 3 + 1]];
    ch.append(&mut col, h[1 * 3 + 1], 1e-14, 1e-16).unwrap();
    let idx = [0, 2, 1];
    for i in 0.. 3 {
        for j in 0.. 3 {
            assert_float_eq!(rtr(&ch, i, j), h[idx[i] * 3 + idx[j]], abs <= 1e-12);
        }
    }
}

#[test]
fn test_cholesky2()
{
    use float_eq::assert_float_eq;

    type L = crate::FloatGeneric<f64>;

    // singular
    let mut ch = Cholesky::<L>::new(2);
    assert_eq!(ch.factorize(2, |_, _| 1., 1e-14), Err(QpError::HessianNotSpd));

    ch.identity(1);
    let mut col = [1.];
    assert_eq!(ch.append(&mut col, 1., 1e-14, 1e-16), Err(QpError::HessianNotSpd));

    // a rotated basis keeps R^T R = G^T M G
    let m = [
        2., 1.,
        1., 3.,
    ];
    ch.factorize(2, |i, j| m[i * 2 + j], 1e-14).unwrap();
    let (c, s, _) = givens(3., 4.);
    ch.rotate_columns(0, c, s);
    assert_float_eq!(ch.at(1, 0), 0., abs <= 1e-15);

    // basis vectors z1' = c z1 + s z0, z0' = c z0 - s z1
    let z = [[c, -s], [s, c]];
    for i in 0.. 2 {
        for j in 0.. 2 {
            let mut g = 0.;
            for p in 0.. 2 {
                for q in 0.. 2 {
                    g += z[i][p] * m[p * 2 + q] * z[j][q];
                }
            }
            assert_float_eq!(rtr(&ch, i, j), g, abs <= 1e-12);
        }
    }
}
