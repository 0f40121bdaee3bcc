use alloc::vec::Vec;
use core::marker::PhantomData;
use num_traits::{Float, Zero, One};
use crate::{LinAlg, QpError, QpResult};
use crate::cholesky::{Cholesky, givens, rotate};

/// TQ factorization of the active constraint rows restricted to the free variables.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// \\[
/// A_{\rm AC,FR} \ Q = \begin{bmatrix} 0 & T \end{bmatrix}, \quad
/// Q = \begin{bmatrix} Z & Y \end{bmatrix}
/// \\]
///
/// \\(Q\\) is orthogonal of dimension \\(n_{\rm FR}\\); its rows follow the free variable order of the caller.
/// \\(T\\) is reverse triangular of dimension \\(n_{\rm AC}\\):
/// row \\(i\\) is zero left of column \\(n_{\rm AC}-1-i\\).
/// The columns of \\(Z\\) span the null space of the active rows.
///
/// \\(T\\) lives right-aligned in a fixed square buffer
/// so that a new column enters on the left without shifting.
#[derive(Debug, Clone)]
pub struct Tq<L: LinAlg>
{
    ph_l: PhantomData<L>,
    n: usize,
    size_t: usize,
    q: Vec<L::F>,
    t: Vec<L::F>,
    tcol: usize,
    n_fr: usize,
    n_ac: usize,
    carry: Vec<L::F>,
}

impl<L: LinAlg> Tq<L>
{
    /// Creates storage for `n` variables and `m` constraints.
    pub fn new(n: usize, m: usize) -> Self
    {
        let f0 = L::F::zero();
        let size_t = n.min(m);

        Tq {
            ph_l: PhantomData,
            n,
            size_t,
            q: alloc::vec![f0; n * n],
            t: alloc::vec![f0; size_t * size_t],
            tcol: size_t,
            n_fr: 0,
            n_ac: 0,
            carry: alloc::vec![f0; size_t],
        }
    }

    /// Sets \\(Q = I\\) of dimension `n_fr` and no active rows.
    pub fn reset(&mut self, n_fr: usize)
    {
        assert!(n_fr <= self.n);

        let f0 = L::F::zero();
        let f1 = L::F::one();

        L::scale(f0, &mut self.q);
        L::scale(f0, &mut self.t);
        for i in 0.. n_fr {
            self.q[i * self.n + i] = f1;
        }
        self.tcol = self.size_t;
        self.n_fr = n_fr;
        self.n_ac = 0;
    }

    pub fn n_fr(&self) -> usize
    {
        self.n_fr
    }

    pub fn n_ac(&self) -> usize
    {
        self.n_ac
    }

    pub fn n_z(&self) -> usize
    {
        self.n_fr - self.n_ac
    }

    /// Capacity of active rows.
    pub fn size_t(&self) -> usize
    {
        self.size_t
    }

    /// Element \\(Q_{ij}\\).
    pub fn q(&self, i: usize, j: usize) -> L::F
    {
        self.q[i * self.n + j]
    }

    fn q_mut(&mut self, i: usize, j: usize) -> &mut L::F
    {
        &mut self.q[i * self.n + j]
    }

    /// Element \\(T_{ij}\\).
    pub fn t(&self, i: usize, j: usize) -> L::F
    {
        self.t[i * self.size_t + self.tcol + j]
    }

    fn t_mut(&mut self, i: usize, j: usize) -> &mut L::F
    {
        &mut self.t[i * self.size_t + self.tcol + j]
    }

    /// Calculates \\(w^T = a^T Q\\).
    ///
    /// * `a` is indexed by rows of \\(Q\\), length \\(n_{\rm FR}\\).
    /// * `w` has length \\(n_{\rm FR}\\).
    pub fn row_times_q(&self, a: &[L::F], w: &mut[L::F])
    {
        assert_eq!(a.len(), self.n_fr);
        assert_eq!(w.len(), self.n_fr);

        for (j, u) in w.iter_mut().enumerate() {
            let mut s = L::F::zero();
            for (p, v) in a.iter().enumerate() {
                s = s + *v * self.q(p, j);
            }
            *u = s;
        }
    }

    /// Copies row `p` of \\(Q\\).
    pub fn q_row(&self, p: usize, w: &mut[L::F])
    {
        assert_eq!(w.len(), self.n_fr);

        L::copy(&self.q[p * self.n.. p * self.n + self.n_fr], w);
    }

    /// Copies column `j` of \\(Q\\).
    pub fn q_col(&self, j: usize, z: &mut[L::F])
    {
        assert_eq!(z.len(), self.n_fr);

        for (p, u) in z.iter_mut().enumerate() {
            *u = self.q(p, j);
        }
    }

    fn rotate_q_cols(&mut self, u: usize, v: usize, c: L::F, s: L::F)
    {
        for p in 0.. self.n_fr {
            let (qu, qv) = rotate(c, s, self.q(p, u), self.q(p, v));
            *self.q_mut(p, u) = qu;
            *self.q_mut(p, v) = qv;
        }
    }

    /// Rotates the columns of \\(Z\\) so that \\(w^T Z\\) is concentrated on its last element.
    ///
    /// * `w` is \\(a^T Q\\) before entry, \\(a^T Q\\) of the rotated \\(Q\\) on exit.
    /// * `chol` is rotated alongside if given; its dimension shall be \\(n_{\rm Z}\\).
    pub fn concentrate(&mut self, w: &mut[L::F], mut chol: Option<&mut Cholesky<L>>)
    {
        let n_z = self.n_z();
        assert!(n_z > 0);

        for j in 0.. n_z - 1 {
            let (c, s, r) = givens(w[j + 1], w[j]);
            w[j + 1] = r;
            w[j] = L::F::zero();

            self.rotate_q_cols(j + 1, j, c, s);
            if let Some(ch) = chol.as_deref_mut() {
                ch.rotate_columns(j, c, s);
            }
        }
    }

    /// Appends an active row after [`Tq::concentrate`].
    ///
    /// The last column of \\(Z\\) moves to \\(Y\\).
    pub fn append_row(&mut self, w: &[L::F])
    {
        assert_eq!(w.len(), self.n_fr);
        assert!(self.n_ac < self.size_t);
        assert!(self.n_z() > 0);

        let n_z = self.n_z();
        let n_ac = self.n_ac;

        self.tcol -= 1;
        for i in 0.. n_ac {
            *self.t_mut(i, 0) = L::F::zero();
        }
        for j in 0..= n_ac {
            *self.t_mut(n_ac, j) = w[n_z - 1 + j];
        }
        self.n_ac += 1;
    }

    /// Removes active row `p`.
    ///
    /// The freed column of \\(Y\\) becomes the last column of \\(Z\\).
    pub fn remove_row(&mut self, p: usize)
    {
        assert!(p < self.n_ac);

        let f0 = L::F::zero();
        let n_ac = self.n_ac;
        let n_z = self.n_z();

        // rows below p move up by one, so their leading element moves right by one
        for i in p + 1.. n_ac {
            let c0 = n_ac - 1 - i;
            let (c, s, _) = givens(self.t(i, c0 + 1), self.t(i, c0));
            for k in 0.. n_ac {
                let (u, v) = rotate(c, s, self.t(k, c0 + 1), self.t(k, c0));
                *self.t_mut(k, c0 + 1) = u;
                *self.t_mut(k, c0) = v;
            }
            *self.t_mut(i, c0) = f0;
            self.rotate_q_cols(n_z + c0 + 1, n_z + c0, c, s);
        }

        for i in p.. n_ac - 1 {
            for j in 0.. n_ac {
                let v = self.t(i + 1, j);
                *self.t_mut(i, j) = v;
            }
        }
        for j in 0.. n_ac {
            *self.t_mut(n_ac - 1, j) = f0;
        }
        for i in 0.. n_ac {
            *self.t_mut(i, 0) = f0;
        }

        self.tcol += 1;
        self.n_ac -= 1;
    }

    /// Swaps rows `p0` and `p1` of \\(Q\\).
    pub fn swap_rows(&mut self, p0: usize, p1: usize)
    {
        if p0 != p1 {
            for j in 0.. self.n_fr {
                self.q.swap(p0 * self.n + j, p1 * self.n + j);
            }
        }
    }

    /// Removes the last row of \\(Q\\) after [`Tq::concentrate`] was applied to it,
    /// i.e. the last free variable gets fixed.
    pub fn remove_last_row(&mut self)
    {
        assert!(self.n_z() > 0);

        let f0 = L::F::zero();
        let n_ac = self.n_ac;
        let n_z = self.n_z();
        let last = self.n_fr - 1;

        for k in 0.. n_ac {
            self.carry[k] = f0;
        }

        for j in 0.. n_ac {
            let v = n_z - 1 + j;
            let u = n_z + j;
            let (c, s, _) = givens(self.q(last, u), self.q(last, v));
            self.rotate_q_cols(u, v, c, s);

            for k in 0.. n_ac {
                let (carry, tj) = rotate(c, s, self.t(k, j), self.carry[k]);
                self.carry[k] = carry;
                *self.t_mut(k, j) = tj;
            }
        }

        for k in 0.. self.n_fr {
            *self.q_mut(last, k) = f0;
            *self.q_mut(k, last) = f0;
        }
        self.n_fr -= 1;
    }

    /// Adds a row to \\(Q\\) for a variable getting free.
    ///
    /// * `a` is the column of the active rows for the new variable, in row order of \\(T\\).
    ///   It is destroyed on exit.
    ///
    /// The new variable becomes the last row of \\(Q\\),
    /// and a new last column of \\(Z\\) appears.
    pub fn append_free_row(&mut self, a: &mut[L::F])
    {
        assert_eq!(a.len(), self.n_ac);
        assert!(self.n_fr < self.n);

        let f0 = L::F::zero();
        let f1 = L::F::one();
        let n_ac = self.n_ac;
        let n_z = self.n_z();
        let n_fr = self.n_fr;

        for p in 0.. n_fr {
            for j in (n_z.. n_fr).rev() {
                let v = self.q(p, j);
                *self.q_mut(p, j + 1) = v;
            }
            *self.q_mut(p, n_z) = f0;
        }
        for j in 0..= n_fr {
            *self.q_mut(n_fr, j) = f0;
        }
        *self.q_mut(n_fr, n_z) = f1;
        self.n_fr += 1;

        // column n_z of A Q is `a` now; rotate it into T row by row
        for i in 0.. n_ac {
            let col = n_ac - 1 - i;
            let (c, s, _) = givens(self.t(i, col), a[i]);
            for k in 0.. n_ac {
                let (u, v) = rotate(c, s, self.t(k, col), a[k]);
                *self.t_mut(k, col) = u;
                a[k] = v;
            }
            a[i] = f0;
            self.rotate_q_cols(n_z + 1 + col, n_z, c, s);
        }
    }

    /// Solves \\(T x = b\\).
    pub fn solve_t(&self, b: &[L::F], x: &mut[L::F], eps_zero: L::F) -> QpResult
    {
        let n_ac = self.n_ac;
        assert_eq!(b.len(), n_ac);
        assert_eq!(x.len(), n_ac);

        for i in 0.. n_ac {
            let j0 = n_ac - 1 - i;
            let mut s = b[i];
            for j in j0 + 1.. n_ac {
                s = s - self.t(i, j) * x[j];
            }

            let d = self.t(i, j0);
            if d.abs() <= eps_zero {
                return Err(QpError::DivByZero);
            }
            x[j0] = s / d;
        }
        Ok(())
    }

    /// Solves \\(T^T x = b\\).
    pub fn solve_tt(&self, b: &[L::F], x: &mut[L::F], eps_zero: L::F) -> QpResult
    {
        let n_ac = self.n_ac;
        assert_eq!(b.len(), n_ac);
        assert_eq!(x.len(), n_ac);

        for j in 0.. n_ac {
            let i0 = n_ac - 1 - j;
            let mut s = b[j];
            for i in i0 + 1.. n_ac {
                s = s - self.t(i, j) * x[i];
            }

            let d = self.t(i0, j);
            if d.abs() <= eps_zero {
                return Err(QpError::DivByZero);
            }
            x[i0] = s / d;
        }
        Ok(())
    }
}

//

#[cfg(test)]
type TestLa = crate::FloatGeneric<f64>;

// checks Q^T Q = I, A_AC,FR Q = [0 T] and the shape of T
#[cfg(test)]
fn check(tq: &Tq<TestLa>, a: &[&[f64]], fr: &[usize], ac: &[usize])
{
    use float_eq::assert_float_eq;

    let n_fr = tq.n_fr();
    let n_ac = tq.n_ac();
    let n_z = tq.n_z();
    assert_eq!(fr.len(), n_fr);
    assert_eq!(ac.len(), n_ac);

    for i in 0.. n_fr {
        for j in 0.. n_fr {
            let mut s = 0.;
            for p in 0.. n_fr {
                s += tq.q(p, i) * tq.q(p, j);
            }
            assert_float_eq!(s, if i == j {1.} else {0.}, abs <= 1e-12);
        }
    }

    for (i, &c) in ac.iter().enumerate() {
        for j in 0.. n_fr {
            let mut s = 0.;
            for (p, &v) in fr.iter().enumerate() {
                s += a[c][v] * tq.q(p, j);
            }
            let t = if j < n_z {0.} else {tq.t(i, j - n_z)};
            assert_float_eq!(s, t, abs <= 1e-12);
            if j >= n_z && j - n_z < n_ac - 1 - i {
                assert_float_eq!(t, 0., abs <= 1e-12);
            }
        }
    }
}

#[cfg(test)]
fn add(tq: &mut Tq<TestLa>, a: &[f64], fr: &[usize])
{
    let a_fr: alloc::vec::Vec<f64> = fr.iter().map(|&v| a[v]).collect();
    let mut w = alloc::vec![0.; fr.len()];
    tq.row_times_q(&a_fr, &mut w);
    tq.concentrate(&mut w, None);
    tq.append_row(&w);
}

#[test]
fn test_tq1()
{
    use float_eq::assert_float_eq;

    let a: &[&[f64]] = &[
        &[1., 2., 0., 1.],
        &[0., 1., 1., -1.],
        &[2., 0., 1., 3.],
    ];
    let mut tq = Tq::<TestLa>::new(4, 3);
    let mut fr = alloc::vec![0, 1, 2, 3];
    let mut ac = alloc::vec![];

    tq.reset(4);
    for c in 0.. 3 {
        add(&mut tq, a[c], &fr);
        ac.push(c);
        check(&tq, a, &fr, &ac);
    }
    assert_eq!(tq.n_z(), 1);

    // T x = b and T^T x = b
    let b = [1., -2., 0.5];
    let mut x = [0.; 3];
    tq.solve_t(&b, &mut x, 1e-16).unwrap();
    for i in 0.. 3 {
        let s: f64 = (0.. 3).map(|j| tq.t(i, j) * x[j]).sum();
        assert_float_eq!(s, b[i], abs <= 1e-12);
    }
    tq.solve_tt(&b, &mut x, 1e-16).unwrap();
    for j in 0.. 3 {
        let s: f64 = (0.. 3).map(|i| tq.t(i, j) * x[i]).sum();
        assert_float_eq!(s, b[j], abs <= 1e-12);
    }

    // remove the middle row
    tq.remove_row(1);
    ac.remove(1);
    check(&tq, a, &fr, &ac);
    assert_eq!(tq.n_z(), 2);

    // fix variable 1
    let p = 1;
    let last = fr.len() - 1;
    tq.swap_rows(p, last);
    fr.swap(p, last);
    let mut w = alloc::vec![0.; fr.len()];
    tq.q_row(last, &mut w);
    let n_z = tq.n_z();
    tq.concentrate(&mut w[.. n_z].to_vec(), None);
    tq.remove_last_row();
    fr.pop();
    check(&tq, a, &fr, &ac);
    assert_eq!(tq.n_z(), 1);

    // free variable 1 again
    let mut col: alloc::vec::Vec<f64> = ac.iter().map(|&c| a[c][1]).collect();
    tq.append_free_row(&mut col);
    fr.push(1);
    check(&tq, a, &fr, &ac);
    assert_eq!(tq.n_z(), 2);
}
