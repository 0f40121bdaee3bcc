use std::ops::{Index, IndexMut, Deref};
use num_traits::{Float, Zero, One};

//

/// Matrix builder
///
/// Dense row-major matrix which owns a `Vec` of data array,
/// laid out as [`olas_core::QProblem::set_h`] and [`olas_core::QProblem::set_a`] expect.
/// This struct relies on dynamic heap allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MatBuild<F>
{
    nrow: usize,
    ncol: usize,
    array: Vec<F>,
}

impl<F: Float> MatBuild<F>
{
    /// Creates an instance.
    ///
    /// Returns the [`MatBuild`] instance with zero data.
    /// * `nrow` is a number of rows.
    /// * `ncol` is a number of columns.
    pub fn new(nrow: usize, ncol: usize) -> Self
    {
        MatBuild {
            nrow,
            ncol,
            array: vec![F::zero(); nrow * ncol],
        }
    }

    /// Creates an identity matrix of size `n`.
    pub fn identity(n: usize) -> Self
    {
        MatBuild::new(n, n).by_fn(|r, c| if r == c {F::one()} else {F::zero()})
    }

    /// Size of the matrix.
    ///
    /// Returns a tuple of a number of rows and columns.
    pub fn size(&self) -> (usize, usize)
    {
        (self.nrow, self.ncol)
    }

    /// Data by a function.
    ///
    /// * `func` takes a row and a column of the matrix and returns data of each element.
    pub fn set_by_fn<M>(&mut self, mut func: M)
    where M: FnMut(usize, usize) -> F
    {
        for r in 0.. self.nrow {
            for c in 0.. self.ncol {
                self[(r, c)] = func(r, c);
            }
        }
    }
    /// Builder pattern of [`MatBuild::set_by_fn`].
    pub fn by_fn<M>(mut self, func: M) -> Self
    where M: FnMut(usize, usize) -> F
    {
        self.set_by_fn(func);
        self
    }

    /// Data by an iterator in column-major.
    ///
    /// * `iter` iterates matrix data in column-major.
    pub fn set_iter_colmaj<T, I>(&mut self, iter: T)
    where T: IntoIterator<Item=I>, I: Deref<Target=F>
    {
        let mut i = iter.into_iter();

        for c in 0.. self.ncol {
            for r in 0.. self.nrow {
                if let Some(v) = i.next() {
                    self[(r, c)] = *v;
                }
                else {
                    break;
                }
            }
        }
    }
    /// Builder pattern of [`MatBuild::set_iter_colmaj`].
    pub fn iter_colmaj<T, I>(mut self, iter: T) -> Self
    where T: IntoIterator<Item=I>, I: Deref<Target=F>
    {
        self.set_iter_colmaj(iter);
        self
    }

    /// Data by an iterator in row-major.
    ///
    /// * `iter` iterates matrix data in row-major.
    pub fn set_iter_rowmaj<T, I>(&mut self, iter: T)
    where T: IntoIterator<Item=I>, I: Deref<Target=F>
    {
        for (d, v) in self.array.iter_mut().zip(iter) {
            *d = *v;
        }
    }
    /// Builder pattern of [`MatBuild::set_iter_rowmaj`].
    pub fn iter_rowmaj<T, I>(mut self, iter: T) -> Self
    where T: IntoIterator<Item=I>, I: Deref<Target=F>
    {
        self.set_iter_rowmaj(iter);
        self
    }

    /// Scales by \\(\alpha\\).
    pub fn set_scale(&mut self, alpha: F)
    {
        for d in self.array.iter_mut() {
            *d = *d * alpha;
        }
    }
    /// Builder pattern of [`MatBuild::set_scale`].
    pub fn scale(mut self, alpha: F) -> Self
    {
        self.set_scale(alpha);
        self
    }

    fn index(&self, (r, c): (usize, usize)) -> usize
    {
        assert!(r < self.nrow);
        assert!(c < self.ncol);
        r * self.ncol + c
    }
}

//

impl<F: Float> Index<(usize, usize)> for MatBuild<F>
{
    type Output = F;
    fn index(&self, index: (usize, usize)) -> &Self::Output
    {
        let i = self.index(index);

        &self.array[i]
    }
}

impl<F: Float> IndexMut<(usize, usize)> for MatBuild<F>
{
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output
    {
        let i = self.index(index);

        &mut self.array[i]
    }
}

//

impl<F> AsRef<[F]> for MatBuild<F>
{
    fn as_ref(&self) -> &[F]
    {
        &self.array
    }
}

impl<F> AsMut<[F]> for MatBuild<F>
{
    fn as_mut(&mut self) -> &mut[F]
    {
        &mut self.array
    }
}

//

impl<F: Float + core::fmt::LowerExp> core::fmt::Display for MatBuild<F>
{
    fn fmt(&self, f: &mut core::fmt::Formatter) -> Result<(), core::fmt::Error>
    {
        let (nr, nc) = self.size();
        if nr == 0 || nc == 0 {
            write!(f, "[ ]")?;
        }
        else {
            write!(f, "[ {:.3e}", self[(0, 0)])?;
            if nc > 2 {
                write!(f, " ...")?;
            }
            if nc > 1 {
                write!(f, " {:.3e}", self[(0, nc - 1)])?;
            }

            if nr > 2 {
                writeln!(f)?;
                write!(f, "  ...")?;
            }

            if nr > 1 {
                writeln!(f)?;
                write!(f, "  {:.3e}", self[(nr - 1, 0)])?;
                if nc > 2 {
                    write!(f, " ...")?;
                }
                if nc > 1 {
                    write!(f, " {:.3e}", self[(nr - 1, nc - 1)])?;
                }
            }
            write!(f, " ]")?;
        }

        write!(f, " ({} x {})", nr, nc)
    }
}

//

#[test]
fn test_matbuild1()
{
    use float_eq::assert_float_eq;

    let m = MatBuild::<f64>::new(2, 3).iter_colmaj(&[
        1., 4.,
        2., 5.,
        3., 6.,
    ]);
    let ref_array = &[
        1., 2., 3.,
        4., 5., 6.,
    ];

    assert_eq!(m.size(), (2, 3));
    assert_float_eq!(m.as_ref(), ref_array.as_ref(), abs_all <= 1e-15);

    let m2 = MatBuild::<f64>::new(2, 3).iter_rowmaj(ref_array).scale(2.);
    assert_float_eq!(m2[(1, 0)], 8., abs <= 1e-15);

    let e = MatBuild::<f64>::identity(3);
    assert_float_eq!(e[(2, 2)], 1., abs <= 1e-15);
    assert_float_eq!(e[(0, 2)], 0., abs <= 1e-15);
}
