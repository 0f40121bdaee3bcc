//! Bound-constrained QP solver

use num_traits::{Float, One};
use core::fmt::{Debug, LowerExp};
use crate::{LinAlg, QpError, QpResult, QpParam, QpStatus, HessianType, Bounds, SubjectToStatus};
use crate::{StepEvent, IterationCallback};
use crate::homotopy::{Homotopy, solve_homotopy};
use crate::qp_base::{QpBase, init_error, setup_error};
use crate::kkt::{kkt_violation, kkt_result};

/// Online active set solver of a QP with simple bounds.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// \\[
/// \begin{array}{ll}
/// {\rm minimize} & {1 \over 2} x^T H x + g^T x \\\\
/// {\rm subject \ to} & l_b \le x \le u_b
/// \end{array}
/// \\]
///
/// - variables \\(x \in \mathbb{R}^n\\)
/// - \\(H \in \mathcal{S}\_{+}^n\\), \\(g \in \mathbb{R}^n\\), \\(l_b, u_b \in \mathbb{R}^n\\)
///
/// The multipliers \\(y \in \mathbb{R}^n\\) satisfy \\(H x + g = y\\),
/// nonnegative at active lower bounds and nonpositive at active upper bounds.
///
/// The Cholesky factor \\(R\\) of the Hessian restricted to the free variables
/// is updated by one row and column per working-set change.
pub struct QProblemB<L: LinAlg>
{
    base: QpBase<L>,
}

impl<L: LinAlg> QProblemB<L>
where L::F: Float + Debug + LowerExp
{
    /// Creates an instance for `n` variables.
    ///
    /// All storage is allocated here.
    pub fn new(n: usize) -> Self
    {
        QProblemB {
            base: QpBase::new(n, 0),
        }
    }

    /// Changes solver parameters.
    ///
    /// Returns [`QProblemB`] with its parameters changed.
    /// * `f` is a function to change parameters given by its argument.
    pub fn par<P>(mut self, f: P) -> Self
    where P: FnOnce(&mut QpParam<L::F>)
    {
        f(&mut self.base.par);
        self
    }

    /// Solver parameters.
    pub fn param(&self) -> &QpParam<L::F>
    {
        &self.base.par
    }

    /// Declares the structure of \\(H\\).
    pub fn set_hessian_type(&mut self, hessian_type: HessianType) -> QpResult
    {
        if self.base.status != QpStatus::NotInitialised {
            return Err(QpError::QpAlreadyInitialised);
        }
        self.base.hessian_type = hessian_type;
        Ok(())
    }

    /// Loads \\(H\\), row-major \\(n \times n\\).
    pub fn set_h(&mut self, h: &[L::F]) -> QpResult
    {
        self.base.set_h(h)
    }

    pub fn set_g(&mut self, g: &[L::F]) -> QpResult
    {
        QpBase::<L>::load(&mut self.base.g, g, self.base.par.infty, "g")
    }

    pub fn set_lb(&mut self, lb: &[L::F]) -> QpResult
    {
        self.base.set_bounds(Some(lb), None)
    }

    pub fn set_ub(&mut self, ub: &[L::F]) -> QpResult
    {
        self.base.set_bounds(None, Some(ub))
    }

    /// Loads \\(l_b\\) and \\(u_b\\); fails with [`QpError::SetupBoundFailed`] if some \\(l_b > u_b\\).
    pub fn set_bounds(&mut self, lb: &[L::F], ub: &[L::F]) -> QpResult
    {
        self.base.set_bounds(Some(lb), Some(ub))
    }

    /// Solves the loaded QP from scratch.
    ///
    /// Returns the number of homotopy steps taken.
    /// * `max_wsr` is the budget of working-set recalculations.
    /// * `cb` is invoked once per homotopy step.
    pub fn init<C>(&mut self, max_wsr: usize, cb: C) -> QpResult<usize>
    where C: IterationCallback<L::F>
    {
        self.init_with_guess(max_wsr, None, None, cb)
    }

    /// Solves the loaded QP from scratch, starting from a guessed solution.
    ///
    /// * `x_guess` sets the bounds it lies on as initially active.
    /// * `y_guess` sets the bounds with nonzero multipliers as initially active.
    pub fn init_with_guess<C>(&mut self, max_wsr: usize, x_guess: Option<&[L::F]>, y_guess: Option<&[L::F]>, mut cb: C) -> QpResult<usize>
    where C: IterationCallback<L::F>
    {
        log::info!("----- Initializing");
        log::debug!("{:?}", self.base.par);

        let n = self.base.n;
        if x_guess.map_or(false, |v| v.len() != n) || y_guess.map_or(false, |v| v.len() != n) {
            log::error!("guess length mismatch");
            return Err(QpError::InvalidArguments);
        }

        self.reset();

        if let Err(e) = self.setup_auxiliary_qp(x_guess, y_guess) {
            log::error!("{}", e);
            self.base.status = QpStatus::NotInitialised;
            return Err(setup_error(e));
        }

        solve_homotopy(self, max_wsr, &mut cb).map_err(init_error)
    }

    /// Solves the loaded QP starting from the previous working set and factorization.
    pub fn hotstart<C>(&mut self, max_wsr: usize, mut cb: C) -> QpResult<usize>
    where C: IterationCallback<L::F>
    {
        match self.base.status {
            QpStatus::AuxiliaryQpSolved | QpStatus::HomotopyQpSolved | QpStatus::Solved => {},
            _ => {
                log::error!("{}", QpError::HotstartFailedAsQpNotInitialised);
                return Err(QpError::HotstartFailedAsQpNotInitialised);
            },
        }
        self.base.check_bounds()?;

        solve_homotopy(self, max_wsr, &mut cb)
    }

    /// Clears working set, factorization and solution.
    pub fn reset(&mut self)
    {
        self.base.reset();
    }

    //

    pub fn x(&self) -> &[L::F]
    {
        &self.base.x
    }

    pub fn y(&self) -> &[L::F]
    {
        &self.base.y
    }

    /// Objective value \\({1 \over 2} x^T H x + g^T x\\) of the loaded data.
    pub fn obj_val(&self) -> L::F
    {
        self.base.obj_val()
    }

    pub fn status(&self) -> QpStatus
    {
        self.base.status
    }

    pub fn hessian_type(&self) -> HessianType
    {
        self.base.hessian_type
    }

    pub fn bounds(&self) -> &Bounds
    {
        &self.base.bounds
    }

    pub fn n_v(&self) -> usize
    {
        self.base.n
    }

    pub fn n_fr(&self) -> usize
    {
        self.base.bounds.n_inactive()
    }

    pub fn n_fx(&self) -> usize
    {
        self.base.bounds.n_active()
    }

    pub fn is_initialised(&self) -> bool
    {
        self.base.status != QpStatus::NotInitialised
    }

    pub fn is_solved(&self) -> bool
    {
        self.base.status == QpStatus::Solved
    }

    pub fn is_infeasible(&self) -> bool
    {
        self.base.infeasible
    }

    pub fn is_unbounded(&self) -> bool
    {
        self.base.unbounded
    }

    /// Maximum violation of the KKT conditions by the stored solution.
    pub fn kkt_violation(&self) -> L::F
    {
        let b = &self.base;
        kkt_violation::<L>(b.n, 0, &b.h, &b.g, &[], &b.lb, &b.ub, &[], &[], &b.x, &b.y)
    }

    /// Checks the stored solution against the KKT conditions.
    ///
    /// Fails with [`QpError::InaccurateSolution`] or [`QpError::NoSolution`].
    pub fn check_kkt(&self) -> QpResult
    {
        kkt_result(self.kkt_violation(), self.base.par.eps_kkt)
    }

    //

    fn setup_auxiliary_qp(&mut self, x_guess: Option<&[L::F]>, y_guess: Option<&[L::F]>) -> QpResult
    {
        let b = &mut self.base;
        b.status = QpStatus::PreparingAuxiliaryQp;

        b.setup_auxiliary_bounds(x_guess, y_guess)?;

        let n_fr = b.fr.len();
        if b.h_identity {
            b.chol.identity(n_fr);
        }
        else {
            let QpBase { h, fr, chol, par, n, .. } = &mut *b;
            let n = *n;
            chol.factorize(n_fr, |i, j| h[fr[i] * n + fr[j]], par.eps_pd)
                .map_err(|_| QpError::InitFailedCholesky)?;
        }

        b.setup_auxiliary_data();

        b.status = QpStatus::AuxiliaryQpSolved;
        log::debug!("auxiliary QP: {} free, {} fixed", n_fr, b.bounds.n_active());
        Ok(())
    }

    fn add_bound(&mut self, i: usize, side: SubjectToStatus) -> QpResult
    {
        let b = &mut self.base;

        let p = b.fr.iter().position(|&v| v == i).ok_or(QpError::AddBoundFailed)?;
        b.bounds.activate(i, side).map_err(|_| QpError::AddBoundFailed)?;
        b.chol.remove_column(p);
        b.fr.remove(p);
        Ok(())
    }

    fn remove_bound(&mut self, i: usize) -> QpResult
    {
        let b = &mut self.base;
        let n = b.n;
        let n_fr = b.fr.len();

        b.bounds.deactivate(i).map_err(|_| QpError::RemoveBoundFailed)?;

        for (p, &v) in b.fr.iter().enumerate() {
            b.wn[p] = b.h[v * n + i];
        }
        let r = b.chol.append(&mut b.wn[.. n_fr], b.h[i * n + i], b.par.eps_pd, b.par.eps_zero);
        if let Err(e) = r {
            return Err(b.append_error(e, QpError::RemoveBoundFailed));
        }
        b.fr.push(i);
        Ok(())
    }
}

impl<L: LinAlg> Homotopy for QProblemB<L>
where L::F: Float + Debug + LowerExp
{
    type L = L;

    fn base(&self) -> &QpBase<L>
    {
        &self.base
    }

    fn base_mut(&mut self) -> &mut QpBase<L>
    {
        &mut self.base
    }

    fn n_ac(&self) -> usize
    {
        0
    }

    fn determine_data_shift(&mut self)
    {
        self.base.determine_data_shift();
    }

    fn determine_step_direction(&mut self) -> QpResult
    {
        let b = &mut self.base;
        let n_fr = b.fr.len();

        b.fixed_direction();

        // R^T R dx_FR = -(H dx_FX + dg)_FR
        b.gradient_shift();
        for (p, &v) in b.fr.iter().enumerate() {
            b.wn[p] = -b.hv[v];
        }
        b.chol.solve_rt(&mut b.wn[.. n_fr], b.par.eps_zero)?;
        b.chol.solve_r(&mut b.wn[.. n_fr], b.par.eps_zero)?;
        for (p, &v) in b.fr.iter().enumerate() {
            b.dx[v] = b.wn[p];
        }

        b.gradient_shift();
        for &i in b.bounds.active() {
            b.dy[i] = b.hv[i];
        }

        log::trace!("dx: {:?}", b.dx);
        log::trace!("dy: {:?}", b.dy);
        Ok(())
    }

    fn determine_step_length(&self) -> (L::F, StepEvent)
    {
        let mut tau = L::F::one();
        let mut event = StepEvent::Full;

        self.base.step_length_bounds(&mut tau, &mut event);
        (tau, event)
    }

    fn perform_step(&mut self, tau: L::F, event: StepEvent)
    {
        self.base.perform_step(tau, event);
    }

    fn change_active_set(&mut self, event: StepEvent) -> QpResult
    {
        match event {
            StepEvent::AddBound(i, side) => self.add_bound(i, side),
            StepEvent::RemoveBound(i) => self.remove_bound(i),
            _ => Err(QpError::StepLengthDeterminationFailed),
        }
    }
}

//

#[test]
fn test_qproblemb1()
{
    use float_eq::assert_float_eq;
    use crate::NoCallback;

    type L = crate::FloatGeneric<f64>;

    let mut qp = QProblemB::<L>::new(2);
    qp.set_h(&[1., 0., 0., 1.]).unwrap();
    qp.set_g(&[-1., -1.]).unwrap();
    qp.set_bounds(&[0., 0.], &[0.3, 10.]).unwrap();

    let nwsr = qp.init(10, NoCallback).unwrap();
    assert!(nwsr <= 3);
    assert!(qp.is_solved());
    assert_float_eq!(qp.x(), [0.3, 1.].as_ref(), abs_all <= 1e-9);
    assert_float_eq!(qp.y(), [-0.7, 0.].as_ref(), abs_all <= 1e-9);
    assert_eq!(qp.bounds().status(0), SubjectToStatus::Upper);
    assert_eq!(qp.n_fx(), 1);
    qp.check_kkt().unwrap();
}

#[test]
fn test_qproblemb2()
{
    use float_eq::assert_float_eq;
    use crate::NoCallback;

    type L = crate::FloatGeneric<f64>;

    // non-diagonal Hessian, both bounds of x0 get visited
    let mut qp = QProblemB::<L>::new(3);
    qp.set_h(&[
        4., 1., 0.,
        1., 3., 1.,
        0., 1., 2.,
    ]).unwrap();
    qp.set_g(&[8., -3., 1.]).unwrap();
    qp.set_bounds(&[-1., -1., -1.], &[1., 1., 1.]).unwrap();

    qp.init(20, NoCallback).unwrap();
    qp.check_kkt().unwrap();
    let x = qp.x().to_vec();

    // same data again
    let nwsr = qp.hotstart(20, NoCallback).unwrap();
    assert_eq!(nwsr, 1);
    assert_float_eq!(qp.x(), x.as_ref(), abs_all <= 1e-12);

    // shift the gradient far
    qp.set_g(&[-8., 3., -1.]).unwrap();
    qp.hotstart(20, NoCallback).unwrap();
    qp.check_kkt().unwrap();
    assert_float_eq!(qp.x()[0], 1., abs <= 1e-9);
}

#[test]
fn test_qproblemb3()
{
    use crate::NoCallback;

    type L = crate::FloatGeneric<f64>;

    let mut qp = QProblemB::<L>::new(2);
    assert_eq!(qp.hotstart(10, NoCallback), Err(QpError::HotstartFailedAsQpNotInitialised));
    assert_eq!(qp.set_bounds(&[1., 1.], &[0., 0.]), Err(QpError::SetupBoundFailed));
    assert_eq!(qp.set_g(&[1.]), Err(QpError::InvalidArguments));

    // zero Hessian is not positive definite
    qp.set_bounds(&[-1., -1.], &[1., 1.]).unwrap();
    assert_eq!(qp.init(10, NoCallback), Err(QpError::InitFailedCholesky));

    qp.set_h(&[1., 0., 0., 1.]).unwrap();
    qp.init(10, NoCallback).unwrap();
    assert_eq!(qp.set_hessian_type(HessianType::Semidef), Err(QpError::QpAlreadyInitialised));
}
