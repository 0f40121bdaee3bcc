//! General QP solver

use alloc::vec::Vec;
use num_traits::{Float, Zero, One};
use core::fmt::{Debug, LowerExp};
use crate::{LinAlg, QpError, QpResult, QpParam, QpStatus, HessianType};
use crate::{Bounds, Constraints, SubjectToKind, BoundKind, ConstraintKind, SubjectToType, SubjectToStatus};
use crate::{StepEvent, IterationCallback, Tq};
use crate::homotopy::{Homotopy, solve_homotopy};
use crate::qp_base::{QpBase, init_error, setup_error};
use crate::kkt::{kkt_violation, kkt_result};

/// Online active set solver of a QP with simple bounds and general linear constraints.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// \\[
/// \begin{array}{ll}
/// {\rm minimize} & {1 \over 2} x^T H x + g^T x \\\\
/// {\rm subject \ to} & l_b \le x \le u_b \\\\
/// & l_{bA} \le A x \le u_{bA}
/// \end{array}
/// \\]
///
/// - variables \\(x \in \mathbb{R}^n\\)
/// - \\(H \in \mathcal{S}\_{+}^n\\), \\(g \in \mathbb{R}^n\\), \\(l_b, u_b \in \mathbb{R}^n\\)
/// - \\(A \in \mathbb{R}^{m \times n}\\), \\(l_{bA}, u_{bA} \in \mathbb{R}^m\\)
///
/// The multipliers \\(y = (y_B, y_C) \in \mathbb{R}^{n+m}\\) satisfy \\(H x + g = y_B + A^T y_C\\),
/// nonnegative at active lower sides and nonpositive at active upper sides.
///
/// A [`Tq`] factorization of the active rows and the Cholesky factor of the projected Hessian
/// \\(Z^T H_{\rm FR} Z = R^T R\\) are updated by Givens rotations per working-set change.
pub struct QProblem<L: LinAlg>
{
    base: QpBase<L>,

    a: Vec<L::F>,
    lba: Vec<L::F>,
    uba: Vec<L::F>,
    lba0: Vec<L::F>,
    uba0: Vec<L::F>,
    ax: Vec<L::F>,
    dax: Vec<L::F>,
    dlba: Vec<L::F>,
    duba: Vec<L::F>,

    constraints: Constraints,
    tq: Tq<L>,
    /// Active constraints in row order of T.
    ac: Vec<usize>,

    wt: Vec<L::F>,
    wt2: Vec<L::F>,
    xi: Vec<L::F>,
    hz: Vec<L::F>,
}

impl<L: LinAlg> QProblem<L>
where L::F: Float + Debug + LowerExp
{
    /// Creates an instance for `n` variables and `m` constraints.
    ///
    /// All storage is allocated here.
    pub fn new(n: usize, m: usize) -> Self
    {
        let f0 = L::F::zero();
        let base = QpBase::new(n, m);
        let infty = base.par.infty;
        let size_t = n.min(m);

        QProblem {
            base,
            a: alloc::vec![f0; m * n],
            lba: alloc::vec![-infty; m],
            uba: alloc::vec![infty; m],
            lba0: alloc::vec![f0; m],
            uba0: alloc::vec![f0; m],
            ax: alloc::vec![f0; m],
            dax: alloc::vec![f0; m],
            dlba: alloc::vec![f0; m],
            duba: alloc::vec![f0; m],
            constraints: Constraints::new(m, size_t),
            tq: Tq::new(n, m),
            ac: Vec::with_capacity(size_t),
            wt: alloc::vec![f0; size_t],
            wt2: alloc::vec![f0; size_t],
            xi: alloc::vec![f0; n + m],
            hz: alloc::vec![f0; n * n],
        }
    }

    /// Changes solver parameters.
    ///
    /// Returns [`QProblem`] with its parameters changed.
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

    /// Loads \\(A\\), row-major \\(m \times n\\).
    pub fn set_a(&mut self, a: &[L::F]) -> QpResult
    {
        if a.len() != self.a.len() {
            log::error!("A: length {} given, {} expected", a.len(), self.a.len());
            return Err(QpError::InvalidArguments);
        }

        L::copy(a, &mut self.a);
        if self.base.status != QpStatus::NotInitialised {
            log::info!("A changed, re-initialization required");
            self.base.status = QpStatus::NotInitialised;
        }
        Ok(())
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

    pub fn set_lba(&mut self, lba: &[L::F]) -> QpResult
    {
        QpBase::<L>::load(&mut self.lba, lba, self.base.par.infty, "lbA")
    }

    pub fn set_uba(&mut self, uba: &[L::F]) -> QpResult
    {
        QpBase::<L>::load(&mut self.uba, uba, self.base.par.infty, "ubA")
    }

    /// Loads \\(l_{bA}\\) and \\(u_{bA}\\); fails with [`QpError::SetupConstraintFailed`] if some \\(l_{bA} > u_{bA}\\).
    pub fn set_constraint_bounds(&mut self, lba: &[L::F], uba: &[L::F]) -> QpResult
    {
        let m = self.base.m;
        if lba.len() != m || uba.len() != m {
            log::error!("constraint bounds: length {}/{} given, {} expected", lba.len(), uba.len(), m);
            return Err(QpError::InvalidArguments);
        }
        if lba.iter().zip(uba).any(|(l, u)| l > u) {
            log::error!("constraint bounds: lower > upper");
            return Err(QpError::SetupConstraintFailed);
        }

        self.set_lba(lba)?;
        self.set_uba(uba)
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
    /// * `x_guess` sets the bounds and constraints it lies on as initially active.
    /// * `y_guess` sets the bounds and constraints with nonzero multipliers as initially active.
    ///
    /// Guessed constraints linearly dependent on the others are left inactive.
    pub fn init_with_guess<C>(&mut self, max_wsr: usize, x_guess: Option<&[L::F]>, y_guess: Option<&[L::F]>, mut cb: C) -> QpResult<usize>
    where C: IterationCallback<L::F>
    {
        log::info!("----- Initializing");
        log::debug!("{:?}", self.base.par);

        let n = self.base.n;
        let m = self.base.m;
        if x_guess.map_or(false, |v| v.len() != n) || y_guess.map_or(false, |v| v.len() != n + m) {
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

    /// Solves the loaded QP starting from the previous working set and factorizations.
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
        if self.lba.iter().zip(&self.uba).any(|(l, u)| l > u) {
            log::error!("constraint bounds: lower > upper");
            return Err(QpError::SetupConstraintFailed);
        }

        solve_homotopy(self, max_wsr, &mut cb)
    }

    /// Clears working sets, factorizations and solution.
    pub fn reset(&mut self)
    {
        self.base.reset();
        self.constraints.reset();
        self.tq.reset(0);
        self.ac.clear();
        L::scale(L::F::zero(), &mut self.ax);
    }

    //

    pub fn x(&self) -> &[L::F]
    {
        &self.base.x
    }

    /// Multipliers, bounds first then constraints.
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

    pub fn constraints(&self) -> &Constraints
    {
        &self.constraints
    }

    pub fn n_v(&self) -> usize
    {
        self.base.n
    }

    pub fn n_c(&self) -> usize
    {
        self.base.m
    }

    pub fn n_fr(&self) -> usize
    {
        self.base.bounds.n_inactive()
    }

    pub fn n_fx(&self) -> usize
    {
        self.base.bounds.n_active()
    }

    pub fn n_ac(&self) -> usize
    {
        self.constraints.n_active()
    }

    pub fn n_iac(&self) -> usize
    {
        self.constraints.n_inactive()
    }

    /// Dimension of the null space of the active rows on the free variables.
    pub fn n_z(&self) -> usize
    {
        self.tq.n_z()
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
        kkt_violation::<L>(b.n, b.m, &b.h, &b.g, &self.a, &b.lb, &b.ub, &self.lba, &self.uba, &b.x, &b.y)
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
        let f0 = L::F::zero();
        let f1 = L::F::one();
        let n = self.base.n;
        let m = self.base.m;

        self.base.status = QpStatus::PreparingAuxiliaryQp;

        for i in 0.. m {
            self.constraints.setup(i, self.lba[i], self.uba[i], self.base.par.eps_bound, self.base.par.infty)?;
        }
        self.base.setup_auxiliary_bounds(x_guess, y_guess)?;

        L::transform_ge(true, n, m, f1, &self.a, &self.base.x, f0, &mut self.ax);
        self.tq.reset(self.base.fr.len());

        for i in 0.. m {
            let kind = self.constraints.kind(i);
            let v = x_guess.map(|_| self.ax[i]);
            let yv = y_guess.map(|yg| yg[n + i]);
            let side = QpBase::<L>::guess_status(&self.base.par, kind, self.lba[i], self.uba[i], v, yv);

            if side.is_active() {
                if self.prepare_constraint(i) && self.ac.len() < self.tq.size_t() {
                    self.append_constraint(i, side, false).map_err(|_| QpError::SetupWorkingSetFailed)?;
                }
                else if kind == SubjectToType::Equality {
                    log::error!("equality constraint {} is linearly dependent", i);
                    return Err(QpError::SetupWorkingSetFailed);
                }
                else {
                    log::debug!("guessed constraint {} is linearly dependent, left inactive", i);
                }
            }
        }

        for i in 0.. m {
            let y = &mut self.base.y[n + i];
            match self.constraints.status(i) {
                SubjectToStatus::Lower => *y = (*y).max(f0),
                SubjectToStatus::Upper => *y = (*y).min(f0),
                _ => *y = f0,
            }
            if self.constraints.kind(i) == SubjectToType::Equality {
                *y = y_guess.map_or(f0, |yg| yg[n + i]);
            }
        }

        self.factorize_projected_hessian().map_err(|_| QpError::InitFailedCholesky)?;

        self.base.setup_auxiliary_data();
        L::transform_ge(false, n, m, f1, &self.a, &self.base.y[n..], f1, &mut self.base.g0);
        for i in 0.. m {
            let (l, u) = QpBase::<L>::relax(&self.base.par, self.constraints.kind(i), self.constraints.status(i), self.ax[i], self.lba[i], self.uba[i]);
            self.lba0[i] = l;
            self.uba0[i] = u;
        }

        self.base.status = QpStatus::AuxiliaryQpSolved;
        log::debug!("auxiliary QP: {} free, {} fixed, {} active", self.base.fr.len(), self.base.bounds.n_active(), self.ac.len());
        Ok(())
    }

    // R^T R = Z^T H_FR Z from scratch
    fn factorize_projected_hessian(&mut self) -> QpResult
    {
        let n = self.base.n;
        let n_fr = self.base.fr.len();
        let n_z = self.tq.n_z();

        if self.base.h_identity {
            self.base.chol.identity(n_z);
            return Ok(());
        }

        let QpBase { h, fr, chol, par, .. } = &mut self.base;
        let tq = &self.tq;
        let hz = &mut self.hz;

        for p in 0.. n_fr {
            for k in 0.. n_z {
                let mut s = L::F::zero();
                for q in 0.. n_fr {
                    s = s + h[fr[p] * n + fr[q]] * tq.q(q, k);
                }
                hz[p * n + k] = s;
            }
        }

        let hz = &*hz;
        chol.factorize(n_z, |i, j| {
            let mut s = L::F::zero();
            for p in 0.. n_fr {
                s = s + tq.q(p, i) * hz[p * n + j];
            }
            s
        }, par.eps_pd)
    }

    //

    /// Computes \\(a^T Q\\) of constraint `i` into `wn2`.
    ///
    /// Returns `true` if the row is linearly independent of the active set.
    fn prepare_constraint(&mut self, i: usize) -> bool
    {
        let n = self.base.n;
        let b = &mut self.base;
        let n_fr = b.fr.len();

        for (p, &v) in b.fr.iter().enumerate() {
            b.wn[p] = self.a[i * n + v];
        }
        self.tq.row_times_q(&b.wn[.. n_fr], &mut b.wn2[.. n_fr]);

        let n_z = self.tq.n_z();
        if n_z == 0 {
            return false;
        }

        let norm_wz = L::norm(&b.wn2[.. n_z]);
        let norm_a = L::norm(&b.wn[.. n_fr]);
        norm_wz > b.par.eps_lindep * norm_a.max(L::F::one())
    }

    /// Activates constraint `i` prepared by [`QProblem::prepare_constraint`].
    fn append_constraint(&mut self, i: usize, side: SubjectToStatus, update_chol: bool) -> QpResult
    {
        let b = &mut self.base;
        let n_fr = b.fr.len();

        self.constraints.activate(i, side).map_err(|_| QpError::AddConstraintFailed)?;

        if update_chol {
            self.tq.concentrate(&mut b.wn2[.. n_fr], Some(&mut b.chol));
            b.chol.drop_last();
        }
        else {
            self.tq.concentrate(&mut b.wn2[.. n_fr], None);
        }
        self.tq.append_row(&b.wn2[.. n_fr]);
        self.ac.push(i);
        Ok(())
    }

    /// Moves free variable `k` to the last row of \\(Q\\) and copies that row into `wn2`.
    ///
    /// Returns `true` if fixing `k` keeps the active set linearly independent.
    fn prepare_bound(&mut self, k: usize) -> QpResult<bool>
    {
        let b = &mut self.base;
        let n_fr = b.fr.len();

        let p = b.fr.iter().position(|&v| v == k).ok_or(QpError::AddBoundFailed)?;
        let last = n_fr - 1;
        self.tq.swap_rows(p, last);
        b.fr.swap(p, last);
        self.tq.q_row(last, &mut b.wn2[.. n_fr]);

        let n_z = self.tq.n_z();
        Ok(n_z > 0 && L::norm(&b.wn2[.. n_z]) > b.par.eps_lindep)
    }

    /// Fixes variable `k` prepared by [`QProblem::prepare_bound`].
    fn append_bound(&mut self, k: usize, side: SubjectToStatus) -> QpResult
    {
        let b = &mut self.base;
        let n_fr = b.fr.len();

        b.bounds.activate(k, side).map_err(|_| QpError::AddBoundFailed)?;

        self.tq.concentrate(&mut b.wn2[.. n_fr], Some(&mut b.chol));
        b.chol.drop_last();
        self.tq.remove_last_row();
        b.fr.pop();
        Ok(())
    }

    fn add_constraint(&mut self, i: usize, side: SubjectToStatus) -> QpResult
    {
        // wn2 must hold a^T Q of this row even when T is full
        let li = self.prepare_constraint(i);

        if li && self.ac.len() < self.tq.size_t() {
            self.append_constraint(i, side, true)
        }
        else {
            self.add_ensure_li::<ConstraintKind>(i, side)
        }
    }

    fn add_bound(&mut self, k: usize, side: SubjectToStatus) -> QpResult
    {
        if self.prepare_bound(k)? {
            self.append_bound(k, side)
        }
        else {
            self.add_ensure_li::<BoundKind>(k, side)
        }
    }

    fn remove_constraint(&mut self, i: usize) -> QpResult
    {
        let p = self.ac.iter().position(|&v| v == i).ok_or(QpError::RemoveConstraintFailed)?;
        self.constraints.deactivate(i).map_err(|_| QpError::RemoveConstraintFailed)?;

        self.tq.remove_row(p);
        self.ac.remove(p);

        self.append_z_column(QpError::RemoveConstraintFailed)
    }

    fn remove_bound(&mut self, k: usize) -> QpResult
    {
        let n = self.base.n;
        let n_ac = self.ac.len();

        self.base.bounds.deactivate(k).map_err(|_| QpError::RemoveBoundFailed)?;

        for (c, &i) in self.ac.iter().enumerate() {
            self.wt[c] = self.a[i * n + k];
        }
        self.tq.append_free_row(&mut self.wt[.. n_ac]);
        self.base.fr.push(k);

        self.append_z_column(QpError::RemoveBoundFailed)
    }

    // extends R by the last column z of Z
    fn append_z_column(&mut self, removal: QpError) -> QpResult
    {
        let n = self.base.n;
        let n_z = self.tq.n_z();
        let j = n_z - 1;
        let b = &mut self.base;
        let n_fr = b.fr.len();

        self.tq.q_col(j, &mut b.wn[.. n_fr]);
        for (p, &u) in b.fr.iter().enumerate() {
            let mut s = L::F::zero();
            for (q, &v) in b.fr.iter().enumerate() {
                s = s + b.h[u * n + v] * b.wn[q];
            }
            b.wn2[p] = s;
        }
        let diag = L::inner_prod(&b.wn[.. n_fr], &b.wn2[.. n_fr]);

        for k in 0.. j {
            let mut s = L::F::zero();
            for p in 0.. n_fr {
                s = s + self.tq.q(p, k) * b.wn2[p];
            }
            b.hv[k] = s;
        }

        let r = b.chol.append(&mut b.hv[.. j], diag, b.par.eps_pd, b.par.eps_zero);
        r.map_err(|e| b.append_error(e, removal))
    }

    /// Adds bound or constraint `i` whose row depends linearly on the active set.
    ///
    /// The dependent row is a combination \\(\xi\\) of the active rows.
    /// Shifting the multipliers along \\(\xi\\) until one of them reaches zero
    /// keeps stationarity; that entity leaves the working set and `i` takes its place.
    fn add_ensure_li<K: SubjectToKind>(&mut self, i: usize, side: SubjectToStatus) -> QpResult
    {
        let n = self.base.n;
        let n_fr = self.base.fr.len();
        let n_ac = self.ac.len();
        let n_z = self.tq.n_z();
        let eps = self.base.par.eps_zero;

        log::debug!("{} {} is linearly dependent", K::NAME, i);

        // T^T xi_C = Y^T a_FR
        L::copy(&self.base.wn2[n_z.. n_fr], &mut self.wt[.. n_ac]);
        self.tq.solve_tt(&self.wt[.. n_ac], &mut self.wt2[.. n_ac], eps).map_err(|_| QpError::EnsureLiFailedTq)?;

        L::scale(L::F::zero(), &mut self.xi);
        for (c, &r) in self.ac.iter().enumerate() {
            self.xi[n + r] = self.wt2[c];
        }
        for &j in self.base.bounds.active() {
            let mut s = if K::HAS_ROW {self.a[i * n + j]} else {L::F::zero()};
            for (c, &r) in self.ac.iter().enumerate() {
                s = s - self.wt2[c] * self.a[r * n + j];
            }
            self.xi[j] = s;
        }

        let kind = if K::HAS_ROW {self.constraints.kind(i)} else {self.base.bounds.kind(i)};
        let dirs: &[bool] = if kind == SubjectToType::Equality {
            &[false, true]
        }
        else if side == SubjectToStatus::Upper {
            &[true]
        }
        else {
            &[false]
        };

        let mut found = None;
        for &flip in dirs {
            if let Some(cand) = self.ensure_li_candidate(flip) {
                found = Some((flip, cand));
                break;
            }
        }
        let (flip, (t, blocking)) = match found {
            Some(f) => f,
            None => {
                log::warn!("{}", QpError::EnsureLiFailedNoIndex);
                return Err(K::ADD_FAILED_INFEASIBILITY);
            },
        };

        let t_signed = if flip {-t} else {t};

        match blocking {
            StepEvent::RemoveBound(j) => self.remove_bound(j)?,
            StepEvent::RemoveConstraint(j) => self.remove_constraint(j)?,
            _ => return Err(K::ADD_FAILED_INFEASIBILITY),
        }

        let appended = if K::HAS_ROW {
            if self.prepare_constraint(i) && self.ac.len() < self.tq.size_t() {
                self.append_constraint(i, side, true)?;
                true
            }
            else {
                false
            }
        }
        else if self.prepare_bound(i)? {
            self.append_bound(i, side)?;
            true
        }
        else {
            false
        };

        if !appended {
            // the working set has lost an entity, nothing to resume from
            log::warn!("{} {} stays dependent after the exchange", K::NAME, i);
            self.base.status = QpStatus::NotInitialised;
            return Err(K::ADD_FAILED_INFEASIBILITY);
        }

        L::add(-t_signed, &self.xi, &mut self.base.y);
        match blocking {
            StepEvent::RemoveBound(j) => self.base.y[j] = L::F::zero(),
            StepEvent::RemoveConstraint(j) => self.base.y[n + j] = L::F::zero(),
            _ => {},
        }
        if K::HAS_ROW {
            self.base.y[n + i] = t_signed;
        }
        else {
            self.base.y[i] = t_signed;
        }
        Ok(())
    }

    // first active entity whose multiplier reaches zero along -t xi, t >= 0
    fn ensure_li_candidate(&self, flip: bool) -> Option<(L::F, StepEvent)>
    {
        let n = self.base.n;
        let f0 = L::F::zero();
        let b = &self.base;
        // coefficients at rounding level are not part of the dependency
        let eps = b.par.eps_lindep * L::norm(&self.xi).max(L::F::one());

        let ratio = |status: SubjectToStatus, yv: L::F, xv: L::F| -> Option<L::F> {
            let xv = if flip {-xv} else {xv};
            match status {
                SubjectToStatus::Lower if xv > eps => Some((yv / xv).max(f0)),
                SubjectToStatus::Upper if xv < -eps => Some((yv / xv).max(f0)),
                _ => None,
            }
        };

        let mut best: Option<(L::F, StepEvent)> = None;

        for j in 0.. n {
            if b.bounds.kind(j) == SubjectToType::Equality {
                continue;
            }
            if let Some(t) = ratio(b.bounds.status(j), b.y[j], self.xi[j]) {
                if best.map_or(true, |(tb, _)| t < tb) {
                    best = Some((t, StepEvent::RemoveBound(j)));
                }
            }
        }
        for j in 0.. b.m {
            if self.constraints.kind(j) == SubjectToType::Equality {
                continue;
            }
            if let Some(t) = ratio(self.constraints.status(j), b.y[n + j], self.xi[n + j]) {
                if best.map_or(true, |(tb, _)| t < tb) {
                    best = Some((t, StepEvent::RemoveConstraint(j)));
                }
            }
        }

        best
    }
}

impl<L: LinAlg> Homotopy for QProblem<L>
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
        self.ac.len()
    }

    fn determine_data_shift(&mut self)
    {
        self.base.determine_data_shift();

        for i in 0.. self.base.m {
            self.dlba[i] = self.lba[i] - self.lba0[i];
            self.duba[i] = self.uba[i] - self.uba0[i];
        }
    }

    fn determine_step_direction(&mut self) -> QpResult
    {
        let f0 = L::F::zero();
        let f1 = L::F::one();
        let n = self.base.n;
        let m = self.base.m;
        let n_fr = self.base.fr.len();
        let n_ac = self.ac.len();
        let n_z = self.tq.n_z();
        let eps = self.base.par.eps_zero;

        self.base.fixed_direction();
        let b = &mut self.base;

        // T dx_Y = dbA - A_FX dx_FX
        if n_ac > 0 {
            for (c, &i) in self.ac.iter().enumerate() {
                let db = match self.constraints.status(i) {
                    SubjectToStatus::Upper => self.duba[i],
                    _ => self.dlba[i],
                };
                self.wt[c] = db - L::inner_prod(&self.a[i * n.. (i + 1) * n], &b.dx);
            }
            self.tq.solve_t(&self.wt[.. n_ac], &mut self.wt2[.. n_ac], eps)?;

            for (p, &v) in b.fr.iter().enumerate() {
                let mut s = f0;
                for c in 0.. n_ac {
                    s = s + self.tq.q(p, n_z + c) * self.wt2[c];
                }
                b.dx[v] = b.dx[v] + s;
            }
        }

        // R^T R dx_Z = -Z^T (H dx + dg)_FR
        if n_z > 0 {
            b.gradient_shift();
            for k in 0.. n_z {
                let mut s = f0;
                for (p, &v) in b.fr.iter().enumerate() {
                    s = s + self.tq.q(p, k) * b.hv[v];
                }
                b.wn[k] = -s;
            }
            b.chol.solve_rt(&mut b.wn[.. n_z], eps)?;
            b.chol.solve_r(&mut b.wn[.. n_z], eps)?;

            for (p, &v) in b.fr.iter().enumerate() {
                let mut s = f0;
                for k in 0.. n_z {
                    s = s + self.tq.q(p, k) * b.wn[k];
                }
                b.dx[v] = b.dx[v] + s;
            }
        }

        // T^T dy_AC = Y^T (H dx + dg)_FR
        b.gradient_shift();
        if n_ac > 0 {
            for c in 0.. n_ac {
                let mut s = f0;
                for (p, &v) in b.fr.iter().enumerate() {
                    s = s + self.tq.q(p, n_z + c) * b.hv[v];
                }
                self.wt[c] = s;
            }
            self.tq.solve_tt(&self.wt[.. n_ac], &mut self.wt2[.. n_ac], eps)?;

            for (c, &i) in self.ac.iter().enumerate() {
                b.dy[n + i] = self.wt2[c];
            }
        }

        // dy_FX = (H dx + dg)_FX - A_AC,FX^T dy_AC
        for &j in b.bounds.active() {
            let mut s = b.hv[j];
            for (c, &i) in self.ac.iter().enumerate() {
                s = s - self.a[i * n + j] * self.wt2[c];
            }
            b.dy[j] = s;
        }

        L::transform_ge(true, n, m, f1, &self.a, &b.dx, f0, &mut self.dax);

        log::trace!("dx: {:?}", b.dx);
        log::trace!("dy: {:?}", b.dy);
        debug_assert!(n_fr == self.tq.n_fr());
        Ok(())
    }

    fn determine_step_length(&self) -> (L::F, StepEvent)
    {
        let f0 = L::F::zero();
        let n = self.base.n;
        let eps = self.base.par.eps_zero;
        let b = &self.base;

        let mut tau = L::F::one();
        let mut event = StepEvent::Full;

        b.step_length_bounds(&mut tau, &mut event);

        for i in 0.. b.m {
            let kind = self.constraints.kind(i);
            let y = b.y[n + i];
            let dy = b.dy[n + i];

            match self.constraints.status(i) {
                SubjectToStatus::Lower if kind != SubjectToType::Equality => {
                    if dy < -eps {
                        let t = (y / -dy).max(f0);
                        if t < tau {
                            tau = t;
                            event = StepEvent::RemoveConstraint(i);
                        }
                    }
                },
                SubjectToStatus::Upper if kind != SubjectToType::Equality => {
                    if dy > eps {
                        let t = (-y / dy).max(f0);
                        if t < tau {
                            tau = t;
                            event = StepEvent::RemoveConstraint(i);
                        }
                    }
                },
                SubjectToStatus::Inactive if kind != SubjectToType::Unbounded => {
                    let d = self.dax[i] - self.dlba[i];
                    if d < -eps && self.constraints.has_side(i, SubjectToStatus::Lower) {
                        let t = ((self.ax[i] - self.lba0[i]) / -d).max(f0);
                        if t < tau {
                            tau = t;
                            event = StepEvent::AddConstraint(i, SubjectToStatus::Lower);
                        }
                    }

                    let d = self.duba[i] - self.dax[i];
                    if d < -eps && self.constraints.has_side(i, SubjectToStatus::Upper) {
                        let t = ((self.uba0[i] - self.ax[i]) / -d).max(f0);
                        if t < tau {
                            tau = t;
                            event = StepEvent::AddConstraint(i, SubjectToStatus::Upper);
                        }
                    }
                },
                _ => {},
            }
        }

        (tau, event)
    }

    fn perform_step(&mut self, tau: L::F, event: StepEvent)
    {
        let n = self.base.n;
        let m = self.base.m;

        self.base.perform_step(tau, event);

        if event == StepEvent::Full {
            L::copy(&self.lba, &mut self.lba0);
            L::copy(&self.uba, &mut self.uba0);
        }
        else {
            L::add(tau, &self.dlba, &mut self.lba0);
            L::add(tau, &self.duba, &mut self.uba0);
        }

        L::transform_ge(true, n, m, L::F::one(), &self.a, &self.base.x, L::F::zero(), &mut self.ax);
    }

    fn change_active_set(&mut self, event: StepEvent) -> QpResult
    {
        match event {
            StepEvent::AddBound(i, side) => self.add_bound(i, side),
            StepEvent::RemoveBound(i) => self.remove_bound(i),
            StepEvent::AddConstraint(i, side) => self.add_constraint(i, side),
            StepEvent::RemoveConstraint(i) => self.remove_constraint(i),
            StepEvent::Full => Err(QpError::StepLengthDeterminationFailed),
        }
    }
}

//

#[test]
fn test_qproblem1()
{
    use float_eq::assert_float_eq;
    use crate::NoCallback;

    type L = crate::FloatGeneric<f64>;

    // min (x0-1)^2/2 + (x1-1)^2/2 s.t. x0 + x1 <= 1
    let mut qp = QProblem::<L>::new(2, 1);
    qp.set_h(&[1., 0., 0., 1.]).unwrap();
    qp.set_g(&[-1., -1.]).unwrap();
    qp.set_a(&[1., 1.]).unwrap();
    qp.set_bounds(&[-10., -10.], &[10., 10.]).unwrap();
    qp.set_constraint_bounds(&[-10.], &[1.]).unwrap();

    let nwsr = qp.init(10, NoCallback).unwrap();
    assert!(nwsr <= 3);
    assert_float_eq!(qp.x(), [0.5, 0.5].as_ref(), abs_all <= 1e-9);
    assert_float_eq!(qp.y(), [0., 0., -0.5].as_ref(), abs_all <= 1e-9);
    assert_eq!(qp.constraints().status(0), SubjectToStatus::Upper);
    assert_eq!(qp.n_z(), 1);
    qp.check_kkt().unwrap();
    assert_float_eq!(qp.obj_val(), -0.75, abs <= 1e-9);
}

#[test]
fn test_qproblem2()
{
    use float_eq::assert_float_eq;
    use crate::NoCallback;

    type L = crate::FloatGeneric<f64>;

    // equality constraint and an active bound share the solution
    let mut qp = QProblem::<L>::new(3, 1);
    qp.set_h(&[
        2., 0., 0.,
        0., 1., 0.,
        0., 0., 1.,
    ]).unwrap();
    qp.set_g(&[0., 0., -4.]).unwrap();
    qp.set_a(&[1., 1., 1.]).unwrap();
    qp.set_bounds(&[0., 0., 0.], &[5., 5., 2.]).unwrap();
    qp.set_constraint_bounds(&[3.], &[3.]).unwrap();

    qp.init(20, NoCallback).unwrap();
    qp.check_kkt().unwrap();
    assert_eq!(qp.constraints().kind(0), SubjectToType::Equality);
    assert_float_eq!(qp.x()[0] + qp.x()[1] + qp.x()[2], 3., abs <= 1e-9);
    assert_float_eq!(qp.x()[2], 2., abs <= 1e-9);

    // hot start with a moved right hand side
    qp.set_constraint_bounds(&[2.5], &[2.5]).unwrap();
    qp.hotstart(20, NoCallback).unwrap();
    qp.check_kkt().unwrap();
    assert_float_eq!(qp.x()[0] + qp.x()[1] + qp.x()[2], 2.5, abs <= 1e-9);
}

#[test]
fn test_qproblem3()
{
    use float_eq::assert_float_eq;
    use crate::NoCallback;

    type L = crate::FloatGeneric<f64>;

    // two parallel rows: the second one becomes active through linear dependence
    let mut qp = QProblem::<L>::new(2, 2);
    qp.set_h(&[1., 0., 0., 1.]).unwrap();
    qp.set_g(&[-2., -2.]).unwrap();
    qp.set_a(&[
        1., 1.,
        2., 2.,
    ]).unwrap();
    qp.set_bounds(&[-10., -10.], &[10., 10.]).unwrap();
    qp.set_constraint_bounds(&[-10., -10.], &[2., 4.]).unwrap();

    qp.init(20, NoCallback).unwrap();
    qp.check_kkt().unwrap();
    assert_float_eq!(qp.x(), [1., 1.].as_ref(), abs_all <= 1e-9);
    assert_eq!(qp.n_ac(), 1);

    // the first row gets tighter
    qp.set_constraint_bounds(&[-10., -10.], &[1., 4.]).unwrap();
    qp.hotstart(20, NoCallback).unwrap();
    qp.check_kkt().unwrap();
    assert_float_eq!(qp.x(), [0.5, 0.5].as_ref(), abs_all <= 1e-9);
}

#[test]
fn test_qproblem4()
{
    use crate::NoCallback;

    type L = crate::FloatGeneric<f64>;

    let mut qp = QProblem::<L>::new(2, 1);
    assert_eq!(qp.set_constraint_bounds(&[1.], &[0.]), Err(QpError::SetupConstraintFailed));
    assert_eq!(qp.set_a(&[1., 2., 3.]), Err(QpError::InvalidArguments));

    // infeasible: x0 + x1 >= 3 with x <= 1
    qp.set_h(&[1., 0., 0., 1.]).unwrap();
    qp.set_a(&[1., 1.]).unwrap();
    qp.set_bounds(&[-1., -1.], &[1., 1.]).unwrap();
    qp.set_constraint_bounds(&[3.], &[10.]).unwrap();
    assert_eq!(qp.init(20, NoCallback), Err(QpError::InitFailedInfeasibility));
    assert!(qp.is_infeasible());
}
