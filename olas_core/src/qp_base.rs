use alloc::vec::Vec;
use core::marker::PhantomData;
use num_traits::{Float, Zero, One};
use crate::{LinAlg, QpError, QpResult, QpParam, QpStatus, HessianType, StepEvent};
use crate::{Bounds, SubjectToType, SubjectToStatus, Cholesky};

/// State shared by [`crate::QProblemB`] and [`crate::QProblem`]:
/// Hessian, gradient and bounds with their homotopy counterparts, solution,
/// bound working set and Cholesky factor.
///
/// `g0`, `lb0`, `ub0` are the data of the QP which `x`, `y` and the working set currently solve.
pub(crate) struct QpBase<L: LinAlg>
{
    ph_l: PhantomData<L>,

    pub(crate) par: QpParam<L::F>,
    pub(crate) status: QpStatus,
    pub(crate) infeasible: bool,
    pub(crate) unbounded: bool,
    pub(crate) hessian_type: HessianType,
    pub(crate) h_identity: bool,

    pub(crate) n: usize,
    pub(crate) m: usize,

    pub(crate) h: Vec<L::F>,
    pub(crate) g: Vec<L::F>,
    pub(crate) lb: Vec<L::F>,
    pub(crate) ub: Vec<L::F>,

    pub(crate) g0: Vec<L::F>,
    pub(crate) lb0: Vec<L::F>,
    pub(crate) ub0: Vec<L::F>,

    pub(crate) x: Vec<L::F>,
    pub(crate) y: Vec<L::F>,

    pub(crate) dx: Vec<L::F>,
    pub(crate) dy: Vec<L::F>,
    pub(crate) dg: Vec<L::F>,
    pub(crate) dlb: Vec<L::F>,
    pub(crate) dub: Vec<L::F>,

    pub(crate) hv: Vec<L::F>,
    pub(crate) wn: Vec<L::F>,
    pub(crate) wn2: Vec<L::F>,

    pub(crate) bounds: Bounds,
    pub(crate) chol: Cholesky<L>,
    /// Free variables in the order of the factorization.
    pub(crate) fr: Vec<usize>,
}

impl<L: LinAlg> QpBase<L>
{
    pub(crate) fn new(n: usize, m: usize) -> Self
    {
        let f0 = L::F::zero();
        let par = QpParam::default();
        let infty = par.infty;

        QpBase {
            ph_l: PhantomData,
            par,
            status: QpStatus::NotInitialised,
            infeasible: false,
            unbounded: false,
            hessian_type: HessianType::Posdef,
            h_identity: false,
            n,
            m,
            h: alloc::vec![f0; n * n],
            g: alloc::vec![f0; n],
            lb: alloc::vec![-infty; n],
            ub: alloc::vec![infty; n],
            g0: alloc::vec![f0; n],
            lb0: alloc::vec![f0; n],
            ub0: alloc::vec![f0; n],
            x: alloc::vec![f0; n],
            y: alloc::vec![f0; n + m],
            dx: alloc::vec![f0; n],
            dy: alloc::vec![f0; n + m],
            dg: alloc::vec![f0; n],
            dlb: alloc::vec![f0; n],
            dub: alloc::vec![f0; n],
            hv: alloc::vec![f0; n],
            wn: alloc::vec![f0; n],
            wn2: alloc::vec![f0; n],
            bounds: Bounds::new(n, n),
            chol: Cholesky::new(n),
            fr: Vec::with_capacity(n),
        }
    }

    /// Returns to [`QpStatus::NotInitialised`] without touching the loaded data.
    pub(crate) fn reset(&mut self)
    {
        let f0 = L::F::zero();

        self.status = QpStatus::NotInitialised;
        self.infeasible = false;
        self.unbounded = false;
        self.bounds.reset();
        self.chol.reset();
        self.fr.clear();
        L::scale(f0, &mut self.x);
        L::scale(f0, &mut self.y);
    }

    //

    /// Copies `src` to `dst` with infinite values clamped to `±infty`.
    pub(crate) fn load(dst: &mut[L::F], src: &[L::F], infty: L::F, what: &str) -> QpResult
    {
        if dst.len() != src.len() {
            log::error!("{}: length {} given, {} expected", what, src.len(), dst.len());
            return Err(QpError::InvalidArguments);
        }

        for (d, s) in dst.iter_mut().zip(src) {
            *d = s.max(-infty).min(infty);
        }
        Ok(())
    }

    pub(crate) fn set_h(&mut self, h: &[L::F]) -> QpResult
    {
        if h.len() != self.h.len() {
            log::error!("H: length {} given, {} expected", h.len(), self.h.len());
            return Err(QpError::InvalidArguments);
        }

        L::copy(h, &mut self.h);
        if self.status != QpStatus::NotInitialised {
            log::info!("H changed, re-initialization required");
            self.status = QpStatus::NotInitialised;
        }
        Ok(())
    }

    pub(crate) fn set_bounds(&mut self, lb: Option<&[L::F]>, ub: Option<&[L::F]>) -> QpResult
    {
        let infty = self.par.infty;

        for v in [lb, ub].iter().flatten() {
            if v.len() != self.n {
                log::error!("bounds: length {} given, {} expected", v.len(), self.n);
                return Err(QpError::InvalidArguments);
            }
        }
        if let (Some(lb), Some(ub)) = (lb, ub) {
            if lb.iter().zip(ub).any(|(l, u)| l > u) {
                log::error!("bounds: lower > upper");
                return Err(QpError::SetupBoundFailed);
            }
        }

        if let Some(lb) = lb {
            Self::load(&mut self.lb, lb, infty, "lb")?;
        }
        if let Some(ub) = ub {
            Self::load(&mut self.ub, ub, infty, "ub")?;
        }
        Ok(())
    }

    /// `out` = \\(H v\\).
    pub(crate) fn mul_h(n: usize, h: &[L::F], v: &[L::F], out: &mut[L::F])
    {
        L::transform_ge(false, n, n, L::F::one(), h, v, L::F::zero(), out);
    }

    pub(crate) fn is_identity_h(&self) -> bool
    {
        let f0 = L::F::zero();
        let f1 = L::F::one();

        for r in 0.. self.n {
            for c in 0.. self.n {
                let e = if r == c {f1} else {f0};
                if self.h[r * self.n + c] != e {
                    return false;
                }
            }
        }
        true
    }

    pub(crate) fn obj_val(&self) -> L::F
    {
        let n = self.n;
        let f2 = L::F::one() + L::F::one();

        let mut v = L::F::zero();
        for i in 0.. n {
            let hx = L::inner_prod(&self.h[i * n.. (i + 1) * n], &self.x);
            v = v + self.x[i] * (hx / f2 + self.g[i]);
        }
        v
    }

    /// Maps a failure of appending to the Cholesky factor.
    pub(crate) fn append_error(&self, e: QpError, removal: QpError) -> QpError
    {
        match e {
            QpError::HessianNotSpd if self.hessian_type == HessianType::Semidef => {
                QpError::HotstartStoppedUnboundedness
            },
            QpError::HessianNotSpd => e,
            _ => removal,
        }
    }

    //

    /// Initial working-set status of an entity of the auxiliary QP.
    ///
    /// * `v` is the guessed value of the variable or of the constraint row, if guessed.
    /// * `yv` is the guessed multiplier, if guessed.
    pub(crate) fn guess_status(par: &QpParam<L::F>, kind: SubjectToType, lo: L::F, up: L::F, v: Option<L::F>, yv: Option<L::F>) -> SubjectToStatus
    {
        let lo_finite = lo > -par.infty;
        let up_finite = up < par.infty;

        match kind {
            SubjectToType::Equality => SubjectToStatus::Lower,
            SubjectToType::Unbounded | SubjectToType::Unknown => SubjectToStatus::Inactive,
            SubjectToType::Bounded => {
                if let Some(v) = v {
                    if lo_finite && (v - lo).abs() <= par.eps_bound {
                        return SubjectToStatus::Lower;
                    }
                    if up_finite && (up - v).abs() <= par.eps_bound {
                        return SubjectToStatus::Upper;
                    }
                }
                if let Some(yv) = yv {
                    if lo_finite && yv > par.eps_zero {
                        return SubjectToStatus::Lower;
                    }
                    if up_finite && yv < -par.eps_zero {
                        return SubjectToStatus::Upper;
                    }
                }
                SubjectToStatus::Inactive
            },
        }
    }

    /// Limits of an entity of the auxiliary QP, relaxed around its value `v`.
    pub(crate) fn relax(par: &QpParam<L::F>, kind: SubjectToType, status: SubjectToStatus, v: L::F, lo: L::F, up: L::F) -> (L::F, L::F)
    {
        let infty = par.infty;
        let lo_relaxed = if lo > -infty {v - par.bound_relaxation} else {-infty};
        let up_relaxed = if up < infty {v + par.bound_relaxation} else {infty};

        match (kind, status) {
            (SubjectToType::Equality, _) => (v, v),
            (SubjectToType::Unbounded, _) | (SubjectToType::Unknown, _) => (-infty, infty),
            (_, SubjectToStatus::Lower) => (v, up_relaxed),
            (_, SubjectToStatus::Upper) => (lo_relaxed, v),
            _ => (lo_relaxed, up_relaxed),
        }
    }

    /// Sets up bound types and the bound working set of the auxiliary QP,
    /// and loads the guessed solution.
    pub(crate) fn setup_auxiliary_bounds(&mut self, x_guess: Option<&[L::F]>, y_guess: Option<&[L::F]>) -> QpResult
    {
        let f0 = L::F::zero();
        let n = self.n;

        for i in 0.. n {
            self.bounds.setup(i, self.lb[i], self.ub[i], self.par.eps_bound, self.par.infty)?;
        }

        match x_guess {
            Some(xg) => L::copy(xg, &mut self.x),
            None => L::scale(f0, &mut self.x),
        }
        match y_guess {
            Some(yg) => L::copy(yg, &mut self.y),
            None => L::scale(f0, &mut self.y),
        }

        for i in 0.. n {
            let kind = self.bounds.kind(i);
            let v = x_guess.map(|xg| xg[i]);
            let yv = y_guess.map(|yg| yg[i]);
            let mut side = Self::guess_status(&self.par, kind, self.lb[i], self.ub[i], v, yv);

            if self.hessian_type == HessianType::Semidef && side == SubjectToStatus::Inactive && kind == SubjectToType::Bounded {
                side = if self.lb[i] > -self.par.infty {SubjectToStatus::Lower} else {SubjectToStatus::Upper};
            }

            if side.is_active() {
                self.bounds.activate(i, side).map_err(|_| QpError::SetupWorkingSetFailed)?;
            }
        }

        // guessed values of fixed variables are taken as they are
        for i in 0.. n {
            match self.bounds.status(i) {
                SubjectToStatus::Lower => self.y[i] = self.y[i].max(f0),
                SubjectToStatus::Upper => self.y[i] = self.y[i].min(f0),
                _ => self.y[i] = f0,
            }
            if self.bounds.kind(i) == SubjectToType::Equality {
                self.y[i] = y_guess.map_or(f0, |yg| yg[i]);
            }
        }

        self.fr.clear();
        self.fr.extend_from_slice(self.bounds.inactive());

        self.h_identity = self.hessian_type == HessianType::Identity
            || (self.hessian_type != HessianType::Semidef && self.is_identity_h());
        if self.h_identity {
            log::debug!("identity Hessian");
        }

        Ok(())
    }

    /// Sets the bound part of the auxiliary data:
    /// relaxed bounds and \\(g_0 = y_B - H x\\).
    pub(crate) fn setup_auxiliary_data(&mut self)
    {
        let n = self.n;

        Self::mul_h(n, &self.h, &self.x, &mut self.g0);
        L::scale(-L::F::one(), &mut self.g0);
        L::add(L::F::one(), &self.y[.. n], &mut self.g0);

        for i in 0.. n {
            let (l, u) = Self::relax(&self.par, self.bounds.kind(i), self.bounds.status(i), self.x[i], self.lb[i], self.ub[i]);
            self.lb0[i] = l;
            self.ub0[i] = u;
        }
    }

    //

    pub(crate) fn determine_data_shift(&mut self)
    {
        for i in 0.. self.n {
            self.dg[i] = self.g[i] - self.g0[i];
            self.dlb[i] = self.lb[i] - self.lb0[i];
            self.dub[i] = self.ub[i] - self.ub0[i];
        }
    }

    /// Sets `dx` of fixed variables to the shift of their active bounds, zero otherwise.
    pub(crate) fn fixed_direction(&mut self)
    {
        L::scale(L::F::zero(), &mut self.dx);
        L::scale(L::F::zero(), &mut self.dy);

        for &i in self.bounds.active() {
            self.dx[i] = match self.bounds.status(i) {
                SubjectToStatus::Upper => self.dub[i],
                _ => self.dlb[i],
            };
        }
    }

    /// `hv` = \\(H\Delta x + \Delta g\\).
    pub(crate) fn gradient_shift(&mut self)
    {
        Self::mul_h(self.n, &self.h, &self.dx, &mut self.hv);
        L::add(L::F::one(), &self.dg, &mut self.hv);
    }

    /// Ratio test over the bounds.
    ///
    /// Lowers `tau` and sets `event` for each bound blocking strictly earlier.
    pub(crate) fn step_length_bounds(&self, tau: &mut L::F, event: &mut StepEvent)
    {
        let f0 = L::F::zero();
        let eps = self.par.eps_zero;

        for i in 0.. self.n {
            let kind = self.bounds.kind(i);

            match self.bounds.status(i) {
                SubjectToStatus::Lower if kind != SubjectToType::Equality => {
                    if self.dy[i] < -eps {
                        let t = (self.y[i] / -self.dy[i]).max(f0);
                        if t < *tau {
                            *tau = t;
                            *event = StepEvent::RemoveBound(i);
                        }
                    }
                },
                SubjectToStatus::Upper if kind != SubjectToType::Equality => {
                    if self.dy[i] > eps {
                        let t = (-self.y[i] / self.dy[i]).max(f0);
                        if t < *tau {
                            *tau = t;
                            *event = StepEvent::RemoveBound(i);
                        }
                    }
                },
                SubjectToStatus::Inactive if kind != SubjectToType::Unbounded => {
                    let d = self.dx[i] - self.dlb[i];
                    if d < -eps && self.bounds.has_side(i, SubjectToStatus::Lower) {
                        let t = ((self.x[i] - self.lb0[i]) / -d).max(f0);
                        if t < *tau {
                            *tau = t;
                            *event = StepEvent::AddBound(i, SubjectToStatus::Lower);
                        }
                    }

                    let d = self.dub[i] - self.dx[i];
                    if d < -eps && self.bounds.has_side(i, SubjectToStatus::Upper) {
                        let t = ((self.ub0[i] - self.x[i]) / -d).max(f0);
                        if t < *tau {
                            *tau = t;
                            *event = StepEvent::AddBound(i, SubjectToStatus::Upper);
                        }
                    }
                },
                _ => {},
            }
        }
    }

    /// Moves solution and bound data by `tau` along the step direction.
    pub(crate) fn perform_step(&mut self, tau: L::F, event: StepEvent)
    {
        let f0 = L::F::zero();

        L::add(tau, &self.dx, &mut self.x);
        L::add(tau, &self.dy, &mut self.y);

        if event == StepEvent::Full {
            L::copy(&self.g, &mut self.g0);
            L::copy(&self.lb, &mut self.lb0);
            L::copy(&self.ub, &mut self.ub0);
        }
        else {
            L::add(tau, &self.dg, &mut self.g0);
            L::add(tau, &self.dlb, &mut self.lb0);
            L::add(tau, &self.dub, &mut self.ub0);
        }

        match event {
            StepEvent::AddBound(i, SubjectToStatus::Upper) => self.x[i] = self.ub0[i],
            StepEvent::AddBound(i, _) => self.x[i] = self.lb0[i],
            StepEvent::RemoveBound(i) => self.y[i] = f0,
            StepEvent::RemoveConstraint(i) => self.y[self.n + i] = f0,
            _ => {},
        }
    }

    /// Verifies the loaded bounds before a hot start.
    pub(crate) fn check_bounds(&self) -> QpResult
    {
        if self.lb.iter().zip(&self.ub).any(|(l, u)| l > u) {
            log::error!("bounds: lower > upper");
            return Err(QpError::SetupBoundFailed);
        }
        Ok(())
    }
}

/// Maps a failure of the homotopy from the auxiliary QP.
pub(crate) fn init_error(e: QpError) -> QpError
{
    match e {
        QpError::HotstartStoppedInfeasibility => QpError::InitFailedInfeasibility,
        QpError::HotstartStoppedUnboundedness => QpError::InitFailedUnboundedness,
        QpError::MaxNwsrReached | QpError::UserAbortRequested | QpError::HessianNotSpd => e,
        _ => QpError::InitFailedHotstart,
    }
}

/// Maps a failure of setting up the auxiliary QP.
pub(crate) fn setup_error(e: QpError) -> QpError
{
    match e {
        QpError::SetupBoundFailed | QpError::SetupConstraintFailed | QpError::SetupWorkingSetFailed
        | QpError::InitFailedCholesky | QpError::InitFailedTq => e,
        _ => QpError::InitFailed,
    }
}
