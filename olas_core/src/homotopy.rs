//! Homotopy between two quadratic programs

use num_traits::{Float, Zero, One};
use core::fmt::{Debug, Display, LowerExp};
use core::ops::ControlFlow;
use crate::{LinAlg, QpError, QpResult, QpStatus, SubjectToStatus};
use crate::qp_base::QpBase;

//

/// Solver parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct QpParam<F: Float>
{
    /// Tolerance below which a pivot or a denominator counts as zero.
    pub eps_zero: F,
    /// Tolerance of a new diagonal element of the Cholesky factor to be positive.
    pub eps_pd: F,
    /// Relative tolerance of linear dependence of a newly activated row.
    pub eps_lindep: F,
    /// Tolerance deciding an equality type and a guessed activity.
    pub eps_bound: F,
    /// Half width of the auxiliary box around the auxiliary solution.
    pub bound_relaxation: F,
    /// Magnitude treated as infinity in bound data.
    pub infty: F,
    /// Tolerance of KKT conditions accepted by solution analysis.
    pub eps_kkt: F,
}

impl<F: Float> Default for QpParam<F>
{
    fn default() -> Self
    {
        let ten = F::from(10).unwrap();

        QpParam {
            eps_zero: ten.powi(-16),
            eps_pd: ten.powi(-14),
            eps_lindep: ten.powi(-10),
            eps_bound: ten.powi(-10),
            bound_relaxation: ten.powi(3),
            infty: ten.powi(20),
            eps_kkt: ten.powi(-6),
        }
    }
}

//

/// Working-set change which ends a homotopy step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent
{
    /// The full remaining step reached the target QP.
    Full,
    /// Inactive bound reached its limit.
    AddBound(usize, SubjectToStatus),
    /// Multiplier of an active bound reached zero.
    RemoveBound(usize),
    /// Inactive constraint reached its limit.
    AddConstraint(usize, SubjectToStatus),
    /// Multiplier of an active constraint reached zero.
    RemoveConstraint(usize),
}

impl Display for StepEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self {
            StepEvent::Full                     => write!(f, "full step"),
            StepEvent::AddBound(i, s)           => write!(f, "add bound {} at {}", i, s),
            StepEvent::RemoveBound(i)           => write!(f, "remove bound {}", i),
            StepEvent::AddConstraint(i, s)      => write!(f, "add constraint {} at {}", i, s),
            StepEvent::RemoveConstraint(i)      => write!(f, "remove constraint {}", i),
        }
    }
}

/// Record handed to [`IterationCallback`] once per homotopy step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iteration<F>
{
    /// Iteration index within the current `init` or `hotstart` call.
    pub iter: usize,
    /// Solver status after the step.
    pub status: QpStatus,
    /// Step length taken, `1` for the full step.
    pub tau: F,
    /// Working-set change which ended the step.
    pub event: StepEvent,
    /// Number of free variables.
    pub n_fr: usize,
    /// Number of active constraints.
    pub n_ac: usize,
}

impl<F: LowerExp> Display for Iteration<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:4} | {:.3e} | {:3} | {:3} | {} ({})", self.iter, self.tau, self.n_fr, self.n_ac, self.event, self.status)
    }
}

/// Diagnostics callback invoked synchronously once per homotopy step.
///
/// Returning [`ControlFlow::Break`] aborts the solve with [`QpError::UserAbortRequested`].
pub trait IterationCallback<F>
{
    fn iteration(&mut self, it: &Iteration<F>) -> ControlFlow<()>;
}

impl<F, C> IterationCallback<F> for C
where C: FnMut(&Iteration<F>) -> ControlFlow<()>
{
    fn iteration(&mut self, it: &Iteration<F>) -> ControlFlow<()>
    {
        self(it)
    }
}

/// Callback doing nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCallback;

impl<F> IterationCallback<F> for NoCallback
{
    fn iteration(&mut self, _it: &Iteration<F>) -> ControlFlow<()>
    {
        ControlFlow::Continue(())
    }
}

/// Callback emitting each iteration through `log` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogIteration;

impl<F: LowerExp> IterationCallback<F> for LogIteration
{
    fn iteration(&mut self, it: &Iteration<F>) -> ControlFlow<()>
    {
        log::debug!("{}", it);
        ControlFlow::Continue(())
    }
}

//

/// One flavour of the online active set strategy.
///
/// The current data `g0`, `lb0`, `ub0` (and constraint bounds) of [`QpBase`] describe the QP
/// which the current solution and working set solve exactly.
/// Each step moves them along the straight line to the loaded data.
pub(crate) trait Homotopy
{
    type L: LinAlg;

    fn base(&self) -> &QpBase<Self::L>;
    fn base_mut(&mut self) -> &mut QpBase<Self::L>;

    fn n_ac(&self) -> usize;

    fn determine_data_shift(&mut self);
    fn determine_step_direction(&mut self) -> QpResult;
    fn determine_step_length(&self) -> (<Self::L as LinAlg>::F, StepEvent);
    fn perform_step(&mut self, tau: <Self::L as LinAlg>::F, event: StepEvent);
    fn change_active_set(&mut self, event: StepEvent) -> QpResult;
}

/// Runs homotopy steps until the loaded QP is solved or `max_wsr` steps are used.
///
/// Returns the number of steps on success.
/// A failure of a working-set change is fatal and drops the solver to [`QpStatus::NotInitialised`],
/// except a detected infeasibility that leaves the factorizations intact.
/// Any other failure leaves the last intermediate solution and working set in place.
pub(crate) fn solve_homotopy<H, C>(qp: &mut H, max_wsr: usize, cb: &mut C) -> QpResult<usize>
where H: Homotopy, C: IterationCallback<<H::L as LinAlg>::F>, <H::L as LinAlg>::F: Debug + LowerExp
{
    let f1 = <H::L as LinAlg>::F::one();

    log::info!("----- Homotopy");

    qp.base_mut().infeasible = false;
    qp.base_mut().unbounded = false;

    for i in 0.. max_wsr {
        let prev = qp.base().status;
        qp.base_mut().status = QpStatus::PerformingHomotopy;

        qp.determine_data_shift();

        if let Err(e) = qp.determine_step_direction() {
            log::error!("step direction: {}", e);
            // solution and factorizations are untouched
            qp.base_mut().status = match prev {
                QpStatus::Solved => QpStatus::HomotopyQpSolved,
                _ => prev,
            };
            return Err(QpError::StepDirectionDeterminationFailed);
        }

        let (tau, event) = qp.determine_step_length();
        if tau <= <H::L as LinAlg>::F::zero() {
            log::warn!("{}: zero step length", i);
        }

        qp.perform_step(tau, event);

        if event == StepEvent::Full {
            debug_assert!(tau == f1);
            qp.base_mut().status = QpStatus::Solved;

            let it = iteration(qp, i, tau, event);
            log::debug!("{}", it);
            // nothing is left to abort
            let _ = cb.iteration(&it);

            log::info!("----- Solved");
            log::trace!("x: {:?}", qp.base().x);
            log::trace!("y: {:?}", qp.base().y);
            return Ok(i + 1);
        }

        if let Err(e) = qp.change_active_set(event) {
            match e {
                QpError::AddBoundFailedInfeasibility | QpError::AddConstraintFailedInfeasibility => {
                    log::warn!("{}: {}", i, e);
                    if qp.base().status == QpStatus::PerformingHomotopy {
                        qp.base_mut().status = QpStatus::HomotopyQpSolved;
                    }
                    qp.base_mut().infeasible = true;
                    return Err(QpError::HotstartStoppedInfeasibility);
                },
                QpError::HotstartStoppedUnboundedness => {
                    log::warn!("{}: {}", i, e);
                    qp.base_mut().status = QpStatus::NotInitialised;
                    qp.base_mut().unbounded = true;
                    return Err(e);
                },
                _ => {
                    log::error!("{}: {}", i, e);
                    qp.base_mut().status = QpStatus::NotInitialised;
                    return Err(e);
                },
            }
        }

        qp.base_mut().status = QpStatus::HomotopyQpSolved;

        let it = iteration(qp, i, tau, event);
        log::debug!("{}", it);
        if cb.iteration(&it).is_break() {
            log::warn!("{}: {}", i, QpError::UserAbortRequested);
            return Err(QpError::UserAbortRequested);
        }
    }

    log::warn!("{}", QpError::MaxNwsrReached);
    Err(QpError::MaxNwsrReached)
}

fn iteration<H: Homotopy>(qp: &H, i: usize, tau: <H::L as LinAlg>::F, event: StepEvent) -> Iteration<<H::L as LinAlg>::F>
{
    let base = qp.base();

    Iteration {
        iter: i,
        status: base.status,
        tau,
        event,
        n_fr: base.bounds.n_inactive(),
        n_ac: qp.n_ac(),
    }
}

//

#[cfg(test)]
struct StubQp
{
    base: QpBase<crate::FloatGeneric<f64>>,
    direction_fails: bool,
}

#[cfg(test)]
impl Homotopy for StubQp
{
    type L = crate::FloatGeneric<f64>;

    fn base(&self) -> &QpBase<Self::L>
    {
        &self.base
    }

    fn base_mut(&mut self) -> &mut QpBase<Self::L>
    {
        &mut self.base
    }

    fn n_ac(&self) -> usize
    {
        0
    }

    fn determine_data_shift(&mut self) {}

    fn determine_step_direction(&mut self) -> QpResult
    {
        if self.direction_fails {Err(QpError::DivByZero)} else {Ok(())}
    }

    fn determine_step_length(&self) -> (f64, StepEvent)
    {
        (0.5, StepEvent::AddBound(0, SubjectToStatus::Lower))
    }

    fn perform_step(&mut self, _tau: f64, _event: StepEvent) {}

    fn change_active_set(&mut self, _event: StepEvent) -> QpResult
    {
        // working set already changed when infeasibility shows up
        self.base.status = QpStatus::NotInitialised;
        Err(QpError::AddBoundFailedInfeasibility)
    }
}

#[test]
fn test_homotopy1()
{
    let mut qp = StubQp {
        base: QpBase::new(1, 0),
        direction_fails: true,
    };

    qp.base.status = QpStatus::Solved;
    assert_eq!(solve_homotopy(&mut qp, 5, &mut NoCallback), Err(QpError::StepDirectionDeterminationFailed));
    assert_eq!(qp.base.status, QpStatus::HomotopyQpSolved);

    qp.base.status = QpStatus::AuxiliaryQpSolved;
    assert_eq!(solve_homotopy(&mut qp, 5, &mut NoCallback), Err(QpError::StepDirectionDeterminationFailed));
    assert_eq!(qp.base.status, QpStatus::AuxiliaryQpSolved);
}

#[test]
fn test_homotopy2()
{
    let mut qp = StubQp {
        base: QpBase::new(1, 0),
        direction_fails: false,
    };

    qp.base.status = QpStatus::Solved;
    assert_eq!(solve_homotopy(&mut qp, 5, &mut NoCallback), Err(QpError::HotstartStoppedInfeasibility));
    assert!(qp.base.infeasible);
    assert_eq!(qp.base.status, QpStatus::NotInitialised);
}
