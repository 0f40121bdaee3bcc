/// Solver errors.
///
/// Every non-successful outcome of the solvers and of their components.
/// `Ok` of [`QpResult`] is the only outcome with a usable solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QpError
{
    // generic
    /// At least one of the arguments is invalid.
    InvalidArguments,
    /// Index out of bounds.
    IndexOutOfBounds,
    /// Division by zero.
    DivByZero,
    /// Requested path is not yet implemented.
    NotYetImplemented,

    // index partition
    /// Index list exceeds its maximal length.
    IndexListExceedsMaxLength,
    /// Index list corrupted.
    IndexListCorrupted,
    /// Index is not a member of the group it is moved from.
    IndexListMoveFailed,

    // bounds and constraints
    /// Setting up a bound failed, typically an infeasible box.
    SetupBoundFailed,
    /// Setting up a constraint failed, typically an infeasible box.
    SetupConstraintFailed,
    /// Moving a bound between active and inactive failed.
    MovingBoundFailed,
    /// Moving a constraint between active and inactive failed.
    MovingConstraintFailed,
    /// Index is already of desired status.
    IndexAlreadyOfDesiredStatus,

    // lifecycle
    /// QP has already been initialised.
    QpAlreadyInitialised,
    /// Reset failed.
    ResetFailed,
    /// Initialisation failed.
    InitFailed,
    /// Initialisation failed due to the TQ factorisation.
    InitFailedTq,
    /// Initialisation failed due to the Cholesky decomposition.
    InitFailedCholesky,
    /// Initialisation failed while performing the homotopy.
    InitFailedHotstart,
    /// Initial QP could not be solved due to infeasibility.
    InitFailedInfeasibility,
    /// Initial QP could not be solved due to unboundedness.
    InitFailedUnboundedness,
    /// Failed to setup the working set of the auxiliary QP.
    SetupWorkingSetFailed,
    /// Unable to perform the homotopy as the previous QP is not solved.
    HotstartFailedAsQpNotInitialised,

    // homotopy step
    /// Determination of the step direction failed.
    StepDirectionDeterminationFailed,
    /// Determination of the step length failed.
    StepLengthDeterminationFailed,
    /// Addition of a bound to the working set failed.
    AddBoundFailed,
    /// Addition of a bound to the working set failed due to infeasibility.
    AddBoundFailedInfeasibility,
    /// Addition of a constraint to the working set failed.
    AddConstraintFailed,
    /// Addition of a constraint to the working set failed due to infeasibility.
    AddConstraintFailedInfeasibility,
    /// Removal of a bound from the working set failed.
    RemoveBoundFailed,
    /// Removal of a constraint from the working set failed.
    RemoveConstraintFailed,
    /// Premature homotopy termination because the QP is infeasible.
    HotstartStoppedInfeasibility,
    /// Premature homotopy termination because the QP is unbounded.
    HotstartStoppedUnboundedness,
    /// Maximum number of working set recalculations performed.
    MaxNwsrReached,
    /// User requested early termination.
    UserAbortRequested,

    // numerical
    /// Projected Hessian matrix not positive definite.
    HessianNotSpd,
    /// Unable to calculate new matrix factorisations.
    MatrixFactorisationFailed,
    /// Linear dependence of the working set could not be resolved, QP probably infeasible.
    EnsureLiFailedNoIndex,
    /// Abnormal termination of the linear independence check due to the TQ factorisation.
    EnsureLiFailedTq,

    // solution analysis
    /// QP solution does not satisfy KKT optimality conditions.
    NoSolution,
    /// KKT optimality conditions not satisfied to sufficient accuracy.
    InaccurateSolution,
}

/// `Result` whose `Ok` is the only successful return of the solvers.
pub type QpResult<T = ()> = Result<T, QpError>;

impl core::fmt::Display for QpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", match &self {
            QpError::InvalidArguments                 => "InvalidArguments: at least one of the arguments is invalid",
            QpError::IndexOutOfBounds                 => "IndexOutOfBounds: index out of bounds",
            QpError::DivByZero                        => "DivByZero: division by zero",
            QpError::NotYetImplemented                => "NotYetImplemented: requested path is not yet implemented",
            QpError::IndexListExceedsMaxLength        => "IndexListExceedsMaxLength: index list exceeds its maximal length",
            QpError::IndexListCorrupted               => "IndexListCorrupted: index list corrupted",
            QpError::IndexListMoveFailed              => "IndexListMoveFailed: index is not a member of the source group",
            QpError::SetupBoundFailed                 => "SetupBoundFailed: setting up bound failed",
            QpError::SetupConstraintFailed            => "SetupConstraintFailed: setting up constraint failed",
            QpError::MovingBoundFailed                => "MovingBoundFailed: moving bound between index sets failed",
            QpError::MovingConstraintFailed           => "MovingConstraintFailed: moving constraint between index sets failed",
            QpError::IndexAlreadyOfDesiredStatus      => "IndexAlreadyOfDesiredStatus: index is already of desired status",
            QpError::QpAlreadyInitialised             => "QpAlreadyInitialised: QP has already been initialised",
            QpError::ResetFailed                      => "ResetFailed: reset failed",
            QpError::InitFailed                       => "InitFailed: initialisation failed",
            QpError::InitFailedTq                     => "InitFailedTq: initialisation failed due to TQ factorisation",
            QpError::InitFailedCholesky               => "InitFailedCholesky: initialisation failed due to Cholesky decomposition",
            QpError::InitFailedHotstart               => "InitFailedHotstart: initialisation failed, QP could not be solved",
            QpError::InitFailedInfeasibility          => "InitFailedInfeasibility: initial QP could not be solved due to infeasibility",
            QpError::InitFailedUnboundedness          => "InitFailedUnboundedness: initial QP could not be solved due to unboundedness",
            QpError::SetupWorkingSetFailed            => "SetupWorkingSetFailed: failed to setup working set for auxiliary QP",
            QpError::HotstartFailedAsQpNotInitialised => "HotstartFailedAsQpNotInitialised: unable to perform homotopy as previous QP is not solved",
            QpError::StepDirectionDeterminationFailed => "StepDirectionDeterminationFailed: determination of step direction failed",
            QpError::StepLengthDeterminationFailed    => "StepLengthDeterminationFailed: determination of step length failed",
            QpError::AddBoundFailed                   => "AddBoundFailed: addition of bound to working set failed",
            QpError::AddBoundFailedInfeasibility      => "AddBoundFailedInfeasibility: addition of bound to working set failed due to infeasibility",
            QpError::AddConstraintFailed              => "AddConstraintFailed: addition of constraint to working set failed",
            QpError::AddConstraintFailedInfeasibility => "AddConstraintFailedInfeasibility: addition of constraint to working set failed due to infeasibility",
            QpError::RemoveBoundFailed                => "RemoveBoundFailed: removal of bound from working set failed",
            QpError::RemoveConstraintFailed           => "RemoveConstraintFailed: removal of constraint from working set failed",
            QpError::HotstartStoppedInfeasibility     => "HotstartStoppedInfeasibility: premature homotopy termination because QP is infeasible",
            QpError::HotstartStoppedUnboundedness     => "HotstartStoppedUnboundedness: premature homotopy termination because QP is unbounded",
            QpError::MaxNwsrReached                   => "MaxNwsrReached: maximum number of working set recalculations performed",
            QpError::UserAbortRequested               => "UserAbortRequested: user requested early termination",
            QpError::HessianNotSpd                    => "HessianNotSpd: projected Hessian matrix not positive definite",
            QpError::MatrixFactorisationFailed        => "MatrixFactorisationFailed: unable to calculate new matrix factorisations",
            QpError::EnsureLiFailedNoIndex            => "EnsureLiFailedNoIndex: no index found, QP probably infeasible",
            QpError::EnsureLiFailedTq                 => "EnsureLiFailedTq: abnormal termination due to TQ factorisation",
            QpError::NoSolution                       => "NoSolution: QP solution does not satisfy KKT optimality conditions",
            QpError::InaccurateSolution               => "InaccurateSolution: KKT optimality conditions not satisfied to sufficient accuracy",
        })
    }
}

//

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "std")]
impl std::error::Error for QpError {}
