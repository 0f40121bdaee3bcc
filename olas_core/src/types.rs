use core::fmt::Display;

/// Solver status.
///
/// Progresses `NotInitialised` → `PreparingAuxiliaryQp` → `AuxiliaryQpSolved`
/// → `PerformingHomotopy` ⇄ `HomotopyQpSolved` → `Solved`.
/// A hot start re-enters at `PerformingHomotopy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QpStatus
{
    /// No working set nor factorization is available.
    NotInitialised,
    /// Building the auxiliary QP and its working set.
    PreparingAuxiliaryQp,
    /// The auxiliary QP is solved by construction.
    AuxiliaryQpSolved,
    /// Homotopy steps are in progress.
    PerformingHomotopy,
    /// An intermediate QP on the homotopy path is solved.
    HomotopyQpSolved,
    /// The loaded QP is solved.
    Solved,
}

impl Display for QpStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", match &self {
            QpStatus::NotInitialised       => "not-initialised",
            QpStatus::PreparingAuxiliaryQp => "preparing-auxiliary-QP",
            QpStatus::AuxiliaryQpSolved    => "auxiliary-QP-solved",
            QpStatus::PerformingHomotopy   => "performing-homotopy",
            QpStatus::HomotopyQpSolved     => "homotopy-QP-solved",
            QpStatus::Solved               => "solved",
        })
    }
}

//

/// Type of a bound or a constraint, derived from its lower and upper limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectToType
{
    /// Both limits are infinite.
    Unbounded,
    /// At least one limit is finite and the limits differ.
    Bounded,
    /// Both limits coincide.
    Equality,
    /// Not classified yet.
    Unknown,
}

/// Status of a bound or a constraint in the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectToStatus
{
    /// Not in the working set.
    Inactive,
    /// Active at its lower limit.
    Lower,
    /// Active at its upper limit.
    Upper,
    /// Not classified yet.
    Undefined,
}

impl SubjectToStatus
{
    pub fn is_active(&self) -> bool
    {
        matches!(self, SubjectToStatus::Lower | SubjectToStatus::Upper)
    }
}

impl Display for SubjectToStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", match &self {
            SubjectToStatus::Inactive  => "inactive",
            SubjectToStatus::Lower     => "lower",
            SubjectToStatus::Upper     => "upper",
            SubjectToStatus::Undefined => "undefined",
        })
    }
}

//

/// Known structure of the Hessian matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HessianType
{
    /// Positive semidefinite.
    Semidef,
    /// Positive definite on the null space of the active bounds and constraints.
    PosdefNullspace,
    /// Positive definite.
    Posdef,
    /// Identity matrix.
    Identity,
}
