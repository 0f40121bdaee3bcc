use alloc::vec::Vec;
use core::marker::PhantomData;
use num_traits::Float;
use crate::{QpError, QpResult, IndexPartition, Group, SubjectToType, SubjectToStatus};

/// Capability of the entities a [`SubjectTo`] manages.
pub trait SubjectToKind
{
    /// `true` if an entity owns a row of the constraint matrix,
    /// `false` if it limits a single variable.
    const HAS_ROW: bool;
    /// Name used in log messages.
    const NAME: &'static str;
    /// Error of an infeasible or repeated setup.
    const SETUP_FAILED: QpError;
    /// Error of a move the entity does not allow.
    const MOVING_FAILED: QpError;
    /// Error of a failed addition to the working set.
    const ADD_FAILED: QpError;
    /// Error of a failed addition due to infeasibility.
    const ADD_FAILED_INFEASIBILITY: QpError;
    /// Error of a failed removal from the working set.
    const REMOVE_FAILED: QpError;
}

/// Simple bounds on variables.
#[derive(Debug, Clone)]
pub struct BoundKind;

impl SubjectToKind for BoundKind
{
    const HAS_ROW: bool = false;
    const NAME: &'static str = "bound";
    const SETUP_FAILED: QpError = QpError::SetupBoundFailed;
    const MOVING_FAILED: QpError = QpError::MovingBoundFailed;
    const ADD_FAILED: QpError = QpError::AddBoundFailed;
    const ADD_FAILED_INFEASIBILITY: QpError = QpError::AddBoundFailedInfeasibility;
    const REMOVE_FAILED: QpError = QpError::RemoveBoundFailed;
}

/// General linear constraints.
#[derive(Debug, Clone)]
pub struct ConstraintKind;

impl SubjectToKind for ConstraintKind
{
    const HAS_ROW: bool = true;
    const NAME: &'static str = "constraint";
    const SETUP_FAILED: QpError = QpError::SetupConstraintFailed;
    const MOVING_FAILED: QpError = QpError::MovingConstraintFailed;
    const ADD_FAILED: QpError = QpError::AddConstraintFailed;
    const ADD_FAILED_INFEASIBILITY: QpError = QpError::AddConstraintFailedInfeasibility;
    const REMOVE_FAILED: QpError = QpError::RemoveConstraintFailed;
}

//

/// Set of bounds or constraints: types, statuses and the active/inactive partition.
///
/// It holds classification only, no numerical data.
/// For [`Bounds`] the active group is the set of fixed variables and the inactive group the free ones.
#[derive(Debug, Clone)]
pub struct SubjectTo<K: SubjectToKind>
{
    ph_k: PhantomData<K>,
    kinds: Vec<SubjectToType>,
    status: Vec<SubjectToStatus>,
    // finite (lower, upper)
    finite: Vec<(bool, bool)>,
    part: IndexPartition,
}

/// Bounds over variables.
pub type Bounds = SubjectTo<BoundKind>;

/// Constraints over rows of the constraint matrix.
pub type Constraints = SubjectTo<ConstraintKind>;

impl<K: SubjectToKind> SubjectTo<K>
{
    /// Creates `n` unclassified entities, at most `max_active` of which can be active at once.
    pub fn new(n: usize, max_active: usize) -> Self
    {
        SubjectTo {
            ph_k: PhantomData,
            kinds: alloc::vec![SubjectToType::Unknown; n],
            status: alloc::vec![SubjectToStatus::Undefined; n],
            finite: alloc::vec![(false, false); n],
            part: IndexPartition::new(n, max_active),
        }
    }

    /// Returns every entity to unclassified and inactive.
    pub fn reset(&mut self)
    {
        for k in self.kinds.iter_mut() {
            *k = SubjectToType::Unknown;
        }
        for s in self.status.iter_mut() {
            *s = SubjectToStatus::Undefined;
        }
        for f in self.finite.iter_mut() {
            *f = (false, false);
        }
        self.part.reset();
    }

    /// Classifies entity `i` from its limits and makes it inactive.
    ///
    /// Limits at or beyond `infty` in magnitude count as infinite;
    /// limits closer than `eps_bound` make an equality.
    pub fn setup<F: Float>(&mut self, i: usize, lower: F, upper: F, eps_bound: F, infty: F) -> QpResult<SubjectToType>
    {
        if i >= self.len() {
            return Err(QpError::IndexOutOfBounds);
        }
        if self.kinds[i] != SubjectToType::Unknown {
            log::error!("{} {} is already set up", K::NAME, i);
            return Err(K::SETUP_FAILED);
        }
        if lower > upper {
            log::error!("{} {} has an infeasible box", K::NAME, i);
            return Err(K::SETUP_FAILED);
        }

        let kind = if lower <= -infty && upper >= infty {
            SubjectToType::Unbounded
        }
        else if upper - lower < eps_bound {
            SubjectToType::Equality
        }
        else {
            SubjectToType::Bounded
        };

        self.kinds[i] = kind;
        self.status[i] = SubjectToStatus::Inactive;
        self.finite[i] = (lower > -infty, upper < infty);
        Ok(kind)
    }

    /// Moves entity `i` to the active group at `side`.
    ///
    /// An equality is always recorded as [`SubjectToStatus::Lower`].
    /// A side whose limit was infinite at setup cannot be activated.
    pub fn activate(&mut self, i: usize, side: SubjectToStatus) -> QpResult
    {
        if i >= self.len() {
            return Err(QpError::IndexOutOfBounds);
        }
        if !side.is_active() {
            return Err(QpError::InvalidArguments);
        }

        let side = match self.kinds[i] {
            SubjectToType::Unbounded | SubjectToType::Unknown => return Err(K::MOVING_FAILED),
            SubjectToType::Equality => SubjectToStatus::Lower,
            SubjectToType::Bounded => {
                if !self.has_side(i, side) {
                    log::error!("{} {} has no finite limit at {}", K::NAME, i, side);
                    return Err(K::MOVING_FAILED);
                }
                side
            },
        };

        if self.status[i].is_active() {
            return Err(QpError::IndexAlreadyOfDesiredStatus);
        }

        self.part.move_to_active(i).map_err(|_| K::MOVING_FAILED)?;
        self.status[i] = side;
        Ok(())
    }

    /// Moves entity `i` to the inactive group.
    pub fn deactivate(&mut self, i: usize) -> QpResult
    {
        if i >= self.len() {
            return Err(QpError::IndexOutOfBounds);
        }
        if !self.status[i].is_active() {
            return Err(QpError::IndexAlreadyOfDesiredStatus);
        }

        self.part.move_to_inactive(i).map_err(|_| K::MOVING_FAILED)?;
        self.status[i] = SubjectToStatus::Inactive;
        Ok(())
    }

    /// Status of entity `i`, [`SubjectToStatus::Undefined`] if out of range.
    pub fn status(&self, i: usize) -> SubjectToStatus
    {
        self.status.get(i).copied().unwrap_or(SubjectToStatus::Undefined)
    }

    /// Type of entity `i`, [`SubjectToType::Unknown`] if out of range.
    pub fn kind(&self, i: usize) -> SubjectToType
    {
        self.kinds.get(i).copied().unwrap_or(SubjectToType::Unknown)
    }

    pub fn is_active(&self, i: usize) -> bool
    {
        self.status(i).is_active()
    }

    /// `true` if entity `i` had a finite limit at `side` when set up.
    pub fn has_side(&self, i: usize, side: SubjectToStatus) -> bool
    {
        match (self.finite.get(i), side) {
            (Some(&(lo, _)), SubjectToStatus::Lower) => lo,
            (Some(&(_, up)), SubjectToStatus::Upper) => up,
            _ => false,
        }
    }

    pub fn len(&self) -> usize
    {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.kinds.is_empty()
    }

    pub fn n_active(&self) -> usize
    {
        self.part.n_active()
    }

    pub fn n_inactive(&self) -> usize
    {
        self.part.n_inactive()
    }

    /// Number of entities of type `kind`.
    pub fn n_of_kind(&self, kind: SubjectToType) -> usize
    {
        self.kinds.iter().filter(|&&k| k == kind).count()
    }

    /// Active entities, in partition order.
    pub fn active(&self) -> &[usize]
    {
        self.part.active()
    }

    /// Inactive entities, in partition order.
    pub fn inactive(&self) -> &[usize]
    {
        self.part.inactive()
    }

    pub fn partition(&self) -> &IndexPartition
    {
        &self.part
    }

    /// Verifies the partition and that exactly the active entities carry an active status.
    pub fn check(&self) -> QpResult
    {
        self.part.check()?;

        for i in 0.. self.len() {
            let in_active = self.part.contains(i)? == Group::Active;
            if in_active != self.status[i].is_active() {
                return Err(QpError::IndexListCorrupted);
            }
        }
        Ok(())
    }
}

//

#[test]
fn test_subject_to1()
{
    let mut b = Bounds::new(4, 4);

    assert_eq!(b.setup(0, 0., 10., 1e-10, 1e20), Ok(SubjectToType::Bounded));
    assert_eq!(b.setup(1, 2., 2., 1e-10, 1e20), Ok(SubjectToType::Equality));
    assert_eq!(b.setup(2, -1e20, 1e20, 1e-10, 1e20), Ok(SubjectToType::Unbounded));
    assert_eq!(b.setup(3, 1., 0., 1e-10, 1e20), Err(QpError::SetupBoundFailed));
    assert_eq!(b.setup(0, 0., 1., 1e-10, 1e20), Err(QpError::SetupBoundFailed));

    b.activate(0, SubjectToStatus::Upper).unwrap();
    assert_eq!(b.status(0), SubjectToStatus::Upper);
    assert_eq!(b.activate(0, SubjectToStatus::Lower), Err(QpError::IndexAlreadyOfDesiredStatus));

    b.activate(1, SubjectToStatus::Upper).unwrap();
    assert_eq!(b.status(1), SubjectToStatus::Lower);

    assert_eq!(b.activate(2, SubjectToStatus::Lower), Err(QpError::MovingBoundFailed));
    assert_eq!(b.activate(3, SubjectToStatus::Lower), Err(QpError::MovingBoundFailed));

    assert_eq!(b.n_active(), 2);
    assert_eq!(b.n_active() + b.n_inactive(), 4);
    b.check().unwrap();

    b.deactivate(0).unwrap();
    assert_eq!(b.status(0), SubjectToStatus::Inactive);
    assert_eq!(b.deactivate(0), Err(QpError::IndexAlreadyOfDesiredStatus));
    b.check().unwrap();
}

#[test]
fn test_subject_to2()
{
    let mut c = Constraints::new(3, 1);

    c.setup(0, -1., 1., 1e-10, 1e20).unwrap();
    c.setup(1, -1., 1., 1e-10, 1e20).unwrap();

    c.activate(0, SubjectToStatus::Lower).unwrap();
    assert_eq!(c.activate(1, SubjectToStatus::Lower), Err(QpError::MovingConstraintFailed));
    assert_eq!(c.status(1), SubjectToStatus::Inactive);
    assert_eq!(c.activate(0, SubjectToStatus::Inactive), Err(QpError::InvalidArguments));
    assert_eq!(c.n_of_kind(SubjectToType::Unknown), 1);

    c.reset();
    assert_eq!(c.n_active(), 0);
    assert_eq!(c.status(0), SubjectToStatus::Undefined);
    assert_eq!(c.n_of_kind(SubjectToType::Unknown), 3);
}

#[test]
fn test_subject_to3()
{
    let mut c = Constraints::new(3, 3);

    // one-sided limits
    assert_eq!(c.setup(0, -1e20, 1., 1e-10, 1e20), Ok(SubjectToType::Bounded));
    assert_eq!(c.setup(1, 0., 1e20, 1e-10, 1e20), Ok(SubjectToType::Bounded));

    assert!(!c.has_side(0, SubjectToStatus::Lower));
    assert!(c.has_side(0, SubjectToStatus::Upper));
    assert_eq!(c.activate(0, SubjectToStatus::Lower), Err(QpError::MovingConstraintFailed));
    assert_eq!(c.activate(1, SubjectToStatus::Upper), Err(QpError::MovingConstraintFailed));
    assert_eq!(c.n_active(), 0);

    c.activate(0, SubjectToStatus::Upper).unwrap();
    c.activate(1, SubjectToStatus::Lower).unwrap();
    assert_eq!(c.n_active(), 2);
    c.check().unwrap();

    // queries out of range
    assert_eq!(c.status(3), SubjectToStatus::Undefined);
    assert_eq!(c.kind(3), SubjectToType::Unknown);
    assert!(!c.is_active(3));
    assert!(!c.has_side(3, SubjectToStatus::Upper));
}
