use alloc::vec::Vec;
use crate::{QpError, QpResult};

/// Group of an index in [`IndexPartition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group
{
    Active,
    Inactive,
}

/// Partition of \\(\\{0,\ldots,n-1\\}\\) into an active and an inactive group.
///
/// All indices live in one slot array:
/// the active group occupies the physical slots `0.. n_active()`
/// and the inactive group the rest.
/// A logical-to-physical table gives constant-time membership and position lookups,
/// and a move between the groups is a single swap across the group boundary.
#[derive(Debug, Clone)]
pub struct IndexPartition
{
    slots: Vec<usize>,
    pos: Vec<usize>,
    n_active: usize,
    max_active: usize,
}

impl IndexPartition
{
    /// Creates a partition with every index inactive.
    ///
    /// * `n` is the number of indices.
    /// * `max_active` is the capacity of the active group.
    pub fn new(n: usize, max_active: usize) -> Self
    {
        assert!(max_active <= n);

        IndexPartition {
            slots: (0.. n).collect(),
            pos: (0.. n).collect(),
            n_active: 0,
            max_active,
        }
    }

    /// Moves every index back to the inactive group, in logical order.
    pub fn reset(&mut self)
    {
        for i in 0.. self.slots.len() {
            self.slots[i] = i;
            self.pos[i] = i;
        }
        self.n_active = 0;
    }

    pub fn len(&self) -> usize
    {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.slots.is_empty()
    }

    pub fn n_active(&self) -> usize
    {
        self.n_active
    }

    pub fn n_inactive(&self) -> usize
    {
        self.slots.len() - self.n_active
    }

    pub fn max_active(&self) -> usize
    {
        self.max_active
    }

    /// Active indices, in physical order.
    pub fn active(&self) -> &[usize]
    {
        &self.slots[.. self.n_active]
    }

    /// Inactive indices, in physical order.
    pub fn inactive(&self) -> &[usize]
    {
        &self.slots[self.n_active..]
    }

    /// Group of a logical index.
    pub fn contains(&self, i: usize) -> QpResult<Group>
    {
        if i >= self.pos.len() {
            return Err(QpError::IndexOutOfBounds);
        }

        if self.pos[i] < self.n_active {
            Ok(Group::Active)
        }
        else {
            Ok(Group::Inactive)
        }
    }

    /// Physical slot of a logical index.
    pub fn physical(&self, i: usize) -> QpResult<usize>
    {
        self.pos.get(i).copied().ok_or(QpError::IndexOutOfBounds)
    }

    pub fn move_to_active(&mut self, i: usize) -> QpResult
    {
        let p = self.physical(i)?;

        if p < self.n_active {
            return Err(QpError::IndexListMoveFailed);
        }
        if self.n_active >= self.max_active {
            return Err(QpError::IndexListExceedsMaxLength);
        }

        self.swap(p, self.n_active);
        self.n_active += 1;
        Ok(())
    }

    pub fn move_to_inactive(&mut self, i: usize) -> QpResult
    {
        let p = self.physical(i)?;

        if p >= self.n_active {
            return Err(QpError::IndexListMoveFailed);
        }

        self.n_active -= 1;
        self.swap(p, self.n_active);
        Ok(())
    }

    /// Verifies that the slot array and the logical-to-physical table describe the same permutation.
    pub fn check(&self) -> QpResult
    {
        let n = self.slots.len();

        if self.pos.len() != n || self.n_active > self.max_active {
            return Err(QpError::IndexListCorrupted);
        }

        for (p, &i) in self.slots.iter().enumerate() {
            if i >= n || self.pos[i] != p {
                return Err(QpError::IndexListCorrupted);
            }
        }
        Ok(())
    }

    fn swap(&mut self, p0: usize, p1: usize)
    {
        if p0 != p1 {
            let i0 = self.slots[p0];
            let i1 = self.slots[p1];
            self.slots[p0] = i1;
            self.slots[p1] = i0;
            self.pos[i1] = p0;
            self.pos[i0] = p1;
        }
    }
}

//

#[test]
fn test_index_partition1()
{
    let mut ip = IndexPartition::new(5, 3);

    assert_eq!(ip.n_active(), 0);
    assert_eq!(ip.inactive(), &[0, 1, 2, 3, 4]);

    ip.move_to_active(3).unwrap();
    ip.move_to_active(1).unwrap();
    assert_eq!(ip.active(), &[3, 1]);
    assert_eq!(ip.contains(1), Ok(Group::Active));
    assert_eq!(ip.contains(0), Ok(Group::Inactive));

    assert_eq!(ip.move_to_active(3), Err(QpError::IndexListMoveFailed));
    assert_eq!(ip.move_to_inactive(4), Err(QpError::IndexListMoveFailed));
    assert_eq!(ip.move_to_active(5), Err(QpError::IndexOutOfBounds));

    ip.move_to_active(4).unwrap();
    assert_eq!(ip.move_to_active(0), Err(QpError::IndexListExceedsMaxLength));

    ip.move_to_inactive(3).unwrap();
    assert_eq!(ip.n_active() + ip.n_inactive(), 5);
    assert_eq!(ip.contains(3), Ok(Group::Inactive));
    ip.check().unwrap();

    ip.reset();
    assert_eq!(ip.n_active(), 0);
    assert_eq!(ip.inactive(), &[0, 1, 2, 3, 4]);
}

#[test]
fn test_index_partition2()
{
    // pseudo random move sequence keeps the partition exact
    let n = 7;
    let mut ip = IndexPartition::new(n, n);
    let mut seed = 12345_usize;

    for _ in 0.. 200 {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345) % (1 << 31);
        let i = seed % n;
        let r = if ip.contains(i) == Ok(Group::Active) {
            ip.move_to_inactive(i)
        }
        else {
            ip.move_to_active(i)
        };
        assert!(r.is_ok());

        assert_eq!(ip.n_active() + ip.n_inactive(), n);
        ip.check().unwrap();

        let mut seen = [false; 7];
        for &j in ip.active().iter().chain(ip.inactive()) {
            assert!(!seen[j]);
            seen[j] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
