//! Resource handles and requirement sets.
//!
//! A resource models an exclusively-ownable piece of hardware or a logical
//! subsystem (a drivetrain, an arm, a shooter wheel). Resources carry no
//! behavior of their own; they exist so the scheduler can guarantee that at
//! most one command controls a given mechanism at any instant. Registration
//! happens once during robot setup via
//! [`Scheduler::register_resource`](crate::Scheduler::register_resource),
//! which hands back a cheap copyable [`ResourceId`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle for a resource registered with a scheduler.
///
/// Handles are only meaningful for the scheduler instance that issued them.
/// Each handle carries the issuing scheduler's token, so a handle minted by
/// one scheduler is rejected by every other instead of silently aliasing a
/// slot at the same index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub(crate) scheduler: u32,
    pub(crate) index: u32,
}

impl ResourceId {
    pub(crate) fn new(scheduler: u32, index: usize) -> Self {
        Self {
            scheduler,
            index: index as u32,
        }
    }

    /// Slot index of this resource inside its scheduler.
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({}/{})", self.scheduler, self.index)
    }
}

/// Immutable set of resources a command requires for its whole lifetime.
///
/// Stored sorted and deduplicated so conflict checks are a linear merge.
/// Requirement sets are fixed at command construction; group builders capture
/// the union of their children's sets once and never recompute it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequirementSet {
    ids: Vec<ResourceId>,
}

impl RequirementSet {
    /// Creates an empty requirement set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource to the set. Duplicates are ignored.
    pub(crate) fn insert(&mut self, id: ResourceId) {
        if let Err(pos) = self.ids.binary_search(&id) {
            self.ids.insert(pos, id);
        }
    }

    /// Merges another requirement set into this one.
    pub(crate) fn union_with(&mut self, other: &RequirementSet) {
        for id in other.iter() {
            self.insert(id);
        }
    }

    /// Whether the set contains `id`.
    pub fn contains(&self, id: ResourceId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// Whether the two sets share at least one resource.
    pub fn intersects(&self, other: &RequirementSet) -> bool {
        let (mut a, mut b) = (self.ids.iter().peekable(), other.ids.iter().peekable());
        while let (Some(x), Some(y)) = (a.peek(), b.peek()) {
            match x.cmp(y) {
                std::cmp::Ordering::Less => {
                    a.next();
                }
                std::cmp::Ordering::Greater => {
                    b.next();
                }
                std::cmp::Ordering::Equal => return true,
            }
        }
        false
    }

    /// Whether every resource in this set is also in `other`.
    pub fn is_subset_of(&self, other: &RequirementSet) -> bool {
        self.ids.iter().all(|id| other.contains(*id))
    }

    /// Iterates the resources in ascending handle order.
    pub fn iter(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.ids.iter().copied()
    }

    /// Number of resources in the set.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<ResourceId> for RequirementSet {
    fn from_iter<T: IntoIterator<Item = ResourceId>>(iter: T) -> Self {
        let mut set = RequirementSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}
