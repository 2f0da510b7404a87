//! Group lock registry: at most one active effect per group.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::EffectHandle;
use crate::domain::{Group, InstanceId};

/// An instance asking to own a group.
#[derive(Debug, Clone)]
pub struct Occupant {
    pub instance: InstanceId,

    /// Arrival sequence assigned when the instance was spawned.
    pub arrival: u64,

    /// Used by the next occupant to cancel this one.
    pub handle: EffectHandle,
}

/// Result of [`GroupLockRegistry::acquire`].
#[derive(Debug)]
pub enum Acquire {
    /// The caller now owns the group. `previous` (if any) must be cancelled,
    /// and its completion awaited, before the caller's action runs.
    Granted { previous: Option<EffectHandle> },

    /// A newer arrival already took the group; the caller must not apply.
    Stale { newer: InstanceId },
}

#[derive(Debug, Default)]
struct Slot {
    occupant: Option<Occupant>,

    /// Highest arrival that has ever been granted this group.
    latest_arrival: Option<(u64, InstanceId)>,
}

/// Tracks which instance currently owns each group.
///
/// Design:
/// - All operations take one short critical section and never await.
/// - Slots are kept after release so arrival order survives an idle group.
#[derive(Debug, Default)]
pub struct GroupLockRegistry {
    slots: Mutex<HashMap<Group, Slot>>,
}

impl GroupLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<Group, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Swap `occupant` in and hand back whoever held the group.
    ///
    /// `None` group always succeeds without exclusion.
    pub fn acquire(&self, group: Option<&Group>, occupant: Occupant) -> Acquire {
        let Some(group) = group else {
            return Acquire::Granted { previous: None };
        };

        let mut slots = self.slots();
        let slot = slots.entry(group.clone()).or_default();

        if let Some((latest, newer)) = slot.latest_arrival
            && latest > occupant.arrival
        {
            return Acquire::Stale { newer };
        }

        slot.latest_arrival = Some((occupant.arrival, occupant.instance));
        let previous = slot
            .occupant
            .replace(occupant)
            .map(|previous| previous.handle);
        Acquire::Granted { previous }
    }

    /// Give the group back. No-op (returns `false`) unless `instance` is the
    /// current occupant, so a stale completion cannot evict its successor.
    pub fn release(&self, group: Option<&Group>, instance: InstanceId) -> bool {
        let Some(group) = group else {
            return false;
        };

        let mut slots = self.slots();
        match slots.get_mut(group) {
            Some(slot) if slot.occupant.as_ref().map(|o| o.instance) == Some(instance) => {
                slot.occupant = None;
                true
            }
            _ => false,
        }
    }

    pub fn occupant(&self, group: &Group) -> Option<InstanceId> {
        self.slots()
            .get(group)
            .and_then(|slot| slot.occupant.as_ref().map(|o| o.instance))
    }

    /// `true` when there is nothing to hold (`None` group) or `instance` owns it.
    pub fn holds(&self, group: Option<&Group>, instance: InstanceId) -> bool {
        match group {
            None => true,
            Some(group) => self.occupant(group) == Some(instance),
        }
    }

    /// Groups that currently have an occupant.
    pub fn occupied(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = self
            .slots()
            .iter()
            .filter(|(_, slot)| slot.occupant.is_some())
            .map(|(group, _)| group.clone())
            .collect();
        groups.sort();
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Phase, RequestId};
    use crate::engine::handle::channel;

    fn occupant(arrival: u64) -> Occupant {
        let instance = InstanceId::generate();
        let (handle, _side) = channel(instance, RequestId::generate(), Phase::Waiting);
        Occupant {
            instance,
            arrival,
            handle,
        }
    }

    #[test]
    fn ungrouped_acquire_never_excludes() {
        let registry = GroupLockRegistry::new();
        assert!(matches!(
            registry.acquire(None, occupant(1)),
            Acquire::Granted { previous: None }
        ));
        assert!(matches!(
            registry.acquire(None, occupant(2)),
            Acquire::Granted { previous: None }
        ));
        assert!(registry.occupied().is_empty());
    }

    #[test]
    fn acquire_swaps_and_returns_previous() {
        let registry = GroupLockRegistry::new();
        let camera = Group::new("camerafov");
        let first = occupant(1);
        let first_id = first.instance;
        let second = occupant(2);
        let second_id = second.instance;

        assert!(matches!(
            registry.acquire(Some(&camera), first),
            Acquire::Granted { previous: None }
        ));
        match registry.acquire(Some(&camera), second) {
            Acquire::Granted { previous: Some(handle) } => assert_eq!(handle.id(), first_id),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(registry.occupant(&camera), Some(second_id));
    }

    #[test]
    fn release_by_non_occupant_is_noop() {
        let registry = GroupLockRegistry::new();
        let music = Group::new("music");
        let first = occupant(1);
        let first_id = first.instance;
        let second = occupant(2);
        let second_id = second.instance;

        registry.acquire(Some(&music), first);
        registry.acquire(Some(&music), second);

        assert!(!registry.release(Some(&music), first_id));
        assert_eq!(registry.occupant(&music), Some(second_id));

        assert!(registry.release(Some(&music), second_id));
        assert_eq!(registry.occupant(&music), None);
        assert!(!registry.release(Some(&music), second_id));
    }

    #[test]
    fn older_arrival_is_stale_after_newer_acquired() {
        let registry = GroupLockRegistry::new();
        let hud = Group::new("hud");
        let newer = occupant(5);
        let newer_id = newer.instance;

        registry.acquire(Some(&hud), newer);
        registry.release(Some(&hud), newer_id);

        match registry.acquire(Some(&hud), occupant(3)) {
            Acquire::Stale { newer } => assert_eq!(newer, newer_id),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(registry.occupant(&hud), None);
    }

    #[test]
    fn groups_are_independent() {
        let registry = GroupLockRegistry::new();
        let a = Group::new("a");
        let b = Group::new("b");
        let first = occupant(1);
        let first_id = first.instance;

        registry.acquire(Some(&a), first);
        assert!(matches!(
            registry.acquire(Some(&b), occupant(2)),
            Acquire::Granted { previous: None }
        ));
        assert!(registry.holds(Some(&a), first_id));
        assert!(registry.holds(None, first_id));
        assert_eq!(registry.occupied(), vec![a, b]);
    }
}
