//! Ownership table for shared timer effects
//!
//! Two phases may define the same effect (same kind and `uid`). Only the
//! first timer to claim the entry drives the effect. Releasing checks the
//! stored owner so a phase that never owned an entry cannot evict the one
//! that does.

use hashbrown::HashMap;

use super::{TimerInstanceId, TimerKind};

#[derive(Debug, Default)]
pub struct ActiveEntityRegistry {
    owners: HashMap<TimerKind, HashMap<String, TimerInstanceId>>,
}

impl ActiveEntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `(kind, uid)`.
    ///
    /// Returns `true` if the entry was free or is already owned by `id`.
    pub fn claim(&mut self, kind: TimerKind, uid: &str, id: TimerInstanceId) -> bool {
        let owners = self.owners.entry(kind).or_default();
        match owners.get(uid) {
            Some(owner) => *owner == id,
            None => {
                owners.insert(uid.to_string(), id);
                true
            }
        }
    }

    /// Drop ownership of `(kind, uid)` if `id` holds it.
    ///
    /// Returns `true` if an entry was removed.
    pub fn release(&mut self, kind: TimerKind, uid: &str, id: TimerInstanceId) -> bool {
        let Some(owners) = self.owners.get_mut(&kind) else {
            return false;
        };
        if owners.get(uid) == Some(&id) {
            owners.remove(uid);
            true
        } else {
            false
        }
    }

    pub fn owner(&self, kind: TimerKind, uid: &str) -> Option<TimerInstanceId> {
        self.owners.get(&kind)?.get(uid).copied()
    }

    pub fn len(&self) -> usize {
        self.owners.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.owners.clear();
    }
}
