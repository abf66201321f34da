//! Bookkeeping for the "lock after first observed change" rule.

use log::debug;

use crate::collections::map::HashMap;
use crate::Value;

/// Observation record kept per storage key.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PersistState {
    #[default]
    Unset,
    ObservedFirst(Value),
    Locked(Value),
}

/// Tracks what persistent cells have observed, keyed by storage key.
///
/// The first read records the observed value. The first later read that
/// differs from it locks the key to that value; from then on every read
/// returns the locked value whatever the store holds.
#[derive(Debug, Default)]
pub struct PersistenceTracker {
    states: HashMap<String, PersistState>,
}

impl PersistenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one read through the tracker and returns the value the reader sees.
    pub fn observe(&mut self, key: &str, observed: Value) -> Value {
        let state = self.states.entry(key.to_owned()).or_default();
        let (next, seen) = match &*state {
            PersistState::Unset => (Some(PersistState::ObservedFirst(observed.clone())), observed),
            PersistState::ObservedFirst(first) if *first != observed => {
                debug!("locking persistent key `{key}` at {observed}");
                (Some(PersistState::Locked(observed.clone())), observed)
            }
            PersistState::ObservedFirst(_) => (None, observed),
            PersistState::Locked(last) => (None, last.clone()),
        };
        if let Some(next) = next {
            *state = next;
        }
        seen
    }

    pub fn state(&self, key: &str) -> PersistState {
        self.states.get(key).cloned().unwrap_or_default()
    }

    pub fn is_locked(&self, key: &str) -> bool {
        matches!(self.states.get(key), Some(PersistState::Locked(_)))
    }

    /// Forgets everything observed for `key`.
    pub fn reset(&mut self, key: &str) {
        self.states.remove(key);
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}
