//! Session-wide key/value storage shared by every cell of one user session.
//!
//! The store has two tiers. The top-level tier is owned by the host: widgets
//! that carry an identity key write their interactive state there. The
//! placeholder tier holds values written through state cells that the host
//! has not promoted to a widget key.

use std::cell::RefCell;

use crate::collections::map::HashMap;
use crate::persist::{PersistState, PersistenceTracker};
use crate::Value;

/// Storage backing state cells for the lifetime of one session.
///
/// Implementations use interior mutability; rendering is single-threaded
/// and the host must not run two passes of the same session concurrently.
pub trait SessionStore {
    /// Returns whether the top-level tier holds `key`.
    fn has(&self, key: &str) -> bool;

    /// Reads the top-level tier.
    fn get(&self, key: &str) -> Option<Value>;

    /// Writes the top-level tier.
    fn set(&self, key: &str, value: Value);

    /// Reads the placeholder tier.
    fn placeholder(&self, key: &str) -> Option<Value>;

    /// Writes the placeholder tier.
    fn set_placeholder(&self, key: &str, value: Value);

    /// Runs a read of a persistent cell through the persistence tracker.
    fn observe_persisted(&self, key: &str, observed: Value) -> Value;

    /// Drops all tiers and persistence records.
    fn clear(&self);
}

/// In-memory [`SessionStore`].
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RefCell<HashMap<String, Value>>,
    placeholders: RefCell<HashMap<String, Value>>,
    persistence: RefCell<PersistenceTracker>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the persistence record for `key`.
    pub fn persist_state(&self, key: &str) -> PersistState {
        self.persistence.borrow().state(key)
    }

    /// Forgets the persistence record for `key`, unlocking it.
    pub fn reset_persisted(&self, key: &str) {
        self.persistence.borrow_mut().reset(key);
    }

    pub fn has_placeholder(&self, key: &str) -> bool {
        self.placeholders.borrow().contains_key(key)
    }
}

impl SessionStore for MemorySessionStore {
    fn has(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.entries.borrow_mut().insert(key.to_owned(), value);
    }

    fn placeholder(&self, key: &str) -> Option<Value> {
        self.placeholders.borrow().get(key).cloned()
    }

    fn set_placeholder(&self, key: &str, value: Value) {
        self.placeholders.borrow_mut().insert(key.to_owned(), value);
    }

    fn observe_persisted(&self, key: &str, observed: Value) -> Value {
        self.persistence.borrow_mut().observe(key, observed)
    }

    fn clear(&self) {
        self.entries.borrow_mut().clear();
        self.placeholders.borrow_mut().clear();
        self.persistence.borrow_mut().clear();
    }
}
