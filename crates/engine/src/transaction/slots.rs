//! Thread-local table of active sessions
//!
//! Each thread keeps its own map of registry -> slot -> session. Nothing in
//! here is shared between threads, so no locking is involved: two threads
//! using the same slot name on the same registry can never observe each
//! other's session.
//!
//! Sessions are stored type-erased (`Rc<dyn Any>`) because a `thread_local!`
//! cannot be generic over the driver. Every registry owns a unique
//! [`RegistryId`] and only ever stores `Session<C>` for its own `C`, so the
//! downcast on lookup always succeeds for entries it wrote.

use super::session::Session;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use transact_core::Connection;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Active sessions of the current thread, per registry then per slot
    static ACTIVE: RefCell<HashMap<RegistryId, HashMap<String, Rc<dyn Any>>>> =
        RefCell::new(HashMap::new());
}

/// Process-unique identity of a registry instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistryId(u64);

impl RegistryId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        RegistryId(NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value (for logging)
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Thread-local slot table operations
///
/// The table is implicitly created per-thread on first access. Callers must
/// not hold a value borrowed from the table across user code: every method
/// releases its borrow before returning.
pub struct SlotTable;

impl SlotTable {
    /// Session active on this thread for `(registry, slot)`, if any
    pub fn lookup<C: Connection>(registry: RegistryId, slot: &str) -> Option<Rc<Session<C>>> {
        let entry = ACTIVE.with(|active| {
            active
                .borrow()
                .get(&registry)
                .and_then(|slots| slots.get(slot))
                .cloned()
        })?;
        entry.downcast::<Session<C>>().ok()
    }

    /// True if this thread has an active session for `(registry, slot)`
    pub fn contains(registry: RegistryId, slot: &str) -> bool {
        ACTIVE.with(|active| {
            active
                .borrow()
                .get(&registry)
                .is_some_and(|slots| slots.contains_key(slot))
        })
    }

    /// Register a session under its slot
    ///
    /// Returns false (and stores nothing) if the slot is already occupied;
    /// at most one session exists per `(registry, thread, slot)`.
    pub fn insert<C: Connection>(registry: RegistryId, session: Rc<Session<C>>) -> bool {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            let slots = active.entry(registry).or_default();
            if slots.contains_key(session.slot()) {
                return false;
            }
            let slot = session.slot().to_string();
            slots.insert(slot, session as Rc<dyn Any>);
            true
        })
    }

    /// Drop the session registered under `(registry, slot)`
    ///
    /// Returns true if an entry was removed. Safe to call while the thread
    /// is tearing down its thread-locals, in which case nothing is removed.
    pub fn remove(registry: RegistryId, slot: &str) -> bool {
        ACTIVE
            .try_with(|active| {
                let mut active = active.borrow_mut();
                let Some(slots) = active.get_mut(&registry) else {
                    return false;
                };
                let removed = slots.remove(slot).is_some();
                if slots.is_empty() {
                    active.remove(&registry);
                }
                removed
            })
            .unwrap_or(false)
    }

    /// Slots with an active session on this thread, sorted by name
    pub fn slots(registry: RegistryId) -> Vec<String> {
        ACTIVE.with(|active| {
            let mut names: Vec<String> = active
                .borrow()
                .get(&registry)
                .map(|slots| slots.keys().cloned().collect())
                .unwrap_or_default();
            names.sort();
            names
        })
    }

    /// Number of registries with at least one active session on this thread
    #[cfg(test)]
    pub fn registry_count() -> usize {
        ACTIVE.with(|active| active.borrow().len())
    }
}
