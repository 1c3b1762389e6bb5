//! Shared document for write-through-read state access.
//!
//! `DocCell` is the smallest possible [`Host`]: a guarded tree where every
//! dispatched descriptor is applied immediately, so the next read sees it.

use crate::{Host, Mutation, Value};
use parking_lot::{Mutex, RwLock};

/// Shared mutable document for write-through-read state access.
///
/// Reads lock briefly to clone the current root (an `Arc` bump). Writes are
/// serialised by a separate commit lock and computed from a snapshot, so a
/// sort comparator may read the document while it runs. The state lock is
/// only held to swap in the new root.
pub struct DocCell {
    state: RwLock<Value>,
    commit: Mutex<()>,
}

impl DocCell {
    /// Create a new `DocCell` with the given initial tree.
    pub fn new(value: Value) -> Self {
        Self {
            state: RwLock::new(value),
            commit: Mutex::new(()),
        }
    }

    /// The current tree.
    #[inline]
    pub fn get(&self) -> Value {
        self.state.read().clone()
    }

    /// Apply one descriptor in place of the current tree.
    ///
    /// Returns what the operation surfaces to its caller. A comparator run
    /// by the descriptor must not dispatch to this cell.
    pub fn apply(&self, mutation: &Mutation) -> Value {
        let _commit = self.commit.lock();
        let applied = mutation.apply(&self.get());
        *self.state.write() = applied.state;
        applied.result
    }

    /// Replace the whole tree.
    pub fn replace(&self, value: Value) -> Value {
        let _commit = self.commit.lock();
        std::mem::replace(&mut *self.state.write(), value)
    }

    /// Consume the `DocCell` and return the tree.
    pub fn into_inner(self) -> Value {
        self.state.into_inner()
    }
}

impl Host for DocCell {
    fn state(&self) -> Value {
        self.get()
    }

    fn dispatch(&self, mutation: Mutation) {
        self.apply(&mutation);
    }
}

impl Default for DocCell {
    fn default() -> Self {
        Self::new(Value::empty_object())
    }
}

impl Clone for DocCell {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl std::fmt::Debug for DocCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DocCell").field(&"<Value>").finish()
    }
}
