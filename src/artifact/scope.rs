//! Per-slot cancellation scopes for artifact loads
//!
//! A presentation layer typically loads one artifact per visual slot (a row,
//! a cell). When a slot is reused for a different item, the load issued for
//! the previous item must be abandoned. [`LoadScopes::begin`] does that: it
//! cancels the slot's previous token and hands out a fresh scope tagged with
//! a monotonically increasing generation, so a result that resolves after it
//! was superseded can always be told apart from the current one.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::trace;

/// One load's cancellation scope, bound to a slot
#[derive(Clone, Debug)]
pub struct LoadScope<K> {
    slot: K,
    generation: u64,
    token: CancellationToken,
}

impl<K> LoadScope<K> {
    /// Slot this scope belongs to
    pub fn slot(&self) -> &K {
        &self.slot
    }

    /// Monotonic generation; later scopes have larger values
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Token cancelled when the scope is superseded or released
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether the scope has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Registry of the current scope per slot
pub struct LoadScopes<K> {
    inner: Mutex<ScopesInner<K>>,
}

struct ScopesInner<K> {
    next_generation: u64,
    active: HashMap<K, (u64, CancellationToken)>,
}

impl<K> Default for LoadScopes<K> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(ScopesInner {
                next_generation: 1,
                active: HashMap::new(),
            }),
        }
    }
}

impl<K> LoadScopes<K>
where
    K: Clone + Eq + Hash + std::fmt::Debug,
{
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScopesInner<K>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new scope for `slot`, cancelling the slot's previous scope
    pub fn begin(&self, slot: K) -> LoadScope<K> {
        let mut inner = self.lock();
        let generation = inner.next_generation;
        inner.next_generation += 1;

        let token = CancellationToken::new();
        if let Some((previous, old)) = inner
            .active
            .insert(slot.clone(), (generation, token.clone()))
        {
            trace!(?slot, previous, generation, "superseding load scope");
            old.cancel();
        }

        LoadScope {
            slot,
            generation,
            token,
        }
    }

    /// Whether `scope` is still the latest scope of its slot and not cancelled
    pub fn is_current(&self, scope: &LoadScope<K>) -> bool {
        !scope.is_cancelled()
            && self
                .lock()
                .active
                .get(&scope.slot)
                .is_some_and(|(generation, _)| *generation == scope.generation)
    }

    /// Cancel and forget `scope` if it is still the slot's current one
    ///
    /// Releasing a superseded scope leaves the newer scope untouched.
    pub fn release(&self, scope: &LoadScope<K>) {
        let mut inner = self.lock();
        let is_current = inner
            .active
            .get(&scope.slot)
            .is_some_and(|(generation, _)| *generation == scope.generation);
        if is_current {
            inner.active.remove(&scope.slot);
        }
        scope.token.cancel();
    }

    /// Cancel every active scope
    pub fn cancel_all(&self) {
        let mut inner = self.lock();
        for (_, (_, token)) in inner.active.drain() {
            token.cancel();
        }
    }

    /// Number of slots with an active scope
    pub fn active_slots(&self) -> usize {
        self.lock().active.len()
    }
}
