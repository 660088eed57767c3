//! Exclusive mutation scopes keyed by user and bill.
//!
//! Every balance mutation is a read-modify-write of a bill row and of its
//! owner row. Two such sequences on the same bill or user must not
//! interleave, so the engine holds a scope for the owner and, when the
//! mutation targets one, the bill for the whole load → compute → commit
//! sequence.
//!
//! Locks are always taken user first, bill second. Lock entries live in the
//! registry only while someone holds or waits for them.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::{BillId, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    User(UserId),
    Bill(BillId),
}

#[derive(Debug, Default)]
pub struct MutationScopes {
    locks: Mutex<HashMap<ScopeKey, Arc<AsyncMutex<()>>>>,
}

impl MutationScopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the scope of `user_id` (and `bill_id`, if any) is free and
    /// takes it. The scope is released when the guard is dropped.
    pub async fn acquire(&self, user_id: UserId, bill_id: Option<BillId>) -> ScopeGuard<'_> {
        let mut guard = ScopeGuard {
            scopes: self,
            held: Vec::with_capacity(2),
        };
        let keys = std::iter::once(ScopeKey::User(user_id)).chain(bill_id.map(ScopeKey::Bill));
        for key in keys {
            let lock = self.lock_for(key);
            let held = lock.lock_owned().await;
            guard.held.push((key, held));
        }
        guard
    }

    /// Number of keys currently held or waited on.
    pub fn active(&self) -> usize {
        self.locks.lock().len()
    }

    fn lock_for(&self, key: ScopeKey) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(key).or_default())
    }

    fn release(&self, key: ScopeKey) {
        let mut locks = self.locks.lock();
        if locks
            .get(&key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&key);
        }
    }
}

/// Held mutation scope, see [`MutationScopes::acquire`].
#[derive(Debug)]
pub struct ScopeGuard<'a> {
    scopes: &'a MutationScopes,
    held: Vec<(ScopeKey, OwnedMutexGuard<()>)>,
}

impl ScopeGuard<'_> {
    pub fn keys(&self) -> Vec<ScopeKey> {
        self.held.iter().map(|(key, _)| *key).collect()
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        while let Some((key, held)) = self.held.pop() {
            drop(held);
            self.scopes.release(key);
        }
    }
}
