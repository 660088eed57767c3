//! Per-user cache of materialized transaction lists.
//!
//! The cache holds, for at most `capacity` users, the full list of their
//! transactions as returned by the store. Entries are evicted least recently
//! used first. Mutations patch resident entries in place of invalidating
//! them, so a user who keeps writing keeps a warm cache.
//!
//! ## Copy-on-write lists
//!
//! Lists are shared as `Arc<Vec<Transaction>>`. A patch builds a new list and
//! swaps the `Arc`; readers holding the previous list keep a consistent
//! snapshot.
//!
//! ## Read-through population
//!
//! A reader that misses loads the list from the store without holding any
//! lock, so a mutation can commit and patch (a no-op, the user is not
//! resident) while the load is in flight. Inserting that load afterwards would
//! resurrect stale data. [`TransactionCache::begin_fill`] hands out a
//! [`CacheFill`] ticket; any patch, removal or eviction for the same user
//! before [`CacheFill::complete`] makes the completion skip the insert.

use std::{collections::HashMap, num::NonZeroUsize, sync::Arc};

use lru::LruCache;
use parking_lot::Mutex;

use crate::{EngineError, ResultEngine, Transaction, TransactionId, UserId};

/// Number of users kept resident when none is configured.
pub const DEFAULT_CACHE_CAPACITY: usize = 3;

pub type CachedTransactions = Arc<Vec<Transaction>>;

#[derive(Debug, Default)]
struct PendingFill {
    generation: u64,
    readers: usize,
}

#[derive(Debug)]
struct Inner {
    entries: LruCache<UserId, CachedTransactions>,
    fills: HashMap<UserId, PendingFill>,
}

impl Inner {
    fn touch_fill(&mut self, user_id: UserId) {
        if let Some(fill) = self.fills.get_mut(&user_id) {
            fill.generation += 1;
        }
    }

    fn insert(&mut self, user_id: UserId, list: CachedTransactions) {
        let len = list.len();
        if let Some((evicted, _)) = self.entries.push(user_id, list)
            && evicted != user_id
        {
            tracing::info!(user_id = evicted, "evicting least recently used transactions");
        }
        tracing::debug!(user_id, len, "cached transactions");
    }
}

/// Bounded LRU of transaction lists keyed by user.
#[derive(Debug)]
pub struct TransactionCache {
    inner: Mutex<Inner>,
}

impl Default for TransactionCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl TransactionCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        tracing::debug!(capacity = capacity.get(), "transaction cache initialized");
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                fills: HashMap::new(),
            }),
        }
    }

    /// Builds a cache from a raw capacity, rejecting 0.
    pub fn with_capacity(capacity: usize) -> ResultEngine<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            EngineError::InvalidInput("cache capacity must be > 0".to_string())
        })?;
        Ok(Self::new(capacity))
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().entries.cap().get()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resident users, most recently used first.
    pub fn resident_users(&self) -> Vec<UserId> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|(user_id, _)| *user_id)
            .collect()
    }

    /// Returns the cached list and marks the user as most recently used.
    ///
    /// `None` is a miss, not an error: the caller goes to the store.
    pub fn get(&self, user_id: UserId) -> Option<CachedTransactions> {
        let hit = self.inner.lock().entries.get(&user_id).cloned();
        match &hit {
            Some(list) => tracing::debug!(user_id, len = list.len(), "transaction cache hit"),
            None => tracing::debug!(user_id, "transaction cache miss"),
        }
        hit
    }

    /// Inserts or replaces the full list of a user.
    pub fn put(&self, user_id: UserId, transactions: Vec<Transaction>) -> CachedTransactions {
        let list = Arc::new(transactions);
        let mut inner = self.inner.lock();
        inner.touch_fill(user_id);
        inner.insert(user_id, Arc::clone(&list));
        list
    }

    /// Replaces (or appends) one transaction in a resident list.
    ///
    /// Users without a resident entry are left alone: a list holding only the
    /// patched transaction would look complete while it is not.
    pub fn patch_one(&self, user_id: UserId, transaction: &Transaction) {
        let mut inner = self.inner.lock();
        inner.touch_fill(user_id);
        let Some(entry) = inner.entries.get_mut(&user_id) else {
            return;
        };
        let mut list: Vec<Transaction> = entry
            .iter()
            .filter(|cached| cached.id != transaction.id)
            .cloned()
            .collect();
        list.push(transaction.clone());
        *entry = Arc::new(list);
        tracing::debug!(user_id, transaction_id = transaction.id, "patched cached transaction");
    }

    /// Drops one transaction from a resident list.
    pub fn remove_one(&self, user_id: UserId, transaction_id: TransactionId) {
        let mut inner = self.inner.lock();
        inner.touch_fill(user_id);
        let Some(entry) = inner.entries.peek_mut(&user_id) else {
            return;
        };
        if entry.iter().any(|cached| cached.id == transaction_id) {
            let list: Vec<Transaction> = entry
                .iter()
                .filter(|cached| cached.id != transaction_id)
                .cloned()
                .collect();
            *entry = Arc::new(list);
            tracing::debug!(user_id, transaction_id, "removed cached transaction");
        }
    }

    /// Drops the whole entry of a user.
    pub fn evict_user(&self, user_id: UserId) {
        let mut inner = self.inner.lock();
        inner.touch_fill(user_id);
        if inner.entries.pop(&user_id).is_some() {
            tracing::info!(user_id, "cleared cached transactions");
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        for fill in inner.fills.values_mut() {
            fill.generation += 1;
        }
        inner.entries.clear();
        tracing::info!("cleared transaction cache");
    }

    /// Starts a read-through population for `user_id`.
    pub fn begin_fill(&self, user_id: UserId) -> CacheFill<'_> {
        let mut inner = self.inner.lock();
        let fill = inner.fills.entry(user_id).or_default();
        fill.readers += 1;
        CacheFill {
            cache: self,
            user_id,
            generation: fill.generation,
            finished: false,
        }
    }

    fn finish_fill(&self, user_id: UserId, generation: u64, list: Option<CachedTransactions>) {
        let mut inner = self.inner.lock();
        let fresh = match inner.fills.get_mut(&user_id) {
            Some(fill) => {
                fill.readers = fill.readers.saturating_sub(1);
                let fresh = fill.generation == generation;
                if fill.readers == 0 {
                    inner.fills.remove(&user_id);
                }
                fresh
            }
            None => false,
        };
        let Some(list) = list else {
            return;
        };
        if fresh {
            inner.insert(user_id, list);
        } else {
            tracing::debug!(user_id, "discarding stale transaction list");
        }
    }
}

/// Ticket for a read-through population, see [`TransactionCache::begin_fill`].
///
/// Dropping the ticket without completing it (for example because the store
/// failed) releases it without touching the cache.
#[derive(Debug)]
pub struct CacheFill<'a> {
    cache: &'a TransactionCache,
    user_id: UserId,
    generation: u64,
    finished: bool,
}

impl CacheFill<'_> {
    /// Stores `transactions` unless the user was touched since the ticket was
    /// issued. The list is returned either way.
    pub fn complete(mut self, transactions: Vec<Transaction>) -> CachedTransactions {
        self.finished = true;
        let list = Arc::new(transactions);
        self.cache
            .finish_fill(self.user_id, self.generation, Some(Arc::clone(&list)));
        list
    }
}

impl Drop for CacheFill<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.cache.finish_fill(self.user_id, self.generation, None);
        }
    }
}
