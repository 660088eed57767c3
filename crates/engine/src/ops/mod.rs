use std::{fmt, sync::Arc};

use sea_orm::DatabaseConnection;

use crate::{
    BalanceLedger, Bill, BillId, DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_AMOUNT, EngineError,
    MoneyCents, MutationScopes, ResultEngine, SeaOrmStore, Store, Transaction, TransactionCache,
    TransactionId, User, UserId,
};

mod bills;
mod tags;
mod transactions;
mod users;

/// Entry point of every operation.
///
/// The engine is shared behind an `Arc` across tasks: every method takes
/// `&self`. Balance mutations run inside a [`MutationScopes`] guard for the
/// owner (and bill), commit through [`Store::commit`], and only then touch
/// the [`TransactionCache`].
pub struct Engine {
    store: Arc<dyn Store>,
    ledger: BalanceLedger,
    cache: TransactionCache,
    scopes: MutationScopes,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("ledger", &self.ledger)
            .field("cache", &self.cache)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn cache(&self) -> &TransactionCache {
        &self.cache
    }

    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    async fn require_user(&self, user_id: UserId) -> ResultEngine<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("user {user_id}")))
    }

    async fn require_bill(&self, bill_id: BillId) -> ResultEngine<Bill> {
        self.store
            .find_bill(bill_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("bill {bill_id}")))
    }

    async fn require_bill_for_user(&self, bill_id: BillId, user_id: UserId) -> ResultEngine<Bill> {
        self.store
            .find_bill_for_user(bill_id, user_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("bill {bill_id} of user {user_id}")))
    }

    async fn require_transaction(&self, transaction_id: TransactionId) -> ResultEngine<Transaction> {
        self.store
            .find_transaction(transaction_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("transaction {transaction_id}")))
    }
}

fn missing_commit(what: &str) -> EngineError {
    EngineError::Store(format!("commit did not return the {what}"))
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn Store>>,
    cache_capacity: Option<usize>,
    max_amount: Option<MoneyCents>,
}

impl EngineBuilder {
    /// Pass the required database, wrapped in a [`SeaOrmStore`].
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.store = Some(Arc::new(SeaOrmStore::new(db)));
        self
    }

    /// Use a custom store instead of a database.
    pub fn store(mut self, store: Arc<dyn Store>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    /// Number of users whose transactions stay cached (default 3).
    pub fn cache_capacity(mut self, capacity: usize) -> EngineBuilder {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Largest amount accepted for a single transaction.
    pub fn max_amount(mut self, max_amount: MoneyCents) -> EngineBuilder {
        self.max_amount = Some(max_amount);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let store = self
            .store
            .ok_or_else(|| EngineError::InvalidInput("engine requires a store".to_string()))?;
        let max_amount = self.max_amount.unwrap_or(DEFAULT_MAX_AMOUNT);
        if !max_amount.is_positive() {
            return Err(EngineError::InvalidInput(
                "max amount must be > 0".to_string(),
            ));
        }
        let cache =
            TransactionCache::with_capacity(self.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY))?;
        tracing::info!(
            cache_capacity = cache.capacity(),
            %max_amount,
            "engine ready"
        );
        Ok(Engine {
            store,
            ledger: BalanceLedger::new(max_amount),
            cache,
            scopes: MutationScopes::new(),
        })
    }
}
