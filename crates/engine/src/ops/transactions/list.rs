use crate::{
    BillId, CachedTransactions, ResultEngine, TagId, Transaction, TransactionId, UserId,
};

use super::super::Engine;

impl Engine {
    pub async fn transaction(&self, transaction_id: TransactionId) -> ResultEngine<Transaction> {
        self.require_transaction(transaction_id).await
    }

    /// Every transaction in creation order. Not cached.
    pub async fn transactions(&self) -> ResultEngine<Vec<Transaction>> {
        self.store.list_transactions().await
    }

    /// Transactions carrying a tag, in creation order. Not cached.
    pub async fn transactions_for_tag(&self, tag_id: TagId) -> ResultEngine<Vec<Transaction>> {
        self.tag(tag_id).await?;
        self.store.list_transactions_by_tag(tag_id).await
    }

    /// Transactions of a bill in creation order. Not cached.
    pub async fn transactions_for_bill(&self, bill_id: BillId) -> ResultEngine<Vec<Transaction>> {
        self.require_bill(bill_id).await?;
        self.store.list_transactions_by_bill(bill_id).await
    }

    /// Transactions of a user, served from the cache when the user is
    /// resident. A fresh load is in creation order; patched entries keep
    /// rewritten transactions at the end.
    ///
    /// A resident entry implies the user exists: deleting a user evicts it.
    /// On a miss the fill ticket is taken before the user is checked, so a
    /// deletion committed after that check still discards the load. The list
    /// is cached unless a mutation or deletion of the same user raced with it.
    pub async fn transactions_for_user(&self, user_id: UserId) -> ResultEngine<CachedTransactions> {
        if let Some(list) = self.cache.get(user_id) {
            return Ok(list);
        }
        let fill = self.cache.begin_fill(user_id);
        self.require_user(user_id).await?;
        let transactions = self.store.list_transactions_by_user(user_id).await?;
        Ok(fill.complete(transactions))
    }
}
