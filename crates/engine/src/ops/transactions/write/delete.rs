use crate::{EntryWrite, ResultEngine, TransactionId, ledger::signed};

use super::super::super::Engine;

impl Engine {
    /// Delete a transaction and reverse its effect on the bill and the owner.
    ///
    /// Reversal is never refused for funds: undoing an income may leave the
    /// bill negative.
    pub async fn delete_transaction(&self, transaction_id: TransactionId) -> ResultEngine<()> {
        let located = self.require_transaction(transaction_id).await?;
        let _scope = self
            .scopes
            .acquire(located.user_id, Some(located.bill_id))
            .await;
        let existing = self.require_transaction(transaction_id).await?;

        let bill = match self
            .require_bill_for_user(existing.bill_id, existing.user_id)
            .await
        {
            Ok(bill) => bill,
            Err(err) => {
                tracing::error!(
                    transaction_id,
                    bill_id = existing.bill_id,
                    user_id = existing.user_id,
                    "transaction points to a missing bill"
                );
                return Err(err);
            }
        };
        let new_balance = self
            .ledger
            .apply_delete(&bill, signed(existing.amount, existing.kind))?;
        let user = self.require_user(existing.user_id).await?;

        self.commit_entry(&bill, &user, new_balance, EntryWrite::Delete(transaction_id))
            .await?;

        self.cache.remove_one(existing.user_id, transaction_id);
        tracing::debug!(
            transaction_id,
            bill_id = bill.id,
            balance = %new_balance,
            "deleted transaction"
        );
        Ok(())
    }
}
