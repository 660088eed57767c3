use crate::{
    CreateTransactionCmd, EntryWrite, NewTransaction, ResultEngine, Transaction,
    util::{normalize_optional_text, normalize_required_name},
};

use super::super::super::{Engine, missing_commit};

impl Engine {
    /// Record an income or an expense on a bill of the user.
    ///
    /// The bill and the owner aggregate move by the signed amount in the same
    /// commit as the transaction insert. An expense larger than the bill
    /// balance is [`InsufficientFunds`](crate::EngineError::InsufficientFunds).
    pub async fn create_transaction(&self, cmd: CreateTransactionCmd) -> ResultEngine<Transaction> {
        let name = normalize_required_name(&cmd.name, "transaction")?;
        let description = normalize_optional_text(cmd.description.as_deref());

        let _scope = self.scopes.acquire(cmd.user_id, Some(cmd.bill_id)).await;
        let user = self.require_user(cmd.user_id).await?;
        let bill = self.require_bill_for_user(cmd.bill_id, cmd.user_id).await?;
        let tags = self.resolve_tags(cmd.user_id, &cmd.tag_ids).await?;

        let delta = self.ledger.effect(cmd.amount, cmd.kind)?;
        let new_balance = self.ledger.apply_create(&bill, delta)?;

        let entry = EntryWrite::Insert(NewTransaction {
            name,
            description,
            kind: cmd.kind,
            amount: cmd.amount,
            date: cmd.date,
            user_id: cmd.user_id,
            bill_id: cmd.bill_id,
            tags,
        });
        let created = self
            .commit_entry(&bill, &user, new_balance, entry)
            .await?
            .ok_or_else(|| missing_commit("transaction"))?;

        self.cache.patch_one(created.user_id, &created);
        tracing::debug!(
            transaction_id = created.id,
            bill_id = bill.id,
            kind = created.kind.as_str(),
            amount = %created.amount,
            balance = %new_balance,
            "created transaction"
        );
        Ok(created)
    }
}

