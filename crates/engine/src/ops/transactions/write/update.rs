use crate::{
    EngineError, EntryWrite, ResultEngine, Transaction, UpdateTransactionCmd,
    ledger::signed,
    util::{apply_optional_text_patch, normalize_required_name},
};

use super::super::super::{Engine, missing_commit};

impl Engine {
    /// Patch a transaction and move its bill by the difference between the
    /// old and the new effect.
    ///
    /// A transaction stays on its user and bill: restating them is accepted,
    /// changing them is an `InvalidInput`.
    pub async fn update_transaction(&self, cmd: UpdateTransactionCmd) -> ResultEngine<Transaction> {
        let name = cmd
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "transaction"))
            .transpose()?;

        let located = self.require_transaction(cmd.transaction_id).await?;
        let _scope = self
            .scopes
            .acquire(located.user_id, Some(located.bill_id))
            .await;
        let existing = self.require_transaction(cmd.transaction_id).await?;

        if let Some(user_id) = cmd.user_id
            && user_id != existing.user_id
        {
            return Err(EngineError::InvalidInput(format!(
                "transaction {} cannot move to user {user_id}",
                existing.id
            )));
        }
        if let Some(bill_id) = cmd.bill_id
            && bill_id != existing.bill_id
        {
            return Err(EngineError::InvalidInput(format!(
                "transaction {} cannot move to bill {bill_id}",
                existing.id
            )));
        }

        let tags = match cmd.tag_ids.as_deref() {
            Some(tag_ids) => self.resolve_tags(existing.user_id, tag_ids).await?,
            None => existing.tags.clone(),
        };
        let kind = cmd.kind.unwrap_or(existing.kind);
        let amount = cmd.amount.unwrap_or(existing.amount);

        let old = signed(existing.amount, existing.kind);
        let new = self.ledger.effect(amount, kind)?;
        let bill = self
            .require_bill_for_user(existing.bill_id, existing.user_id)
            .await?;
        let user = self.require_user(existing.user_id).await?;
        let new_balance = self.ledger.apply_replace(&bill, old, new)?;

        let updated = Transaction {
            id: existing.id,
            name: name.unwrap_or_else(|| existing.name.clone()),
            description: apply_optional_text_patch(
                existing.description.clone(),
                cmd.description.as_deref(),
            ),
            kind,
            amount,
            date: cmd.date.unwrap_or(existing.date),
            user_id: existing.user_id,
            bill_id: existing.bill_id,
            tags,
        };
        let updated = self
            .commit_entry(&bill, &user, new_balance, EntryWrite::Save(updated))
            .await?
            .ok_or_else(|| missing_commit("transaction"))?;

        self.cache.patch_one(updated.user_id, &updated);
        tracing::debug!(
            transaction_id = updated.id,
            bill_id = bill.id,
            old = %old,
            new = %new,
            balance = %new_balance,
            "updated transaction"
        );
        Ok(updated)
    }
}
