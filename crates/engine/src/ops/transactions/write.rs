use crate::{Bill, BillWrite, EntryWrite, LedgerWrite, MoneyCents, ResultEngine, Transaction, User};

use super::super::{Engine, missing_commit};

mod create;
mod delete;
mod update;

impl Engine {
    /// Commits a bill balance change, the owner aggregate that follows from
    /// it, and the transaction write as one ledger write.
    ///
    /// Returns the persisted transaction, `None` for a deletion.
    async fn commit_entry(
        &self,
        bill: &Bill,
        user: &User,
        new_balance: MoneyCents,
        entry: EntryWrite,
    ) -> ResultEngine<Option<Transaction>> {
        let user = self
            .ledger
            .propagate_to_user(user, bill, bill.balance, new_balance)?;
        let expects_transaction = !matches!(entry, EntryWrite::Delete(_));
        let commit = self
            .store
            .commit(LedgerWrite {
                bill: BillWrite::Save(bill.with_balance(new_balance)),
                user,
                entry: Some(entry),
            })
            .await?;
        if expects_transaction && commit.transaction.is_none() {
            return Err(missing_commit("transaction"));
        }
        Ok(commit.transaction)
    }
}
