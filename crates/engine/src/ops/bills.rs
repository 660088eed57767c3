use crate::{
    Bill, BillId, BillWrite, EngineError, LedgerWrite, MoneyCents, NewBill, ResultEngine,
    UpdateBillCmd, UserId, util::normalize_required_name,
};

use super::{Engine, missing_commit};

fn ensure_opening_balance(balance: MoneyCents) -> ResultEngine<()> {
    if balance.is_negative() {
        return Err(EngineError::InvalidInput(
            "bill balance must be >= 0".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Open a bill for `user_id` with `balance` already on it.
    ///
    /// The opening balance is added to the owner aggregate in the same
    /// commit.
    pub async fn create_bill(
        &self,
        user_id: UserId,
        name: &str,
        balance: MoneyCents,
    ) -> ResultEngine<Bill> {
        let name = normalize_required_name(name, "bill")?;
        ensure_opening_balance(balance)?;

        let _scope = self.scopes.acquire(user_id, None).await;
        let user = self.require_user(user_id).await?;
        let user = self.ledger.shift_user(&user, MoneyCents::ZERO, balance)?;
        let commit = self
            .store
            .commit(LedgerWrite {
                bill: BillWrite::Insert(NewBill {
                    name,
                    balance,
                    user_id,
                }),
                user,
                entry: None,
            })
            .await?;
        let bill = commit.bill.ok_or_else(|| missing_commit("bill"))?;
        tracing::debug!(bill_id = bill.id, user_id, %balance, "opened bill");
        Ok(bill)
    }

    pub async fn bill(&self, bill_id: BillId) -> ResultEngine<Bill> {
        self.require_bill(bill_id).await
    }

    pub async fn bills(&self) -> ResultEngine<Vec<Bill>> {
        self.store.list_bills().await
    }

    pub async fn bills_for_user(&self, user_id: UserId) -> ResultEngine<Vec<Bill>> {
        self.require_user(user_id).await?;
        self.store.list_bills_by_user(user_id).await
    }

    /// Rename a bill and/or correct its balance.
    ///
    /// A correction moves the owner aggregate by the same delta. Cached
    /// transaction lists do not embed bills, so the cache is left alone.
    pub async fn update_bill(&self, cmd: UpdateBillCmd) -> ResultEngine<Bill> {
        let name = cmd
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "bill"))
            .transpose()?;
        if let Some(balance) = cmd.balance {
            ensure_opening_balance(balance)?;
        }

        let owner = self.require_bill(cmd.bill_id).await?.user_id;
        let _scope = self.scopes.acquire(owner, Some(cmd.bill_id)).await;
        let bill = self.require_bill(cmd.bill_id).await?;
        let user = self.require_user(bill.user_id).await?;

        let balance = cmd.balance.unwrap_or(bill.balance);
        let user = self
            .ledger
            .propagate_to_user(&user, &bill, bill.balance, balance)?;
        let mut updated = bill.with_balance(balance);
        if let Some(name) = name {
            updated.name = name;
        }
        let commit = self
            .store
            .commit(LedgerWrite {
                bill: BillWrite::Save(updated),
                user,
                entry: None,
            })
            .await?;
        let updated = commit.bill.ok_or_else(|| missing_commit("bill"))?;
        tracing::debug!(
            bill_id = updated.id,
            old = %bill.balance,
            new = %updated.balance,
            "updated bill"
        );
        Ok(updated)
    }

    /// Delete a bill and its transactions, removing its balance from the
    /// owner aggregate.
    pub async fn delete_bill(&self, bill_id: BillId) -> ResultEngine<()> {
        let owner = self.require_bill(bill_id).await?.user_id;
        let _scope = self.scopes.acquire(owner, Some(bill_id)).await;
        let bill = self.require_bill(bill_id).await?;
        let user = self.require_user(bill.user_id).await?;
        let user = self
            .ledger
            .propagate_to_user(&user, &bill, bill.balance, MoneyCents::ZERO)?;
        self.store
            .commit(LedgerWrite {
                bill: BillWrite::Delete(bill_id),
                user,
                entry: None,
            })
            .await?;
        self.cache.evict_user(bill.user_id);
        tracing::info!(bill_id, user_id = bill.user_id, "deleted bill");
        Ok(())
    }
}
