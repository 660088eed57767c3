//! Balance arithmetic for transaction mutations.
//!
//! `BalanceLedger` is pure: it never touches the store. It turns a
//! transaction into a signed delta and computes the balances a bill and its
//! owner must have after the delta is applied, reversed, or replaced.
//!
//! Every operation is checked: overflows surface as
//! [`EngineError::InvalidInput`] instead of wrapping.

use crate::{Bill, EngineError, MoneyCents, ResultEngine, TransactionKind, User};

/// Upper bound for a single transaction amount when none is configured.
pub const DEFAULT_MAX_AMOUNT: MoneyCents = MoneyCents::new(100_000_000_00);

#[derive(Clone, Copy, Debug)]
pub struct BalanceLedger {
    max_amount: MoneyCents,
}

impl Default for BalanceLedger {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AMOUNT)
    }
}

/// Signed effect of an already recorded transaction, without limit checks.
pub fn signed(amount: MoneyCents, kind: TransactionKind) -> MoneyCents {
    match kind {
        TransactionKind::Income => amount,
        TransactionKind::Expense => -amount,
    }
}

fn overflow() -> EngineError {
    EngineError::InvalidInput("amount overflows the balance".to_string())
}

impl BalanceLedger {
    pub fn new(max_amount: MoneyCents) -> Self {
        Self { max_amount }
    }

    pub fn max_amount(&self) -> MoneyCents {
        self.max_amount
    }

    /// Signed effect of a transaction: `+amount` for income, `-amount` for
    /// expense.
    pub fn effect(&self, amount: MoneyCents, kind: TransactionKind) -> ResultEngine<MoneyCents> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidInput(
                "amount must be > 0".to_string(),
            ));
        }
        if amount > self.max_amount {
            return Err(EngineError::InvalidInput(format!(
                "amount must be <= {}",
                self.max_amount
            )));
        }
        Ok(signed(amount, kind))
    }

    /// Balance of `bill` after recording a new transaction.
    pub fn apply_create(&self, bill: &Bill, delta: MoneyCents) -> ResultEngine<MoneyCents> {
        let balance = bill.balance.checked_add(delta).ok_or_else(overflow)?;
        if delta.is_negative() && balance.is_negative() {
            return Err(insufficient(bill, delta));
        }
        Ok(balance)
    }

    /// Balance of `bill` after replacing a transaction effect `old` with
    /// `new`.
    ///
    /// The old effect is reversed before the new one is applied; the check
    /// only looks at the final balance and at the direction of the net change.
    pub fn apply_replace(
        &self,
        bill: &Bill,
        old: MoneyCents,
        new: MoneyCents,
    ) -> ResultEngine<MoneyCents> {
        let reversed = bill.balance.checked_sub(old).ok_or_else(overflow)?;
        let balance = reversed.checked_add(new).ok_or_else(overflow)?;
        let net = new.checked_sub(old).ok_or_else(overflow)?;
        if net.is_negative() && balance.is_negative() {
            return Err(insufficient(bill, net));
        }
        Ok(balance)
    }

    /// Balance of `bill` after a transaction with effect `delta` is removed.
    ///
    /// Never rejected: removing a transaction only returns funds or takes
    /// back a credit.
    pub fn apply_delete(&self, bill: &Bill, delta: MoneyCents) -> ResultEngine<MoneyCents> {
        bill.balance.checked_sub(delta).ok_or_else(overflow)
    }

    /// Carries a bill balance change over to the owner aggregate.
    pub fn propagate_to_user(
        &self,
        user: &User,
        bill: &Bill,
        old_bill_balance: MoneyCents,
        new_bill_balance: MoneyCents,
    ) -> ResultEngine<User> {
        if bill.user_id != user.id {
            return Err(EngineError::NotFound(format!(
                "bill {} of user {}",
                bill.id, user.id
            )));
        }
        self.shift_user(user, old_bill_balance, new_bill_balance)
    }

    /// Moves the user aggregate by `new - old`. Used directly when the bill
    /// has no id yet (opening a bill).
    pub fn shift_user(
        &self,
        user: &User,
        old_bill_balance: MoneyCents,
        new_bill_balance: MoneyCents,
    ) -> ResultEngine<User> {
        let change = new_bill_balance
            .checked_sub(old_bill_balance)
            .ok_or_else(overflow)?;
        let balance = user.balance.checked_add(change).ok_or_else(overflow)?;
        Ok(user.with_balance(balance))
    }
}

fn insufficient(bill: &Bill, change: MoneyCents) -> EngineError {
    EngineError::InsufficientFunds(format!(
        "bill {} has {}, cannot apply {}",
        bill.id, bill.balance, change
    ))
}
