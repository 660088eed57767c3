//! Command structs for engine operations.
//!
//! These types group parameters for write operations
//! (create/update of transactions, bills and users), keeping call sites
//! readable and avoiding long argument lists.

use chrono::NaiveDate;

use crate::{BillId, MoneyCents, TagId, TransactionId, TransactionKind, UserId};

/// Record a new income or expense against a bill.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub user_id: UserId,
    pub bill_id: BillId,
    pub name: String,
    pub description: Option<String>,
    pub kind: TransactionKind,
    pub amount: MoneyCents,
    pub date: NaiveDate,
    pub tag_ids: Vec<TagId>,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(
        user_id: UserId,
        bill_id: BillId,
        name: impl Into<String>,
        kind: TransactionKind,
        amount: MoneyCents,
        date: NaiveDate,
    ) -> Self {
        Self {
            user_id,
            bill_id,
            name: name.into(),
            description: None,
            kind,
            amount,
            date,
            tag_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn income(
        user_id: UserId,
        bill_id: BillId,
        name: impl Into<String>,
        amount: MoneyCents,
        date: NaiveDate,
    ) -> Self {
        Self::new(user_id, bill_id, name, TransactionKind::Income, amount, date)
    }

    #[must_use]
    pub fn expense(
        user_id: UserId,
        bill_id: BillId,
        name: impl Into<String>,
        amount: MoneyCents,
        date: NaiveDate,
    ) -> Self {
        Self::new(user_id, bill_id, name, TransactionKind::Expense, amount, date)
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn tag_ids(mut self, tag_ids: impl IntoIterator<Item = TagId>) -> Self {
        self.tag_ids = tag_ids.into_iter().collect();
        self
    }
}

/// Patch an existing transaction.
///
/// Fields left to `None` keep their stored value. `user_id` and `bill_id`
/// may only restate the stored owner and bill: a transaction never moves.
/// `tag_ids = Some(vec![])` removes every tag; a blank `description` clears
/// it.
#[derive(Clone, Debug, Default)]
pub struct UpdateTransactionCmd {
    pub transaction_id: TransactionId,
    pub user_id: Option<UserId>,
    pub bill_id: Option<BillId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<TransactionKind>,
    pub amount: Option<MoneyCents>,
    pub date: Option<NaiveDate>,
    pub tag_ids: Option<Vec<TagId>>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(transaction_id: TransactionId) -> Self {
        Self {
            transaction_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn bill_id(mut self, bill_id: BillId) -> Self {
        self.bill_id = Some(bill_id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn tag_ids(mut self, tag_ids: impl IntoIterator<Item = TagId>) -> Self {
        self.tag_ids = Some(tag_ids.into_iter().collect());
        self
    }
}

/// Rename a bill and/or correct its balance.
#[derive(Clone, Debug, Default)]
pub struct UpdateBillCmd {
    pub bill_id: BillId,
    pub name: Option<String>,
    pub balance: Option<MoneyCents>,
}

impl UpdateBillCmd {
    #[must_use]
    pub fn new(bill_id: BillId) -> Self {
        Self {
            bill_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn balance(mut self, balance: MoneyCents) -> Self {
        self.balance = Some(balance);
        self
    }
}

/// Rename a user and/or change their email.
#[derive(Clone, Debug, Default)]
pub struct UpdateUserCmd {
    pub user_id: UserId,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UpdateUserCmd {
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
