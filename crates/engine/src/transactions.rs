//! Transaction primitives.
//!
//! A `Transaction` is an income or an expense recorded against one bill of
//! one user. Its `amount` is always strictly positive; the direction of the
//! money movement lives in `kind`.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{BillId, EngineError, MoneyCents, ResultEngine, Tag, TagId, UserId};

pub type TransactionId = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Maps the boolean polarity flag used by clients (`true` = income).
    pub fn from_flag(is_income: bool) -> Self {
        if is_income {
            Self::Income
        } else {
            Self::Expense
        }
    }

    pub fn is_income(self) -> bool {
        matches!(self, Self::Income)
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidInput(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

/// A materialized transaction, tags included.
///
/// `tags` is kept sorted by tag id so two materializations of the same row
/// compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub name: String,
    pub description: Option<String>,
    pub kind: TransactionKind,
    pub amount: MoneyCents,
    pub date: NaiveDate,
    pub user_id: UserId,
    pub bill_id: BillId,
    pub tags: Vec<Tag>,
}

impl Transaction {
    pub fn tag_ids(&self) -> Vec<TagId> {
        self.tags.iter().map(|tag| tag.id).collect()
    }
}

/// A transaction that has not been persisted yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTransaction {
    pub name: String,
    pub description: Option<String>,
    pub kind: TransactionKind,
    pub amount: MoneyCents,
    pub date: NaiveDate,
    pub user_id: UserId,
    pub bill_id: BillId,
    pub tags: Vec<Tag>,
}

impl NewTransaction {
    /// Attaches the id assigned by the store.
    #[must_use]
    pub fn with_id(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            name: self.name,
            description: self.description,
            kind: self.kind,
            amount: self.amount,
            date: self.date,
            user_id: self.user_id,
            bill_id: self.bill_id,
            tags: self.tags,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub kind: String,
    pub amount: i64,
    pub date: Date,
    pub user_id: i64,
    pub bill_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bills::Entity",
        from = "Column::BillId",
        to = "super::bills::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Bill,
    #[sea_orm(has_many = "super::transaction_tags::Entity")]
    TransactionTags,
}

impl Related<super::bills::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bill.def()
    }
}

impl Related<super::transaction_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Unchanged(tx.id),
            name: ActiveValue::Set(tx.name.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount: ActiveValue::Set(tx.amount.cents()),
            date: ActiveValue::Set(tx.date),
            user_id: ActiveValue::Set(tx.user_id),
            bill_id: ActiveValue::Set(tx.bill_id),
        }
    }
}

impl From<&NewTransaction> for ActiveModel {
    fn from(tx: &NewTransaction) -> Self {
        Self {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(tx.name.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount: ActiveValue::Set(tx.amount.cents()),
            date: ActiveValue::Set(tx.date),
            user_id: ActiveValue::Set(tx.user_id),
            bill_id: ActiveValue::Set(tx.bill_id),
        }
    }
}

impl TryFrom<(Model, Vec<Tag>)> for Transaction {
    type Error = EngineError;

    fn try_from((model, mut tags): (Model, Vec<Tag>)) -> ResultEngine<Self> {
        tags.sort_by_key(|tag| tag.id);
        Ok(Self {
            id: model.id,
            name: model.name,
            description: model.description,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount: MoneyCents::new(model.amount),
            date: model.date,
            user_id: model.user_id,
            bill_id: model.bill_id,
            tags,
        })
    }
}
