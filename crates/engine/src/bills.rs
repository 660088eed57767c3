//! The module contains `Bill` and its database entity.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{MoneyCents, UserId};

pub type BillId = i64;

/// A bill.
///
/// A bill is a representation of a real account: a wallet, a bank account or
/// anything else where money is kept. It belongs to exactly one user and its
/// balance never goes negative because of a recorded expense.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub name: String,
    pub balance: MoneyCents,
    pub user_id: UserId,
}

impl Bill {
    /// Returns a copy of the bill carrying `balance`.
    #[must_use]
    pub fn with_balance(&self, balance: MoneyCents) -> Self {
        Self {
            balance,
            ..self.clone()
        }
    }
}

/// A bill that has not been persisted yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewBill {
    pub name: String,
    pub balance: MoneyCents,
    pub user_id: UserId,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub balance: i64,
    pub user_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Bill {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            balance: MoneyCents::new(model.balance),
            user_id: model.user_id,
        }
    }
}

impl From<&Bill> for ActiveModel {
    fn from(value: &Bill) -> Self {
        Self {
            id: ActiveValue::Unchanged(value.id),
            name: ActiveValue::Set(value.name.clone()),
            balance: ActiveValue::Set(value.balance.cents()),
            user_id: ActiveValue::Set(value.user_id),
        }
    }
}

impl From<&NewBill> for ActiveModel {
    fn from(value: &NewBill) -> Self {
        Self {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(value.name.clone()),
            balance: ActiveValue::Set(value.balance.cents()),
            user_id: ActiveValue::Set(value.user_id),
        }
    }
}
