//! Users and their aggregate balance.
//!
//! `User::balance` is denormalized: it always equals the sum of the balances
//! of the bills the user owns. Only ledger side effects change it.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

use crate::MoneyCents;

pub type UserId = i64;

/// A registered user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub balance: MoneyCents,
}

impl User {
    /// Returns a copy of the user carrying `balance`.
    #[must_use]
    pub fn with_balance(&self, balance: MoneyCents) -> Self {
        Self {
            balance,
            ..self.clone()
        }
    }
}

/// A user that has not been persisted yet. New users always start at 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub balance: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bills::Entity")]
    Bills,
}

impl Related<super::bills::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bills.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            balance: MoneyCents::new(model.balance),
        }
    }
}

impl From<&User> for ActiveModel {
    fn from(value: &User) -> Self {
        Self {
            id: ActiveValue::Unchanged(value.id),
            name: ActiveValue::Set(value.name.clone()),
            email: ActiveValue::Set(value.email.clone()),
            balance: ActiveValue::Set(value.balance.cents()),
        }
    }
}

impl From<&NewUser> for ActiveModel {
    fn from(value: &NewUser) -> Self {
        Self {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(value.name.clone()),
            email: ActiveValue::Set(value.email.clone()),
            balance: ActiveValue::Set(0),
        }
    }
}
