//! Tag registry per user.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};

use crate::UserId;

pub type TagId = i64;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub user_id: UserId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTag {
    pub name: String,
    pub user_id: UserId,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
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
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Tag {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            user_id: model.user_id,
        }
    }
}

impl From<&NewTag> for ActiveModel {
    fn from(value: &NewTag) -> Self {
        Self {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(value.name.clone()),
            user_id: ActiveValue::Set(value.user_id),
        }
    }
}

impl From<&Tag> for ActiveModel {
    fn from(value: &Tag) -> Self {
        Self {
            id: ActiveValue::Unchanged(value.id),
            name: ActiveValue::Set(value.name.clone()),
            user_id: ActiveValue::Unchanged(value.user_id),
        }
    }
}
