//! [`Store`] over a sea-orm connection (SQLite in production and tests).

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseConnection, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    Bill, BillId, NewBill, NewTag, NewTransaction, NewUser, ResultEngine, Tag, TagId,
    Transaction, TransactionId, User, UserId, bills, tags, transaction_tags, transactions, users,
};

use super::{BillWrite, EntryWrite, LedgerCommit, LedgerWrite, Store};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

#[derive(Clone, Debug)]
pub struct SeaOrmStore {
    database: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &DatabaseConnection {
        &self.database
    }
}

async fn tags_by_transaction<C: ConnectionTrait>(
    db: &C,
    transaction_ids: &[TransactionId],
) -> ResultEngine<HashMap<TransactionId, Vec<Tag>>> {
    if transaction_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let links = transaction_tags::Entity::find()
        .filter(transaction_tags::Column::TransactionId.is_in(transaction_ids.iter().copied()))
        .all(db)
        .await?;
    if links.is_empty() {
        return Ok(HashMap::new());
    }

    let mut tag_ids: Vec<TagId> = links.iter().map(|link| link.tag_id).collect();
    tag_ids.sort_unstable();
    tag_ids.dedup();
    let tags: HashMap<TagId, Tag> = tags::Entity::find()
        .filter(tags::Column::Id.is_in(tag_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|model| (model.id, Tag::from(model)))
        .collect();

    let mut by_transaction: HashMap<TransactionId, Vec<Tag>> = HashMap::new();
    for link in links {
        if let Some(tag) = tags.get(&link.tag_id) {
            by_transaction
                .entry(link.transaction_id)
                .or_default()
                .push(tag.clone());
        }
    }
    for tags in by_transaction.values_mut() {
        tags.sort_by_key(|tag| tag.id);
    }
    Ok(by_transaction)
}

async fn materialize<C: ConnectionTrait>(
    db: &C,
    models: Vec<transactions::Model>,
) -> ResultEngine<Vec<Transaction>> {
    let ids: Vec<TransactionId> = models.iter().map(|model| model.id).collect();
    let mut tags = tags_by_transaction(db, &ids).await?;
    models
        .into_iter()
        .map(|model| {
            let tx_tags = tags.remove(&model.id).unwrap_or_default();
            Transaction::try_from((model, tx_tags))
        })
        .collect()
}

async fn link_tags<C: ConnectionTrait>(
    db: &C,
    transaction_id: TransactionId,
    tags: &[Tag],
) -> ResultEngine<()> {
    if tags.is_empty() {
        return Ok(());
    }
    let links = tags.iter().map(|tag| transaction_tags::ActiveModel {
        transaction_id: ActiveValue::Set(transaction_id),
        tag_id: ActiveValue::Set(tag.id),
    });
    transaction_tags::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

async fn unlink_transactions<C: ConnectionTrait>(
    db: &C,
    transaction_ids: Vec<TransactionId>,
) -> ResultEngine<()> {
    if transaction_ids.is_empty() {
        return Ok(());
    }
    transaction_tags::Entity::delete_many()
        .filter(transaction_tags::Column::TransactionId.is_in(transaction_ids))
        .exec(db)
        .await?;
    Ok(())
}

async fn transaction_ids_where<C: ConnectionTrait>(
    db: &C,
    column: transactions::Column,
    value: i64,
) -> ResultEngine<Vec<TransactionId>> {
    Ok(transactions::Entity::find()
        .filter(column.eq(value))
        .all(db)
        .await?
        .into_iter()
        .map(|model| model.id)
        .collect())
}

async fn insert_bill<C: ConnectionTrait>(db: &C, bill: &NewBill) -> ResultEngine<Bill> {
    let model = bills::ActiveModel::from(bill).insert(db).await?;
    Ok(Bill::from(model))
}

async fn save_bill<C: ConnectionTrait>(db: &C, bill: &Bill) -> ResultEngine<()> {
    bills::ActiveModel::from(bill).update(db).await?;
    Ok(())
}

async fn delete_bill<C: ConnectionTrait>(db: &C, id: BillId) -> ResultEngine<()> {
    let tx_ids = transaction_ids_where(db, transactions::Column::BillId, id).await?;
    unlink_transactions(db, tx_ids).await?;
    transactions::Entity::delete_many()
        .filter(transactions::Column::BillId.eq(id))
        .exec(db)
        .await?;
    bills::Entity::delete_by_id(id).exec(db).await?;
    Ok(())
}

async fn save_user<C: ConnectionTrait>(db: &C, user: &User) -> ResultEngine<()> {
    users::ActiveModel::from(user).update(db).await?;
    Ok(())
}

async fn insert_transaction<C: ConnectionTrait>(
    db: &C,
    tx: NewTransaction,
) -> ResultEngine<Transaction> {
    let model = transactions::ActiveModel::from(&tx).insert(db).await?;
    link_tags(db, model.id, &tx.tags).await?;
    Ok(tx.with_id(model.id))
}

async fn save_transaction<C: ConnectionTrait>(db: &C, tx: &Transaction) -> ResultEngine<()> {
    transactions::ActiveModel::from(tx).update(db).await?;
    unlink_transactions(db, vec![tx.id]).await?;
    link_tags(db, tx.id, &tx.tags).await?;
    Ok(())
}

async fn delete_transaction<C: ConnectionTrait>(db: &C, id: TransactionId) -> ResultEngine<()> {
    unlink_transactions(db, vec![id]).await?;
    transactions::Entity::delete_by_id(id).exec(db).await?;
    Ok(())
}

#[async_trait]
impl Store for SeaOrmStore {
    async fn find_user(&self, id: UserId) -> ResultEngine<Option<User>> {
        Ok(users::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> ResultEngine<Option<User>> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?
            .map(User::from))
    }

    async fn list_users(&self) -> ResultEngine<Vec<User>> {
        Ok(users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(User::from)
            .collect())
    }

    async fn insert_user(&self, user: NewUser) -> ResultEngine<User> {
        let model = users::ActiveModel::from(&user)
            .insert(&self.database)
            .await?;
        Ok(User::from(model))
    }

    async fn save_user(&self, user: &User) -> ResultEngine<()> {
        save_user(&self.database, user).await
    }

    async fn delete_user(&self, id: UserId) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let tx_ids = transaction_ids_where(&db_tx, transactions::Column::UserId, id).await?;
            unlink_transactions(&db_tx, tx_ids).await?;
            transactions::Entity::delete_many()
                .filter(transactions::Column::UserId.eq(id))
                .exec(&db_tx)
                .await?;

            let tag_ids: Vec<TagId> = tags::Entity::find()
                .filter(tags::Column::UserId.eq(id))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| model.id)
                .collect();
            if !tag_ids.is_empty() {
                transaction_tags::Entity::delete_many()
                    .filter(transaction_tags::Column::TagId.is_in(tag_ids))
                    .exec(&db_tx)
                    .await?;
            }
            tags::Entity::delete_many()
                .filter(tags::Column::UserId.eq(id))
                .exec(&db_tx)
                .await?;
            bills::Entity::delete_many()
                .filter(bills::Column::UserId.eq(id))
                .exec(&db_tx)
                .await?;
            users::Entity::delete_by_id(id).exec(&db_tx).await?;
            Ok(())
        })
    }

    async fn find_bill(&self, id: BillId) -> ResultEngine<Option<Bill>> {
        Ok(bills::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .map(Bill::from))
    }

    async fn find_bill_for_user(
        &self,
        bill_id: BillId,
        user_id: UserId,
    ) -> ResultEngine<Option<Bill>> {
        Ok(bills::Entity::find_by_id(bill_id)
            .filter(bills::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .map(Bill::from))
    }

    async fn list_bills(&self) -> ResultEngine<Vec<Bill>> {
        Ok(bills::Entity::find()
            .order_by_asc(bills::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Bill::from)
            .collect())
    }

    async fn list_bills_by_user(&self, user_id: UserId) -> ResultEngine<Vec<Bill>> {
        Ok(bills::Entity::find()
            .filter(bills::Column::UserId.eq(user_id))
            .order_by_asc(bills::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Bill::from)
            .collect())
    }

    async fn insert_bill(&self, bill: NewBill) -> ResultEngine<Bill> {
        insert_bill(&self.database, &bill).await
    }

    async fn save_bill(&self, bill: &Bill) -> ResultEngine<()> {
        save_bill(&self.database, bill).await
    }

    async fn delete_bill(&self, id: BillId) -> ResultEngine<()> {
        with_tx!(self, |db_tx| delete_bill(&db_tx, id).await)
    }

    async fn find_tag(&self, id: TagId) -> ResultEngine<Option<Tag>> {
        Ok(tags::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .map(Tag::from))
    }

    async fn find_tags_by_ids(&self, ids: &[TagId]) -> ResultEngine<Vec<Tag>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(tags::Entity::find()
            .filter(tags::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(tags::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Tag::from)
            .collect())
    }

    async fn list_tags(&self) -> ResultEngine<Vec<Tag>> {
        Ok(tags::Entity::find()
            .order_by_asc(tags::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Tag::from)
            .collect())
    }

    async fn list_tags_by_user(&self, user_id: UserId) -> ResultEngine<Vec<Tag>> {
        Ok(tags::Entity::find()
            .filter(tags::Column::UserId.eq(user_id))
            .order_by_asc(tags::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Tag::from)
            .collect())
    }

    async fn list_tags_by_transaction(&self, id: TransactionId) -> ResultEngine<Vec<Tag>> {
        Ok(tags_by_transaction(&self.database, &[id])
            .await?
            .remove(&id)
            .unwrap_or_default())
    }

    async fn insert_tag(&self, tag: NewTag) -> ResultEngine<Tag> {
        let model = tags::ActiveModel::from(&tag).insert(&self.database).await?;
        Ok(Tag::from(model))
    }

    async fn save_tag(&self, tag: &Tag) -> ResultEngine<()> {
        tags::ActiveModel::from(tag).update(&self.database).await?;
        Ok(())
    }

    async fn delete_tag(&self, id: TagId) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            transaction_tags::Entity::delete_many()
                .filter(transaction_tags::Column::TagId.eq(id))
                .exec(&db_tx)
                .await?;
            tags::Entity::delete_by_id(id).exec(&db_tx).await?;
            Ok(())
        })
    }

    async fn find_transaction(&self, id: TransactionId) -> ResultEngine<Option<Transaction>> {
        let Some(model) = transactions::Entity::find_by_id(id)
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };
        let mut found = materialize(&self.database, vec![model]).await?;
        Ok(found.pop())
    }

    async fn list_transactions(&self) -> ResultEngine<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .order_by_asc(transactions::Column::Id)
            .all(&self.database)
            .await?;
        materialize(&self.database, models).await
    }

    async fn list_transactions_by_user(&self, user_id: UserId) -> ResultEngine<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_asc(transactions::Column::Id)
            .all(&self.database)
            .await?;
        materialize(&self.database, models).await
    }

    async fn list_transactions_by_bill(&self, bill_id: BillId) -> ResultEngine<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::BillId.eq(bill_id))
            .order_by_asc(transactions::Column::Id)
            .all(&self.database)
            .await?;
        materialize(&self.database, models).await
    }

    async fn list_transactions_by_tag(&self, tag_id: TagId) -> ResultEngine<Vec<Transaction>> {
        let tagged: Vec<TransactionId> = transaction_tags::Entity::find()
            .filter(transaction_tags::Column::TagId.eq(tag_id))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|link| link.transaction_id)
            .collect();
        if tagged.is_empty() {
            return Ok(Vec::new());
        }
        let models = transactions::Entity::find()
            .filter(transactions::Column::Id.is_in(tagged))
            .order_by_asc(transactions::Column::Id)
            .all(&self.database)
            .await?;
        materialize(&self.database, models).await
    }

    async fn insert_transaction(&self, tx: NewTransaction) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| insert_transaction(&db_tx, tx).await)
    }

    async fn save_transaction(&self, tx: &Transaction) -> ResultEngine<()> {
        with_tx!(self, |db_tx| save_transaction(&db_tx, tx).await)
    }

    async fn delete_transaction(&self, id: TransactionId) -> ResultEngine<()> {
        with_tx!(self, |db_tx| delete_transaction(&db_tx, id).await)
    }

    /// Applies the whole ledger write inside one database transaction.
    async fn commit(&self, write: LedgerWrite) -> ResultEngine<LedgerCommit> {
        with_tx!(self, |db_tx| {
            let bill = match write.bill {
                BillWrite::Insert(bill) => Some(insert_bill(&db_tx, &bill).await?),
                BillWrite::Save(bill) => {
                    save_bill(&db_tx, &bill).await?;
                    Some(bill)
                }
                BillWrite::Delete(id) => {
                    delete_bill(&db_tx, id).await?;
                    None
                }
            };
            save_user(&db_tx, &write.user).await?;
            let transaction = match write.entry {
                Some(EntryWrite::Insert(tx)) => Some(insert_transaction(&db_tx, tx).await?),
                Some(EntryWrite::Save(tx)) => {
                    save_transaction(&db_tx, &tx).await?;
                    Some(tx)
                }
                Some(EntryWrite::Delete(id)) => {
                    delete_transaction(&db_tx, id).await?;
                    None
                }
                None => None,
            };
            Ok(LedgerCommit { bill, transaction })
        })
    }
}
