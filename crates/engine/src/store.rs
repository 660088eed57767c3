//! Durable storage boundary of the engine.
//!
//! The engine never talks to a database directly: it loads and saves plain
//! records through [`Store`]. [`SeaOrmStore`] is the SQL implementation used
//! by the application; tests wrap it to count or fail calls.
//!
//! Single calls are atomic on their own. The three writes of a balance
//! mutation (bill, owner, transaction) go through [`Store::commit`] so an
//! implementation can group them; the provided default applies them one
//! after the other and surfaces the first failure.

use async_trait::async_trait;

use crate::{
    Bill, BillId, NewBill, NewTag, NewTransaction, NewUser, ResultEngine, Tag, TagId,
    Transaction, TransactionId, User, UserId,
};

mod database;

pub use database::SeaOrmStore;

/// Write applied to the bill of a ledger commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BillWrite {
    Insert(NewBill),
    Save(Bill),
    /// Deletes the bill together with its transactions.
    Delete(BillId),
}

/// Write applied to the transaction of a ledger commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryWrite {
    Insert(NewTransaction),
    Save(Transaction),
    Delete(TransactionId),
}

/// The writes of one balance mutation, applied in the order bill → user →
/// entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerWrite {
    pub bill: BillWrite,
    pub user: User,
    pub entry: Option<EntryWrite>,
}

/// What a ledger commit persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerCommit {
    /// The inserted or saved bill, `None` when it was deleted.
    pub bill: Option<Bill>,
    /// The inserted or saved transaction, `None` when it was deleted or the
    /// commit had no entry.
    pub transaction: Option<Transaction>,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user(&self, id: UserId) -> ResultEngine<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> ResultEngine<Option<User>>;
    async fn list_users(&self) -> ResultEngine<Vec<User>>;
    async fn insert_user(&self, user: NewUser) -> ResultEngine<User>;
    async fn save_user(&self, user: &User) -> ResultEngine<()>;
    /// Deletes the user and everything it owns.
    async fn delete_user(&self, id: UserId) -> ResultEngine<()>;

    async fn find_bill(&self, id: BillId) -> ResultEngine<Option<Bill>>;
    /// Loads a bill only if it belongs to `user_id`.
    async fn find_bill_for_user(
        &self,
        bill_id: BillId,
        user_id: UserId,
    ) -> ResultEngine<Option<Bill>>;
    async fn list_bills(&self) -> ResultEngine<Vec<Bill>>;
    async fn list_bills_by_user(&self, user_id: UserId) -> ResultEngine<Vec<Bill>>;
    async fn insert_bill(&self, bill: NewBill) -> ResultEngine<Bill>;
    async fn save_bill(&self, bill: &Bill) -> ResultEngine<()>;
    async fn delete_bill(&self, id: BillId) -> ResultEngine<()>;

    async fn find_tag(&self, id: TagId) -> ResultEngine<Option<Tag>>;
    /// Returns the tags that exist among `ids`; completeness and ownership are
    /// checked by the caller.
    async fn find_tags_by_ids(&self, ids: &[TagId]) -> ResultEngine<Vec<Tag>>;
    async fn list_tags(&self) -> ResultEngine<Vec<Tag>>;
    async fn list_tags_by_user(&self, user_id: UserId) -> ResultEngine<Vec<Tag>>;
    async fn list_tags_by_transaction(&self, id: TransactionId) -> ResultEngine<Vec<Tag>>;
    async fn insert_tag(&self, tag: NewTag) -> ResultEngine<Tag>;
    async fn save_tag(&self, tag: &Tag) -> ResultEngine<()>;
    async fn delete_tag(&self, id: TagId) -> ResultEngine<()>;

    async fn find_transaction(&self, id: TransactionId) -> ResultEngine<Option<Transaction>>;
    /// Every transaction in creation order.
    async fn list_transactions(&self) -> ResultEngine<Vec<Transaction>>;
    /// Transactions of a user in creation order.
    async fn list_transactions_by_user(&self, user_id: UserId) -> ResultEngine<Vec<Transaction>>;
    /// Transactions of a bill in creation order.
    async fn list_transactions_by_bill(&self, bill_id: BillId) -> ResultEngine<Vec<Transaction>>;
    /// Transactions carrying the tag, in creation order.
    async fn list_transactions_by_tag(&self, tag_id: TagId) -> ResultEngine<Vec<Transaction>>;
    async fn insert_transaction(&self, tx: NewTransaction) -> ResultEngine<Transaction>;
    async fn save_transaction(&self, tx: &Transaction) -> ResultEngine<()>;
    async fn delete_transaction(&self, id: TransactionId) -> ResultEngine<()>;

    /// Applies the writes of one balance mutation.
    async fn commit(&self, write: LedgerWrite) -> ResultEngine<LedgerCommit> {
        let bill = match write.bill {
            BillWrite::Insert(bill) => Some(self.insert_bill(bill).await?),
            BillWrite::Save(bill) => {
                self.save_bill(&bill).await?;
                Some(bill)
            }
            BillWrite::Delete(id) => {
                self.delete_bill(id).await?;
                None
            }
        };
        self.save_user(&write.user).await?;
        let transaction = match write.entry {
            Some(EntryWrite::Insert(tx)) => Some(self.insert_transaction(tx).await?),
            Some(EntryWrite::Save(tx)) => {
                self.save_transaction(&tx).await?;
                Some(tx)
            }
            Some(EntryWrite::Delete(id)) => {
                self.delete_transaction(id).await?;
                None
            }
            None => None,
        };
        Ok(LedgerCommit { bill, transaction })
    }
}
