#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Bill, BillId, Engine, EngineError, LedgerCommit, LedgerWrite, MoneyCents, NewBill, NewTag,
    NewTransaction, NewUser, ResultEngine, SeaOrmStore, Store, Tag, TagId, Transaction,
    TransactionId, User, UserId,
};
use migration::MigratorTrait;

pub async fn database() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn engine() -> Engine {
    Engine::builder()
        .database(database().await)
        .build()
        .await
        .unwrap()
}

/// Engine over a [`ProbeStore`], returned alongside so tests can count store
/// calls and inject failures.
pub async fn probed_engine(cache_capacity: usize) -> (Engine, Arc<ProbeStore>) {
    let probe = Arc::new(ProbeStore::new(SeaOrmStore::new(database().await)));
    let engine = Engine::builder()
        .store(probe.clone())
        .cache_capacity(cache_capacity)
        .build()
        .await
        .unwrap();
    (engine, probe)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn cents(value: i64) -> MoneyCents {
    MoneyCents::new(value)
}

/// Creates a user named after `email` with one bill holding `balance`.
pub async fn user_with_bill(engine: &Engine, email: &str, balance: i64) -> (User, Bill) {
    let user = engine.create_user("Owner", email).await.unwrap();
    let bill = engine
        .create_bill(user.id, "Main", cents(balance))
        .await
        .unwrap();
    (user, bill)
}

/// Sorted by id, the order of a fresh store listing.
pub fn by_id(transactions: &[Transaction]) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by_key(|tx| tx.id);
    sorted
}

/// Store wrapper counting calls and failing on demand.
pub struct ProbeStore {
    inner: SeaOrmStore,
    calls: AtomicUsize,
    user_listings: AtomicUsize,
    fail_commits: AtomicBool,
    user_read_delay_ms: AtomicU64,
    hide_emails: AtomicBool,
}

impl ProbeStore {
    pub fn new(inner: SeaOrmStore) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            user_listings: AtomicUsize::new(0),
            fail_commits: AtomicBool::new(false),
            user_read_delay_ms: AtomicU64::new(0),
            hide_emails: AtomicBool::new(false),
        }
    }

    /// Every store call so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls to `list_transactions_by_user` so far.
    pub fn user_listings(&self) -> usize {
        self.user_listings.load(Ordering::SeqCst)
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Holds the next `find_user` result for `delay` after it was read.
    pub fn delay_next_user_read(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap();
        self.user_read_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Makes `find_user_by_email` report no match, as a concurrent
    /// registration that has not committed yet would see.
    pub fn hide_emails(&self, hide: bool) {
        self.hide_emails.store(hide, Ordering::SeqCst);
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for ProbeStore {
    async fn find_user(&self, id: UserId) -> ResultEngine<Option<User>> {
        self.hit();
        let found = self.inner.find_user(id).await;
        let delay = self.user_read_delay_ms.swap(0, Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        found
    }

    async fn find_user_by_email(&self, email: &str) -> ResultEngine<Option<User>> {
        self.hit();
        if self.hide_emails.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_user_by_email(email).await
    }

    async fn list_users(&self) -> ResultEngine<Vec<User>> {
        self.hit();
        self.inner.list_users().await
    }

    async fn insert_user(&self, user: NewUser) -> ResultEngine<User> {
        self.hit();
        self.inner.insert_user(user).await
    }

    async fn save_user(&self, user: &User) -> ResultEngine<()> {
        self.hit();
        self.inner.save_user(user).await
    }

    async fn delete_user(&self, id: UserId) -> ResultEngine<()> {
        self.hit();
        self.inner.delete_user(id).await
    }

    async fn find_bill(&self, id: BillId) -> ResultEngine<Option<Bill>> {
        self.hit();
        self.inner.find_bill(id).await
    }

    async fn find_bill_for_user(
        &self,
        bill_id: BillId,
        user_id: UserId,
    ) -> ResultEngine<Option<Bill>> {
        self.hit();
        self.inner.find_bill_for_user(bill_id, user_id).await
    }

    async fn list_bills(&self) -> ResultEngine<Vec<Bill>> {
        self.hit();
        self.inner.list_bills().await
    }

    async fn list_bills_by_user(&self, user_id: UserId) -> ResultEngine<Vec<Bill>> {
        self.hit();
        self.inner.list_bills_by_user(user_id).await
    }

    async fn insert_bill(&self, bill: NewBill) -> ResultEngine<Bill> {
        self.hit();
        self.inner.insert_bill(bill).await
    }

    async fn save_bill(&self, bill: &Bill) -> ResultEngine<()> {
        self.hit();
        self.inner.save_bill(bill).await
    }

    async fn delete_bill(&self, id: BillId) -> ResultEngine<()> {
        self.hit();
        self.inner.delete_bill(id).await
    }

    async fn find_tag(&self, id: TagId) -> ResultEngine<Option<Tag>> {
        self.hit();
        self.inner.find_tag(id).await
    }

    async fn find_tags_by_ids(&self, ids: &[TagId]) -> ResultEngine<Vec<Tag>> {
        self.hit();
        self.inner.find_tags_by_ids(ids).await
    }

    async fn list_tags(&self) -> ResultEngine<Vec<Tag>> {
        self.hit();
        self.inner.list_tags().await
    }

    async fn list_tags_by_user(&self, user_id: UserId) -> ResultEngine<Vec<Tag>> {
        self.hit();
        self.inner.list_tags_by_user(user_id).await
    }

    async fn list_tags_by_transaction(&self, id: TransactionId) -> ResultEngine<Vec<Tag>> {
        self.hit();
        self.inner.list_tags_by_transaction(id).await
    }

    async fn insert_tag(&self, tag: NewTag) -> ResultEngine<Tag> {
        self.hit();
        self.inner.insert_tag(tag).await
    }

    async fn save_tag(&self, tag: &Tag) -> ResultEngine<()> {
        self.hit();
        self.inner.save_tag(tag).await
    }

    async fn delete_tag(&self, id: TagId) -> ResultEngine<()> {
        self.hit();
        self.inner.delete_tag(id).await
    }

    async fn find_transaction(&self, id: TransactionId) -> ResultEngine<Option<Transaction>> {
        self.hit();
        self.inner.find_transaction(id).await
    }

    async fn list_transactions(&self) -> ResultEngine<Vec<Transaction>> {
        self.hit();
        self.inner.list_transactions().await
    }

    async fn list_transactions_by_user(&self, user_id: UserId) -> ResultEngine<Vec<Transaction>> {
        self.hit();
        self.user_listings.fetch_add(1, Ordering::SeqCst);
        self.inner.list_transactions_by_user(user_id).await
    }

    async fn list_transactions_by_bill(&self, bill_id: BillId) -> ResultEngine<Vec<Transaction>> {
        self.hit();
        self.inner.list_transactions_by_bill(bill_id).await
    }

    async fn list_transactions_by_tag(&self, tag_id: TagId) -> ResultEngine<Vec<Transaction>> {
        self.hit();
        self.inner.list_transactions_by_tag(tag_id).await
    }

    async fn insert_transaction(&self, tx: NewTransaction) -> ResultEngine<Transaction> {
        self.hit();
        self.inner.insert_transaction(tx).await
    }

    async fn save_transaction(&self, tx: &Transaction) -> ResultEngine<()> {
        self.hit();
        self.inner.save_transaction(tx).await
    }

    async fn delete_transaction(&self, id: TransactionId) -> ResultEngine<()> {
        self.hit();
        self.inner.delete_transaction(id).await
    }

    async fn commit(&self, write: LedgerWrite) -> ResultEngine<LedgerCommit> {
        self.hit();
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(EngineError::Store("injected commit failure".to_string()));
        }
        self.inner.commit(write).await
    }
}
