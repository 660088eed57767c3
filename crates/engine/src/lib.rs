pub use bills::{Bill, BillId, NewBill};
pub use cache::{CacheFill, CachedTransactions, DEFAULT_CACHE_CAPACITY, TransactionCache};
pub use commands::{CreateTransactionCmd, UpdateBillCmd, UpdateTransactionCmd, UpdateUserCmd};
pub use error::EngineError;
pub use ledger::{BalanceLedger, DEFAULT_MAX_AMOUNT};
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder};
pub use scopes::{MutationScopes, ScopeGuard, ScopeKey};
pub use store::{BillWrite, EntryWrite, LedgerCommit, LedgerWrite, SeaOrmStore, Store};
pub use tags::{NewTag, Tag, TagId};
pub use transactions::{NewTransaction, Transaction, TransactionId, TransactionKind};
pub use users::{NewUser, User, UserId};

mod bills;
mod cache;
mod commands;
mod error;
mod ledger;
mod money;
mod ops;
mod scopes;
mod store;
mod tags;
mod transaction_tags;
mod transactions;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
