//! The module contains the errors the engine can return.
//!
//! The errors are:
//!
//! - [`NotFound`] when a user, bill, transaction or tag does not exist, or a
//!   bill is not owned by the claimed user.
//! - [`InvalidInput`] when a request is malformed (bad amount, foreign tag,
//!   attempt to move a transaction between bills, ...).
//! - [`InsufficientFunds`] when an expense would overdraw a bill.
//! - [`ExistingKey`] when a unique key (the user email) is already taken.
//! - [`Store`] and [`Database`] when the store failed; the engine never
//!   retries these.
//!
//!  [`NotFound`]: EngineError::NotFound
//!  [`InvalidInput`]: EngineError::InvalidInput
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Store`]: EngineError::Store
//!  [`Database`]: EngineError::Database
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Store failure: {0}")]
    Store(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` when the error comes from the store rather than from
    /// validation, i.e. the call was aborted after validation passed.
    #[must_use]
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Database(_))
    }

    /// Reports a unique-constraint violation from the database as
    /// [`EngineError::ExistingKey`] for `key`. Other errors pass through.
    #[must_use]
    pub fn or_existing_key(self, key: &str) -> Self {
        let unique = matches!(
            &self,
            Self::Database(err)
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        );
        if unique {
            Self::ExistingKey(key.to_string())
        } else {
            self
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Store(a), Self::Store(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrelated_errors_are_not_existing_keys() {
        let err = EngineError::Database(DbErr::Custom("disk full".to_string()));
        assert!(matches!(
            err.or_existing_key("alice@example.com"),
            EngineError::Database(_)
        ));
        assert_eq!(
            EngineError::Store("down".to_string()).or_existing_key("x"),
            EngineError::Store("down".to_string())
        );
    }
}
