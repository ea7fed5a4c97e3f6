use super::account::Client;
use super::specification::{Record, Specification};
use super::transfer::Transfer;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

/// Persistence for one record type.
///
/// Implementations provide atomic single-record writes and at least
/// read-committed visibility; the engines do no locking of their own.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    async fn find_all(&self, spec: &Specification) -> Result<Vec<R>>;
    async fn find_by_id(&self, id: u64) -> Result<Option<R>>;
    /// Inserts or replaces the record, assigning a fresh id when its id is `0`.
    async fn save(&self, record: R) -> Result<R>;
    async fn delete_by_id(&self, id: u64) -> Result<()>;
    async fn exists_by_id(&self, id: u64) -> Result<bool>;
}

pub type StoreRef<R> = Arc<dyn RecordStore<R>>;

/// The only way a client's balance changes.
#[async_trait]
pub trait AccountBalanceMutator: Send + Sync {
    /// Applies `entry` to the balance of its owning client and stores it.
    ///
    /// Both writes commit together or not at all. Outgoing entries fail with
    /// `InsufficientFunds` when the balance does not cover them, and any entry
    /// fails with `AccountUnavailable` when its client does not exist.
    async fn post(&self, entry: Transfer) -> Result<(Client, Transfer)>;

    /// Replaces the client's name under the same isolation as `post`, so a
    /// concurrent posting is never overwritten. Fails with `NotFound` when
    /// the client does not exist.
    async fn rename(&self, client_id: u64, full_name: String) -> Result<Client>;
}

pub type MutatorRef = Arc<dyn AccountBalanceMutator>;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub type ClockRef = Arc<dyn Clock>;
