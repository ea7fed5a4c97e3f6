use crate::domain::account::Client;
use crate::domain::ports::{AccountBalanceMutator, RecordStore};
use crate::domain::specification::{Record, Specification};
use crate::domain::transfer::Transfer;
use crate::error::{BankError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct Table<R> {
    rows: BTreeMap<u64, R>,
    next_id: u64,
}

impl<R: Record> Table<R> {
    fn insert(&mut self, mut record: R) -> R {
        if record.id() == 0 {
            record.set_id(self.next_id);
        }
        self.next_id = self.next_id.max(record.id() + 1);
        self.rows.insert(record.id(), record.clone());
        record
    }
}

/// A thread-safe in-memory store for one record type.
///
/// Rows are kept in id order, which is the order `find_all` returns them in.
/// Clones share the same underlying table.
pub struct InMemoryStore<R> {
    table: Arc<RwLock<Table<R>>>,
}

impl<R> Clone for InMemoryStore<R> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<R> Default for InMemoryStore<R> {
    fn default() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table {
                rows: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }
}

impl<R: Record> InMemoryStore<R> {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for InMemoryStore<R> {
    async fn find_all(&self, spec: &Specification) -> Result<Vec<R>> {
        let filter = spec.compile::<R>()?;
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<R>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn save(&self, record: R) -> Result<R> {
        let mut table = self.table.write().await;
        Ok(table.insert(record))
    }

    async fn delete_by_id(&self, id: u64) -> Result<()> {
        let mut table = self.table.write().await;
        table.rows.remove(&id);
        Ok(())
    }

    async fn exists_by_id(&self, id: u64) -> Result<bool> {
        let table = self.table.read().await;
        Ok(table.rows.contains_key(&id))
    }
}

/// Applies ledger entries to in-memory client balances.
///
/// Holds the client and transfer tables' write locks together, always in
/// that order, so a balance change and its entry become visible at once.
#[derive(Clone)]
pub struct InMemoryBalanceMutator {
    clients: InMemoryStore<Client>,
    transfers: InMemoryStore<Transfer>,
}

impl InMemoryBalanceMutator {
    pub fn new(clients: InMemoryStore<Client>, transfers: InMemoryStore<Transfer>) -> Self {
        Self { clients, transfers }
    }
}

#[async_trait]
impl AccountBalanceMutator for InMemoryBalanceMutator {
    async fn post(&self, entry: Transfer) -> Result<(Client, Transfer)> {
        let mut clients = self.clients.table.write().await;
        let mut transfers = self.transfers.table.write().await;

        let client = clients.rows.get_mut(&entry.client).ok_or_else(|| {
            BankError::AccountUnavailable(format!("client {} not available", entry.client))
        })?;
        client.apply(entry.r#type, entry.amount)?;
        let client = client.clone();

        Ok((client, transfers.insert(entry)))
    }

    async fn rename(&self, client_id: u64, full_name: String) -> Result<Client> {
        let mut clients = self.clients.table.write().await;
        let client = clients
            .rows
            .get_mut(&client_id)
            .ok_or_else(|| BankError::not_found("Client", client_id))?;
        client.full_name = full_name;
        Ok(client.clone())
    }
}
