use crate::domain::account::Client;
use crate::domain::back_office::{AppUser, CreditCard, Employee, Loan};
use crate::domain::order::Order;
use crate::domain::ports::{AccountBalanceMutator, RecordStore};
use crate::domain::specification::{Record, Specification};
use crate::domain::transfer::Transfer;
use crate::error::{BankError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// One column family per record collection.
pub const COLLECTIONS: [&str; 7] = [
    Order::COLLECTION,
    Client::COLLECTION,
    Transfer::COLLECTION,
    Employee::COLLECTION,
    AppUser::COLLECTION,
    CreditCard::COLLECTION,
    Loan::COLLECTION,
];

/// A persistent store implementation using RocksDB.
///
/// Records are JSON values keyed by their big-endian id, so iteration order is
/// id order and the last key gives the next free id. Writes are serialized
/// through one async mutex, which makes id allocation and the balance
/// mutator's read-check-write safe.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    writes: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the specified path, creating
    /// any missing collection column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLLECTIONS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            writes: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, collection: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(collection).ok_or_else(|| {
            BankError::InternalError(Box::new(std::io::Error::other(format!(
                "{collection} column family not found"
            ))))
        })
    }

    fn read<R: Record>(&self, id: u64) -> Result<Option<R>> {
        let cf = self.cf(R::COLLECTION)?;
        match self.db.get_cf(cf, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn next_id(&self, collection: &str) -> Result<u64> {
        let cf = self.cf(collection)?;
        match self.db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (key, _) = item?;
                Ok(id_from_key(&key)? + 1)
            }
            None => Ok(1),
        }
    }
}

fn id_from_key(key: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = key.try_into().map_err(|_| {
        BankError::InternalError(Box::new(std::io::Error::other(format!(
            "malformed record key of {} bytes",
            key.len()
        ))))
    })?;
    Ok(u64::from_be_bytes(bytes))
}

#[async_trait]
impl<R: Record> RecordStore<R> for RocksDbStore {
    async fn find_all(&self, spec: &Specification) -> Result<Vec<R>> {
        let filter = spec.compile::<R>()?;
        debug!(query = %filter.to_store_query(), "Scanning collection");

        let cf = self.cf(R::COLLECTION)?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let record: R = serde_json::from_slice(&value)?;
            if filter.matches(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<R>> {
        self.read(id)
    }

    async fn save(&self, mut record: R) -> Result<R> {
        let _guard = self.writes.lock().await;
        if record.id() == 0 {
            record.set_id(self.next_id(R::COLLECTION)?);
        }
        let cf = self.cf(R::COLLECTION)?;
        self.db
            .put_cf(cf, record.id().to_be_bytes(), serde_json::to_vec(&record)?)?;
        Ok(record)
    }

    async fn delete_by_id(&self, id: u64) -> Result<()> {
        let _guard = self.writes.lock().await;
        let cf = self.cf(R::COLLECTION)?;
        self.db.delete_cf(cf, id.to_be_bytes())?;
        Ok(())
    }

    async fn exists_by_id(&self, id: u64) -> Result<bool> {
        let cf = self.cf(R::COLLECTION)?;
        // Just check if the key exists without retrieving the value
        Ok(self.db.get_pinned_cf(cf, id.to_be_bytes())?.is_some())
    }
}

#[async_trait]
impl AccountBalanceMutator for RocksDbStore {
    async fn post(&self, mut entry: Transfer) -> Result<(Client, Transfer)> {
        let _guard = self.writes.lock().await;

        let mut client: Client = self.read(entry.client)?.ok_or_else(|| {
            BankError::AccountUnavailable(format!("client {} not available", entry.client))
        })?;
        client.apply(entry.r#type, entry.amount)?;
        if entry.id == 0 {
            entry.id = self.next_id(Transfer::COLLECTION)?;
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(Client::COLLECTION)?,
            client.id.to_be_bytes(),
            serde_json::to_vec(&client)?,
        );
        batch.put_cf(
            self.cf(Transfer::COLLECTION)?,
            entry.id.to_be_bytes(),
            serde_json::to_vec(&entry)?,
        );
        self.db.write(batch)?;

        Ok((client, entry))
    }

    async fn rename(&self, client_id: u64, full_name: String) -> Result<Client> {
        let _guard = self.writes.lock().await;

        let mut client: Client = self
            .read(client_id)?
            .ok_or_else(|| BankError::not_found("Client", client_id))?;
        client.full_name = full_name;
        self.db.put_cf(
            self.cf(Client::COLLECTION)?,
            client.id.to_be_bytes(),
            serde_json::to_vec(&client)?,
        )?;
        Ok(client)
    }
}
