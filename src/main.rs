use clap::Parser;
use miette::{IntoDiagnostic, Result};
use obs_core::application::ledger::TransferLedger;
use obs_core::config::{LogConfig, LogFormat};
use obs_core::domain::account::Client;
use obs_core::domain::ports::{ClockRef, MutatorRef, StoreRef};
use obs_core::domain::specification::Specification;
use obs_core::domain::transfer::Transfer;
use obs_core::infrastructure::clock::SystemClock;
use obs_core::infrastructure::in_memory::{InMemoryBalanceMutator, InMemoryStore};
use obs_core::interfaces::csv::client_reader::ClientReader;
use obs_core::interfaces::csv::client_writer::ClientWriter;
use obs_core::interfaces::csv::transfer_reader::TransferReader;
use obs_core::logging;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Opening balances CSV file (`client,full_name,account_number,balance`)
    clients: PathBuf,

    /// Transfers CSV file (`sender,to_account_number,amount,category,title`)
    transfers: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Log filter directives
    #[arg(long, env = "OBS_LOG", default_value = "warn")]
    log: String,

    #[arg(long, env = "OBS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

struct LedgerStores {
    clients: StoreRef<Client>,
    transfers: StoreRef<Transfer>,
    mutator: MutatorRef,
}

fn in_memory_stores() -> LedgerStores {
    let clients = InMemoryStore::<Client>::new();
    let transfers = InMemoryStore::<Transfer>::new();
    LedgerStores {
        mutator: Arc::new(InMemoryBalanceMutator::new(
            clients.clone(),
            transfers.clone(),
        )),
        clients: Arc::new(clients),
        transfers: Arc::new(transfers),
    }
}

#[cfg(feature = "storage-rocksdb")]
fn persistent_stores(path: &Path) -> obs_core::error::Result<LedgerStores> {
    use obs_core::infrastructure::rocksdb::RocksDbStore;

    let store = RocksDbStore::open(path)?;
    Ok(LedgerStores {
        clients: Arc::new(store.clone()),
        transfers: Arc::new(store.clone()),
        mutator: Arc::new(store),
    })
}

#[cfg(not(feature = "storage-rocksdb"))]
fn persistent_stores(path: &Path) -> obs_core::error::Result<LedgerStores> {
    Err(obs_core::error::BankError::ConfigError(format!(
        "cannot open {}: built without the storage-rocksdb feature",
        path.display()
    )))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&LogConfig {
        filter: cli.log,
        format: cli.log_format,
    })
    .into_diagnostic()?;

    let stores = match cli.db_path.as_deref() {
        Some(db_path) => persistent_stores(db_path).into_diagnostic()?,
        None => in_memory_stores(),
    };

    // Seed opening balances; a reused database keeps its clients
    let file = File::open(&cli.clients).into_diagnostic()?;
    for client_result in ClientReader::new(file).clients() {
        match client_result {
            Ok(client) => {
                if stores.clients.exists_by_id(client.id).await.into_diagnostic()? {
                    debug!(client_id = client.id, "Client already present");
                    continue;
                }
                stores.clients.save(client).await.into_diagnostic()?;
            }
            Err(e) => warn!(error = %e, "Error reading client"),
        }
    }

    let clock: ClockRef = Arc::new(SystemClock);
    let ledger = TransferLedger::new(
        stores.clients.clone(),
        stores.transfers,
        stores.mutator,
        clock,
    );

    // Process transfers
    let file = File::open(&cli.transfers).into_diagnostic()?;
    let mut executed = 0usize;
    for request_result in TransferReader::new(file).requests() {
        match request_result {
            Ok(request) => match ledger.execute_transfer(request).await {
                Ok(_) => executed += 1,
                Err(e) if e.is_business_rejection() => {
                    warn!(error = %e, "Transfer rejected");
                }
                Err(e) => return Err(e).into_diagnostic(),
            },
            Err(e) => warn!(error = %e, "Error reading transfer"),
        }
    }
    info!(executed, "Batch finished");

    let mut clients = stores
        .clients
        .find_all(&Specification::new())
        .await
        .into_diagnostic()?;
    clients.sort_by_key(|c| c.id);

    let stdout = io::stdout();
    let mut writer = ClientWriter::new(stdout.lock());
    writer.write_clients(clients).into_diagnostic()?;

    Ok(())
}
