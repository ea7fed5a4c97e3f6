use crate::domain::account::Client;
use crate::error::Result;
use std::io::Write;

/// Writes final balances as `client,account_number,balance` rows.
pub struct ClientWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ClientWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes the header and one row per client, in the given order.
    pub fn write_clients(&mut self, clients: impl IntoIterator<Item = Client>) -> Result<()> {
        self.writer
            .write_record(["client", "account_number", "balance"])?;
        for client in clients {
            self.writer.write_record([
                client.id.to_string(),
                client.account_number,
                client.balance.0.normalize().to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
