use crate::domain::account::{Balance, Client};
use crate::error::{BankError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct ClientRow {
    client: u64,
    full_name: String,
    account_number: String,
    balance: Decimal,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client::new(
            row.client,
            row.full_name,
            row.account_number,
            Balance::new(row.balance),
        )
    }
}

/// Reads opening client balances from a CSV source with the header
/// `client,full_name,account_number,balance`.
pub struct ClientReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ClientReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    pub fn clients(self) -> impl Iterator<Item = Result<Client>> {
        self.reader
            .into_deserialize::<ClientRow>()
            .map(|result| result.map(Client::from).map_err(BankError::from))
    }
}
