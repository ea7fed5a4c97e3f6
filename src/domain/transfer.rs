use crate::domain::account::Amount;
use crate::domain::specification::{Field, Record, Value, ValueKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Destination used for payments that leave the bank, such as loan rates.
pub const RESTRICTED_ACCOUNT_NUMBER: &str = "Restricted Account Number";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferType {
    Incoming,
    Outgoing,
}

impl TransferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "INCOMING",
            Self::Outgoing => "OUTGOING",
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferCategory {
    Bills,
    Food,
    Shopping,
    Entertainment,
    Transport,
    Salary,
    Other,
}

impl TransferCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bills => "BILLS",
            Self::Food => "FOOD",
            Self::Shopping => "SHOPPING",
            Self::Entertainment => "ENTERTAINMENT",
            Self::Transport => "TRANSPORT",
            Self::Salary => "SALARY",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for TransferCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a money movement, owned by `client`.
///
/// Ledger entries are never updated. They are only removed by an explicit
/// administrative delete.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transfer {
    pub id: u64,
    pub amount: Amount,
    pub date: NaiveDate,
    pub category: TransferCategory,
    pub r#type: TransferType,
    pub counterparty_name: String,
    pub title: String,
    pub to_account_number: String,
    /// Owning client.
    pub client: u64,
}

impl Record for Transfer {
    const COLLECTION: &'static str = "transfers";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn schema() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            Field::new("id", ValueKind::Id),
            Field::new("amount", ValueKind::Decimal),
            Field::new("date", ValueKind::Date),
            Field::new("category", ValueKind::Text),
            Field::new("type", ValueKind::Text),
            Field::new("counterparty_name", ValueKind::Text),
            Field::new("title", ValueKind::Text),
            Field::new("to_account_number", ValueKind::Text),
            Field::new("client", ValueKind::Id),
        ];
        FIELDS
    }

    fn value_of(&self, attribute: &str) -> Option<Value> {
        match attribute {
            "id" => Some(Value::Id(self.id)),
            "amount" => Some(self.amount.value().into()),
            "date" => Some(self.date.into()),
            "category" => Some(self.category.as_str().into()),
            "type" => Some(self.r#type.as_str().into()),
            "counterparty_name" => Some(self.counterparty_name.clone().into()),
            "title" => Some(self.title.clone().into()),
            "to_account_number" => Some(self.to_account_number.clone().into()),
            "client" => Some(Value::Id(self.client)),
            _ => None,
        }
    }
}

/// A request to move money out of `sender`'s account.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransferRequest {
    pub sender: u64,
    pub to_account_number: String,
    pub amount: Amount,
    pub category: TransferCategory,
    pub title: String,
}

/// The ledger entries written by one executed transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub outgoing: Transfer,
    /// `None` when the receiving account is not held by this bank.
    pub incoming: Option<Transfer>,
}

/// Criteria for a client's transfer history. Both date bounds are inclusive.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransferFilter {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub r#type: TransferType,
    pub category: TransferCategory,
}

impl TransferFilter {
    pub fn accepts(&self, transfer: &Transfer) -> bool {
        transfer.date >= self.date_from
            && transfer.date <= self.date_to
            && transfer.r#type == self.r#type
            && transfer.category == self.category
    }
}
