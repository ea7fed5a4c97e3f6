use crate::domain::specification::{Field, Record, Value, ValueKind};
use crate::domain::transfer::TransferType;
use crate::error::{BankError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A signed monetary value held on an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(pub Decimal);

/// A strictly positive monetary amount moved by a transfer.
///
/// Validation also runs on deserialization, so a payload carrying a zero or
/// negative amount never decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(BankError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = BankError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn covers(&self, amount: Amount) -> bool {
        *self >= Balance::from(amount)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// A client's bank account.
///
/// `balance` is only ever changed through [`Client::apply`], which the
/// balance mutator calls together with writing the matching ledger entry.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Client {
    /// The unique identifier for the client.
    pub id: u64,
    pub full_name: String,
    /// Number other accounts use to address transfers to this one.
    pub account_number: String,
    pub balance: Balance,
}

impl Client {
    pub fn new(
        id: u64,
        full_name: impl Into<String>,
        account_number: impl Into<String>,
        balance: Balance,
    ) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            account_number: account_number.into(),
            balance,
        }
    }

    /// Credits the account.
    pub fn credit(&mut self, amount: Amount) {
        self.balance += amount.into();
    }

    /// Debits the account if the balance covers the amount.
    pub fn debit(&mut self, amount: Amount) -> Result<()> {
        if self.balance.covers(amount) {
            self.balance -= amount.into();
            Ok(())
        } else {
            Err(self.insufficient(amount))
        }
    }

    /// Applies one side of a money movement: outgoing debits, incoming credits.
    pub fn apply(&mut self, direction: TransferType, amount: Amount) -> Result<()> {
        match direction {
            TransferType::Outgoing => self.debit(amount),
            TransferType::Incoming => {
                self.credit(amount);
                Ok(())
            }
        }
    }

    pub fn insufficient(&self, requested: Amount) -> BankError {
        BankError::InsufficientFunds {
            client_id: self.id,
            balance: self.balance.0,
            requested: requested.value(),
        }
    }
}

impl Record for Client {
    const COLLECTION: &'static str = "clients";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn schema() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            Field::new("id", ValueKind::Id),
            Field::new("full_name", ValueKind::Text),
            Field::new("account_number", ValueKind::Text),
            Field::new("balance", ValueKind::Decimal),
        ];
        FIELDS
    }

    fn value_of(&self, attribute: &str) -> Option<Value> {
        match attribute {
            "id" => Some(Value::Id(self.id)),
            "full_name" => Some(self.full_name.clone().into()),
            "account_number" => Some(self.account_number.clone().into()),
            "balance" => Some(self.balance.0.into()),
            _ => None,
        }
    }
}
