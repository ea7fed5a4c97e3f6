//! Records touched by order domain actions, and the payloads orders carry.

use crate::domain::account::Amount;
use crate::domain::order::Role;
use crate::domain::specification::{Field, Record, Value, ValueKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Employee {
    #[serde(default)]
    pub id: u64,
    pub full_name: String,
    pub position: String,
}

impl Record for Employee {
    const COLLECTION: &'static str = "employees";

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
            Field::new("position", ValueKind::Text),
        ];
        FIELDS
    }

    fn value_of(&self, attribute: &str) -> Option<Value> {
        match attribute {
            "id" => Some(Value::Id(self.id)),
            "full_name" => Some(self.full_name.clone().into()),
            "position" => Some(self.position.clone().into()),
            _ => None,
        }
    }
}

/// A login account. Credentials themselves live with the authentication layer.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct AppUser {
    #[serde(default)]
    pub id: u64,
    pub username: String,
    pub role: Role,
}

impl Record for AppUser {
    const COLLECTION: &'static str = "app_users";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn schema() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            Field::new("id", ValueKind::Id),
            Field::new("username", ValueKind::Text),
            Field::new("role", ValueKind::Text),
        ];
        FIELDS
    }

    fn value_of(&self, attribute: &str) -> Option<Value> {
        match attribute {
            "id" => Some(Value::Id(self.id)),
            "username" => Some(self.username.clone().into()),
            "role" => Some(self.role.as_str().into()),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CreditCard {
    #[serde(default)]
    pub id: u64,
    pub client: u64,
    pub card_number: String,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

impl Record for CreditCard {
    const COLLECTION: &'static str = "credit_cards";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn schema() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            Field::new("id", ValueKind::Id),
            Field::new("client", ValueKind::Id),
            Field::new("card_number", ValueKind::Text),
            Field::new("active", ValueKind::Bool),
        ];
        FIELDS
    }

    fn value_of(&self, attribute: &str) -> Option<Value> {
        match attribute {
            "id" => Some(Value::Id(self.id)),
            "client" => Some(Value::Id(self.client)),
            "card_number" => Some(self.card_number.clone().into()),
            "active" => Some(self.active.into()),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Loan {
    #[serde(default)]
    pub id: u64,
    pub client: Option<u64>,
    pub amount: Amount,
    pub rate_amount: Amount,
    pub num_of_rates: u32,
    pub rates_left_to_pay: u32,
}

impl Loan {
    /// 1-based index of the next rate to be paid.
    pub fn next_rate_number(&self) -> u32 {
        self.num_of_rates
            .saturating_sub(self.rates_left_to_pay)
            .saturating_add(1)
    }
}

impl Record for Loan {
    const COLLECTION: &'static str = "loans";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn schema() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            Field::new("id", ValueKind::Id),
            Field::new("client", ValueKind::Id),
            Field::new("amount", ValueKind::Decimal),
            Field::new("rate_amount", ValueKind::Decimal),
            Field::new("num_of_rates", ValueKind::Integer),
            Field::new("rates_left_to_pay", ValueKind::Integer),
        ];
        FIELDS
    }

    fn value_of(&self, attribute: &str) -> Option<Value> {
        match attribute {
            "id" => Some(Value::Id(self.id)),
            "client" => self.client.map(Value::Id),
            "amount" => Some(self.amount.value().into()),
            "rate_amount" => Some(self.rate_amount.value().into()),
            "num_of_rates" => Some(i64::from(self.num_of_rates).into()),
            "rates_left_to_pay" => Some(i64::from(self.rates_left_to_pay).into()),
            _ => None,
        }
    }
}

/// Payload of user creation and modification orders.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct UserCredentials {
    /// Required when modifying an existing user.
    #[serde(default)]
    pub user_id: Option<u64>,
    pub username: String,
    pub role: Role,
}

/// Payload of client edit orders. The balance is deliberately absent.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ClientDetails {
    pub client_id: u64,
    pub full_name: String,
}

/// Payload of block, unblock and discard card orders.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct CardReference {
    pub card_id: u64,
}

/// Payload of loan rate payment orders.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct LoanRate {
    pub loan_id: u64,
}
