use crate::domain::specification::{Field, Record, Value, ValueKind};
use crate::error::BankError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of approval-gated requests.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
pub enum OrderType {
    CreateUser,
    ModifyUser,
    EditClient,
    ModifyEmployee,
    BlockCreditCard,
    DiscardCreditCard,
    CreateCreditCard,
    UnblockCreditCard,
    LoanApplication,
    Transfer,
    LoanRatePayment,
}

impl OrderType {
    pub const ALL: [OrderType; 11] = [
        Self::CreateUser,
        Self::ModifyUser,
        Self::EditClient,
        Self::ModifyEmployee,
        Self::BlockCreditCard,
        Self::DiscardCreditCard,
        Self::CreateCreditCard,
        Self::UnblockCreditCard,
        Self::LoanApplication,
        Self::Transfer,
        Self::LoanRatePayment,
    ];

    /// Types only administrators may see and handle.
    pub const PRIVILEGED: [OrderType; 3] =
        [Self::ModifyEmployee, Self::ModifyUser, Self::CreateUser];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateUser => "CreateUser",
            Self::ModifyUser => "ModifyUser",
            Self::EditClient => "EditClient",
            Self::ModifyEmployee => "ModifyEmployee",
            Self::BlockCreditCard => "BlockCreditCard",
            Self::DiscardCreditCard => "DiscardCreditCard",
            Self::CreateCreditCard => "CreateCreditCard",
            Self::UnblockCreditCard => "UnblockCreditCard",
            Self::LoanApplication => "LoanApplication",
            Self::Transfer => "Transfer",
            Self::LoanRatePayment => "LoanRatePayment",
        }
    }

    /// Human readable description shown to employees.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreateUser => "User creation",
            Self::ModifyUser => "User modification",
            Self::EditClient => "Client data edit",
            Self::ModifyEmployee => "Employee data modification",
            Self::BlockCreditCard => "Credit card block",
            Self::DiscardCreditCard => "Credit card withdrawal",
            Self::CreateCreditCard => "New credit card",
            Self::UnblockCreditCard => "Credit card unblock",
            Self::LoanApplication => "Loan application",
            Self::Transfer => "Transfer",
            Self::LoanRatePayment => "Loan rate payment",
        }
    }

    pub fn is_privileged(&self) -> bool {
        Self::PRIVILEGED.contains(self)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| BankError::UnknownOrderType(s.to_string()))
    }
}

impl From<OrderType> for Value {
    fn from(value: OrderType) -> Self {
        Value::Text(value.as_str().to_string())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(BankError::ValidationError(format!(
                "Unknown decision: {other}"
            ))),
        }
    }
}

/// A deferred request waiting for an employee's decision.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub id: u64,
    pub order_type: OrderType,
    /// Canonical JSON encoding of the type's payload.
    pub request_body: String,
    pub is_active: bool,
    pub decision: Decision,
    /// Employee handling the order, if assigned.
    pub employee: Option<u64>,
    pub create_date: DateTime<Utc>,
    /// Client the order was submitted for, if any.
    pub client: Option<u64>,
}

impl Order {
    pub fn is_terminal(&self) -> bool {
        !self.is_active || self.decision != Decision::Pending
    }
}

impl Record for Order {
    const COLLECTION: &'static str = "orders";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn schema() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            Field::new("id", ValueKind::Id),
            Field::new("order_type", ValueKind::Text),
            Field::new("request_body", ValueKind::Text),
            Field::new("is_active", ValueKind::Bool),
            Field::new("decision", ValueKind::Text),
            Field::new("employee", ValueKind::Id),
            Field::new("create_date", ValueKind::Timestamp),
            Field::new("client", ValueKind::Id),
        ];
        FIELDS
    }

    fn value_of(&self, attribute: &str) -> Option<Value> {
        match attribute {
            "id" => Some(Value::Id(self.id)),
            "order_type" => Some(self.order_type.into()),
            "request_body" => Some(self.request_body.clone().into()),
            "is_active" => Some(self.is_active.into()),
            "decision" => Some(self.decision.as_str().into()),
            "employee" => self.employee.map(Value::Id),
            "create_date" => Some(self.create_date.into()),
            "client" => self.client.map(Value::Id),
            _ => None,
        }
    }
}

/// An order submission as received from a caller.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct NewOrder {
    /// Order type tag, e.g. `"LoanApplication"`.
    pub order_type: String,
    /// Raw payload, validated against the type's payload shape.
    pub payload: serde_json::Value,
    #[serde(default)]
    pub client: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Employee,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Employee => "EMPLOYEE",
            Self::Client => "CLIENT",
        }
    }
}

impl FromStr for Role {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Self::Admin),
            "EMPLOYEE" => Ok(Self::Employee),
            "CLIENT" => Ok(Self::Client),
            _ => Err(BankError::ValidationError(format!("Unknown role: {s}"))),
        }
    }
}

/// What a caller may see when listing orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    privileged_orders: bool,
}

impl Permissions {
    pub fn administrator() -> Self {
        Self {
            privileged_orders: true,
        }
    }

    pub fn standard() -> Self {
        Self {
            privileged_orders: false,
        }
    }

    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Self::administrator(),
            Role::Employee | Role::Client => Self::standard(),
        }
    }

    /// Permissions for a role name coming from the authentication layer.
    /// Anything other than the administrator role gets standard permissions.
    pub fn from_role_name(name: &str) -> Self {
        match name.parse::<Role>() {
            Ok(role) => Self::for_role(role),
            Err(_) => Self::standard(),
        }
    }

    pub fn can_view(&self, order_type: OrderType) -> bool {
        self.privileged_orders || !order_type.is_privileged()
    }
}
