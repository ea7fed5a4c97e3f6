//! Order type → payload → domain action registry.
//!
//! Each entry is a [`TypedAction`] that knows its concrete payload type and
//! exposes it through the object-safe [`DynOrderAction`], so the table can
//! hold every order type behind one `Arc<dyn DynOrderAction>`.

use crate::domain::order::OrderType;
use crate::error::{BankError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// Anything that can travel as an order's request body.
pub trait OrderPayload: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> OrderPayload for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// A domain action run when an order of its type is accepted.
#[async_trait]
pub trait OrderAction<P: OrderPayload>: Send + Sync {
    async fn apply(&self, payload: P) -> Result<()>;
}

#[async_trait]
pub trait DynOrderAction: Send + Sync {
    fn order_type(&self) -> OrderType;

    /// Validates a raw payload and returns its canonical encoding.
    fn encode(&self, raw: serde_json::Value) -> Result<String>;

    /// Decodes a stored request body and runs the action on it.
    async fn apply_encoded(&self, request_body: &str) -> Result<()>;
}

pub struct TypedAction<P, A> {
    order_type: OrderType,
    action: A,
    _payload: PhantomData<fn() -> P>,
}

impl<P: OrderPayload, A: OrderAction<P>> TypedAction<P, A> {
    pub fn new(order_type: OrderType, action: A) -> Self {
        Self {
            order_type,
            action,
            _payload: PhantomData,
        }
    }

    fn invalid(&self, source: serde_json::Error) -> BankError {
        BankError::InvalidPayload {
            order_type: self.order_type,
            source,
        }
    }
}

#[async_trait]
impl<P: OrderPayload, A: OrderAction<P>> DynOrderAction for TypedAction<P, A> {
    fn order_type(&self) -> OrderType {
        self.order_type
    }

    fn encode(&self, raw: serde_json::Value) -> Result<String> {
        let payload: P = serde_json::from_value(raw).map_err(|e| self.invalid(e))?;
        Ok(serde_json::to_string(&payload)?)
    }

    async fn apply_encoded(&self, request_body: &str) -> Result<()> {
        let payload: P = serde_json::from_str(request_body).map_err(|e| self.invalid(e))?;
        self.action.apply(payload).await
    }
}

#[derive(Default, Clone)]
pub struct DispatchTable {
    entries: HashMap<OrderType, Arc<dyn DynOrderAction>>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P, A>(&mut self, order_type: OrderType, action: A) -> Result<()>
    where
        P: OrderPayload,
        A: OrderAction<P> + 'static,
    {
        if self.entries.contains_key(&order_type) {
            return Err(BankError::DuplicateOrderAction(order_type));
        }
        self.entries.insert(
            order_type,
            Arc::new(TypedAction::<P, A>::new(order_type, action)),
        );
        Ok(())
    }

    pub fn get(&self, order_type: OrderType) -> Result<Arc<dyn DynOrderAction>> {
        self.entries
            .get(&order_type)
            .cloned()
            .ok_or_else(|| BankError::UnknownOrderType(order_type.to_string()))
    }

    pub fn registered_types(&self) -> Vec<OrderType> {
        OrderType::ALL
            .into_iter()
            .filter(|t| self.entries.contains_key(t))
            .collect()
    }

    /// Whether every known order type has an action.
    pub fn is_complete(&self) -> bool {
        OrderType::ALL.iter().all(|t| self.entries.contains_key(t))
    }
}
