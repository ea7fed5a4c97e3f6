#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use obs_core::application::actions::BackOffice;
use obs_core::application::ledger::TransferLedger;
use obs_core::application::orders::OrderEngine;
use obs_core::config::EngineConfig;
use obs_core::domain::account::{Balance, Client};
use obs_core::domain::back_office::{AppUser, CreditCard, Employee, Loan};
use obs_core::domain::order::{NewOrder, Order};
use obs_core::domain::ports::{ClockRef, RecordStore};
use obs_core::domain::transfer::Transfer;
use obs_core::infrastructure::clock::FixedClock;
use obs_core::infrastructure::in_memory::{InMemoryBalanceMutator, InMemoryStore};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Every engine wired to in-memory stores and a clock that only moves on
/// request.
pub struct Bank {
    pub clock: Arc<FixedClock>,
    pub clients: InMemoryStore<Client>,
    pub transfers: InMemoryStore<Transfer>,
    pub orders: InMemoryStore<Order>,
    pub employees: InMemoryStore<Employee>,
    pub users: InMemoryStore<AppUser>,
    pub cards: InMemoryStore<CreditCard>,
    pub loans: InMemoryStore<Loan>,
    pub ledger: Arc<TransferLedger>,
    pub engine: OrderEngine,
}

impl Bank {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let clock = Arc::new(FixedClock::new(start()));
        let clock_ref: ClockRef = clock.clone();

        let clients = InMemoryStore::<Client>::new();
        let transfers = InMemoryStore::<Transfer>::new();
        let orders = InMemoryStore::<Order>::new();
        let employees = InMemoryStore::<Employee>::new();
        let users = InMemoryStore::<AppUser>::new();
        let cards = InMemoryStore::<CreditCard>::new();
        let loans = InMemoryStore::<Loan>::new();

        let ledger = Arc::new(TransferLedger::new(
            Arc::new(clients.clone()),
            Arc::new(transfers.clone()),
            Arc::new(InMemoryBalanceMutator::new(
                clients.clone(),
                transfers.clone(),
            )),
            clock_ref.clone(),
        ));
        let office = Arc::new(BackOffice {
            users: Arc::new(users.clone()),
            clients: Arc::new(clients.clone()),
            employees: Arc::new(employees.clone()),
            cards: Arc::new(cards.clone()),
            loans: Arc::new(loans.clone()),
            ledger: ledger.clone(),
        });
        let dispatch = office.dispatch_table().expect("dispatch table");
        let engine = OrderEngine::new(
            Arc::new(orders.clone()),
            Arc::new(employees.clone()),
            dispatch,
            clock_ref,
            &config,
        );

        Self {
            clock,
            clients,
            transfers,
            orders,
            employees,
            users,
            cards,
            loans,
            ledger,
            engine,
        }
    }

    pub async fn seed_client(
        &self,
        id: u64,
        full_name: &str,
        account_number: &str,
        balance: Decimal,
    ) -> Client {
        self.clients
            .save(Client::new(
                id,
                full_name,
                account_number,
                Balance::new(balance),
            ))
            .await
            .unwrap()
    }

    pub async fn seed_employee(&self, full_name: &str) -> Employee {
        self.employees
            .save(Employee {
                id: 0,
                full_name: full_name.to_string(),
                position: "Teller".to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn balance_of(&self, client_id: u64) -> Decimal {
        self.clients
            .find_by_id(client_id)
            .await
            .unwrap()
            .expect("client exists")
            .balance
            .0
    }

    /// Creates an order of `order_type` whose payload only names a card.
    pub async fn card_order(&self, order_type: &str, card_id: u64) -> Order {
        self.engine
            .create_order(NewOrder {
                order_type: order_type.to_string(),
                payload: json!({ "card_id": card_id }),
                client: None,
            })
            .await
            .unwrap()
    }
}
