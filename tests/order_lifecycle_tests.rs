use chrono::TimeDelta;
use obs_core::config::EngineConfig;
use obs_core::domain::back_office::{CreditCard, Loan};
use obs_core::domain::order::{Decision, NewOrder, OrderType, Permissions};
use obs_core::domain::ports::RecordStore;
use obs_core::domain::specification::Specification;
use obs_core::error::BankError;
use rust_decimal_macros::dec;
use serde_json::json;

mod common;
use common::Bank;

fn loan_application(client: u64) -> NewOrder {
    NewOrder {
        order_type: "LoanApplication".to_string(),
        payload: json!({
            "client": client,
            "amount": "5000",
            "rate_amount": "500",
            "num_of_rates": 10,
            "rates_left_to_pay": 10
        }),
        client: Some(client),
    }
}

#[tokio::test]
async fn test_accepted_loan_application_creates_loan() {
    let bank = Bank::new();
    bank.seed_client(1, "Jan Kowalski", "PL01", dec!(100)).await;

    let order = bank.engine.create_order(loan_application(1)).await.unwrap();
    assert!(order.is_active);
    assert_eq!(order.decision, Decision::Pending);
    assert_eq!(order.employee, None);

    bank.engine.decide(order.id, Decision::Accepted).await.unwrap();

    let loans: Vec<Loan> = bank.loans.find_all(&Specification::new()).await.unwrap();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].client, Some(1));
    assert_eq!(loans[0].rate_amount.value(), dec!(500));

    let order = bank.engine.get_order(order.id).await.unwrap();
    assert!(!order.is_active);
    assert_eq!(order.decision, Decision::Accepted);

    let again = bank.engine.decide(order.id, Decision::Rejected).await;
    assert!(matches!(again, Err(BankError::OrderFinalized(id)) if id == order.id));
    assert_eq!(bank.loans.find_all(&Specification::new()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rejected_order_runs_no_action() {
    let bank = Bank::new();
    bank.seed_client(1, "Jan Kowalski", "PL01", dec!(100)).await;

    let order = bank.engine.create_order(loan_application(1)).await.unwrap();
    bank.engine.decide(order.id, Decision::Rejected).await.unwrap();

    assert!(bank.loans.find_all(&Specification::new()).await.unwrap().is_empty());
    let order = bank.engine.get_order(order.id).await.unwrap();
    assert_eq!(order.decision, Decision::Rejected);
    assert!(!order.is_active);
}

#[tokio::test]
async fn test_failing_action_leaves_order_pending() {
    let bank = Bank::new();
    // No client 7, so the loan action fails on accept.
    let order = bank.engine.create_order(loan_application(7)).await.unwrap();

    let result = bank.engine.decide(order.id, Decision::Accepted).await;
    assert!(matches!(result, Err(BankError::NotFound { .. })));

    let order = bank.engine.get_order(order.id).await.unwrap();
    assert!(order.is_active);
    assert_eq!(order.decision, Decision::Pending);
}

#[tokio::test]
async fn test_deciding_pending_is_rejected() {
    let bank = Bank::new();
    let order = bank.card_order("BlockCreditCard", 1).await;
    let result = bank.engine.decide(order.id, Decision::Pending).await;
    assert!(matches!(result, Err(BankError::ValidationError(_))));
}

#[tokio::test]
async fn test_standard_listing_hides_privileged_orders() {
    let bank = Bank::new();
    bank.engine
        .create_order(NewOrder {
            order_type: "CreateUser".to_string(),
            payload: json!({ "username": "jnowak", "role": "EMPLOYEE" }),
            client: None,
        })
        .await
        .unwrap();
    bank.engine
        .create_order(NewOrder {
            order_type: "ModifyEmployee".to_string(),
            payload: json!({ "id": 1, "full_name": "Anna Nowak", "position": "Manager" }),
            client: None,
        })
        .await
        .unwrap();
    bank.engine
        .create_order(NewOrder {
            order_type: "ModifyUser".to_string(),
            payload: json!({ "user_id": 1, "username": "anowak", "role": "ADMIN" }),
            client: None,
        })
        .await
        .unwrap();
    let visible = bank.card_order("BlockCreditCard", 1).await;

    let teller = bank
        .engine
        .list_orders(&Permissions::from_role_name("teller"))
        .await
        .unwrap();
    assert_eq!(teller.len(), 1);
    assert_eq!(teller[0].id, visible.id);
    assert!(teller.iter().all(|o| !o.order_type.is_privileged()));

    let admin = bank
        .engine
        .list_orders(&Permissions::from_role_name("ADMIN"))
        .await
        .unwrap();
    assert_eq!(admin.len(), 4);
}

#[tokio::test]
async fn test_listing_excludes_assigned_orders() {
    let bank = Bank::new();
    let employee = bank.seed_employee("Anna Nowak").await;
    let assigned = bank.card_order("BlockCreditCard", 1).await;
    let open = bank.card_order("UnblockCreditCard", 1).await;

    bank.engine
        .assign_employee(assigned.id, employee.id)
        .await
        .unwrap();

    let listed = bank
        .engine
        .list_orders(&Permissions::standard())
        .await
        .unwrap();
    assert_eq!(listed.iter().map(|o| o.id).collect::<Vec<_>>(), vec![open.id]);
}

#[tokio::test]
async fn test_priority_threshold_is_exclusive() {
    let bank = Bank::new();
    let order = bank.card_order("BlockCreditCard", 1).await;
    let admin = Permissions::administrator();

    bank.clock.advance(TimeDelta::hours(24));
    assert!(bank.engine.list_priority_orders(&admin).await.unwrap().is_empty());

    bank.clock.advance(TimeDelta::milliseconds(1));
    let priority = bank.engine.list_priority_orders(&admin).await.unwrap();
    assert_eq!(priority.len(), 1);
    assert_eq!(priority[0].id, order.id);
}

#[tokio::test]
async fn test_priority_listing_skips_assigned_orders() {
    let bank = Bank::new();
    let employee = bank.seed_employee("Anna Nowak").await;
    let assigned = bank.card_order("BlockCreditCard", 1).await;
    let waiting = bank.card_order("UnblockCreditCard", 1).await;
    bank.engine
        .assign_employee(assigned.id, employee.id)
        .await
        .unwrap();

    bank.clock.advance(TimeDelta::hours(48));
    let priority = bank
        .engine
        .list_priority_orders(&Permissions::administrator())
        .await
        .unwrap();

    assert_eq!(priority.iter().map(|o| o.id).collect::<Vec<_>>(), vec![waiting.id]);
    assert!(priority.iter().all(|o| o.employee.is_none()));
}

#[tokio::test]
async fn test_standard_priority_listing_hides_privileged_orders() {
    let bank = Bank::new();
    for (order_type, payload) in [
        ("CreateUser", json!({ "username": "jnowak", "role": "EMPLOYEE" })),
        ("ModifyUser", json!({ "user_id": 1, "username": "anowak", "role": "ADMIN" })),
        (
            "ModifyEmployee",
            json!({ "id": 1, "full_name": "Anna Nowak", "position": "Manager" }),
        ),
    ] {
        bank.engine
            .create_order(NewOrder {
                order_type: order_type.to_string(),
                payload,
                client: None,
            })
            .await
            .unwrap();
    }
    let visible = bank.card_order("DiscardCreditCard", 1).await;

    bank.clock.advance(TimeDelta::hours(25));
    let standard = bank
        .engine
        .list_priority_orders(&Permissions::standard())
        .await
        .unwrap();
    assert_eq!(standard.iter().map(|o| o.id).collect::<Vec<_>>(), vec![visible.id]);

    let admin = bank
        .engine
        .list_priority_orders(&Permissions::administrator())
        .await
        .unwrap();
    assert_eq!(admin.len(), 4);
}

#[tokio::test]
async fn test_priority_threshold_follows_config() {
    let bank = Bank::with_config(EngineConfig::with_threshold_hours(2).unwrap());
    bank.card_order("BlockCreditCard", 1).await;

    bank.clock.advance(TimeDelta::hours(3));
    let priority = bank
        .engine
        .list_priority_orders(&Permissions::standard())
        .await
        .unwrap();
    assert_eq!(priority.len(), 1);
}

#[tokio::test]
async fn test_unknown_order_type_is_rejected() {
    let bank = Bank::new();
    let result = bank
        .engine
        .create_order(NewOrder {
            order_type: "OpenSafeDepositBox".to_string(),
            payload: json!({}),
            client: None,
        })
        .await;

    assert!(matches!(result, Err(BankError::UnknownOrderType(tag)) if tag == "OpenSafeDepositBox"));
    assert!(bank.orders.find_all(&Specification::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_payload_must_match_order_type() {
    let bank = Bank::new();
    let result = bank
        .engine
        .create_order(NewOrder {
            order_type: "BlockCreditCard".to_string(),
            payload: json!({ "loan_id": 3 }),
            client: None,
        })
        .await;

    assert!(matches!(
        result,
        Err(BankError::InvalidPayload {
            order_type: OrderType::BlockCreditCard,
            ..
        })
    ));
}

#[tokio::test]
async fn test_assign_employee_not_found() {
    let bank = Bank::new();
    let employee = bank.seed_employee("Anna Nowak").await;
    let order = bank.card_order("BlockCreditCard", 1).await;

    let missing_order = bank.engine.assign_employee(99, employee.id).await;
    assert!(matches!(missing_order, Err(BankError::NotFound { entity: "Order", id: 99 })));

    let missing_employee = bank.engine.assign_employee(order.id, 42).await;
    assert!(matches!(missing_employee, Err(BankError::NotFound { entity: "Employee", id: 42 })));
}

#[tokio::test]
async fn test_reassignment_replaces_employee() {
    let bank = Bank::new();
    let first = bank.seed_employee("Anna Nowak").await;
    let second = bank.seed_employee("Piotr Zielinski").await;
    let order = bank.card_order("BlockCreditCard", 1).await;

    bank.engine.assign_employee(order.id, first.id).await.unwrap();
    bank.engine.assign_employee(order.id, second.id).await.unwrap();

    assert_eq!(
        bank.engine.get_order(order.id).await.unwrap().employee,
        Some(second.id)
    );
    assert!(bank.engine.list_employee_orders(first.id, true).await.unwrap().is_empty());
    assert_eq!(
        bank.engine.list_employee_orders(second.id, true).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_employee_orders_split_by_activity() {
    let bank = Bank::new();
    let employee = bank.seed_employee("Anna Nowak").await;
    bank.cards
        .save(CreditCard {
            id: 0,
            client: 1,
            card_number: "4111".to_string(),
            active: true,
        })
        .await
        .unwrap();

    let done = bank.card_order("BlockCreditCard", 1).await;
    let open = bank.card_order("UnblockCreditCard", 1).await;
    bank.engine.assign_employee(done.id, employee.id).await.unwrap();
    bank.engine.assign_employee(open.id, employee.id).await.unwrap();
    bank.engine.decide(done.id, Decision::Accepted).await.unwrap();

    let active = bank.engine.list_employee_orders(employee.id, true).await.unwrap();
    let finished = bank.engine.list_employee_orders(employee.id, false).await.unwrap();
    assert_eq!(active.iter().map(|o| o.id).collect::<Vec<_>>(), vec![open.id]);
    assert_eq!(finished.iter().map(|o| o.id).collect::<Vec<_>>(), vec![done.id]);

    let card = bank.cards.find_by_id(1).await.unwrap().unwrap();
    assert!(!card.active);

    let unknown = bank.engine.list_employee_orders(77, true).await;
    assert!(matches!(unknown, Err(BankError::NotFound { .. })));
}

#[tokio::test]
async fn test_assigning_finalized_order_fails() {
    let bank = Bank::new();
    let employee = bank.seed_employee("Anna Nowak").await;
    let order = bank.card_order("BlockCreditCard", 1).await;
    bank.engine.decide(order.id, Decision::Rejected).await.unwrap();

    let result = bank.engine.assign_employee(order.id, employee.id).await;
    assert!(matches!(result, Err(BankError::OrderFinalized(_))));
}

#[tokio::test]
async fn test_client_orders_and_delete() {
    let bank = Bank::new();
    bank.seed_client(1, "Jan Kowalski", "PL01", dec!(100)).await;
    bank.seed_client(2, "Anna Nowak", "PL02", dec!(100)).await;
    let mine = bank.engine.create_order(loan_application(1)).await.unwrap();
    bank.engine.create_order(loan_application(2)).await.unwrap();

    let orders = bank.engine.list_client_orders(1).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, mine.id);

    bank.engine.delete_order(mine.id).await.unwrap();
    assert!(bank.engine.list_client_orders(1).await.unwrap().is_empty());
    assert!(matches!(
        bank.engine.get_order(mine.id).await,
        Err(BankError::NotFound { .. })
    ));
    assert!(matches!(
        bank.engine.delete_order(mine.id).await,
        Err(BankError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_accepted_transfer_order_moves_money() {
    let bank = Bank::new();
    bank.seed_client(1, "Jan Kowalski", "PL01", dec!(500)).await;
    bank.seed_client(2, "Anna Nowak", "PL02", dec!(200)).await;

    let order = bank
        .engine
        .create_order(NewOrder {
            order_type: "Transfer".to_string(),
            payload: json!({
                "sender": 1,
                "to_account_number": "PL02",
                "amount": "100",
                "category": "SHOPPING",
                "title": "Bike"
            }),
            client: Some(1),
        })
        .await
        .unwrap();
    assert_eq!(bank.balance_of(1).await, dec!(500));

    bank.engine.decide(order.id, Decision::Accepted).await.unwrap();
    assert_eq!(bank.balance_of(1).await, dec!(400));
    assert_eq!(bank.balance_of(2).await, dec!(300));
}

#[tokio::test]
async fn test_create_user_order_rejects_taken_username() {
    let bank = Bank::new();
    let new_user = || NewOrder {
        order_type: "CreateUser".to_string(),
        payload: json!({ "username": "jnowak", "role": "EMPLOYEE" }),
        client: None,
    };

    let first = bank.engine.create_order(new_user()).await.unwrap();
    let second = bank.engine.create_order(new_user()).await.unwrap();
    bank.engine.decide(first.id, Decision::Accepted).await.unwrap();

    let result = bank.engine.decide(second.id, Decision::Accepted).await;
    assert!(matches!(result, Err(BankError::ValidationError(_))));
    assert_eq!(bank.users.find_all(&Specification::new()).await.unwrap().len(), 1);
}
