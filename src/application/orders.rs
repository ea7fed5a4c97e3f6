use crate::application::dispatch::DispatchTable;
use crate::config::EngineConfig;
use crate::domain::back_office::Employee;
use crate::domain::order::{Decision, NewOrder, Order, OrderType, Permissions};
use crate::domain::ports::{ClockRef, StoreRef};
use crate::domain::specification::{Predicate, Specification, Value};
use crate::error::{BankError, Result};
use chrono::TimeDelta;
use tracing::{info, warn};

/// Owns every state transition of [`Order`]s.
///
/// ```text
/// pending, unassigned ──assign──▶ pending, assigned
///        │                               │
///        └────────────decide─────────────┴──▶ accepted | rejected (terminal)
/// ```
pub struct OrderEngine {
    orders: StoreRef<Order>,
    employees: StoreRef<Employee>,
    dispatch: DispatchTable,
    clock: ClockRef,
    priority_threshold: TimeDelta,
}

impl OrderEngine {
    pub fn new(
        orders: StoreRef<Order>,
        employees: StoreRef<Employee>,
        dispatch: DispatchTable,
        clock: ClockRef,
        config: &EngineConfig,
    ) -> Self {
        Self {
            orders,
            employees,
            dispatch,
            clock,
            priority_threshold: config.priority_threshold(),
        }
    }

    /// Unassigned orders visible with `permissions`.
    pub async fn list_orders(&self, permissions: &Permissions) -> Result<Vec<Order>> {
        self.orders.find_all(&unassigned(permissions)).await
    }

    /// Unassigned orders that have been waiting longer than the priority
    /// threshold.
    pub async fn list_priority_orders(&self, permissions: &Permissions) -> Result<Vec<Order>> {
        let cutoff = self.clock.now() - self.priority_threshold;
        let spec = unassigned(permissions).add(Predicate::less_than("create_date", cutoff));
        self.orders.find_all(&spec).await
    }

    pub async fn list_employee_orders(&self, employee_id: u64, is_active: bool) -> Result<Vec<Order>> {
        if !self.employees.exists_by_id(employee_id).await? {
            return Err(BankError::not_found("Employee", employee_id));
        }
        let spec = Specification::new()
            .add(Predicate::equal("employee", Value::Id(employee_id)))
            .add(Predicate::equal("is_active", is_active));
        self.orders.find_all(&spec).await
    }

    pub async fn list_client_orders(&self, client_id: u64) -> Result<Vec<Order>> {
        let spec = Specification::new().add(Predicate::equal("client", Value::Id(client_id)));
        self.orders.find_all(&spec).await
    }

    pub async fn get_order(&self, order_id: u64) -> Result<Order> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| BankError::not_found("Order", order_id))
    }

    /// Validates the payload against its order type and stores the order as
    /// active, pending and unassigned.
    pub async fn create_order(&self, new_order: NewOrder) -> Result<Order> {
        let order_type: OrderType = new_order.order_type.parse()?;
        let request_body = self.dispatch.get(order_type)?.encode(new_order.payload)?;

        let order = Order {
            id: 0,
            order_type,
            request_body,
            is_active: true,
            decision: Decision::Pending,
            employee: None,
            create_date: self.clock.now(),
            client: new_order.client,
        };
        let order = self.orders.save(order).await?;
        info!(order_id = order.id, %order_type, "Order created");
        Ok(order)
    }

    pub async fn delete_order(&self, order_id: u64) -> Result<()> {
        if !self.orders.exists_by_id(order_id).await? {
            return Err(BankError::not_found("Order", order_id));
        }
        self.orders.delete_by_id(order_id).await
    }

    /// Hands the order to an employee, replacing any previous assignment.
    pub async fn assign_employee(&self, order_id: u64, employee_id: u64) -> Result<()> {
        let mut order = self.get_order(order_id).await?;
        if !self.employees.exists_by_id(employee_id).await? {
            return Err(BankError::not_found("Employee", employee_id));
        }
        if order.is_terminal() {
            return Err(BankError::OrderFinalized(order_id));
        }

        order.employee = Some(employee_id);
        self.orders.save(order).await?;
        info!(order_id, employee_id, "Order assigned");
        Ok(())
    }

    /// Finalizes a pending order.
    ///
    /// An accepted order runs its domain action first. If the action fails the
    /// error is returned and the order stays pending.
    pub async fn decide(&self, order_id: u64, decision: Decision) -> Result<()> {
        if decision == Decision::Pending {
            return Err(BankError::ValidationError(
                "An order can only be accepted or rejected".to_string(),
            ));
        }
        let mut order = self.get_order(order_id).await?;
        if order.is_terminal() {
            return Err(BankError::OrderFinalized(order_id));
        }

        if decision == Decision::Accepted {
            let action = self.dispatch.get(order.order_type)?;
            if let Err(e) = action.apply_encoded(&order.request_body).await {
                warn!(order_id, order_type = %order.order_type, error = %e, "Order action failed");
                return Err(e);
            }
        }

        order.is_active = false;
        order.decision = decision;
        self.orders.save(order).await?;
        info!(order_id, %decision, "Order finalized");
        Ok(())
    }
}

/// Unassigned orders, minus the types `permissions` does not allow.
fn unassigned(permissions: &Permissions) -> Specification {
    OrderType::ALL
        .into_iter()
        .filter(|t| !permissions.can_view(*t))
        .fold(
            Specification::new().add(Predicate::is_null("employee")),
            |spec, hidden| spec.add(Predicate::not_equal("order_type", hidden)),
        )
}
