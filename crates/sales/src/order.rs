use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use furnerp_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Money, TenantId};
use furnerp_events::Event;

/// Sales order identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SalesOrderId(pub AggregateId);

impl SalesOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SalesOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Sales order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// Allowed status transitions.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
                | (Delivered, Refunded)
        )
    }

    /// Whether an order may be created directly in this status.
    pub fn is_valid_initial(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Delivered)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the customer paid at the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Mobile,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Mobile => "mobile",
        }
    }
}

impl core::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order line snapshot: copied from the catalog at sale time, never a live reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// Aggregate root: SalesOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesOrder {
    id: SalesOrderId,
    tenant_id: Option<TenantId>,
    customer: String,
    placed_at: Option<DateTime<Utc>>,
    lines: Vec<OrderLine>,
    status: OrderStatus,
    payment_method: Option<PaymentMethod>,
    total: Money,
    version: u64,
    created: bool,
}

impl SalesOrder {
    /// Create an empty, not-yet-placed aggregate instance for rehydration.
    pub fn empty(id: SalesOrderId) -> Self {
        Self {
            id,
            tenant_id: None,
            customer: String::new(),
            placed_at: None,
            lines: Vec::new(),
            status: OrderStatus::Pending,
            payment_method: None,
            total: Money::ZERO,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> SalesOrderId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn is_placed(&self) -> bool {
        self.created
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.placed_at
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(OrderLine::line_total).sum()
    }
}

impl AggregateRoot for SalesOrder {
    type Id = SalesOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: PlaceOrder.
///
/// Placing an already-placed order with the same content is accepted and
/// emits nothing, so callers can retry with the same `order_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub customer: String,
    pub placed_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total: Money,
}

/// Command: ChangeStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesOrderCommand {
    PlaceOrder(PlaceOrder),
    ChangeStatus(ChangeStatus),
}

/// Event: OrderPlaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub customer: String,
    pub placed_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total: Money,
}

/// Event: StatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesOrderEvent {
    OrderPlaced(OrderPlaced),
    StatusChanged(StatusChanged),
}

impl Event for SalesOrderEvent {
    const STREAM: &'static str = "sales.order";

    fn event_type(&self) -> &'static str {
        match self {
            SalesOrderEvent::OrderPlaced(_) => "sales.order.placed",
            SalesOrderEvent::StatusChanged(_) => "sales.order.status_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SalesOrderEvent::OrderPlaced(e) => e.placed_at,
            SalesOrderEvent::StatusChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for SalesOrder {
    type Command = SalesOrderCommand;
    type Event = SalesOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SalesOrderEvent::OrderPlaced(e) => {
                self.id = e.order_id;
                self.tenant_id = Some(e.tenant_id);
                self.customer = e.customer.clone();
                self.placed_at = Some(e.placed_at);
                self.lines = e.lines.clone();
                self.status = e.status;
                self.payment_method = Some(e.payment_method);
                self.total = e.total;
                self.created = true;
            }
            SalesOrderEvent::StatusChanged(e) => {
                self.status = e.to;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SalesOrderCommand::PlaceOrder(cmd) => self.handle_place(cmd),
            SalesOrderCommand::ChangeStatus(cmd) => self.handle_change_status(cmd),
        }
    }
}

impl SalesOrder {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_order_id(&self, order_id: SalesOrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    /// Same customer, lines, payment and total as the placed order.
    fn is_same_placement(&self, cmd: &PlaceOrder) -> bool {
        self.customer == cmd.customer
            && self.lines == cmd.lines
            && self.payment_method == Some(cmd.payment_method)
            && self.total == cmd.total
    }

    fn handle_place(&self, cmd: &PlaceOrder) -> Result<Vec<SalesOrderEvent>, DomainError> {
        if self.created {
            self.ensure_tenant(cmd.tenant_id)?;
            if self.is_same_placement(cmd) {
                return Ok(vec![]);
            }
            return Err(DomainError::conflict(
                "order id already used for a different order",
            ));
        }

        if cmd.customer.trim().is_empty() {
            return Err(DomainError::validation("customer cannot be empty"));
        }
        if cmd.lines.is_empty() {
            return Err(DomainError::validation("order must have at least one line"));
        }
        if let Some(idx) = cmd.lines.iter().position(|l| l.quantity == 0) {
            return Err(DomainError::validation(format!(
                "line {} quantity must be positive",
                idx + 1
            )));
        }
        if cmd.lines.iter().any(|l| l.description.trim().is_empty()) {
            return Err(DomainError::validation("line description cannot be empty"));
        }
        if !cmd.status.is_valid_initial() {
            return Err(DomainError::validation(format!(
                "order cannot be created as {}",
                cmd.status
            )));
        }
        let subtotal: Money = cmd.lines.iter().map(OrderLine::line_total).sum();
        if cmd.total < subtotal {
            return Err(DomainError::invariant("total cannot be less than line subtotal"));
        }

        Ok(vec![SalesOrderEvent::OrderPlaced(OrderPlaced {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            customer: cmd.customer.clone(),
            placed_at: cmd.placed_at,
            lines: cmd.lines.clone(),
            status: cmd.status,
            payment_method: cmd.payment_method,
            total: cmd.total,
        })])
    }

    fn handle_change_status(
        &self,
        cmd: &ChangeStatus,
    ) -> Result<Vec<SalesOrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_order_id(cmd.order_id)?;

        if !self.status.can_transition_to(cmd.status) {
            return Err(DomainError::invariant(format!(
                "cannot move order from {} to {}",
                self.status, cmd.status
            )));
        }

        Ok(vec![SalesOrderEvent::StatusChanged(StatusChanged {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            from: self.status,
            to: cmd.status,
            occurred_at: cmd.occurred_at,
        })])
    }
}
