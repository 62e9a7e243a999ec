use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use furnerp_core::TenantId;
use furnerp_pos::{NewOrder, OrderService, ServiceError};
use furnerp_sales::{ChangeStatus, OrderStatus, PlaceOrder, SalesOrder, SalesOrderCommand, SalesOrderId};

use super::service_error;
use crate::event_store::{EventStore, InMemoryEventStore};
use crate::read_model::{InMemoryTenantStore, TenantStore};
use crate::repository::AggregateRepository;

/// Event-sourced sales orders with a per-tenant order list.
///
/// `create_order` is idempotent on the order id: the same payload again
/// returns the same id, a different payload is a conflict.
pub struct InMemoryOrderService {
    repo: AggregateRepository<Arc<dyn EventStore>>,
    orders: InMemoryTenantStore<SalesOrderId, SalesOrder>,
}

impl Default for InMemoryOrderService {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryEventStore::new()))
    }
}

impl InMemoryOrderService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            repo: AggregateRepository::new(store),
            orders: InMemoryTenantStore::new(),
        }
    }

    pub fn get_order(&self, tenant_id: TenantId, order_id: SalesOrderId) -> Option<SalesOrder> {
        self.orders.get(tenant_id, &order_id)
    }

    /// Orders for a tenant, oldest first.
    pub fn list_orders(&self, tenant_id: TenantId) -> Vec<SalesOrder> {
        let mut orders = self.orders.list(tenant_id);
        orders.sort_by_key(|o| (o.placed_at(), o.id_typed().0));
        orders
    }

    pub fn order_count(&self, tenant_id: TenantId) -> usize {
        self.orders.count(tenant_id)
    }

    /// Move an order along its lifecycle (e.g. `delivered -> refunded`).
    pub fn change_status(
        &self,
        tenant_id: TenantId,
        order_id: SalesOrderId,
        status: OrderStatus,
    ) -> Result<OrderStatus, ServiceError> {
        let command = SalesOrderCommand::ChangeStatus(ChangeStatus {
            tenant_id,
            order_id,
            status,
            occurred_at: Utc::now(),
        });
        let order = self.execute(tenant_id, order_id, &command)?;
        Ok(order.status())
    }

    fn execute(
        &self,
        tenant_id: TenantId,
        order_id: SalesOrderId,
        command: &SalesOrderCommand,
    ) -> Result<SalesOrder, ServiceError> {
        let executed = self
            .repo
            .execute(tenant_id, order_id.0, command, || SalesOrder::empty(order_id))
            .map_err(service_error)?;
        self.orders.upsert(tenant_id, order_id, executed.aggregate.clone());
        Ok(executed.aggregate)
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn create_order(
        &self,
        tenant_id: TenantId,
        order: &NewOrder,
    ) -> Result<SalesOrderId, ServiceError> {
        let command = SalesOrderCommand::PlaceOrder(PlaceOrder {
            tenant_id,
            order_id: order.order_id,
            customer: order.customer.clone(),
            placed_at: order.date,
            lines: order.lines.clone(),
            status: order.status,
            payment_method: order.payment_method,
            total: order.total,
        });
        let placed = self.execute(tenant_id, order.order_id, &command).inspect_err(|err| {
            tracing::warn!(%tenant_id, order_id = %order.order_id, error = %err, "order rejected");
        })?;

        tracing::info!(
            %tenant_id,
            order_id = %order.order_id,
            total = %placed.total(),
            lines = placed.lines().len(),
            "order recorded"
        );
        Ok(placed.id_typed())
    }
}
