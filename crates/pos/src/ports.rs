//! Service ports used by the terminal.
//!
//! Every external call the point-of-sale flow makes goes through one of these
//! traits; adapters (in-memory, HTTP, database) live elsewhere.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use furnerp_core::{Money, TenantId};
use furnerp_inventory::{CatalogItem, CatalogQuery, SaleReference, StockDecrement};
use furnerp_sales::{OrderLine, OrderStatus, PaymentMethod, SalesOrderId};

/// Failure reported by an external service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Transport or backend failure; the request may or may not have applied.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The service understood the request and refused it.
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    /// Whether the write may have been applied despite the error.
    pub fn may_have_applied(&self) -> bool {
        matches!(self, ServiceError::Unavailable(_))
    }
}

/// Order payload sent to the order service.
///
/// `order_id` is chosen by the caller and doubles as the idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_id: SalesOrderId,
    pub customer: String,
    pub date: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total: Money,
}

#[async_trait]
pub trait InventoryService: Send + Sync {
    async fn list_catalog_items(
        &self,
        tenant_id: TenantId,
        query: &CatalogQuery,
    ) -> Result<Vec<CatalogItem>, ServiceError>;

    /// Best-effort batched decrement. Returns no post-decrement quantities.
    async fn decrement_stock(
        &self,
        tenant_id: TenantId,
        reference: SaleReference,
        lines: &[StockDecrement],
    ) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn list_customer_names(&self, tenant_id: TenantId) -> Result<Vec<String>, ServiceError>;
}

#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create_order(
        &self,
        tenant_id: TenantId,
        order: &NewOrder,
    ) -> Result<SalesOrderId, ServiceError>;
}

#[async_trait]
impl<T> InventoryService for Arc<T>
where
    T: InventoryService + ?Sized,
{
    async fn list_catalog_items(
        &self,
        tenant_id: TenantId,
        query: &CatalogQuery,
    ) -> Result<Vec<CatalogItem>, ServiceError> {
        (**self).list_catalog_items(tenant_id, query).await
    }

    async fn decrement_stock(
        &self,
        tenant_id: TenantId,
        reference: SaleReference,
        lines: &[StockDecrement],
    ) -> Result<(), ServiceError> {
        (**self).decrement_stock(tenant_id, reference, lines).await
    }
}

#[async_trait]
impl<T> CustomerDirectory for Arc<T>
where
    T: CustomerDirectory + ?Sized,
{
    async fn list_customer_names(&self, tenant_id: TenantId) -> Result<Vec<String>, ServiceError> {
        (**self).list_customer_names(tenant_id).await
    }
}

#[async_trait]
impl<T> OrderService for Arc<T>
where
    T: OrderService + ?Sized,
{
    async fn create_order(
        &self,
        tenant_id: TenantId,
        order: &NewOrder,
    ) -> Result<SalesOrderId, ServiceError> {
        (**self).create_order(tenant_id, order).await
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrintError {
    #[error("printer unavailable: {0}")]
    Unavailable(String),
}

/// Host print capability.
pub trait ReceiptPrinter {
    fn print(&self, rendered: &str) -> Result<(), PrintError>;
}
