use std::sync::Arc;

use furnerp_auth::{Role, RolePolicy, SessionContext};
use furnerp_core::{Money, TenantId, UserId};
use furnerp_infra::event_store::{EventStore, InMemoryEventStore};
use furnerp_infra::{
    InMemoryCustomerDirectory, InMemoryInventoryService, InMemoryOrderService, NewCatalogItem,
    PosConfig,
};
use furnerp_inventory::CatalogItemId;
use furnerp_pos::{CheckoutError, PosTerminal, ServiceError, TerminalError};
use furnerp_sales::{OrderStatus, PaymentMethod};

struct Backend {
    tenant_id: TenantId,
    inventory: Arc<InMemoryInventoryService>,
    customers: Arc<InMemoryCustomerDirectory>,
    orders: Arc<InMemoryOrderService>,
    sofa: CatalogItemId,
    lamp: CatalogItemId,
}

type Terminal = PosTerminal<
    Arc<InMemoryInventoryService>,
    Arc<InMemoryCustomerDirectory>,
    Arc<InMemoryOrderService>,
>;

fn backend() -> Backend {
    let store: Arc<dyn EventStore> = Arc::new(InMemoryEventStore::new());
    let inventory = Arc::new(InMemoryInventoryService::new(store.clone()));
    let customers = Arc::new(InMemoryCustomerDirectory::new());
    let orders = Arc::new(InMemoryOrderService::new(store));
    let tenant_id = TenantId::new();

    let sofa = inventory
        .register_item(
            tenant_id,
            NewCatalogItem {
                name: "Velvet Sofa".to_string(),
                sku: "SOF-VEL-3".to_string(),
                category: "Living Room".to_string(),
                unit_price: Money::from_minor(8_900_000),
                initial_stock: 1,
            },
        )
        .unwrap();
    let lamp = inventory
        .register_item(
            tenant_id,
            NewCatalogItem {
                name: "Arc Floor Lamp".to_string(),
                sku: "LMP-ARC-1".to_string(),
                category: "Lighting".to_string(),
                unit_price: Money::from_minor(10_000),
                initial_stock: 6,
            },
        )
        .unwrap();
    customers.add_customer(tenant_id, "Ayu Lestari").unwrap();

    Backend {
        tenant_id,
        inventory,
        customers,
        orders,
        sofa,
        lamp,
    }
}

async fn terminal(backend: &Backend, name: &str) -> Terminal {
    let session = SessionContext::new(
        backend.tenant_id,
        UserId::new(),
        name,
        vec![Role::CASHIER],
        &RolePolicy::standard(),
    );
    let mut terminal = PosTerminal::new(
        session,
        PosConfig::default().terminal_settings(),
        backend.inventory.clone(),
        backend.customers.clone(),
        backend.orders.clone(),
    )
    .unwrap();
    terminal.load().await.unwrap();
    terminal
}

#[tokio::test]
async fn sale_is_recorded_and_stock_follows() {
    let backend = backend();
    let mut till = terminal(&backend, "Sari").await;

    till.add_item(backend.sofa).unwrap();
    till.add_item(backend.lamp).unwrap();
    till.add_item(backend.lamp).unwrap();
    till.set_customer("Ayu Lestari").unwrap();
    let receipt = till.checkout(PaymentMethod::Card).await.unwrap();

    assert_eq!(receipt.subtotal, Money::from_minor(8_920_000));
    assert_eq!(receipt.tax, Money::from_minor(713_600));
    assert_eq!(receipt.total, Money::from_minor(9_633_600));

    let order = backend.orders.get_order(backend.tenant_id, receipt.order_id).unwrap();
    assert_eq!(order.lines().len(), 2);
    assert_eq!(order.status(), OrderStatus::Delivered);
    assert_eq!(order.payment_method(), Some(PaymentMethod::Card));
    assert_eq!(order.customer(), "Ayu Lestari");

    let sofa = backend.inventory.get_item(backend.tenant_id, backend.sofa).unwrap();
    let lamp = backend.inventory.get_item(backend.tenant_id, backend.lamp).unwrap();
    assert_eq!((sofa.on_hand, lamp.on_hand), (0, 4));
    assert_eq!(till.catalog().get(backend.lamp).unwrap().on_hand, 4);

    let rendered = till.render_receipt().unwrap();
    assert!(rendered.contains("IDR 9,633,600"));
    till.start_new_sale().unwrap();

    // A fresh terminal sees the new counts.
    let other = terminal(&backend, "Dewi").await;
    assert_eq!(other.catalog().get(backend.sofa).unwrap().on_hand, 0);
    assert_eq!(other.catalog().customers(), ["Ayu Lestari".to_string()]);
}

#[tokio::test]
async fn two_terminals_racing_for_the_last_unit() {
    let backend = backend();
    let mut first = terminal(&backend, "Sari").await;
    let mut second = terminal(&backend, "Dewi").await;

    first.add_item(backend.sofa).unwrap();
    second.add_item(backend.sofa).unwrap();

    first.checkout(PaymentMethod::Cash).await.unwrap();
    let err = second.checkout(PaymentMethod::Cash).await.unwrap_err();

    let TerminalError::Checkout(CheckoutError::StockDecrement { order_id, source }) = err else {
        panic!("expected a stock failure, got {err:?}");
    };
    assert!(matches!(source, ServiceError::Rejected(_)));

    // The losing order exists without its stock movement and stays pending on the terminal.
    assert_eq!(backend.orders.order_count(backend.tenant_id), 2);
    assert!(backend.orders.get_order(backend.tenant_id, order_id).is_some());
    assert_eq!(second.pending_sale().map(|p| p.order.order_id), Some(order_id));
    assert_eq!(
        backend.inventory.get_item(backend.tenant_id, backend.sofa).unwrap().on_hand,
        0
    );

    // Once the item is restocked, retrying the same cart completes that same order.
    backend.inventory.restock(backend.tenant_id, backend.sofa, 1).unwrap();
    let receipt = second.checkout(PaymentMethod::Cash).await.unwrap();
    assert_eq!(receipt.order_id, order_id);
    assert_eq!(backend.orders.order_count(backend.tenant_id), 2);
    assert_eq!(
        backend.inventory.get_item(backend.tenant_id, backend.sofa).unwrap().on_hand,
        0
    );
}

#[tokio::test]
async fn refunds_follow_the_order_lifecycle() {
    let backend = backend();
    let mut till = terminal(&backend, "Sari").await;
    till.add_item(backend.lamp).unwrap();
    let receipt = till.checkout(PaymentMethod::Mobile).await.unwrap();

    let status = backend
        .orders
        .change_status(backend.tenant_id, receipt.order_id, OrderStatus::Refunded)
        .unwrap();
    assert_eq!(status, OrderStatus::Refunded);
    assert_eq!(backend.orders.list_orders(backend.tenant_id).len(), 1);
}
