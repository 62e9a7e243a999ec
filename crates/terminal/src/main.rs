//! Single-terminal demo: in-memory backend, one cashier, one scripted sale.
//!
//! Usage: `furnerp-terminal [cash|card|mobile] [SKU ...]`

mod seed;

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;

use furnerp_auth::{Role, RolePolicy, SessionContext, visible_modules};
use furnerp_core::{TenantId, UserId};
use furnerp_infra::event_store::{EventStore, InMemoryEventStore};
use furnerp_infra::{
    InMemoryCustomerDirectory, InMemoryInventoryService, InMemoryOrderService, PosConfig,
};
use furnerp_pos::{PosTerminal, PrintError, ReceiptPrinter};
use furnerp_sales::PaymentMethod;

const DEFAULT_SKUS: [&str; 3] = ["TBL-TEK-1", "CHR-RAT-2", "CHR-RAT-2"];

struct StdoutPrinter;

impl ReceiptPrinter for StdoutPrinter {
    fn print(&self, rendered: &str) -> Result<(), PrintError> {
        let mut out = std::io::stdout().lock();
        out.write_all(rendered.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|e| PrintError::Unavailable(e.to_string()))
    }
}

fn payment_method(arg: &str) -> Option<PaymentMethod> {
    match arg.to_ascii_lowercase().as_str() {
        "cash" => Some(PaymentMethod::Cash),
        "card" => Some(PaymentMethod::Card),
        "mobile" => Some(PaymentMethod::Mobile),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    furnerp_observability::init();

    let config = PosConfig::from_env().context("invalid POS configuration")?;

    let store: Arc<dyn EventStore> = Arc::new(InMemoryEventStore::new());
    let inventory = Arc::new(InMemoryInventoryService::new(store.clone()));
    let customers = Arc::new(InMemoryCustomerDirectory::new());
    let orders = Arc::new(InMemoryOrderService::new(store));

    let tenant_id = TenantId::new();
    seed::load(tenant_id, &inventory, &customers)?;

    let session = SessionContext::new(
        tenant_id,
        UserId::new(),
        "Demo Cashier",
        vec![Role::CASHIER],
        &RolePolicy::standard(),
    );
    let modules: Vec<&str> = visible_modules(session.capabilities())
        .map(|m| m.route())
        .collect();
    tracing::info!(user = session.display_name(), ?modules, "session opened");

    let mut terminal = PosTerminal::new(
        session,
        config.terminal_settings(),
        inventory,
        customers,
        orders.clone(),
    )?;
    terminal.load().await?;

    let mut args = std::env::args().skip(1).peekable();
    let payment = match args.peek().and_then(|a| payment_method(a)) {
        Some(method) => {
            args.next();
            method
        }
        None => PaymentMethod::Cash,
    };
    let mut skus: Vec<String> = args.collect();
    if skus.is_empty() {
        skus = DEFAULT_SKUS.iter().map(|s| s.to_string()).collect();
    }

    for sku in &skus {
        match terminal.scan(sku) {
            Ok(change) => tracing::debug!(sku, ?change, "scanned"),
            Err(err) if err.is_warning() => tracing::warn!(sku, error = %err, "scan rejected"),
            Err(err) => return Err(err.into()),
        }
    }
    if let Some(customer) = terminal.catalog().customers().first().cloned() {
        terminal.set_customer(&customer)?;
    }
    if terminal.cart().is_empty() {
        tracing::warn!("nothing sellable was scanned; no sale made");
        return Ok(());
    }

    terminal.checkout(payment).await?;
    terminal.print_receipt(&StdoutPrinter)?;
    terminal.start_new_sale()?;

    tracing::info!(orders = orders.order_count(tenant_id), "session closed");
    Ok(())
}
