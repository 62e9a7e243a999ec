//! Demo data for the in-memory backend.

use anyhow::Context;
use serde::Deserialize;

use furnerp_core::{Money, TenantId};
use furnerp_infra::{InMemoryCustomerDirectory, InMemoryInventoryService, NewCatalogItem};

const SEED: &str = include_str!("seed.json");

#[derive(Debug, Deserialize)]
struct Seed {
    customers: Vec<String>,
    items: Vec<SeedItem>,
}

#[derive(Debug, Deserialize)]
struct SeedItem {
    name: String,
    sku: String,
    category: String,
    unit_price: Money,
    initial_stock: u32,
}

pub fn load(
    tenant_id: TenantId,
    inventory: &InMemoryInventoryService,
    customers: &InMemoryCustomerDirectory,
) -> anyhow::Result<usize> {
    let seed: Seed = serde_json::from_str(SEED).context("embedded seed data is malformed")?;

    for name in &seed.customers {
        customers
            .add_customer(tenant_id, name)
            .with_context(|| format!("seeding customer '{name}'"))?;
    }
    for item in &seed.items {
        inventory
            .register_item(
                tenant_id,
                NewCatalogItem {
                    name: item.name.clone(),
                    sku: item.sku.clone(),
                    category: item.category.clone(),
                    unit_price: item.unit_price,
                    initial_stock: item.initial_stock,
                },
            )
            .with_context(|| format!("seeding item {}", item.sku))?;
    }

    tracing::info!(
        %tenant_id,
        items = seed.items.len(),
        customers = seed.customers.len(),
        "seed data loaded"
    );
    Ok(seed.items.len())
}
