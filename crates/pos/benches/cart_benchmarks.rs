use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use furnerp_core::{AggregateId, Money};
use furnerp_inventory::{CatalogItem, CatalogItemId};
use furnerp_pos::{Cart, CatalogCache, ReceiptRenderer, SaleReceipt};
use furnerp_sales::{PaymentMethod, SalesOrderId};

fn catalog(size: usize) -> Vec<CatalogItem> {
    (0..size)
        .map(|i| CatalogItem {
            id: CatalogItemId::new(AggregateId::new()),
            name: format!("Item {i} {}", ["Sofa", "Table", "Chair", "Lamp"][i % 4]),
            sku: format!("SKU-{i:05}"),
            category: ["Living", "Dining", "Bedroom"][i % 3].to_string(),
            unit_price: Money::from_minor(10_000 + i as u64 * 7),
            on_hand: 50,
        })
        .collect()
}

fn filled_cart(items: &[CatalogItem]) -> Cart {
    let mut cart = Cart::default();
    for item in items {
        cart.add(item).unwrap();
        cart.add(item).unwrap();
    }
    cart
}

fn bench_cart_totals(c: &mut Criterion) {
    let mut group = c.benchmark_group("cart_totals");

    for lines in [1usize, 10, 50] {
        let items = catalog(lines);
        let cart = filled_cart(&items);
        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lines), &cart, |b, cart| {
            b.iter(|| black_box(cart.total()));
        });
    }

    group.finish();
}

fn bench_cart_add(c: &mut Criterion) {
    let items = catalog(50);
    c.bench_function("cart_add_50_distinct", |b| {
        b.iter(|| black_box(filled_cart(&items)));
    });
}

fn bench_catalog_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_search");

    for size in [100usize, 1_000, 10_000] {
        let cache = CatalogCache::from_parts(catalog(size), Vec::new());
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &cache, |b, cache| {
            b.iter(|| black_box(cache.search("chair").count()));
        });
    }

    group.finish();
}

fn bench_receipt_render(c: &mut Criterion) {
    let items = catalog(20);
    let cart = filled_cart(&items);
    let receipt = SaleReceipt::from_cart(
        &cart,
        SalesOrderId::new(AggregateId::new()),
        PaymentMethod::Card,
        "Bench",
        chrono::Utc::now(),
    );
    let renderer = ReceiptRenderer::default();

    c.bench_function("receipt_render_20_lines", |b| {
        b.iter(|| black_box(renderer.render(&receipt)));
    });
}

criterion_group!(
    benches,
    bench_cart_totals,
    bench_cart_add,
    bench_catalog_search,
    bench_receipt_render
);
criterion_main!(benches);
