//! Sale receipts and their fixed-width text rendering.

use chrono::{DateTime, Utc};
use serde::Serialize;

use furnerp_core::{Money, TaxRate};
use furnerp_sales::{PaymentMethod, SalesOrderId};

use crate::cart::Cart;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptLine {
    pub description: String,
    pub sku: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Transient view of a completed sale. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleReceipt {
    pub order_id: SalesOrderId,
    pub customer: String,
    pub cashier: String,
    pub payment_method: PaymentMethod,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: Money,
    pub tax_rate: TaxRate,
    pub tax: Money,
    pub total: Money,
    pub issued_at: DateTime<Utc>,
}

impl SaleReceipt {
    pub fn from_cart(
        cart: &Cart,
        order_id: SalesOrderId,
        payment_method: PaymentMethod,
        cashier: &str,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let lines = cart
            .lines()
            .iter()
            .map(|l| ReceiptLine {
                description: l.item.name.clone(),
                sku: l.item.sku.clone(),
                quantity: l.quantity,
                unit_price: l.item.unit_price,
                line_total: l.line_total(),
            })
            .collect();

        Self {
            order_id,
            customer: cart.customer().to_string(),
            cashier: cashier.to_string(),
            payment_method,
            lines,
            subtotal: cart.subtotal(),
            tax_rate: cart.tax_rate(),
            tax: cart.tax(),
            total: cart.total(),
            issued_at,
        }
    }

    pub fn unit_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

/// Paper and branding settings for rendered receipts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLayout {
    /// Characters per line (32 for 58mm paper, 42-48 for 80mm). Anything
    /// below [`ReceiptLayout::MIN_WIDTH`] is raised to it by the renderer.
    pub width: usize,
    pub store_name: String,
    pub currency: String,
    pub currency_decimals: u8,
    pub footer: String,
}

impl ReceiptLayout {
    /// Narrowest paper the two-column rows are laid out for.
    pub const MIN_WIDTH: usize = 24;
}

impl Default for ReceiptLayout {
    fn default() -> Self {
        Self {
            width: 42,
            store_name: "Furniture Showroom".to_string(),
            currency: "IDR".to_string(),
            currency_decimals: 0,
            footer: "Thank you for your purchase!".to_string(),
        }
    }
}

/// Renders [`SaleReceipt`]s as plain text, one `\n`-terminated line per row.
#[derive(Debug, Clone, Default)]
pub struct ReceiptRenderer {
    layout: ReceiptLayout,
}

impl ReceiptRenderer {
    pub fn new(mut layout: ReceiptLayout) -> Self {
        layout.width = layout.width.max(ReceiptLayout::MIN_WIDTH);
        Self { layout }
    }

    pub fn layout(&self) -> &ReceiptLayout {
        &self.layout
    }

    pub fn render(&self, receipt: &SaleReceipt) -> String {
        let width = self.layout.width;
        let mut out = Vec::new();

        out.push(center(&self.layout.store_name, width));
        out.push("=".repeat(width));
        out.extend(columns("Order", &receipt.order_id.to_string(), width));
        out.extend(columns(
            "Date",
            &receipt.issued_at.format("%Y-%m-%d %H:%M").to_string(),
            width,
        ));
        out.extend(columns("Cashier", &receipt.cashier, width));
        out.extend(columns("Customer", &receipt.customer, width));
        out.push("-".repeat(width));

        for line in &receipt.lines {
            out.push(fit(&line.description, width));
            let qty = format!("  {} x {}", line.quantity, self.amount(line.unit_price));
            out.extend(columns(&qty, &self.amount(line.line_total), width));
        }

        out.push("-".repeat(width));
        out.extend(columns("Subtotal", &self.amount(receipt.subtotal), width));
        out.extend(columns(
            &format!("Tax ({})", receipt.tax_rate.label()),
            &self.amount(receipt.tax),
            width,
        ));
        out.extend(columns(
            "TOTAL",
            &format!("{} {}", self.layout.currency, self.amount(receipt.total)),
            width,
        ));
        out.extend(columns(
            "Payment",
            &receipt.payment_method.as_str().to_uppercase(),
            width,
        ));
        out.push("=".repeat(width));
        out.push(center(&self.layout.footer, width));

        let mut rendered = out.join("\n");
        rendered.push('\n');
        rendered
    }

    fn amount(&self, money: Money) -> String {
        money.format(self.layout.currency_decimals)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn fit(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

fn center(s: &str, width: usize) -> String {
    let s = fit(s, width);
    let pad = (width - char_len(&s)) / 2;
    format!("{}{}", " ".repeat(pad), s)
}

/// Left text and right-aligned value on one row, or two rows when both do not fit.
fn columns(left: &str, right: &str, width: usize) -> Vec<String> {
    let right_len = char_len(right);
    if right_len + 1 > width {
        return vec![fit(left, width), fit(right, width)];
    }

    let room = width - right_len - 1;
    if char_len(left) > room {
        let pad = width - right_len;
        return vec![fit(left, width), format!("{}{}", " ".repeat(pad), right)];
    }

    let pad = width - char_len(left) - right_len;
    vec![format!("{left}{}{right}", " ".repeat(pad))]
}
