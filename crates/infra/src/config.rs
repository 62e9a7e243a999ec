//! Terminal configuration from the process environment.

use thiserror::Error;

use furnerp_core::TaxRate;
use furnerp_pos::{ReceiptLayout, TerminalSettings, WALK_IN_CUSTOMER};

pub const MIN_RECEIPT_WIDTH: usize = ReceiptLayout::MIN_WIDTH;
pub const MAX_CURRENCY_DECIMALS: u8 = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: '{value}' is not a valid {expected}")]
    Malformed {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{key}: {reason}")]
    OutOfRange { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosConfig {
    pub tax_rate: TaxRate,
    pub receipt_width: usize,
    pub store_name: String,
    pub currency: String,
    pub currency_decimals: u8,
    pub walk_in_customer: String,
    pub receipt_footer: String,
}

impl Default for PosConfig {
    fn default() -> Self {
        let layout = ReceiptLayout::default();
        Self {
            tax_rate: TaxRate::STANDARD,
            receipt_width: layout.width,
            store_name: layout.store_name,
            currency: layout.currency,
            currency_decimals: layout.currency_decimals,
            walk_in_customer: WALK_IN_CUSTOMER.to_string(),
            receipt_footer: layout.footer,
        }
    }
}

impl PosConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset and blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(raw) = get("POS_TAX_RATE_BPS") {
            let bps: u32 = parse("POS_TAX_RATE_BPS", &raw, "basis-point count")?;
            if bps > 10_000 {
                return Err(ConfigError::OutOfRange {
                    key: "POS_TAX_RATE_BPS",
                    reason: format!("{bps} exceeds 10000 (100%)"),
                });
            }
            config.tax_rate = TaxRate::from_basis_points(bps);
        }
        if let Some(raw) = get("POS_RECEIPT_WIDTH") {
            let width: usize = parse("POS_RECEIPT_WIDTH", &raw, "column count")?;
            if width < MIN_RECEIPT_WIDTH {
                return Err(ConfigError::OutOfRange {
                    key: "POS_RECEIPT_WIDTH",
                    reason: format!("{width} is below the minimum of {MIN_RECEIPT_WIDTH}"),
                });
            }
            config.receipt_width = width;
        }
        if let Some(raw) = get("POS_CURRENCY_DECIMALS") {
            let decimals: u8 = parse("POS_CURRENCY_DECIMALS", &raw, "digit count")?;
            if decimals > MAX_CURRENCY_DECIMALS {
                return Err(ConfigError::OutOfRange {
                    key: "POS_CURRENCY_DECIMALS",
                    reason: format!("{decimals} exceeds {MAX_CURRENCY_DECIMALS}"),
                });
            }
            config.currency_decimals = decimals;
        }
        if let Some(name) = get("POS_STORE_NAME") {
            config.store_name = name;
        }
        if let Some(currency) = get("POS_CURRENCY") {
            config.currency = currency;
        }
        if let Some(label) = get("POS_WALK_IN_CUSTOMER") {
            config.walk_in_customer = label;
        }
        if let Some(footer) = get("POS_RECEIPT_FOOTER") {
            config.receipt_footer = footer;
        }

        Ok(config)
    }

    pub fn terminal_settings(&self) -> TerminalSettings {
        TerminalSettings {
            tax_rate: self.tax_rate,
            walk_in_customer: self.walk_in_customer.clone(),
            receipt: ReceiptLayout {
                width: self.receipt_width,
                store_name: self.store_name.clone(),
                currency: self.currency.clone(),
                currency_decimals: self.currency_decimals,
                footer: self.receipt_footer.clone(),
            },
        }
    }
}

fn parse<T: std::str::FromStr>(
    key: &'static str,
    raw: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Malformed {
        key,
        value: raw.to_string(),
        expected,
    })
}
