//! Currency conversion against a base-anchored rate table
//!
//! A rate table stores, for each currency, how many units of that currency
//! one unit of the base currency buys. Converting between two non-base
//! currencies goes through the base: `amount / rate[from] * rate[to]`.

pub mod cache;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use cache::{RateCache, RateKey};

/// Normalize a currency code for comparison ("usd " -> "USD")
pub fn normalize_currency(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Rates relative to a single base currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    base: String,
    rates: BTreeMap<String, Decimal>,
}

impl RateTable {
    pub fn new(base: &str, rates: BTreeMap<String, Decimal>) -> Self {
        let rates = rates
            .into_iter()
            .map(|(code, rate)| (normalize_currency(&code), rate))
            .collect();
        Self {
            base: normalize_currency(base),
            rates,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Units of `currency` per one unit of base. The base itself is always 1,
    /// even when the table lists it explicitly.
    pub fn rate_for(&self, currency: &str) -> Option<Decimal> {
        let code = normalize_currency(currency);
        if code == self.base {
            return Some(Decimal::ONE);
        }
        self.rates.get(&code).copied()
    }

    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.base.as_str()).chain(self.rates.keys().map(String::as_str))
    }
}

/// Convert `amount` between currencies.
///
/// Returns `None` when either currency lacks a usable rate. Identical
/// currencies short-circuit without consulting the table.
pub fn convert(amount: Decimal, from: &str, to: &str, table: &RateTable) -> Option<Decimal> {
    if normalize_currency(from) == normalize_currency(to) {
        return Some(amount);
    }

    let from_rate = table.rate_for(from)?;
    let to_rate = table.rate_for(to)?;
    if from_rate <= Decimal::ZERO {
        return None;
    }

    let in_base = amount.checked_div(from_rate)?;
    in_base.checked_mul(to_rate)
}

/// Outcome of a conversion with raw-value fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Converted {
    pub value: Decimal,
    /// false when the raw amount was used because no rate was available
    pub converted: bool,
}

/// Convert when possible, otherwise hand back the raw amount flagged as
/// unconverted. A missing table only works for same-currency amounts.
pub fn convert_or_raw(
    amount: Decimal,
    from: &str,
    to: &str,
    table: Option<&RateTable>,
) -> Converted {
    let result = match table {
        Some(t) => convert(amount, from, to, t),
        None if normalize_currency(from) == normalize_currency(to) => Some(amount),
        None => None,
    };

    match result {
        Some(value) => Converted {
            value,
            converted: true,
        },
        None => Converted {
            value: amount,
            converted: false,
        },
    }
}

/// Read side of the exchange-rate collaborator.
///
/// The network fetch lives outside this crate; implementors only hand back
/// whatever table they currently hold.
pub trait RateProvider {
    fn rate_table(&self, key: &RateKey) -> Option<RateTable>;
}
