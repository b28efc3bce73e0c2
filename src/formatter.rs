//! Node label formatting.

use crate::models::MonetaryAmount;

const FACTOR_PERCENT: f64 = 100.0;

/// Format the text drawn on a node: `"<name>: <currency><amount>(<percent>%)"`.
///
/// The percentage is truncated, not rounded: 0.305 shows as 30%.
pub fn format_label(
    name: &str,
    monetary_amount: MonetaryAmount,
    probability: f64,
    currency_symbol: &str,
) -> String {
    format!(
        "{}: {}{}({}%)",
        name,
        currency_symbol,
        monetary_amount,
        truncated_percent(probability)
    )
}

/// Whole percentage of a probability, truncated toward zero.
pub fn truncated_percent(probability: f64) -> i64 {
    (probability * FACTOR_PERCENT).trunc() as i64
}

/// Formats labels with a fixed currency symbol.
#[derive(Debug, Clone)]
pub struct LabelFormatter {
    currency_symbol: String,
}

impl LabelFormatter {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        Self {
            currency_symbol: currency_symbol.into(),
        }
    }

    pub fn format(&self, name: &str, monetary_amount: MonetaryAmount, probability: f64) -> String {
        format_label(name, monetary_amount, probability, &self.currency_symbol)
    }
}
