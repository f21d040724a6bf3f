//! Utility functions for formatting and common operations
//!
//! This module provides centralized formatting utilities for consistent
//! display of money, percentages and optional metrics.

use rust_decimal::Decimal;

/// Placeholder shown for metrics that are not available
pub const NOT_AVAILABLE: &str = "N/A";

/// Core formatting function with full control over output.
///
/// Formats a Decimal value with two decimals and `,` thousands separators,
/// optionally prefixed by a currency code.
///
/// # Arguments
/// * `value` - The decimal value to format
/// * `width` - Minimum width for padding (0 for no padding, right-aligned)
/// * `currency` - Currency code to prefix, if any
///
/// # Examples
/// ```
/// use snapfolio::utils::format_money_with_width;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(
///     format_money_with_width(dec!(1234.56), 0, Some("USD")),
///     "USD 1,234.56"
/// );
///
/// assert_eq!(
///     format_money_with_width(dec!(1234), 12, None),
///     "    1,234.00"
/// );
/// ```
pub fn format_money_with_width(value: Decimal, width: usize, currency: Option<&str>) -> String {
    let rounded = value.round_dp(2);
    let is_negative = rounded < Decimal::ZERO;

    let formatted = format!("{:.2}", rounded.abs());
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    // Add thousands separators (,) to integer part
    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    let prefix = match currency {
        Some(code) if !code.is_empty() => format!("{} ", code),
        _ => String::new(),
    };

    let result = format!("{}{}{}.{}", prefix, sign, with_separators, decimal_part);

    if width > 0 && result.len() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

/// Format with a currency code: "EUR 1,234.56"
///
/// # Examples
/// ```
/// use snapfolio::utils::format_money;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_money(dec!(1234.56), "EUR"), "EUR 1,234.56");
/// assert_eq!(format_money(dec!(-500), "USD"), "USD -500.00");
/// ```
pub fn format_money(value: Decimal, currency: &str) -> String {
    format_money_with_width(value, 0, Some(currency))
}

/// Format number only (no currency): "1,234.56"
pub fn format_amount(value: Decimal) -> String {
    format_money_with_width(value, 0, None)
}

/// Format a percentage with two decimals: "12.35%"
///
/// # Examples
/// ```
/// use snapfolio::utils::format_percent;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_percent(dec!(12.3456)), "12.35%");
/// assert_eq!(format_percent(dec!(-3)), "-3.00%");
/// ```
pub fn format_percent(value: Decimal) -> String {
    format!("{:.2}%", value.round_dp(2))
}

/// Format an optional metric, "N/A" when absent
pub fn format_optional_percent(value: Option<Decimal>) -> String {
    value
        .map(format_percent)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Format an optional amount, "N/A" when absent
pub fn format_optional_money(value: Option<Decimal>, currency: &str) -> String {
    value
        .map(|v| format_money(v, currency))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_money_basic() {
        assert_eq!(format_money(dec!(1234.56), "USD"), "USD 1,234.56");
        assert_eq!(format_money(dec!(0.99), "USD"), "USD 0.99");
        assert_eq!(format_money(dec!(1000000), "EUR"), "EUR 1,000,000.00");
    }

    #[test]
    fn test_format_money_small_values() {
        assert_eq!(format_amount(dec!(0)), "0.00");
        assert_eq!(format_amount(dec!(0.01)), "0.01");
        assert_eq!(format_amount(dec!(12)), "12.00");
        assert_eq!(format_amount(dec!(999.99)), "999.99");
    }

    #[test]
    fn test_format_money_large_values() {
        assert_eq!(format_amount(dec!(1000)), "1,000.00");
        assert_eq!(format_amount(dec!(123456)), "123,456.00");
        assert_eq!(format_amount(dec!(12345678.90)), "12,345,678.90");
    }

    #[test]
    fn test_format_money_negative() {
        assert_eq!(format_money(dec!(-1234.56), "GBP"), "GBP -1,234.56");
        assert_eq!(format_amount(dec!(-0.01)), "-0.01");
    }

    #[test]
    fn test_tiny_negative_rounds_to_zero() {
        assert_eq!(format_amount(dec!(-0.001)), "0.00");
    }

    #[test]
    fn test_format_with_width() {
        let result = format_money_with_width(dec!(100), 12, Some("USD"));
        assert_eq!(result, "  USD 100.00");

        let no_padding = format_money_with_width(dec!(1000000), 5, None);
        assert_eq!(no_padding, "1,000,000.00");
    }

    #[test]
    fn test_empty_currency_has_no_prefix() {
        assert_eq!(format_money(dec!(5), ""), "5.00");
    }

    #[test]
    fn test_optional_formatting() {
        assert_eq!(format_optional_percent(None), NOT_AVAILABLE);
        assert_eq!(format_optional_percent(Some(dec!(10))), "10.00%");
        assert_eq!(format_optional_money(None, "USD"), NOT_AVAILABLE);
        assert_eq!(format_optional_money(Some(dec!(10)), "USD"), "USD 10.00");
    }
}
