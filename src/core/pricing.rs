//! Amount parsing and coin price calculation.
//!
//! This module converts free-text quantities ("1.5B", "$100", "250m coins")
//! into numeric coin/USD amounts and applies the published price table with
//! its 1B-coin volume breakpoint. Parsing is deliberately lenient: anything
//! that is not a digit, a decimal point, or a recognized unit letter is
//! stripped before parsing, and callers treat a returned `0.0` as "invalid".

use serde::Deserialize;

use crate::errors::{Error, Result};

/// Which side of a coin trade a price is being quoted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    /// Customer buys coins from the shop.
    Buy,
    /// Customer sells coins to the shop.
    Sell,
}

/// The published per-million-coin rates, in USD.
///
/// Buy pricing has a volume breakpoint at 1B coins (1000 million); sell
/// pricing is flat. Updated only through the owner-gated update operation.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PriceTable {
    /// Buy rate for orders under 1B coins, USD per million.
    pub buy_under_1b: f64,
    /// Buy rate for orders of 1B coins or more, USD per million.
    pub buy_over_1b: f64,
    /// Sell rate, USD per million.
    pub sell: f64,
}

impl PriceTable {
    /// Checks that every rate is a positive finite number.
    ///
    /// Called when the table is loaded from `config.toml` and again on every
    /// owner-submitted update, so an invalid table never becomes visible.
    pub fn validate(&self) -> Result<()> {
        for value in [self.buy_under_1b, self.buy_over_1b, self.sell] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidPrice { value });
            }
        }
        Ok(())
    }
}

/// Parses a free-text coin or dollar amount into a plain number.
///
/// Keeps only digits, `.`, and the unit letters `b`/`m`/`k`/`t`
/// (case-insensitive); the first unit letter present selects a multiplier
/// (b→1e9, m→1e6, k→1e3, t→1e12, none→1). Returns `0.0` unless the numeric
/// remainder is a finite positive number, so "1.5B", "1.5b coins!!" and
/// "$100" all parse while garbage yields the caller-visible invalid marker.
#[must_use]
pub fn parse_amount(input: &str) -> f64 {
    let cleaned: String = input
        .chars()
        .filter_map(|c| {
            let c = c.to_ascii_lowercase();
            (c.is_ascii_digit() || c == '.' || matches!(c, 'b' | 'm' | 'k' | 't')).then_some(c)
        })
        .collect();

    let multiplier = if cleaned.contains('b') {
        1e9
    } else if cleaned.contains('m') {
        1e6
    } else if cleaned.contains('k') {
        1e3
    } else if cleaned.contains('t') {
        1e12
    } else {
        1.0
    };

    let digits: String = cleaned
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    match digits.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value * multiplier,
        _ => 0.0,
    }
}

/// Formats a raw coin count back into the short human form used in embeds
/// (`1.5B`, `250M`, `10K`). At most two decimals, trailing zeros trimmed.
#[must_use]
pub fn format_amount(coins: f64) -> String {
    let (scaled, suffix) = if coins >= 1e12 {
        (coins / 1e12, "T")
    } else if coins >= 1e9 {
        (coins / 1e9, "B")
    } else if coins >= 1e6 {
        (coins / 1e6, "M")
    } else if coins >= 1e3 {
        (coins / 1e3, "K")
    } else {
        (coins, "")
    };
    let mut text = format!("{scaled:.2}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    format!("{text}{suffix}")
}

/// Computes the USD price for a coin amount on the given side.
///
/// Converts coins to millions; sell uses the flat sell rate, buy uses the
/// over-1B rate at 1000 million and above, the under-1B rate below. No
/// rounding happens here; the presentation layer rounds to 2 decimals.
#[must_use]
pub fn calculate_price(table: &PriceTable, amount_coins: f64, side: TradeSide) -> f64 {
    let millions = amount_coins / 1e6;
    match side {
        TradeSide::Sell => millions * table.sell,
        TradeSide::Buy => {
            if millions >= 1000.0 {
                millions * table.buy_over_1b
            } else {
                millions * table.buy_under_1b
            }
        }
    }
}

/// Computes how many coins a USD amount buys.
///
/// Assumes the over-1B rate first; if the resulting amount is at least 1000
/// million the answer stands, otherwise it is recomputed at the under-1B
/// rate. The breakpoint check is one-directional: after switching rates the
/// result is not re-checked against the boundary. That matches the published
/// price table's intent and is preserved as-is.
#[must_use]
pub fn coins_for_money(table: &PriceTable, usd: f64) -> f64 {
    let millions_at_bulk_rate = usd / table.buy_over_1b;
    if millions_at_bulk_rate >= 1000.0 {
        millions_at_bulk_rate * 1e6
    } else {
        (usd / table.buy_under_1b) * 1e6
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    fn table() -> PriceTable {
        PriceTable {
            buy_under_1b: 0.04,
            buy_over_1b: 0.035,
            sell: 0.018,
        }
    }

    #[test]
    fn test_parse_amount_units() {
        assert_eq!(parse_amount("1.5B"), 1_500_000_000.0);
        assert_eq!(parse_amount("250m"), 250_000_000.0);
        assert_eq!(parse_amount("10K"), 10_000.0);
        assert_eq!(parse_amount("2t"), 2e12);
        assert_eq!(parse_amount("100"), 100.0);
    }

    #[test]
    fn test_parse_amount_lenient_noise() {
        assert_eq!(parse_amount("1.5b coins!!"), 1_500_000_000.0);
        assert_eq!(parse_amount("$100"), 100.0);
        assert_eq!(parse_amount(" 3 , 5 m "), 35_000_000.0);
    }

    #[test]
    fn test_parse_amount_invalid_is_zero() {
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("lots of coins"), 0.0);
        assert_eq!(parse_amount("..."), 0.0);
        assert_eq!(parse_amount("-5m"), 5_000_000.0); // sign is stripped, not kept
        assert_eq!(parse_amount("0"), 0.0);
    }

    #[test]
    fn test_parse_amount_idempotent_through_format() {
        for input in ["1.5B", "250M", "10K", "755m", "2.25b"] {
            let first = parse_amount(input);
            let second = parse_amount(&format_amount(first));
            // Formatting keeps two decimals of the scaled value, so the
            // round-trip is exact for these inputs.
            assert_eq!(first, second, "round-trip mismatch for {input}");
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1_500_000_000.0), "1.5B");
        assert_eq!(format_amount(250_000_000.0), "250M");
        assert_eq!(format_amount(10_000.0), "10K");
        assert_eq!(format_amount(2e12), "2T");
        assert_eq!(format_amount(950.0), "950");
    }

    #[test]
    fn test_calculate_price_buy_breakpoint() {
        let t = table();
        // 1.5B coins = 1500 million, over the breakpoint
        assert_eq!(
            calculate_price(&t, 1_500_000_000.0, TradeSide::Buy),
            1500.0 * 0.035
        );
        // 500M coins, under the breakpoint
        assert_eq!(
            calculate_price(&t, 500_000_000.0, TradeSide::Buy),
            500.0 * 0.04
        );
        // Exactly 1B sits on the bulk rate
        assert_eq!(
            calculate_price(&t, 1_000_000_000.0, TradeSide::Buy),
            1000.0 * 0.035
        );
    }

    #[test]
    fn test_calculate_price_sell_is_flat() {
        let t = table();
        assert_eq!(
            calculate_price(&t, 2_000_000_000.0, TradeSide::Sell),
            2000.0 * 0.018
        );
        assert_eq!(
            calculate_price(&t, 100_000_000.0, TradeSide::Sell),
            100.0 * 0.018
        );
    }

    #[test]
    fn test_published_rate_example_1_5b() {
        let t = PriceTable {
            buy_under_1b: 0.04,
            buy_over_1b: 0.035,
            sell: 0.018,
        };
        let coins = parse_amount("1.5B");
        assert_eq!(coins, 1_500_000_000.0);
        assert_eq!(calculate_price(&t, coins, TradeSide::Buy), 52.5);
    }

    #[test]
    fn test_coins_for_money_bulk_branch() {
        let t = table();
        // $100 / 0.035 = 2857.14M >= 1000M, so the bulk rate stands.
        let coins = coins_for_money(&t, parse_amount("$100"));
        assert!((coins - 2_857_142_857.142_857).abs() < 1.0);
    }

    #[test]
    fn test_coins_for_money_small_branch() {
        let t = table();
        // $10 / 0.035 = 285.7M < 1000M, so recompute at the under-1B rate.
        let coins = coins_for_money(&t, 10.0);
        assert_eq!(coins, (10.0 / 0.04) * 1e6);
    }

    #[test]
    fn test_price_table_validation() {
        assert!(table().validate().is_ok());
        let bad = PriceTable {
            buy_under_1b: 0.0,
            ..table()
        };
        assert!(bad.validate().is_err());
        let nan = PriceTable {
            sell: f64::NAN,
            ..table()
        };
        assert!(nan.validate().is_err());
    }
}
