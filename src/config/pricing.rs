//! Price table and wallet configuration loading from config.toml
//!
//! This module loads the initial published price table and the crypto wallet
//! addresses the bot hands out for crypto payments. The price table seeded
//! here is only the starting point; the owner can replace it at runtime via
//! the staff-gated update operation.

use crate::core::pricing::PriceTable;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct FileConfig {
    /// Initial published price table
    pub prices: PriceTable,
    /// Crypto wallet addresses shown in the `!crypto` embed
    pub wallets: Wallets,
}

/// Crypto wallet addresses, opaque strings passed straight to embeds
#[derive(Debug, Deserialize, Clone)]
pub struct Wallets {
    /// Bitcoin address
    pub btc: String,
    /// Ethereum address
    pub eth: String,
    /// Litecoin address
    pub ltc: String,
    /// USDT (TRC-20) address
    pub usdt: String,
}

/// Loads price/wallet configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
/// - Any price rate is non-positive or non-finite
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    let config: FileConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    config.prices.validate()?;
    Ok(config)
}

/// Loads price/wallet configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<FileConfig> {
    load_config("config.toml")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_pricing_config() {
        let toml_str = r#"
            [prices]
            buy_under_1b = 0.04
            buy_over_1b = 0.035
            sell = 0.018

            [wallets]
            btc = "bc1qexample"
            eth = "0xexample"
            ltc = "ltc1example"
            usdt = "TExample"
        "#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.prices.buy_under_1b, 0.04);
        assert_eq!(config.prices.buy_over_1b, 0.035);
        assert_eq!(config.prices.sell, 0.018);
        assert!(config.prices.validate().is_ok());
        assert_eq!(config.wallets.btc, "bc1qexample");
        assert_eq!(config.wallets.usdt, "TExample");
    }
}
