//! Startup configuration assembled from environment variables and config.toml.
//!
//! All Discord identifiers (roles, category, channels, owner) come from the
//! `.env` file or the process environment; the price table and wallet
//! addresses come from `config.toml`. The bot token itself is read directly
//! in `main` just before use and is never stored here.

use crate::config::pricing::{self, Wallets};
use crate::core::pricing::PriceTable;
use crate::errors::{Error, Result};

/// Immutable application configuration, shared with every handler.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Role allowed into ticket channels and staff-only actions.
    pub staff_role_id: u64,
    /// The shop owner; the only user allowed DM owner commands.
    pub owner_id: u64,
    /// Category new ticket channels are created under.
    pub ticket_category_id: u64,
    /// Channel transcripts are posted to on ticket closure.
    pub transcript_channel_id: u64,
    /// The verification message watched for ✅ reactions.
    pub verify_message_id: u64,
    /// Role granted on successful verification.
    pub member_role_id: u64,
    /// Initial published price table (mutable at runtime via `BotData`).
    pub initial_prices: PriceTable,
    /// Crypto wallet addresses shown to customers.
    pub wallets: Wallets,
}

/// Reads a required environment variable and parses it as a Discord id.
fn env_id(name: &str) -> Result<u64> {
    let raw = std::env::var(name).map_err(|_| Error::Config {
        message: format!("Missing required environment variable {name}"),
    })?;
    raw.trim().parse().map_err(|_| Error::Config {
        message: format!("{name} is not a valid Discord id: {raw}"),
    })
}

/// Loads the full application configuration.
///
/// Environment variables provide the opaque Discord identifiers;
/// `config.toml` provides the initial price table and wallet addresses.
/// Any missing or malformed value is a startup error - the bot refuses to
/// run half-configured.
pub fn load_app_configuration() -> Result<AppConfig> {
    let file = pricing::load_default_config()?;
    Ok(AppConfig {
        staff_role_id: env_id("STAFF_ROLE_ID")?,
        owner_id: env_id("OWNER_ID")?,
        ticket_category_id: env_id("TICKET_CATEGORY_ID")?,
        transcript_channel_id: env_id("TRANSCRIPT_CHANNEL_ID")?,
        verify_message_id: env_id("VERIFY_MESSAGE_ID")?,
        member_role_id: env_id("MEMBER_ROLE_ID")?,
        initial_prices: file.prices,
        wallets: file.wallets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_id_rejects_garbage() {
        std::env::set_var("DC_TEST_BAD_ID", "not-a-number");
        assert!(env_id("DC_TEST_BAD_ID").is_err());
        std::env::remove_var("DC_TEST_BAD_ID");
    }

    #[test]
    fn test_env_id_parses_and_trims() {
        std::env::set_var("DC_TEST_GOOD_ID", " 123456789012345678 ");
        assert_eq!(env_id("DC_TEST_GOOD_ID").ok(), Some(123_456_789_012_345_678));
        std::env::remove_var("DC_TEST_GOOD_ID");
    }

    #[test]
    fn test_env_id_missing_is_config_error() {
        assert!(matches!(
            env_id("DC_TEST_DEFINITELY_UNSET"),
            Err(Error::Config { .. })
        ));
    }
}
