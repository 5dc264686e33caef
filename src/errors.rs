//! Unified error type for the whole crate.
//!
//! User-input and session errors carry enough context to render a short
//! user-visible reply; everything else is logged and answered generically by
//! the framework's `on_error` hook. Nothing here is fatal to the process.

use thiserror::Error;

/// All errors the bot can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment problem detected at startup.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of what was wrong.
        message: String,
    },

    /// Free-text amount that did not parse to a positive finite number.
    #[error("Invalid amount: {input}")]
    InvalidAmount {
        /// The raw user input.
        input: String,
    },

    /// Price-table update with a non-positive or non-finite rate.
    #[error("Invalid price: {value}")]
    InvalidPrice {
        /// The offending rate value.
        value: f64,
    },

    /// Ledger lookup for a user with no profile.
    #[error("Unknown user: {user}")]
    UnknownUser {
        /// The user reference as given by the caller.
        user: String,
    },

    /// Ticket creation attempted while the user already has one open.
    #[error("You already have an open ticket")]
    TicketAlreadyOpen,

    /// Ticket operation on a channel that is not a tracked ticket.
    #[error("No ticket found for channel {channel}")]
    TicketNotFound {
        /// The channel id that was probed.
        channel: u64,
    },

    /// Listing wizard operation with no live session in the expected step.
    #[error("Session expired, please restart")]
    SessionExpired,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise framework error.
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Error::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
