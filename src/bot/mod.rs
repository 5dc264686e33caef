//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the `DavidsCoins`
//! application: prefix commands, the gateway event handler for buttons,
//! modals, reactions and ticket message tracking, and the shared bot
//! context that owns every in-memory service.

/// Discord command implementations (general, trading, ticket, owner)
pub mod commands;
/// Discord gateway event handlers (components, modals, reactions, messages)
pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tokio::sync::{Mutex, RwLock};
use tokio::task::AbortHandle;
use tracing::info;

use crate::config::AppConfig;
use crate::core::ledger::Ledger;
use crate::core::listings::ListingBoard;
use crate::core::pricing::PriceTable;
use crate::core::tickets::TicketRegistry;
use crate::errors;

/// Shared data available to all bot commands and event handlers.
///
/// Every registry the original product kept as module-level mutable state
/// lives here as an owned service, constructed once at process start.
/// Mutating calls take the write guard for the whole operation, preserving
/// the single-writer semantics the core relies on.
pub struct BotData {
    /// Immutable startup configuration.
    pub config: Arc<AppConfig>,
    /// The published price table; replaced only by owner-gated updates.
    pub prices: RwLock<PriceTable>,
    /// Trade log, profiles, and statistics.
    pub ledger: RwLock<Ledger>,
    /// Open tickets and their transcript buffers.
    pub tickets: RwLock<TicketRegistry>,
    /// Listing wizard sessions and the published marketplace.
    pub listings: RwLock<ListingBoard>,
    /// Abort handles for scheduled ticket-channel deletions, keyed by
    /// channel id; a manual channel deletion cancels the pending task.
    pub pending_deletions: Mutex<HashMap<u64, AbortHandle>>,
}

impl BotData {
    /// Creates the shared context with empty registries and the configured
    /// initial price table.
    #[must_use]
    pub fn new(config: Arc<AppConfig>) -> Self {
        let prices = config.initial_prices;
        Self {
            config,
            prices: RwLock::new(prices),
            ledger: RwLock::new(Ledger::new()),
            tickets: RwLock::new(TicketRegistry::new()),
            listings: RwLock::new(ListingBoard::new()),
            pending_deletions: Mutex::new(HashMap::new()),
        }
    }
}

/// Error type shared with poise.
pub type Error = errors::Error;
/// Command context alias used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            tracing::error!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say("❌ Something went wrong, please try again.").await {
                tracing::error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                tracing::error!("Error while handling error: {e}");
            }
        }
    }
}

/// Builds the poise framework and runs the gateway client until shutdown.
pub async fn run_bot(token: String, app_config: Arc<AppConfig>) -> Result<(), serenity::Error> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::info(),
                commands::crypto(),
                commands::price(),
                commands::stats(),
                commands::leaderboard(),
                commands::profile(),
                commands::history(),
                commands::recent(),
                commands::close(),
                commands::servers(),
                commands::setprice(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".to_string()),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::handle_event(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |_ctx, ready, _framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                Ok(BotData::new(app_config))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot client...");
    client.start().await.inspect_err(|why| {
        tracing::error!("Client error: {why:?}");
    })
}
