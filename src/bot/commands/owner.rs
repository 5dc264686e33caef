//! DM-only owner commands.
//!
//! Both commands refuse to run unless the author is the configured owner
//! and the message arrived in a DM, so price updates can't be triggered
//! (or observed) from a public channel.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use tracing::info;

    use crate::bot::Context;
    use crate::core::pricing::PriceTable;
    use crate::errors::Result;

    async fn owner_dm_only(ctx: Context<'_>) -> Result<bool> {
        Ok(ctx.guild_id().is_none() && ctx.author().id.get() == ctx.data().config.owner_id)
    }

    /// Lists every server the bot is currently in.
    #[poise::command(prefix_command, check = "owner_dm_only", hide_in_help)]
    pub async fn servers(ctx: Context<'_>) -> Result<()> {
        let cache = &ctx.serenity_context().cache;
        let mut lines = Vec::new();
        for guild_id in cache.guilds() {
            let name = guild_id
                .name(cache)
                .unwrap_or_else(|| "(name unavailable)".to_string());
            lines.push(format!("• {name} ({guild_id})"));
        }
        if lines.is_empty() {
            ctx.say("Not in any servers.").await?;
        } else {
            ctx.say(lines.join("\n")).await?;
        }
        Ok(())
    }

    /// Replaces the published price table: `!setprice <under_1b> <over_1b> <sell>`.
    #[poise::command(prefix_command, check = "owner_dm_only", hide_in_help)]
    pub async fn setprice(
        ctx: Context<'_>,
        buy_under_1b: f64,
        buy_over_1b: f64,
        sell: f64,
    ) -> Result<()> {
        let table = PriceTable {
            buy_under_1b,
            buy_over_1b,
            sell,
        };
        if table.validate().is_err() {
            ctx.say("❌ All three rates must be positive numbers.").await?;
            return Ok(());
        }

        *ctx.data().prices.write().await = table;
        info!(
            "Price table updated: under={buy_under_1b} over={buy_over_1b} sell={sell}"
        );
        ctx.say(format!(
            "✅ Prices updated: under 1B ${buy_under_1b}/M, 1B+ ${buy_over_1b}/M, sell ${sell}/M"
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
