//! Trading statistics commands - server stats, leaderboard, profiles, and
//! trade history. All of these are read-only views over the ledger.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use poise::serenity_prelude::CreateEmbed;

    use crate::bot::Context;
    use crate::core::ledger::{LeaderboardMetric, Period, Trade, UserProfile};
    use crate::core::pricing::format_amount;
    use crate::errors::Result;

    const EMBED_COLOUR: u32 = 0x00b0_f4;
    const HISTORY_LIMIT: usize = 10;
    const LEADERBOARD_LIMIT: usize = 10;

    /// Strips a Discord mention (`<@123>` / `<@!123>`) down to the raw id.
    fn resolve_user_ref(raw: &str) -> &str {
        raw.trim_start_matches("<@!")
            .trim_start_matches("<@")
            .trim_end_matches('>')
    }

    fn format_trade_line(trade: &Trade) -> String {
        format!(
            "`{}` {} {} for **${:.2}** via {} ({})",
            trade.trade_id,
            trade.kind.label(),
            format_amount(trade.amount),
            trade.price_usd,
            trade.payment_method,
            trade.timestamp.format("%Y-%m-%d")
        )
    }

    fn metric_value(profile: &UserProfile, metric: LeaderboardMetric) -> String {
        match metric {
            LeaderboardMetric::Volume => format!("${:.2}", profile.trades.total_volume_usd),
            LeaderboardMetric::Trades => format!("{} trades", profile.trades.total),
            LeaderboardMetric::Buys => format!("{} buys", profile.trades.buys),
            LeaderboardMetric::Sells => format!("{} sells", profile.trades.sells),
            LeaderboardMetric::Reputation => format!("{:.1} ⭐", profile.reputation.rating()),
        }
    }

    /// Shows server-wide totals and the current day/week/month buckets.
    #[poise::command(prefix_command)]
    pub async fn stats(ctx: Context<'_>) -> Result<()> {
        let ledger = ctx.data().ledger.read().await;
        let totals = ledger.server_stats();
        let daily = ledger.stats_for_period(Period::Daily);
        let weekly = ledger.stats_for_period(Period::Weekly);
        let monthly = ledger.stats_for_period(Period::Monthly);

        let embed = CreateEmbed::new()
            .title("Server statistics")
            .field(
                "All time",
                format!(
                    "{} trades, ${:.2} revenue, {} traders",
                    totals.total_trades, totals.total_revenue, totals.total_users
                ),
                false,
            )
            .field(
                "Today",
                format!("{} trades, ${:.2}", daily.trades, daily.revenue),
                true,
            )
            .field(
                "This week",
                format!("{} trades, ${:.2}", weekly.trades, weekly.revenue),
                true,
            )
            .field(
                "This month",
                format!("{} trades, ${:.2}", monthly.trades, monthly.revenue),
                true,
            )
            .colour(EMBED_COLOUR);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Ranks the top traders by a metric (volume, trades, buys, sells,
    /// reputation). Defaults to volume.
    #[poise::command(prefix_command)]
    pub async fn leaderboard(ctx: Context<'_>, metric: Option<String>) -> Result<()> {
        let metric = match metric.as_deref() {
            None => LeaderboardMetric::Volume,
            Some(raw) => match LeaderboardMetric::parse(raw) {
                Some(metric) => metric,
                None => {
                    ctx.say(format!(
                        "❌ Unknown metric `{raw}`. Try: volume, trades, buys, sells, reputation"
                    ))
                    .await?;
                    return Ok(());
                }
            },
        };

        let ledger = ctx.data().ledger.read().await;
        let top = ledger.top_traders(metric, LEADERBOARD_LIMIT);
        if top.is_empty() {
            ctx.say("No trades recorded yet.").await?;
            return Ok(());
        }

        let lines: Vec<String> = top
            .iter()
            .enumerate()
            .map(|(rank, profile)| {
                format!(
                    "**{}.** {} — {}",
                    rank + 1,
                    profile.username,
                    metric_value(profile, metric)
                )
            })
            .collect();
        let embed = CreateEmbed::new()
            .title("Top traders")
            .description(lines.join("\n"))
            .colour(EMBED_COLOUR);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows a trading profile - yours by default, or the named user's.
    #[poise::command(prefix_command)]
    pub async fn profile(ctx: Context<'_>, user: Option<String>) -> Result<()> {
        let author_id = ctx.author().id.to_string();
        let query = user.as_deref().map_or(author_id.as_str(), resolve_user_ref);

        let ledger = ctx.data().ledger.read().await;
        let Some(profile) = ledger.find_user(query) else {
            ctx.say("❌ No trading profile found for that user.").await?;
            return Ok(());
        };

        let embed = CreateEmbed::new()
            .title(format!("Trading profile: {}", profile.username))
            .field(
                "Trades",
                format!(
                    "{} total ({} buys / {} sells)",
                    profile.trades.total, profile.trades.buys, profile.trades.sells
                ),
                false,
            )
            .field(
                "Volume",
                format!("${:.2}", profile.trades.total_volume_usd),
                true,
            )
            .field(
                "Reputation",
                format!(
                    "{:.1} ⭐ ({} ratings)",
                    profile.reputation.rating(),
                    profile.reputation.total_ratings
                ),
                true,
            )
            .field(
                "First seen",
                profile.join_date.format("%Y-%m-%d").to_string(),
                true,
            )
            .colour(EMBED_COLOUR);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Lists a user's recent trades, newest first.
    #[poise::command(prefix_command)]
    pub async fn history(ctx: Context<'_>, user: Option<String>) -> Result<()> {
        let author_id = ctx.author().id.to_string();
        let query = user.as_deref().map_or(author_id.as_str(), resolve_user_ref);

        let ledger = ctx.data().ledger.read().await;
        let Some(profile) = ledger.find_user(query) else {
            ctx.say("❌ No trading profile found for that user.").await?;
            return Ok(());
        };
        let trades = ledger.user_history(&profile.user_id, HISTORY_LIMIT);
        if trades.is_empty() {
            ctx.say("No trades recorded for that user yet.").await?;
            return Ok(());
        }

        let lines: Vec<String> = trades.iter().map(|t| format_trade_line(t)).collect();
        let embed = CreateEmbed::new()
            .title(format!("Trade history: {}", profile.username))
            .description(lines.join("\n"))
            .colour(EMBED_COLOUR);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Lists the most recent trades server-wide, newest first.
    #[poise::command(prefix_command)]
    pub async fn recent(ctx: Context<'_>) -> Result<()> {
        let ledger = ctx.data().ledger.read().await;
        let trades = ledger.recent_trades(HISTORY_LIMIT);
        if trades.is_empty() {
            ctx.say("No trades recorded yet.").await?;
            return Ok(());
        }
        let lines: Vec<String> = trades.iter().map(|t| format_trade_line(t)).collect();
        let embed = CreateEmbed::new()
            .title("Recent trades")
            .description(lines.join("\n"))
            .colour(EMBED_COLOUR);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
