//! General Discord commands - the shop panel, crypto wallets, and prices.
//! These commands only read shared state and post embeds; all the real
//! workflow starts from the buttons they attach.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use poise::serenity_prelude::{ButtonStyle, CreateActionRow, CreateButton, CreateEmbed};

    use crate::bot::Context;
    use crate::errors::Result;

    const EMBED_COLOUR: u32 = 0x00b0_f4;

    /// Posts the shop panel with the buy/sell/calculate buttons.
    ///
    /// This is the entry point customers interact with; each button opens a
    /// modal that asks for an amount and then opens a private ticket.
    #[poise::command(prefix_command)]
    pub async fn info(ctx: Context<'_>) -> Result<()> {
        let prices = *ctx.data().prices.read().await;
        let embed = CreateEmbed::new()
            .title("David's Coins")
            .description(
                "Buy and sell coins quickly and safely.\n\
                 Use the buttons below to open a private ticket or check a price.",
            )
            .field(
                "Buy rates",
                format!(
                    "Under 1B: **${:.3}/M**\n1B and over: **${:.3}/M**",
                    prices.buy_under_1b, prices.buy_over_1b
                ),
                true,
            )
            .field("Sell rate", format!("**${:.3}/M**", prices.sell), true)
            .colour(EMBED_COLOUR);

        let buttons = CreateActionRow::Buttons(vec![
            CreateButton::new("buy_coins")
                .label("Buy Coins")
                .style(ButtonStyle::Success),
            CreateButton::new("sell_coins")
                .label("Sell Coins")
                .style(ButtonStyle::Danger),
            CreateButton::new("calculate_price")
                .label("Price Calculator")
                .style(ButtonStyle::Secondary),
        ]);
        let marketplace = CreateActionRow::Buttons(vec![
            CreateButton::new("list_account")
                .label("Sell an Account")
                .style(ButtonStyle::Secondary),
            CreateButton::new("list_profile")
                .label("Sell a Profile")
                .style(ButtonStyle::Secondary),
        ]);

        ctx.send(
            poise::CreateReply::default()
                .embed(embed)
                .components(vec![buttons, marketplace]),
        )
        .await?;
        Ok(())
    }

    /// Posts the crypto wallet addresses with copy buttons.
    #[poise::command(prefix_command)]
    pub async fn crypto(ctx: Context<'_>) -> Result<()> {
        let wallets = &ctx.data().config.wallets;
        let embed = CreateEmbed::new()
            .title("Crypto payment addresses")
            .field("BTC", &wallets.btc, false)
            .field("ETH", &wallets.eth, false)
            .field("LTC", &wallets.ltc, false)
            .field("USDT (TRC-20)", &wallets.usdt, false)
            .colour(EMBED_COLOUR);

        let buttons = CreateActionRow::Buttons(vec![
            CreateButton::new("copy_btc")
                .label("BTC")
                .style(ButtonStyle::Secondary),
            CreateButton::new("copy_eth")
                .label("ETH")
                .style(ButtonStyle::Secondary),
            CreateButton::new("copy_ltc")
                .label("LTC")
                .style(ButtonStyle::Secondary),
            CreateButton::new("copy_usdt")
                .label("USDT")
                .style(ButtonStyle::Secondary),
        ]);

        ctx.send(
            poise::CreateReply::default()
                .embed(embed)
                .components(vec![buttons]),
        )
        .await?;
        Ok(())
    }

    /// Shows the current published price table.
    #[poise::command(prefix_command)]
    pub async fn price(ctx: Context<'_>) -> Result<()> {
        let prices = *ctx.data().prices.read().await;
        let embed = CreateEmbed::new()
            .title("Current prices (USD per million coins)")
            .field("Buy (under 1B)", format!("${:.3}", prices.buy_under_1b), true)
            .field("Buy (1B+)", format!("${:.3}", prices.buy_over_1b), true)
            .field("Sell", format!("${:.3}", prices.sell), true)
            .colour(EMBED_COLOUR);
        // The button is posted for everyone; the handler gates it to staff.
        let buttons = CreateActionRow::Buttons(vec![CreateButton::new("update_prices")
            .label("Update Prices")
            .style(ButtonStyle::Secondary)]);
        ctx.send(
            poise::CreateReply::default()
                .embed(embed)
                .components(vec![buttons]),
        )
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
