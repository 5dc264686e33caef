//! Modal builders and submission handling.
//!
//! Each modal's `custom_id` is decoded into a [`ModalAction`] before any
//! work happens; unknown ids are ignored. The builders live next to the
//! handlers so a modal's fields and the code reading them stay in one file.

use poise::serenity_prelude as serenity;
use serenity::{
    ActionRowComponent, ButtonStyle, CreateActionRow, CreateButton, CreateEmbed,
    CreateInputText, CreateInteractionResponse, CreateInteractionResponseMessage, CreateModal,
    InputTextStyle,
};
use tracing::{error, info};

use super::{is_staff, tickets as flow};
use crate::bot::BotData;
use crate::core::ledger::{NewTrade, TradeKind};
use crate::core::pricing::{self, TradeSide};
use crate::core::tickets::TicketKind;
use crate::errors::{Error, Result};

/// Display name credited to the shop side of logged trades.
const SHOP_NAME: &str = "David's Coins";

/// Everything a modal submission can mean, decoded from its `custom_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalAction {
    /// `buy_modal` - buy-coins amount entry.
    Buy,
    /// `sell_modal` - sell-coins amount entry.
    Sell,
    /// `calculate_modal` - price calculator.
    Calculate,
    /// `update_prices` - staff price-table replacement.
    UpdatePrices,
    /// `listing_details` - listing wizard details step.
    ListingDetails,
    /// `ticket_configure_close` - close a ticket with a logged trade.
    ConfigureClose,
    /// `manual_history_configure` - staff manual trade entry.
    ManualHistory,
    /// `owner_selection` - assign a staff handler to a ticket.
    OwnerSelection,
    /// `buy_account_modal_{id}` - purchase a marketplace listing.
    BuyAccount(u64),
}

impl ModalAction {
    /// Decodes a modal `custom_id`; `None` for anything we don't recognize.
    #[must_use]
    pub fn parse(custom_id: &str) -> Option<Self> {
        match custom_id {
            "buy_modal" => Some(Self::Buy),
            "sell_modal" => Some(Self::Sell),
            "calculate_modal" => Some(Self::Calculate),
            "update_prices" => Some(Self::UpdatePrices),
            "listing_details" => Some(Self::ListingDetails),
            "ticket_configure_close" => Some(Self::ConfigureClose),
            "manual_history_configure" => Some(Self::ManualHistory),
            "owner_selection" => Some(Self::OwnerSelection),
            other => other
                .strip_prefix("buy_account_modal_")
                .and_then(|id| id.parse().ok())
                .map(Self::BuyAccount),
        }
    }
}

fn short_input(label: &str, id: &str) -> CreateActionRow {
    CreateActionRow::InputText(CreateInputText::new(InputTextStyle::Short, label, id))
}

fn optional_input(label: &str, id: &str) -> CreateActionRow {
    CreateActionRow::InputText(
        CreateInputText::new(InputTextStyle::Short, label, id).required(false),
    )
}

pub(crate) fn buy_modal() -> CreateModal {
    CreateModal::new("buy_modal", "Buy Coins")
        .components(vec![short_input("Amount (e.g. 1.5b, 200m)", "amount")])
}

pub(crate) fn sell_modal() -> CreateModal {
    CreateModal::new("sell_modal", "Sell Coins")
        .components(vec![short_input("Amount (e.g. 1.5b, 200m)", "amount")])
}

pub(crate) fn calculate_modal() -> CreateModal {
    CreateModal::new("calculate_modal", "Price Calculator").components(vec![short_input(
        "Coin amount, or $ budget (e.g. 1.5b or $100)",
        "amount",
    )])
}

pub(crate) fn update_prices_modal(table: &pricing::PriceTable) -> CreateModal {
    CreateModal::new("update_prices", "Update Prices").components(vec![
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Short, "Buy rate under 1B ($/M)", "buy_under_1b")
                .value(table.buy_under_1b.to_string()),
        ),
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Short, "Buy rate 1B+ ($/M)", "buy_over_1b")
                .value(table.buy_over_1b.to_string()),
        ),
        CreateActionRow::InputText(
            CreateInputText::new(InputTextStyle::Short, "Sell rate ($/M)", "sell")
                .value(table.sell.to_string()),
        ),
    ])
}

pub(crate) fn listing_details_modal() -> CreateModal {
    CreateModal::new("listing_details", "Listing Details").components(vec![
        short_input("Title", "title"),
        CreateActionRow::InputText(CreateInputText::new(
            InputTextStyle::Paragraph,
            "Description",
            "description",
        )),
        short_input("Price (USD)", "price"),
    ])
}

pub(crate) fn configure_close_modal() -> CreateModal {
    CreateModal::new("ticket_configure_close", "Close & Log Trade").components(vec![
        short_input("Coin amount (0 for account sales)", "amount"),
        short_input("Price (USD)", "price"),
        short_input("Payment method", "payment_method"),
        optional_input("Customer rating 1-5 (optional)", "rating"),
        optional_input("Notes (optional)", "notes"),
    ])
}

pub(crate) fn manual_history_modal() -> CreateModal {
    CreateModal::new("manual_history_configure", "Log Trade Manually").components(vec![
        short_input("Buyer (mention or id)", "buyer"),
        short_input("Seller (mention or id)", "seller"),
        short_input("Coin amount", "amount"),
        short_input("Price (USD)", "price"),
        short_input("Payment method", "payment_method"),
    ])
}

pub(crate) fn owner_selection_modal() -> CreateModal {
    CreateModal::new("owner_selection", "Assign Handler")
        .components(vec![short_input("Handler (mention or id)", "handler")])
}

pub(crate) fn buy_account_modal(listing_id: u64) -> CreateModal {
    CreateModal::new(format!("buy_account_modal_{listing_id}"), "Buy Listing")
        .components(vec![optional_input("Message to the seller (optional)", "note")])
}

/// First value of the input with the given `custom_id`, if filled in.
fn modal_value(data: &serenity::ModalInteractionData, id: &str) -> Option<String> {
    data.components.iter().find_map(|row| {
        row.components.iter().find_map(|component| match component {
            ActionRowComponent::InputText(input) if input.custom_id == id => input.value.clone(),
            _ => None,
        })
    })
}

/// Accepts `<@123>`, `<@!123>`, or a bare id, and returns the id.
fn strip_mention(raw: &str) -> String {
    raw.trim()
        .trim_start_matches("<@!")
        .trim_start_matches("<@")
        .trim_end_matches('>')
        .to_string()
}

async fn reply(
    ctx: &serenity::Context,
    interaction: &serenity::ModalInteraction,
    text: impl Into<String>,
    ephemeral: bool,
) -> Result<()> {
    let message = CreateInteractionResponseMessage::new()
        .content(text)
        .ephemeral(ephemeral);
    interaction
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await?;
    Ok(())
}

/// Handles one decoded modal submission.
pub async fn handle_modal(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ModalInteraction,
) -> Result<()> {
    let Some(action) = ModalAction::parse(&interaction.data.custom_id) else {
        return Ok(());
    };
    match action {
        ModalAction::Buy => {
            order_ticket(ctx, data, interaction, TradeSide::Buy).await
        }
        ModalAction::Sell => {
            order_ticket(ctx, data, interaction, TradeSide::Sell).await
        }
        ModalAction::Calculate => handle_calculate(ctx, data, interaction).await,
        ModalAction::UpdatePrices => handle_update_prices(ctx, data, interaction).await,
        ModalAction::ListingDetails => handle_listing_details(ctx, data, interaction).await,
        ModalAction::ConfigureClose => handle_configure_close(ctx, data, interaction).await,
        ModalAction::ManualHistory => handle_manual_history(ctx, data, interaction).await,
        ModalAction::OwnerSelection => {
            let handler = modal_value(&interaction.data, "handler").unwrap_or_default();
            let handler_id = strip_mention(&handler);
            if handler_id.is_empty() || !handler_id.chars().all(|c| c.is_ascii_digit()) {
                return reply(ctx, interaction, "❌ Give a user mention or id.", true).await;
            }
            reply(
                ctx,
                interaction,
                format!("🤝 <@{handler_id}> will handle this ticket."),
                false,
            )
            .await
        }
        ModalAction::BuyAccount(id) => handle_buy_account(ctx, data, interaction, id).await,
    }
}

/// Buy/sell amount submission: quote the price and open the matching ticket.
async fn order_ticket(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ModalInteraction,
    side: TradeSide,
) -> Result<()> {
    let Some(guild_id) = interaction.guild_id else {
        return reply(ctx, interaction, "❌ Use this in a server.", true).await;
    };
    let raw = modal_value(&interaction.data, "amount").unwrap_or_default();
    let amount = pricing::parse_amount(&raw);
    if amount <= 0.0 {
        return reply(
            ctx,
            interaction,
            format!("❌ Couldn't understand the amount `{raw}`. Try `1.5b` or `200m`."),
            true,
        )
        .await;
    }

    let price = {
        let table = data.prices.read().await;
        pricing::calculate_price(&table, amount, side)
    };
    let (kind, verb) = match side {
        TradeSide::Buy => (TicketKind::Buy, "Buying"),
        TradeSide::Sell => (TicketKind::Sell, "Selling"),
    };
    let summary = CreateEmbed::new()
        .title(format!("{verb} {}", pricing::format_amount(amount)))
        .field("Amount", pricing::format_amount(amount), true)
        .field("Price", format!("${price:.2}"), true)
        .colour(0x00b0_f4);

    match flow::open_ticket(ctx, data, guild_id, &interaction.user, kind, summary).await {
        Ok(channel_id) => {
            reply(ctx, interaction, format!("✅ Ticket created: <#{channel_id}>"), true).await
        }
        Err(Error::TicketAlreadyOpen) => {
            reply(ctx, interaction, "❌ You already have an open ticket.", true).await
        }
        Err(e) => {
            error!("Ticket creation failed: {e}");
            reply(ctx, interaction, "❌ Couldn't create the ticket, try again later.", true).await
        }
    }
}

/// Calculator: a `$`-prefixed input converts money to coins, anything else
/// is a coin amount quoted at both buy and sell rates.
async fn handle_calculate(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ModalInteraction,
) -> Result<()> {
    let raw = modal_value(&interaction.data, "amount").unwrap_or_default();
    let trimmed = raw.trim();
    let table = *data.prices.read().await;

    if let Some(money) = trimmed.strip_prefix('$') {
        let usd: f64 = money.trim().parse().unwrap_or(0.0);
        if usd <= 0.0 {
            return reply(ctx, interaction, format!("❌ Couldn't understand `{raw}`."), true)
                .await;
        }
        let coins = pricing::coins_for_money(&table, usd);
        return reply(
            ctx,
            interaction,
            format!("💵 ${usd:.2} buys you **{}** coins.", pricing::format_amount(coins)),
            true,
        )
        .await;
    }

    let amount = pricing::parse_amount(trimmed);
    if amount <= 0.0 {
        return reply(ctx, interaction, format!("❌ Couldn't understand `{raw}`."), true).await;
    }
    let buy = pricing::calculate_price(&table, amount, TradeSide::Buy);
    let sell = pricing::calculate_price(&table, amount, TradeSide::Sell);
    reply(
        ctx,
        interaction,
        format!(
            "💰 **{}** coins: buy for **${buy:.2}**, sell for **${sell:.2}**.",
            pricing::format_amount(amount)
        ),
        true,
    )
    .await
}

async fn handle_update_prices(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ModalInteraction,
) -> Result<()> {
    if !is_staff(data, interaction.member.as_ref(), interaction.user.id.get()) {
        return reply(ctx, interaction, "❌ Staff only.", true).await;
    }
    let parse = |id: &str| -> f64 {
        modal_value(&interaction.data, id)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0.0)
    };
    let table = pricing::PriceTable {
        buy_under_1b: parse("buy_under_1b"),
        buy_over_1b: parse("buy_over_1b"),
        sell: parse("sell"),
    };
    if table.validate().is_err() {
        return reply(ctx, interaction, "❌ All three rates must be positive numbers.", true)
            .await;
    }
    *data.prices.write().await = table;
    reply(
        ctx,
        interaction,
        format!(
            "✅ Prices updated: under 1B ${}/M, 1B+ ${}/M, sell ${}/M",
            table.buy_under_1b, table.buy_over_1b, table.sell
        ),
        false,
    )
    .await
}

/// Listing wizard step 2: store the details and ask for a payment method.
async fn handle_listing_details(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ModalInteraction,
) -> Result<()> {
    let title = modal_value(&interaction.data, "title").unwrap_or_default();
    let description = modal_value(&interaction.data, "description").unwrap_or_default();
    let price: f64 = modal_value(&interaction.data, "price")
        .and_then(|v| v.trim().trim_start_matches('$').parse().ok())
        .unwrap_or(0.0);
    if title.trim().is_empty() || !price.is_finite() || price <= 0.0 {
        return reply(ctx, interaction, "❌ A title and a positive USD price are required.", true)
            .await;
    }

    let user_id = interaction.user.id.to_string();
    let stored = data
        .listings
        .write()
        .await
        .set_details(&user_id, title.trim(), description.trim(), price);
    match stored {
        Ok(()) => {
            let buttons = CreateActionRow::Buttons(vec![
                CreateButton::new("payment_paypal")
                    .label("PayPal")
                    .style(ButtonStyle::Primary),
                CreateButton::new("payment_crypto")
                    .label("Crypto")
                    .style(ButtonStyle::Primary),
                CreateButton::new("payment_giftcard")
                    .label("Gift Card")
                    .style(ButtonStyle::Primary),
            ]);
            let message = CreateInteractionResponseMessage::new()
                .content("Almost done! Pick the payment method you accept:")
                .components(vec![buttons])
                .ephemeral(true);
            interaction
                .create_response(&ctx.http, CreateInteractionResponse::Message(message))
                .await?;
            Ok(())
        }
        Err(Error::SessionExpired) => {
            reply(ctx, interaction, "❌ Session expired, please restart the listing.", true).await
        }
        Err(e) => Err(e),
    }
}

/// Closes the current ticket while logging the settled trade (and an
/// optional customer rating) into the ledger.
async fn handle_configure_close(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ModalInteraction,
) -> Result<()> {
    if !is_staff(data, interaction.member.as_ref(), interaction.user.id.get()) {
        return reply(ctx, interaction, "❌ Staff only.", true).await;
    }
    let channel_id = interaction.channel_id.get();
    let Some(meta) = data.tickets.read().await.meta(channel_id).cloned() else {
        return reply(ctx, interaction, "❌ This is not a ticket channel.", true).await;
    };

    let amount = pricing::parse_amount(
        &modal_value(&interaction.data, "amount").unwrap_or_default(),
    );
    let price: f64 = modal_value(&interaction.data, "price")
        .and_then(|v| v.trim().trim_start_matches('$').parse().ok())
        .unwrap_or(0.0);
    if !price.is_finite() || price <= 0.0 {
        return reply(ctx, interaction, "❌ A positive USD price is required.", true).await;
    }
    let payment_method = modal_value(&interaction.data, "payment_method")
        .unwrap_or_else(|| "unspecified".to_string());
    let notes = modal_value(&interaction.data, "notes").unwrap_or_default();

    // The ticket kind decides which side of the trade the customer is on:
    // the shop is the counterparty in every ticket.
    let shop_id = data.config.owner_id.to_string();
    let customer_id = meta.owner_id.clone();
    let customer_name = meta.owner_name.clone();
    let (kind, buyer_id, buyer_name, seller_id, seller_name) = match meta.kind {
        TicketKind::Buy => (
            TradeKind::Buy,
            customer_id.clone(),
            customer_name.clone(),
            shop_id,
            SHOP_NAME.to_string(),
        ),
        TicketKind::Sell => (
            TradeKind::Sell,
            shop_id,
            SHOP_NAME.to_string(),
            customer_id.clone(),
            customer_name.clone(),
        ),
        TicketKind::Account => (
            TradeKind::AccountPurchase,
            customer_id.clone(),
            customer_name.clone(),
            shop_id,
            SHOP_NAME.to_string(),
        ),
    };

    let trade = data.ledger.write().await.add_trade(NewTrade {
        kind,
        buyer_id,
        buyer_name,
        seller_id,
        seller_name,
        amount,
        price_usd: price,
        payment_method,
        channel_id: Some(channel_id),
        notes,
    });

    info!("Recorded trade {} for ticket channel {channel_id}", trade.trade_id);

    let rating = modal_value(&interaction.data, "rating")
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|r| (1.0..=5.0).contains(r));
    if let Some(rating) = rating {
        data.ledger.write().await.add_rating(&customer_id, rating);
    }

    if let Err(e) = flow::close_ticket(ctx, data, interaction.channel_id, &interaction.user.name)
        .await
    {
        error!("Ticket closure failed after logging trade {}: {e}", trade.trade_id);
        return reply(
            ctx,
            interaction,
            format!("⚠️ Trade `{}` logged, but closing the ticket failed.", trade.trade_id),
            true,
        )
        .await;
    }
    reply(
        ctx,
        interaction,
        format!(
            "✅ Trade `{}` logged. Ticket closed; this channel will be deleted in 5 seconds.",
            trade.trade_id
        ),
        false,
    )
    .await
}

/// Staff entry of a trade that happened outside a ticket.
async fn handle_manual_history(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ModalInteraction,
) -> Result<()> {
    if !is_staff(data, interaction.member.as_ref(), interaction.user.id.get()) {
        return reply(ctx, interaction, "❌ Staff only.", true).await;
    }
    let buyer = strip_mention(&modal_value(&interaction.data, "buyer").unwrap_or_default());
    let seller = strip_mention(&modal_value(&interaction.data, "seller").unwrap_or_default());
    if buyer.is_empty() || seller.is_empty() {
        return reply(ctx, interaction, "❌ Both buyer and seller are required.", true).await;
    }
    let amount = pricing::parse_amount(
        &modal_value(&interaction.data, "amount").unwrap_or_default(),
    );
    let price: f64 = modal_value(&interaction.data, "price")
        .and_then(|v| v.trim().trim_start_matches('$').parse().ok())
        .unwrap_or(0.0);
    if !price.is_finite() || price <= 0.0 {
        return reply(ctx, interaction, "❌ A positive USD price is required.", true).await;
    }
    let payment_method = modal_value(&interaction.data, "payment_method")
        .unwrap_or_else(|| "unspecified".to_string());

    let channel_id = interaction.channel_id.get();
    let in_ticket = data.tickets.read().await.is_ticket_channel(channel_id);
    let trade = data.ledger.write().await.add_trade(NewTrade {
        kind: TradeKind::Buy,
        buyer_id: buyer.clone(),
        buyer_name: buyer,
        seller_id: seller.clone(),
        seller_name: seller,
        amount,
        price_usd: price,
        payment_method,
        channel_id: in_ticket.then_some(channel_id),
        notes: format!("manually logged by {}", interaction.user.name),
    });
    info!("Recorded manual trade {}", trade.trade_id);
    reply(ctx, interaction, format!("✅ Trade `{}` logged.", trade.trade_id), false).await
}

/// Opens an account ticket for a marketplace listing purchase.
async fn handle_buy_account(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ModalInteraction,
    listing_id: u64,
) -> Result<()> {
    let Some(guild_id) = interaction.guild_id else {
        return reply(ctx, interaction, "❌ Use this in a server.", true).await;
    };
    let Some((title, price, seller_id)) = data
        .listings
        .read()
        .await
        .listing(listing_id)
        .map(|l| (l.title.clone(), l.price, l.owner_id.clone()))
    else {
        return reply(ctx, interaction, "❌ That listing is no longer available.", true).await;
    };
    let note = modal_value(&interaction.data, "note").unwrap_or_default();

    let mut summary = CreateEmbed::new()
        .title(format!("Listing purchase: {title}"))
        .field("Price", format!("${price:.2}"), true)
        .field("Seller", format!("<@{seller_id}>"), true)
        .colour(0x00b0_f4);
    if !note.trim().is_empty() {
        summary = summary.field("Buyer's note", note.trim().to_string(), false);
    }

    match flow::open_ticket(
        ctx,
        data,
        guild_id,
        &interaction.user,
        TicketKind::Account,
        summary,
    )
    .await
    {
        Ok(channel_id) => {
            reply(ctx, interaction, format!("✅ Ticket created: <#{channel_id}>"), true).await
        }
        Err(Error::TicketAlreadyOpen) => {
            reply(ctx, interaction, "❌ You already have an open ticket.", true).await
        }
        Err(e) => {
            error!("Ticket creation failed: {e}");
            reply(ctx, interaction, "❌ Couldn't create the ticket, try again later.", true).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_ids() {
        assert_eq!(ModalAction::parse("buy_modal"), Some(ModalAction::Buy));
        assert_eq!(
            ModalAction::parse("ticket_configure_close"),
            Some(ModalAction::ConfigureClose)
        );
        assert_eq!(
            ModalAction::parse("buy_account_modal_42"),
            Some(ModalAction::BuyAccount(42))
        );
    }

    #[test]
    fn test_parse_unknown_ids_ignored() {
        assert_eq!(ModalAction::parse("buy_account_modal_x"), None);
        assert_eq!(ModalAction::parse("something_else"), None);
        assert_eq!(ModalAction::parse(""), None);
    }

    #[test]
    fn test_strip_mention_variants() {
        assert_eq!(strip_mention("<@123>"), "123");
        assert_eq!(strip_mention("<@!123>"), "123");
        assert_eq!(strip_mention("  456 "), "456");
    }
}
