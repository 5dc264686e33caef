//! Button-click handling.
//!
//! Every component `custom_id` is decoded into a [`ComponentAction`] first;
//! unknown ids are ignored so stale buttons from old messages can't crash a
//! handler. The actions then dispatch into the core services or open the
//! matching modal.

use poise::serenity_prelude as serenity;
use serenity::{
    ButtonStyle, CreateActionRow, CreateButton, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, CreateMessage, CreateModal,
};
use tracing::error;

use super::{is_staff, modals};
use crate::bot::BotData;
use crate::core::listings::{Listing, ListingKind, ListingStep};
use crate::errors::{Error, Result};

/// Everything a button click can mean, decoded from its `custom_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentAction {
    /// `buy_coins` - open the buy-amount modal.
    OpenBuyModal,
    /// `sell_coins` - open the sell-amount modal.
    OpenSellModal,
    /// `calculate_price` - open the calculator modal.
    OpenCalculateModal,
    /// `confirm_close` - close the current ticket.
    ConfirmClose,
    /// `cancel_close` - abort a pending closure.
    CancelClose,
    /// `configure_close` - close with a logged trade and rating.
    ConfigureClose,
    /// `update_prices` - staff-only modal to replace the price table.
    UpdatePrices,
    /// `payment_{method}` - pick a payment method (ticket or listing wizard).
    Payment(String),
    /// `copy_{wallet}` - show a wallet address for copying.
    CopyWallet(String),
    /// `list_account` - start the listing wizard for an account.
    ListAccount,
    /// `list_profile` - start the listing wizard for a profile.
    ListProfile,
    /// `buy_listing_{id}` - buy a published listing.
    BuyListing(u64),
    /// `unlist_{id}` - remove one's own listing.
    Unlist(u64),
    /// `log_trade` - staff-only manual trade entry.
    LogTrade,
    /// `owner_select` - staff-only handler assignment.
    AssignHandler,
}

impl ComponentAction {
    /// Decodes a `custom_id`; `None` for anything we don't recognize.
    #[must_use]
    pub fn parse(custom_id: &str) -> Option<Self> {
        match custom_id {
            "buy_coins" => Some(Self::OpenBuyModal),
            "sell_coins" => Some(Self::OpenSellModal),
            "calculate_price" => Some(Self::OpenCalculateModal),
            "confirm_close" => Some(Self::ConfirmClose),
            "cancel_close" => Some(Self::CancelClose),
            "configure_close" => Some(Self::ConfigureClose),
            "update_prices" => Some(Self::UpdatePrices),
            "list_account" => Some(Self::ListAccount),
            "list_profile" => Some(Self::ListProfile),
            "log_trade" => Some(Self::LogTrade),
            "owner_select" => Some(Self::AssignHandler),
            other => {
                if let Some(method) = other.strip_prefix("payment_") {
                    Some(Self::Payment(method.to_string()))
                } else if let Some(wallet) = other.strip_prefix("copy_") {
                    Some(Self::CopyWallet(wallet.to_string()))
                } else if let Some(id) = other.strip_prefix("buy_listing_") {
                    id.parse().ok().map(Self::BuyListing)
                } else if let Some(id) = other.strip_prefix("unlist_") {
                    id.parse().ok().map(Self::Unlist)
                } else {
                    None
                }
            }
        }
    }
}

async fn reply(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
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

async fn respond_modal(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    modal: CreateModal,
) -> Result<()> {
    interaction
        .create_response(&ctx.http, CreateInteractionResponse::Modal(modal))
        .await?;
    Ok(())
}

fn marketplace_embed(listing: &Listing, seller_name: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("{}: {}", listing.kind.label(), listing.title))
        .description(listing.description.clone())
        .field("Price", format!("${:.2}", listing.price), true)
        .field("Payment", listing.payment_methods.join(", "), true)
        .field("Seller", seller_name.to_string(), true)
        .colour(0x00b0_f4)
}

/// Handles one decoded button click.
pub async fn handle_component(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ComponentInteraction,
) -> Result<()> {
    let Some(action) = ComponentAction::parse(&interaction.data.custom_id) else {
        return Ok(());
    };
    let user_id = interaction.user.id.to_string();
    let staff = is_staff(data, interaction.member.as_ref(), interaction.user.id.get());

    match action {
        ComponentAction::OpenBuyModal => respond_modal(ctx, interaction, modals::buy_modal()).await,
        ComponentAction::OpenSellModal => {
            respond_modal(ctx, interaction, modals::sell_modal()).await
        }
        ComponentAction::OpenCalculateModal => {
            respond_modal(ctx, interaction, modals::calculate_modal()).await
        }
        ComponentAction::UpdatePrices => {
            if !staff {
                return reply(ctx, interaction, "❌ Staff only.", true).await;
            }
            let table = *data.prices.read().await;
            respond_modal(ctx, interaction, modals::update_prices_modal(&table)).await
        }
        ComponentAction::ConfirmClose => {
            match super::tickets::close_ticket(ctx, data, interaction.channel_id, &interaction.user.name)
                .await
            {
                Ok(()) => {
                    reply(
                        ctx,
                        interaction,
                        "✅ Ticket closed. This channel will be deleted in 5 seconds.",
                        false,
                    )
                    .await
                }
                Err(Error::TicketNotFound { .. }) => {
                    reply(ctx, interaction, "❌ This is not a ticket channel.", true).await
                }
                Err(e) => {
                    error!("Ticket closure failed: {e}");
                    reply(ctx, interaction, "❌ Something went wrong closing the ticket.", true)
                        .await
                }
            }
        }
        ComponentAction::ConfigureClose => {
            if !staff {
                return reply(ctx, interaction, "❌ Staff only.", true).await;
            }
            respond_modal(ctx, interaction, modals::configure_close_modal()).await
        }
        ComponentAction::CancelClose => {
            reply(ctx, interaction, "Ticket stays open.", false).await
        }
        ComponentAction::Payment(method) => {
            handle_payment(ctx, data, interaction, &user_id, &method).await
        }
        ComponentAction::CopyWallet(wallet) => {
            let wallets = &data.config.wallets;
            let address = match wallet.as_str() {
                "btc" => Some(&wallets.btc),
                "eth" => Some(&wallets.eth),
                "ltc" => Some(&wallets.ltc),
                "usdt" => Some(&wallets.usdt),
                _ => None,
            };
            match address {
                Some(address) => reply(ctx, interaction, address.clone(), true).await,
                None => reply(ctx, interaction, "❌ Unknown wallet.", true).await,
            }
        }
        ComponentAction::ListAccount => {
            start_listing(ctx, data, interaction, &user_id, ListingKind::Account).await
        }
        ComponentAction::ListProfile => {
            start_listing(ctx, data, interaction, &user_id, ListingKind::Profile).await
        }
        ComponentAction::BuyListing(id) => {
            if data.listings.read().await.listing(id).is_none() {
                return reply(ctx, interaction, "❌ That listing is no longer available.", true)
                    .await;
            }
            respond_modal(ctx, interaction, modals::buy_account_modal(id)).await
        }
        ComponentAction::Unlist(id) => {
            match data.listings.write().await.unlist(id, &user_id) {
                Some(listing) => {
                    reply(
                        ctx,
                        interaction,
                        format!("✅ Unlisted **{}**.", listing.title),
                        false,
                    )
                    .await
                }
                None => {
                    reply(ctx, interaction, "❌ Only the owner can unlist this.", true).await
                }
            }
        }
        ComponentAction::LogTrade => {
            if !staff {
                return reply(ctx, interaction, "❌ Staff only.", true).await;
            }
            respond_modal(ctx, interaction, modals::manual_history_modal()).await
        }
        ComponentAction::AssignHandler => {
            if !staff {
                return reply(ctx, interaction, "❌ Staff only.", true).await;
            }
            respond_modal(ctx, interaction, modals::owner_selection_modal()).await
        }
    }
}

/// A `payment_*` click either finishes the listing wizard (when the user is
/// mid-wizard at the payment step) or records a payment choice in a ticket.
async fn handle_payment(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ComponentInteraction,
    user_id: &str,
    method: &str,
) -> Result<()> {
    let publishing = data
        .listings
        .read()
        .await
        .session(user_id)
        .is_some_and(|s| s.step == ListingStep::PaymentSelection);

    if publishing {
        let published = data
            .listings
            .write()
            .await
            .publish(user_id, vec![method.to_string()]);
        return match published {
            Ok(listing) => {
                let row = CreateActionRow::Buttons(vec![
                    CreateButton::new(format!("buy_listing_{}", listing.id))
                        .label("Buy")
                        .style(ButtonStyle::Success),
                    CreateButton::new(format!("unlist_{}", listing.id))
                        .label("Unlist")
                        .style(ButtonStyle::Danger),
                ]);
                interaction
                    .channel_id
                    .send_message(
                        &ctx.http,
                        CreateMessage::new()
                            .embed(marketplace_embed(&listing, &interaction.user.name))
                            .components(vec![row]),
                    )
                    .await?;
                reply(ctx, interaction, "✅ Listing published!", true).await
            }
            Err(Error::SessionExpired) => {
                reply(ctx, interaction, "❌ Session expired, please restart the listing.", true)
                    .await
            }
            Err(e) => Err(e),
        };
    }

    if !data
        .tickets
        .read()
        .await
        .is_ticket_channel(interaction.channel_id.get())
    {
        return reply(ctx, interaction, "❌ Use this inside a ticket.", true).await;
    }
    let note = match method {
        "crypto" => {
            let wallets = &data.config.wallets;
            format!(
                "💰 Paying with crypto. Addresses:\nBTC: `{}`\nETH: `{}`\nLTC: `{}`\nUSDT: `{}`",
                wallets.btc, wallets.eth, wallets.ltc, wallets.usdt
            )
        }
        "paypal" => "💳 Paying with PayPal. Staff will send an invoice shortly.".to_string(),
        "giftcard" => "🎁 Paying with a gift card. Staff will verify it shortly.".to_string(),
        other => format!("Payment method set to **{other}**."),
    };
    reply(ctx, interaction, note, false).await
}

/// `list_account` / `list_profile` both (re)start the wizard: the click is
/// the type-selection step, so a fresh session is created and immediately
/// advanced, replacing any abandoned one.
async fn start_listing(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ComponentInteraction,
    user_id: &str,
    kind: ListingKind,
) -> Result<()> {
    {
        let mut board = data.listings.write().await;
        board.start_session(user_id);
        board.choose_kind(user_id, kind)?;
    }
    respond_modal(ctx, interaction, modals::listing_details_modal()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_ids() {
        assert_eq!(
            ComponentAction::parse("buy_coins"),
            Some(ComponentAction::OpenBuyModal)
        );
        assert_eq!(
            ComponentAction::parse("confirm_close"),
            Some(ComponentAction::ConfirmClose)
        );
        assert_eq!(
            ComponentAction::parse("list_profile"),
            Some(ComponentAction::ListProfile)
        );
    }

    #[test]
    fn test_parse_prefixed_ids() {
        assert_eq!(
            ComponentAction::parse("payment_paypal"),
            Some(ComponentAction::Payment("paypal".to_string()))
        );
        assert_eq!(
            ComponentAction::parse("copy_btc"),
            Some(ComponentAction::CopyWallet("btc".to_string()))
        );
        assert_eq!(
            ComponentAction::parse("buy_listing_7"),
            Some(ComponentAction::BuyListing(7))
        );
        assert_eq!(
            ComponentAction::parse("unlist_3"),
            Some(ComponentAction::Unlist(3))
        );
    }

    #[test]
    fn test_parse_unknown_ids_ignored() {
        assert_eq!(ComponentAction::parse("totally_unknown"), None);
        assert_eq!(ComponentAction::parse("buy_listing_notanumber"), None);
        assert_eq!(ComponentAction::parse(""), None);
    }
}
