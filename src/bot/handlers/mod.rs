//! Gateway event handlers.
//!
//! Everything that is not a prefix command arrives here: button clicks,
//! modal submissions, reaction adds, and plain messages in ticket channels.
//! Component and modal payloads are decoded into explicit action enums at
//! the boundary, so the handlers below work with precise types instead of
//! probing loosely-shaped payloads.

/// Button-click decoding and handling
pub mod components;
/// Modal-submission decoding and handling
pub mod modals;
/// Ticket open/close orchestration shared by components and modals
pub mod tickets;

use chrono::Utc;
use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::bot::{BotData, Error};
use crate::core::tickets::{TrackedEmbed, TrackedMessage};
use crate::errors::Result;

/// Top-level gateway event dispatch, wired into the poise framework.
pub async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!("Gateway ready as {}", data_about_bot.user.name);
        }
        serenity::FullEvent::Message { new_message } => {
            track_ticket_message(data, new_message).await;
        }
        serenity::FullEvent::ReactionAdd { add_reaction } => {
            handle_verification_reaction(ctx, data, add_reaction).await;
        }
        serenity::FullEvent::ChannelDelete { channel, .. } => {
            // A manual deletion pre-empts the scheduled one; cancel it so the
            // deferred task doesn't fire against a dead channel.
            if let Some(handle) = data
                .pending_deletions
                .lock()
                .await
                .remove(&channel.id.get())
            {
                handle.abort();
            }
        }
        serenity::FullEvent::InteractionCreate { interaction } => match interaction {
            serenity::Interaction::Component(component) => {
                components::handle_component(ctx, data, component).await?;
            }
            serenity::Interaction::Modal(modal) => {
                modals::handle_modal(ctx, data, modal).await?;
            }
            _ => {}
        },
        _ => {}
    }
    Ok(())
}

/// Appends a message to its ticket channel's transcript buffer.
///
/// Every message in a recognized ticket channel is tracked in arrival
/// order, bot or human; messages anywhere else are ignored.
async fn track_ticket_message(data: &BotData, message: &serenity::Message) {
    let channel_id = message.channel_id.get();
    let mut registry = data.tickets.write().await;
    if !registry.is_ticket_channel(channel_id) {
        return;
    }

    let embeds = message
        .embeds
        .iter()
        .map(|embed| TrackedEmbed {
            title: embed.title.clone(),
            description: embed.description.clone(),
            fields: embed
                .fields
                .iter()
                .map(|field| (field.name.clone(), field.value.clone()))
                .collect(),
        })
        .collect();
    let timestamp = chrono::DateTime::from_timestamp(message.timestamp.unix_timestamp(), 0)
        .unwrap_or_else(Utc::now);
    registry.track_message(
        channel_id,
        TrackedMessage {
            author: message.author.name.clone(),
            content: message.content.clone(),
            timestamp,
            is_bot: message.author.bot,
            embeds,
        },
    );
}

/// Grants the member role when someone ✅-reacts to the verification message.
async fn handle_verification_reaction(
    ctx: &serenity::Context,
    data: &BotData,
    reaction: &serenity::Reaction,
) {
    if reaction.message_id.get() != data.config.verify_message_id
        || !reaction.emoji.unicode_eq("✅")
    {
        return;
    }
    let (Some(guild_id), Some(user_id)) = (reaction.guild_id, reaction.user_id) else {
        return;
    };
    let role_id = serenity::RoleId::new(data.config.member_role_id);
    match ctx
        .http
        .add_member_role(guild_id, user_id, role_id, Some("Verification reaction"))
        .await
    {
        Ok(()) => info!("Verified user {user_id}"),
        Err(e) => error!("Failed to grant member role to {user_id}: {e}"),
    }
}

/// Whether the interacting user may use staff-only controls.
pub(crate) fn is_staff(
    data: &BotData,
    member: Option<&serenity::Member>,
    user_id: u64,
) -> bool {
    user_id == data.config.owner_id
        || member.is_some_and(|m| {
            m.roles
                .iter()
                .any(|role| role.get() == data.config.staff_role_id)
        })
}
