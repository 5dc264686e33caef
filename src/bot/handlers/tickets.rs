//! Ticket open/close orchestration.
//!
//! Opening reserves the user's slot before the awaited channel creation, so
//! a double-click cannot open two tickets; the reservation is confirmed or
//! cancelled depending on how the Discord call went. Closing pulls the
//! buffer out of the registry, renders the transcript, delivers it, and
//! schedules the channel deletion 5 seconds out as a cancellable task.

use std::sync::Arc;
use std::time::Duration;

use poise::serenity_prelude as serenity;
use serenity::{
    ButtonStyle, ChannelType, CreateActionRow, CreateAttachment, CreateButton, CreateChannel,
    CreateEmbed, CreateMessage, PermissionOverwrite, PermissionOverwriteType, Permissions,
};
use tracing::{error, info, warn};

use crate::bot::BotData;
use crate::core::tickets::{self, TicketKind};
use crate::core::transcript::{self, TranscriptHeader};
use crate::errors::Result;

const DELETE_DELAY: Duration = Duration::from_secs(5);

/// Creates a private ticket channel for `user` and registers it.
///
/// Fails with [`crate::errors::Error::TicketAlreadyOpen`] without touching
/// Discord when the user already has a ticket. On channel-creation failure
/// the reservation is released and the error propagated.
pub async fn open_ticket(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    user: &serenity::User,
    kind: TicketKind,
    summary: CreateEmbed,
) -> Result<serenity::ChannelId> {
    let user_id = user.id.to_string();
    data.tickets.write().await.reserve(&user_id)?;

    let config = &data.config;
    let name = tickets::channel_name(kind, &user.name);
    let member_perms =
        Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::READ_MESSAGE_HISTORY;
    let overwrites = vec![
        // @everyone stays out; the everyone role id equals the guild id.
        PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            kind: PermissionOverwriteType::Role(serenity::RoleId::new(guild_id.get())),
        },
        PermissionOverwrite {
            allow: member_perms,
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Member(user.id),
        },
        PermissionOverwrite {
            allow: member_perms,
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Role(serenity::RoleId::new(config.staff_role_id)),
        },
    ];

    let builder = CreateChannel::new(&name)
        .kind(ChannelType::Text)
        .category(serenity::ChannelId::new(config.ticket_category_id))
        .permissions(overwrites);
    let channel = match guild_id.create_channel(&ctx.http, builder).await {
        Ok(channel) => channel,
        Err(e) => {
            data.tickets.write().await.cancel(&user_id);
            error!("Failed to create ticket channel {name}: {e}");
            return Err(e.into());
        }
    };
    data.tickets
        .write()
        .await
        .confirm(&user_id, &user.name, channel.id.get(), kind);
    info!("Opened {} ticket #{name} for {}", kind.prefix(), user.name);

    let payment_row = CreateActionRow::Buttons(vec![
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
    let staff_row = CreateActionRow::Buttons(vec![
        CreateButton::new("log_trade")
            .label("Log Trade")
            .style(ButtonStyle::Secondary),
        CreateButton::new("owner_select")
            .label("Assign Handler")
            .style(ButtonStyle::Secondary),
    ]);
    let welcome = CreateMessage::new()
        .content(format!(
            "Welcome <@{}>! Pick a payment method below; staff will be with \
             you shortly. Type `!close` when you're done.",
            user.id
        ))
        .embed(summary)
        .components(vec![payment_row, staff_row]);
    channel.id.send_message(&ctx.http, welcome).await?;

    Ok(channel.id)
}

/// Closes the ticket living on `channel_id`.
///
/// Removes the registry entry and buffer, renders and delivers the
/// transcript (best effort), and schedules the channel deletion. The caller
/// is responsible for the user-facing closing notice.
pub async fn close_ticket(
    ctx: &serenity::Context,
    data: &BotData,
    channel_id: serenity::ChannelId,
    closed_by: &str,
) -> Result<()> {
    let closed = data.tickets.write().await.close(channel_id.get())?;
    let name = tickets::channel_name(closed.meta.kind, &closed.meta.owner_name);

    let header = TranscriptHeader {
        channel_name: name.clone(),
        opened_at: closed.meta.opened_at,
        fields: vec![
            (
                "Opened by".to_string(),
                format!("{} ({})", closed.meta.owner_name, closed.meta.owner_id),
            ),
            (
                "Ticket type".to_string(),
                closed.meta.kind.prefix().to_string(),
            ),
            ("Closed by".to_string(), closed_by.to_string()),
        ],
    };
    let text = transcript::render(&header, &closed.messages);

    // Transcript delivery is best effort; a failure is logged, not retried.
    let attachment = CreateAttachment::bytes(text.into_bytes(), format!("{name}.txt"));
    let transcript_channel = serenity::ChannelId::new(data.config.transcript_channel_id);
    if let Err(e) = transcript_channel
        .send_message(
            &ctx.http,
            CreateMessage::new()
                .content(format!("Transcript for #{name}"))
                .add_file(attachment),
        )
        .await
    {
        error!("Failed to deliver transcript for #{name}: {e}");
    }

    schedule_channel_deletion(ctx, data, channel_id).await;
    info!("Closed ticket #{name}");
    Ok(())
}

/// Schedules the ticket channel for deletion after [`DELETE_DELAY`].
///
/// The abort handle is kept so a manual deletion can cancel the task. If
/// the channel is already gone when the timer fires, the failure is only
/// logged.
async fn schedule_channel_deletion(
    ctx: &serenity::Context,
    data: &BotData,
    channel_id: serenity::ChannelId,
) {
    let http = Arc::clone(&ctx.http);
    let raw_id = channel_id.get();
    let task = tokio::spawn(async move {
        tokio::time::sleep(DELETE_DELAY).await;
        if let Err(e) = channel_id.delete(&http).await {
            warn!("Deferred deletion of channel {raw_id} failed: {e}");
        }
    });
    data.pending_deletions
        .lock()
        .await
        .insert(raw_id, task.abort_handle());
}
