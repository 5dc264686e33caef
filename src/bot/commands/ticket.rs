//! Ticket closure command.
//!
//! `!close` only posts the confirmation prompt; the destructive part runs
//! from the `confirm_close` button so a stray command can't nuke a ticket.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use poise::serenity_prelude::{ButtonStyle, CreateActionRow, CreateButton, CreateEmbed};

    use crate::bot::Context;
    use crate::errors::Result;

    /// Asks for confirmation before closing the current ticket.
    #[poise::command(prefix_command, guild_only)]
    pub async fn close(ctx: Context<'_>) -> Result<()> {
        let channel_id = ctx.channel_id().get();
        let is_ticket = ctx
            .data()
            .tickets
            .read()
            .await
            .is_ticket_channel(channel_id);
        if !is_ticket {
            ctx.say("❌ This is not a ticket channel.").await?;
            return Ok(());
        }

        let embed = CreateEmbed::new()
            .title("Close this ticket?")
            .description(
                "A transcript will be saved and this channel will be deleted \
                 5 seconds after closing.",
            )
            .colour(0x00b0_f4);
        let buttons = CreateActionRow::Buttons(vec![
            CreateButton::new("confirm_close")
                .label("Close Ticket")
                .style(ButtonStyle::Danger),
            CreateButton::new("configure_close")
                .label("Close & Log Trade")
                .style(ButtonStyle::Primary),
            CreateButton::new("cancel_close")
                .label("Keep Open")
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
}

// Re-export all commands
pub use inner::*;
