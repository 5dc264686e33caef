//! Ticket registry and lifecycle.
//!
//! Each user may have at most one open ticket. The registry maps owners to
//! their ticket channel and keeps the ordered message buffer that later
//! becomes the transcript. Creation goes through a reserve/confirm/cancel
//! protocol: the slot is reserved before the (awaited) Discord channel
//! creation, so two concurrent creation attempts for the same user cannot
//! both pass the "no existing ticket" check. From a caller's point of view
//! the registry entry and the empty buffer appear atomically on confirm.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::errors::{Error, Result};

/// Which flavor of ticket a channel is, which also fixes its name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketKind {
    /// Customer buying coins.
    Buy,
    /// Customer selling coins.
    Sell,
    /// Customer purchasing a listed account.
    Account,
}

impl TicketKind {
    /// Channel-name prefix for this ticket kind.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Account => "account",
        }
    }
}

/// One rendered embed captured into the transcript buffer.
#[derive(Debug, Clone, Default)]
pub struct TrackedEmbed {
    /// Embed title, if any.
    pub title: Option<String>,
    /// Embed description, if any.
    pub description: Option<String>,
    /// Embed fields as (name, value) pairs.
    pub fields: Vec<(String, String)>,
}

/// One message captured into a ticket's transcript buffer.
#[derive(Debug, Clone)]
pub struct TrackedMessage {
    /// Author display name.
    pub author: String,
    /// Raw message content.
    pub content: String,
    /// When the message arrived.
    pub timestamp: DateTime<Utc>,
    /// Whether the author was a bot.
    pub is_bot: bool,
    /// Embeds attached to the message.
    pub embeds: Vec<TrackedEmbed>,
}

/// Metadata kept per open ticket channel, used for the transcript header.
#[derive(Debug, Clone)]
pub struct TicketMeta {
    /// The user who opened the ticket.
    pub owner_id: String,
    /// Owner display name at creation time.
    pub owner_name: String,
    /// When the ticket was opened.
    pub opened_at: DateTime<Utc>,
    /// Buy/sell/account.
    pub kind: TicketKind,
}

/// Everything removed from the registry when a ticket closes.
#[derive(Debug)]
pub struct ClosedTicket {
    /// Ticket metadata.
    pub meta: TicketMeta,
    /// The ordered transcript buffer.
    pub messages: Vec<TrackedMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    // Reserved while the Discord channel is being created.
    Pending,
    Open(u64),
}

/// Owner-to-channel index plus per-channel transcript buffers.
#[derive(Debug, Default)]
pub struct TicketRegistry {
    active: HashMap<String, Slot>,
    messages: HashMap<u64, Vec<TrackedMessage>>,
    meta: HashMap<u64, TicketMeta>,
}

/// Builds the channel name for a new ticket: `{prefix}-{sanitized username}`.
///
/// Discord channel names are lowercase with a restricted alphabet, so
/// anything outside ASCII alphanumerics becomes a dash.
#[must_use]
pub fn channel_name(kind: TicketKind, username: &str) -> String {
    let sanitized: String = username
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    format!("{}-{}", kind.prefix(), sanitized.trim_matches('-'))
}

/// Whether a channel name follows the ticket naming convention.
#[must_use]
pub fn is_ticket_name(name: &str) -> bool {
    name.starts_with("buy-") || name.starts_with("sell-") || name.starts_with("account-")
}

impl TicketRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the one ticket slot for `user_id`.
    ///
    /// Fails with [`Error::TicketAlreadyOpen`] if the user already has an
    /// open or pending ticket; the registry is not mutated in that case.
    pub fn reserve(&mut self, user_id: &str) -> Result<()> {
        if self.active.contains_key(user_id) {
            return Err(Error::TicketAlreadyOpen);
        }
        self.active.insert(user_id.to_string(), Slot::Pending);
        Ok(())
    }

    /// Promotes a reserved slot to an open ticket on `channel_id`.
    ///
    /// Establishes the registry entry, the empty transcript buffer, and the
    /// ticket metadata in one synchronous step.
    pub fn confirm(
        &mut self,
        user_id: &str,
        owner_name: &str,
        channel_id: u64,
        kind: TicketKind,
    ) {
        self.active.insert(user_id.to_string(), Slot::Open(channel_id));
        self.messages.insert(channel_id, Vec::new());
        self.meta.insert(
            channel_id,
            TicketMeta {
                owner_id: user_id.to_string(),
                owner_name: owner_name.to_string(),
                opened_at: Utc::now(),
                kind,
            },
        );
    }

    /// Releases a reservation after a failed channel creation.
    pub fn cancel(&mut self, user_id: &str) {
        if self.active.get(user_id) == Some(&Slot::Pending) {
            self.active.remove(user_id);
        }
    }

    /// The open ticket channel for a user, if any.
    #[must_use]
    pub fn channel_for(&self, user_id: &str) -> Option<u64> {
        match self.active.get(user_id) {
            Some(Slot::Open(channel)) => Some(*channel),
            _ => None,
        }
    }

    /// Whether a channel currently has a transcript buffer.
    #[must_use]
    pub fn is_ticket_channel(&self, channel_id: u64) -> bool {
        self.messages.contains_key(&channel_id)
    }

    /// Metadata for an open ticket channel.
    #[must_use]
    pub fn meta(&self, channel_id: u64) -> Option<&TicketMeta> {
        self.meta.get(&channel_id)
    }

    /// Appends a message to a ticket channel's buffer, in arrival order.
    ///
    /// Returns `false` (and drops the message) when the channel is not a
    /// tracked ticket; messages in ordinary channels are none of our
    /// business.
    pub fn track_message(&mut self, channel_id: u64, message: TrackedMessage) -> bool {
        match self.messages.get_mut(&channel_id) {
            Some(buffer) => {
                buffer.push(message);
                true
            }
            None => false,
        }
    }

    /// Number of currently open tickets.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.messages.len()
    }

    /// Closes the ticket on `channel_id`.
    ///
    /// Scans the owner index by channel id (the index is owner→channel),
    /// removes the entry, and removes and returns the transcript buffer and
    /// metadata for rendering. The channel itself is deleted later by the
    /// bot layer's deferred task.
    pub fn close(&mut self, channel_id: u64) -> Result<ClosedTicket> {
        let owner = self
            .active
            .iter()
            .find_map(|(user, slot)| (*slot == Slot::Open(channel_id)).then(|| user.clone()))
            .ok_or(Error::TicketNotFound {
                channel: channel_id,
            })?;
        self.active.remove(&owner);
        let messages = self.messages.remove(&channel_id).unwrap_or_default();
        let meta = self
            .meta
            .remove(&channel_id)
            .ok_or(Error::TicketNotFound {
                channel: channel_id,
            })?;
        Ok(ClosedTicket { meta, messages })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::tracked;

    #[test]
    fn test_open_ticket_happy_path() {
        let mut registry = TicketRegistry::new();
        registry.reserve("u1").unwrap();
        registry.confirm("u1", "Alice", 100, TicketKind::Buy);

        assert_eq!(registry.channel_for("u1"), Some(100));
        assert!(registry.is_ticket_channel(100));
        assert_eq!(registry.open_count(), 1);
        assert_eq!(registry.meta(100).unwrap().owner_id, "u1");
    }

    #[test]
    fn test_second_ticket_rejected_without_mutation() {
        let mut registry = TicketRegistry::new();
        registry.reserve("u1").unwrap();
        registry.confirm("u1", "Alice", 100, TicketKind::Buy);

        assert!(matches!(
            registry.reserve("u1"),
            Err(Error::TicketAlreadyOpen)
        ));
        // The original ticket is untouched.
        assert_eq!(registry.channel_for("u1"), Some(100));
        assert_eq!(registry.open_count(), 1);
    }

    #[test]
    fn test_pending_reservation_blocks_and_cancel_frees() {
        let mut registry = TicketRegistry::new();
        registry.reserve("u1").unwrap();
        // A concurrent attempt between reserve and confirm loses.
        assert!(registry.reserve("u1").is_err());
        registry.cancel("u1");
        assert!(registry.reserve("u1").is_ok());
    }

    #[test]
    fn test_cancel_does_not_drop_open_ticket() {
        let mut registry = TicketRegistry::new();
        registry.reserve("u1").unwrap();
        registry.confirm("u1", "Alice", 100, TicketKind::Sell);
        registry.cancel("u1");
        assert_eq!(registry.channel_for("u1"), Some(100));
    }

    #[test]
    fn test_track_message_arrival_order() {
        let mut registry = TicketRegistry::new();
        registry.reserve("u1").unwrap();
        registry.confirm("u1", "Alice", 100, TicketKind::Buy);

        assert!(registry.track_message(100, tracked("Alice", "hello")));
        assert!(registry.track_message(100, tracked("Staff", "hi there")));
        assert!(!registry.track_message(999, tracked("Alice", "lost")));

        let closed = registry.close(100).unwrap();
        assert_eq!(closed.messages.len(), 2);
        assert_eq!(closed.messages[0].content, "hello");
        assert_eq!(closed.messages[1].content, "hi there");
    }

    #[test]
    fn test_close_removes_everything() {
        let mut registry = TicketRegistry::new();
        registry.reserve("u1").unwrap();
        registry.confirm("u1", "Alice", 100, TicketKind::Buy);

        let closed = registry.close(100).unwrap();
        assert_eq!(closed.meta.owner_id, "u1");
        assert_eq!(registry.channel_for("u1"), None);
        assert!(!registry.is_ticket_channel(100));
        // The user can open a fresh ticket afterwards.
        assert!(registry.reserve("u1").is_ok());
    }

    #[test]
    fn test_close_unknown_channel() {
        let mut registry = TicketRegistry::new();
        assert!(matches!(
            registry.close(42),
            Err(Error::TicketNotFound { channel: 42 })
        ));
    }

    #[test]
    fn test_channel_naming_and_recognition() {
        assert_eq!(channel_name(TicketKind::Buy, "Alice"), "buy-alice");
        assert_eq!(
            channel_name(TicketKind::Sell, "Some User!"),
            "sell-some-user"
        );
        assert_eq!(
            channel_name(TicketKind::Account, "__x__"),
            "account-x"
        );
        assert!(is_ticket_name("buy-alice"));
        assert!(is_ticket_name("account-x"));
        assert!(!is_ticket_name("general"));
    }
}
