//! Plaintext transcript rendering for closed tickets.
//!
//! Rendering is a pure function over the ticket's tracked messages and
//! metadata: the same buffer always produces the same text, so a transcript
//! can be regenerated or compared byte-for-byte in tests. The output is a
//! flat report - header block, one line per message with embed sub-lines,
//! footer - suitable for posting as a `.txt` attachment.

use chrono::{DateTime, Utc};

use crate::core::tickets::TrackedMessage;

/// Marker rendered instead of a body when the buffer is empty.
pub const NO_MESSAGES_MARKER: &str = "(no messages recorded)";

/// Header metadata for a transcript.
#[derive(Debug, Clone)]
pub struct TranscriptHeader {
    /// Ticket channel name.
    pub channel_name: String,
    /// When the ticket was opened.
    pub opened_at: DateTime<Utc>,
    /// Extra labeled fields (owner, ticket kind, outcome, ...).
    pub fields: Vec<(String, String)>,
}

/// Renders a ticket's tracked messages into the flat text report.
#[must_use]
pub fn render(header: &TranscriptHeader, messages: &[TrackedMessage]) -> String {
    let rule = "=".repeat(48);
    let mut out = String::new();
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!("Ticket transcript: #{}\n", header.channel_name));
    out.push_str(&format!(
        "Opened: {}\n",
        header.opened_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("Messages: {}\n", messages.len()));
    for (label, value) in &header.fields {
        out.push_str(&format!("{label}: {value}\n"));
    }
    out.push_str(&rule);
    out.push('\n');

    if messages.is_empty() {
        out.push_str(NO_MESSAGES_MARKER);
        out.push('\n');
    } else {
        for message in messages {
            let bot_tag = if message.is_bot { " [BOT]" } else { "" };
            out.push_str(&format!(
                "[{}] {}{}: {}\n",
                message.timestamp.format("%H:%M:%S"),
                message.author,
                bot_tag,
                message.content
            ));
            for embed in &message.embeds {
                if let Some(title) = &embed.title {
                    out.push_str(&format!("    [embed] {title}\n"));
                }
                if let Some(description) = &embed.description {
                    out.push_str(&format!("    {description}\n"));
                }
                for (name, value) in &embed.fields {
                    out.push_str(&format!("    - {name}: {value}\n"));
                }
            }
        }
    }

    out.push_str(&format!("---- End of transcript: #{} ----\n", header.channel_name));
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::tickets::TrackedEmbed;
    use crate::test_utils::tracked;
    use chrono::TimeZone;

    fn header() -> TranscriptHeader {
        TranscriptHeader {
            channel_name: "buy-alice".to_string(),
            opened_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            fields: vec![("Opened by".to_string(), "Alice".to_string())],
        }
    }

    #[test]
    fn test_empty_buffer_renders_marker() {
        let text = render(&header(), &[]);
        assert!(text.contains(NO_MESSAGES_MARKER));
        assert!(text.contains("Messages: 0"));
    }

    #[test]
    fn test_header_and_body_lines() {
        let messages = vec![tracked("Alice", "hello"), tracked("CoinBot", "welcome!")];
        let mut bot_message = messages[1].clone();
        bot_message.is_bot = true;
        let messages = vec![messages[0].clone(), bot_message];

        let text = render(&header(), &messages);
        assert!(text.contains("Ticket transcript: #buy-alice"));
        assert!(text.contains("Opened: 2025-06-01 12:00:00 UTC"));
        assert!(text.contains("Messages: 2"));
        assert!(text.contains("Opened by: Alice"));
        assert!(text.contains("Alice: hello"));
        assert!(text.contains("CoinBot [BOT]: welcome!"));
        assert!(text.ends_with("---- End of transcript: #buy-alice ----\n"));
    }

    #[test]
    fn test_embeds_render_as_indented_sublines() {
        let mut message = tracked("CoinBot", "");
        message.embeds.push(TrackedEmbed {
            title: Some("Order summary".to_string()),
            description: Some("1.5B coins".to_string()),
            fields: vec![("Price".to_string(), "$52.50".to_string())],
        });
        let text = render(&header(), &[message]);
        assert!(text.contains("    [embed] Order summary"));
        assert!(text.contains("    1.5B coins"));
        assert!(text.contains("    - Price: $52.50"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let messages = vec![tracked("Alice", "same in"), tracked("Bob", "same out")];
        assert_eq!(render(&header(), &messages), render(&header(), &messages));
    }
}
