//! Archival transcript rendering
//!
//! Pure and deterministic: given a room name and an ordered message
//! history, produce the text artifact that gets delivered to the archive
//! channel. No platform access, no clock access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Messages beyond this bound are silently excluded from the transcript.
pub const TRANSCRIPT_MESSAGE_CAP: usize = 100;

/// Rendered in place of messages without text content (attachments, embeds).
pub const EMPTY_MESSAGE_PLACEHOLDER: &str = "<no content>";

/// One message as supplied by the platform's history source, oldest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub sent_at: DateTime<Utc>,
    pub author_name: String,
    pub author_discriminator: String,
    pub text: String,
}

/// The archival artifact produced at close time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub filename: String,
    pub content: String,
}

/// Render a room's history into its transcript.
///
/// Each line is `[YYYY-MM-DD HH:MM] author#discriminator: text`. At most
/// the first `TRANSCRIPT_MESSAGE_CAP` messages are included.
pub fn render(room_name: &str, history: &[HistoryMessage]) -> Transcript {
    let mut content = String::new();
    for message in history.iter().take(TRANSCRIPT_MESSAGE_CAP) {
        let text = if message.text.is_empty() {
            EMPTY_MESSAGE_PLACEHOLDER
        } else {
            message.text.as_str()
        };
        content.push_str(&format!(
            "[{}] {}#{}: {}\n",
            message.sent_at.format("%Y-%m-%d %H:%M"),
            message.author_name,
            message.author_discriminator,
            text,
        ));
    }

    Transcript {
        filename: format!("{room_name}.txt"),
        content,
    }
}
