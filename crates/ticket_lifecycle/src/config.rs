//! Controller configuration

use serde::{Deserialize, Serialize};
use ticket_core::{ChannelId, RoleId, TRANSCRIPT_MESSAGE_CAP};

pub const DEFAULT_COOLDOWN_SECONDS: u64 = 60;
pub const DEFAULT_CLOSE_DELAY_SECONDS: u64 = 5;
pub const DEFAULT_CATEGORY_NAME: &str = "Tickets";

/// Knobs and identifiers the lifecycle controller runs with. Values are
/// injected by the embedding bot process; nothing here reads the
/// environment or disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Seconds a user must wait between successful ticket requests.
    pub cooldown_seconds: u64,

    /// User-facing delay between a close request and the archival work.
    pub close_delay_seconds: u64,

    /// Maximum number of messages fetched for a transcript.
    pub history_limit: usize,

    /// Role allowed to claim and manage tickets.
    pub staff_role: RoleId,

    /// Display name of the category ticket rooms are created under.
    pub category_name: String,

    /// Channel transcripts are delivered to on close.
    pub archive_channel: ChannelId,
}

impl ControllerConfig {
    pub fn new(staff_role: RoleId, archive_channel: ChannelId) -> Self {
        Self {
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            close_delay_seconds: DEFAULT_CLOSE_DELAY_SECONDS,
            history_limit: TRANSCRIPT_MESSAGE_CAP,
            staff_role,
            category_name: DEFAULT_CATEGORY_NAME.to_string(),
            archive_channel,
        }
    }

    pub fn with_cooldown_seconds(mut self, seconds: u64) -> Self {
        self.cooldown_seconds = seconds;
        self
    }

    pub fn with_close_delay_seconds(mut self, seconds: u64) -> Self {
        self.close_delay_seconds = seconds;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_category_name(mut self, name: impl Into<String>) -> Self {
        self.category_name = name.into();
        self
    }
}
