//! Inbound events and outbound signals
//!
//! The dispatcher that owns the platform connection translates button
//! presses and form submissions into `Event` values; the lifecycle
//! controller answers with `Signal` values the dispatcher renders back to
//! users. Delivery is at-least-once, so every event is safe to replay.

use crate::ids::{RoomId, UserId, WorkspaceId};
use crate::panel::PanelConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A user pressed the panel button asking for a ticket.
    OpenRequest {
        actor: UserId,
        workspace: WorkspaceId,
        at: DateTime<Utc>,
    },

    /// A staff member pressed the claim button inside a ticket room.
    ClaimRequest { room: RoomId, actor: UserId },

    /// Someone pressed the close button inside a ticket room.
    CloseRequest { room: RoomId, actor: UserId },

    /// A panel configuration form was submitted for a workspace.
    ConfigSubmit {
        workspace: WorkspaceId,
        config: PanelConfig,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    /// A new ticket room was provisioned for the requester.
    Created { room: RoomId },

    /// The requester already has a ticket. `room` is `None` while the
    /// existing request is still provisioning its room.
    AlreadyOpen { room: Option<RoomId> },

    /// The requester must wait before opening another ticket.
    CooldownActive { remaining_seconds: u64 },

    /// The ticket was claimed; broadcast to the room.
    Claimed { room: RoomId, by: UserId },

    /// The close was accepted and the archival step is scheduled.
    CloseScheduled { room: RoomId },

    /// The room is already closing; the repeated request did nothing.
    AlreadyClosing { room: RoomId },

    /// The workspace's panel configuration was saved.
    ConfigSaved { workspace: WorkspaceId },
}
