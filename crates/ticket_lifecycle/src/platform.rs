//! Contracts with the external chat platform
//!
//! The lifecycle controller never talks to a platform SDK directly; it
//! calls these traits and the embedding bot process supplies the
//! implementations. Failures cross the boundary as `anyhow::Error` — the
//! controller does not care why the platform said no, only that it did.

use async_trait::async_trait;
use ticket_core::{
    CategoryId, ChannelId, HistoryMessage, RoleId, RoomId, Transcript, UserId, WorkspaceId,
};

/// Access rules for a freshly created ticket room. Everyone not listed
/// here is denied by default.
#[derive(Debug, Clone)]
pub struct RoomPermissions {
    /// The ticket owner, granted access to their own room.
    pub owner: UserId,
    /// The staff role, granted access to every ticket room.
    pub staff_role: RoleId,
}

/// Creates and destroys ticket rooms.
#[async_trait]
pub trait RoomProvisioner: Send + Sync {
    /// Find or create the named room category and return its identifier.
    async fn ensure_category(
        &self,
        workspace: &WorkspaceId,
        name: &str,
    ) -> anyhow::Result<CategoryId>;

    /// Create a private room under the category with the given access
    /// rules and return its identifier.
    async fn create_room(
        &self,
        category: &CategoryId,
        name: &str,
        permissions: &RoomPermissions,
    ) -> anyhow::Result<RoomId>;

    async fn delete_room(&self, room: &RoomId) -> anyhow::Result<()>;

    /// Whether the room still exists on the platform. Used to heal stale
    /// registry mappings after out-of-band deletions.
    async fn room_exists(&self, room: &RoomId) -> bool;
}

/// Reads a room's message history for archival.
#[async_trait]
pub trait MessageHistorySource: Send + Sync {
    /// At most `limit` messages, oldest first.
    async fn fetch_history(
        &self,
        room: &RoomId,
        limit: usize,
    ) -> anyhow::Result<Vec<HistoryMessage>>;
}

/// Delivers transcripts and user-facing notices.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn send_artifact(
        &self,
        target: &ChannelId,
        artifact: &Transcript,
    ) -> anyhow::Result<()>;

    async fn send_notice(&self, target: &RoomId, text: &str) -> anyhow::Result<()>;
}

/// Answers role-membership questions. Consumed, never owned: the platform
/// is the authority on who is staff.
#[async_trait]
pub trait PermissionOracle: Send + Sync {
    async fn has_role(&self, actor: &UserId, role: &RoleId) -> bool;
}
