//! In-memory platform fakes
//!
//! A complete stand-in for the chat platform: rooms, categories, message
//! history, artifact and notice capture, and a role table, with failure
//! toggles for the provisioning and delivery paths. One `Arc<FakePlatform>`
//! satisfies all four collaborator traits, so tests (and local smoke runs
//! of an embedding bot) need no platform connection at all.

use crate::platform::{
    DeliverySink, MessageHistorySource, PermissionOracle, RoomPermissions, RoomProvisioner,
};
use anyhow::bail;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use ticket_core::{
    CategoryId, ChannelId, HistoryMessage, RoleId, RoomId, Transcript, UserId, WorkspaceId,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct FakeRoom {
    pub name: String,
    pub category: CategoryId,
}

#[derive(Debug, Default)]
pub struct FakePlatform {
    rooms: Mutex<HashMap<RoomId, FakeRoom>>,
    categories: Mutex<HashMap<(WorkspaceId, String), CategoryId>>,
    histories: Mutex<HashMap<RoomId, Vec<HistoryMessage>>>,
    artifacts: Mutex<Vec<(ChannelId, Transcript)>>,
    notices: Mutex<Vec<(RoomId, String)>>,
    roles: Mutex<HashSet<(UserId, RoleId)>>,
    created_rooms: AtomicUsize,
    fail_create_room: AtomicBool,
    fail_delivery: AtomicBool,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant_role(&self, user: UserId, role: RoleId) {
        self.roles.lock().unwrap().insert((user, role));
    }

    pub fn push_history(&self, room: &RoomId, message: HistoryMessage) {
        self.histories
            .lock()
            .unwrap()
            .entry(room.clone())
            .or_default()
            .push(message);
    }

    /// Delete a room behind the controller's back, leaving any registry
    /// mapping stale.
    pub fn forget_room(&self, room: &RoomId) {
        self.rooms.lock().unwrap().remove(room);
        self.histories.lock().unwrap().remove(room);
    }

    pub fn set_fail_create_room(&self, fail: bool) {
        self.fail_create_room.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_delivery(&self, fail: bool) {
        self.fail_delivery.store(fail, Ordering::SeqCst);
    }

    /// Rooms currently alive.
    pub fn room_count(&self) -> usize {
        self.rooms.lock().unwrap().len()
    }

    /// Rooms ever created, deleted or not.
    pub fn created_room_count(&self) -> usize {
        self.created_rooms.load(Ordering::SeqCst)
    }

    pub fn room(&self, room: &RoomId) -> Option<FakeRoom> {
        self.rooms.lock().unwrap().get(room).cloned()
    }

    pub fn artifacts(&self) -> Vec<(ChannelId, Transcript)> {
        self.artifacts.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<(RoomId, String)> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoomProvisioner for FakePlatform {
    async fn ensure_category(
        &self,
        workspace: &WorkspaceId,
        name: &str,
    ) -> anyhow::Result<CategoryId> {
        let mut categories = self.categories.lock().unwrap();
        let category = categories
            .entry((workspace.clone(), name.to_string()))
            .or_insert_with(|| CategoryId::new(format!("category-{}", Uuid::new_v4())));
        Ok(category.clone())
    }

    async fn create_room(
        &self,
        category: &CategoryId,
        name: &str,
        _permissions: &RoomPermissions,
    ) -> anyhow::Result<RoomId> {
        if self.fail_create_room.load(Ordering::SeqCst) {
            bail!("platform refused to create room {name}");
        }

        let room = RoomId::new(format!("room-{}", Uuid::new_v4()));
        self.rooms.lock().unwrap().insert(
            room.clone(),
            FakeRoom {
                name: name.to_string(),
                category: category.clone(),
            },
        );
        self.histories
            .lock()
            .unwrap()
            .insert(room.clone(), Vec::new());
        self.created_rooms.fetch_add(1, Ordering::SeqCst);
        Ok(room)
    }

    async fn delete_room(&self, room: &RoomId) -> anyhow::Result<()> {
        if self.rooms.lock().unwrap().remove(room).is_none() {
            bail!("no such room: {room}");
        }
        self.histories.lock().unwrap().remove(room);
        Ok(())
    }

    async fn room_exists(&self, room: &RoomId) -> bool {
        self.rooms.lock().unwrap().contains_key(room)
    }
}

#[async_trait]
impl MessageHistorySource for FakePlatform {
    async fn fetch_history(
        &self,
        room: &RoomId,
        limit: usize,
    ) -> anyhow::Result<Vec<HistoryMessage>> {
        let histories = self.histories.lock().unwrap();
        let mut messages = histories.get(room).cloned().unwrap_or_default();
        messages.truncate(limit);
        Ok(messages)
    }
}

#[async_trait]
impl DeliverySink for FakePlatform {
    async fn send_artifact(
        &self,
        target: &ChannelId,
        artifact: &Transcript,
    ) -> anyhow::Result<()> {
        if self.fail_delivery.load(Ordering::SeqCst) {
            bail!("delivery sink unavailable");
        }
        self.artifacts
            .lock()
            .unwrap()
            .push((target.clone(), artifact.clone()));
        Ok(())
    }

    async fn send_notice(&self, target: &RoomId, text: &str) -> anyhow::Result<()> {
        self.notices
            .lock()
            .unwrap()
            .push((target.clone(), text.to_string()));
        Ok(())
    }
}

#[async_trait]
impl PermissionOracle for FakePlatform {
    async fn has_role(&self, actor: &UserId, role: &RoleId) -> bool {
        self.roles
            .lock()
            .unwrap()
            .contains(&(actor.clone(), role.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_category_is_idempotent_per_workspace() {
        let platform = FakePlatform::new();
        let ws = WorkspaceId::new("ws");

        let first = platform.ensure_category(&ws, "Tickets").await.unwrap();
        let second = platform.ensure_category(&ws, "Tickets").await.unwrap();
        assert_eq!(first, second);

        let other = platform
            .ensure_category(&WorkspaceId::new("other"), "Tickets")
            .await
            .unwrap();
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn created_rooms_exist_until_deleted() {
        let platform = FakePlatform::new();
        let category = platform
            .ensure_category(&WorkspaceId::new("ws"), "Tickets")
            .await
            .unwrap();
        let permissions = RoomPermissions {
            owner: UserId::new("u1"),
            staff_role: RoleId::new("staff"),
        };

        let room = platform
            .create_room(&category, "ticket-u1", &permissions)
            .await
            .unwrap();
        assert!(platform.room_exists(&room).await);

        platform.delete_room(&room).await.unwrap();
        assert!(!platform.room_exists(&room).await);
        assert!(platform.delete_room(&room).await.is_err());
    }
}
