//! The lifecycle controller
//!
//! The only component with side effects on the platform. It consumes
//! inbound [`Event`]s, consults the cooldown tracker and ticket registry
//! under one coarse lock, and drives each ticket's state machine through
//! open, claim and close.
//!
//! Locking rules: the registry/cooldown lock is held only for map reads
//! and writes, never across platform I/O. The open sequence stays atomic
//! anyway because a reservation is parked in the registry before the lock
//! is released for provisioning. Individual tickets carry their own lock,
//! so claim and close serialize per room without blocking other rooms.

use crate::config::ControllerConfig;
use crate::cooldown::{CooldownStatus, CooldownTracker};
use crate::panel_store::PanelStore;
use crate::platform::{
    DeliverySink, MessageHistorySource, PermissionOracle, RoomPermissions, RoomProvisioner,
};
use crate::registry::{Resolution, TicketRegistry};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use ticket_core::{
    transcript, CategoryId, ChannelId, CloseBegin, Event, PanelConfig, Result, RoomId, Signal,
    Ticket, TicketError, UserId, WorkspaceId,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// The registry and cooldown maps share one lock: the dedup and cooldown
/// checks on an open request are a single read-check-then-write sequence
/// and must not interleave with another request from the same user.
#[derive(Default)]
struct ControllerState {
    registry: TicketRegistry,
    cooldown: CooldownTracker,
}

pub struct LifecycleController {
    config: ControllerConfig,
    state: Arc<Mutex<ControllerState>>,
    panels: PanelStore,
    /// Category identifiers already ensured, cached per workspace so room
    /// identity is never re-derived from display names.
    categories: DashMap<WorkspaceId, CategoryId>,
    rooms: Arc<dyn RoomProvisioner>,
    history: Arc<dyn MessageHistorySource>,
    delivery: Arc<dyn DeliverySink>,
    permissions: Arc<dyn PermissionOracle>,
}

impl LifecycleController {
    /// A controller with empty state. All ticket state is process-lifetime
    /// only; construct one of these at startup and let it drop at exit.
    pub fn new(
        config: ControllerConfig,
        rooms: Arc<dyn RoomProvisioner>,
        history: Arc<dyn MessageHistorySource>,
        delivery: Arc<dyn DeliverySink>,
        permissions: Arc<dyn PermissionOracle>,
    ) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(ControllerState::default())),
            panels: PanelStore::new(),
            categories: DashMap::new(),
            rooms,
            history,
            delivery,
            permissions,
        }
    }

    /// Handle one inbound event. Every failure is scoped to this event;
    /// an `Err` here never poisons the controller.
    pub async fn handle_event(&self, event: Event) -> Result<Signal> {
        match event {
            Event::OpenRequest {
                actor,
                workspace,
                at,
            } => self.handle_open(actor, workspace, at).await,
            Event::ClaimRequest { room, actor } => self.handle_claim(room, actor).await,
            Event::CloseRequest { room, actor } => self.handle_close(room, actor).await,
            Event::ConfigSubmit { workspace, config } => self.handle_config(workspace, config),
        }
    }

    /// The saved panel for a workspace, required before a panel can be
    /// rendered. Rendering itself lives outside the core.
    pub fn panel(&self, workspace: &WorkspaceId) -> Result<PanelConfig> {
        self.panels.get(workspace).ok_or(TicketError::NotConfigured)
    }

    /// A point-in-time copy of the ticket living in `room`.
    pub async fn ticket_snapshot(&self, room: &RoomId) -> Option<Ticket> {
        let handle = self.ticket_handle(room).await?;
        let ticket = handle.lock().await;
        Some(ticket.clone())
    }

    /// The room of a user's active ticket, if any.
    pub async fn open_ticket_for(&self, user: &UserId) -> Option<RoomId> {
        self.state.lock().await.registry.lookup(user)
    }

    async fn handle_open(
        &self,
        actor: UserId,
        workspace: WorkspaceId,
        at: DateTime<Utc>,
    ) -> Result<Signal> {
        // First pass under the lock: classify the user's slot and, when
        // the path is clear, take a reservation so a concurrent open from
        // the same user collapses into AlreadyOpen.
        let active_room = {
            let mut state = self.state.lock().await;
            match state.registry.current(&actor) {
                Resolution::Pending => return Ok(Signal::AlreadyOpen { room: None }),
                Resolution::Active(room) => Some(room),
                Resolution::None | Resolution::Healed => {
                    match self.reserve_if_off_cooldown(&mut state, &actor, at) {
                        Ok(()) => None,
                        Err(signal) => return Ok(signal),
                    }
                }
            }
        };

        if let Some(room) = active_room {
            // Existence check is platform I/O; do it with the lock released,
            // then re-resolve whatever the registry holds by now.
            let exists = self.rooms.room_exists(&room).await;
            let mut state = self.state.lock().await;
            match state.registry.resolve_stale_or_active(&actor, exists) {
                Resolution::Active(room) => {
                    return Ok(Signal::AlreadyOpen { room: Some(room) })
                }
                Resolution::Pending => return Ok(Signal::AlreadyOpen { room: None }),
                Resolution::Healed | Resolution::None => {
                    if let Err(signal) = self.reserve_if_off_cooldown(&mut state, &actor, at) {
                        return Ok(signal);
                    }
                }
            }
        }

        // Reservation held; provision with no lock.
        let room_name = format!("ticket-{actor}");
        let room = match self.provision_room(&workspace, &actor, &room_name).await {
            Ok(room) => room,
            Err(error) => {
                let mut state = self.state.lock().await;
                state.registry.cancel_reservation(&actor);
                return Err(TicketError::Provisioning(error));
            }
        };

        let ticket = Ticket::open(actor.clone(), room.clone(), room_name, at);
        {
            let mut state = self.state.lock().await;
            state.registry.activate(&actor, ticket);
            // The slot is consumed only now that the room exists.
            state.cooldown.record(&actor, at);
        }

        info!(user = %actor, room = %room, "ticket opened");
        Ok(Signal::Created { room })
    }

    /// Cooldown gate for an open request. On `Ok` a reservation has been
    /// taken; the returned `Err` is the user-facing signal, and nothing
    /// was consumed.
    fn reserve_if_off_cooldown(
        &self,
        state: &mut ControllerState,
        actor: &UserId,
        at: DateTime<Utc>,
    ) -> std::result::Result<(), Signal> {
        match state
            .cooldown
            .check(actor, at, self.config.cooldown_seconds)
        {
            CooldownStatus::Blocked { remaining_seconds } => {
                Err(Signal::CooldownActive { remaining_seconds })
            }
            CooldownStatus::Allowed => match state.registry.reserve(actor) {
                Ok(()) => Ok(()),
                // Unreachable while the lock is held; collapse to dedup.
                Err(_) => Err(Signal::AlreadyOpen {
                    room: state.registry.lookup(actor),
                }),
            },
        }
    }

    async fn provision_room(
        &self,
        workspace: &WorkspaceId,
        owner: &UserId,
        room_name: &str,
    ) -> anyhow::Result<RoomId> {
        let cached = self.categories.get(workspace).map(|entry| entry.value().clone());
        let category = match cached {
            Some(category) => category,
            None => {
                let category = self
                    .rooms
                    .ensure_category(workspace, &self.config.category_name)
                    .await?;
                self.categories.insert(workspace.clone(), category.clone());
                category
            }
        };

        let permissions = RoomPermissions {
            owner: owner.clone(),
            staff_role: self.config.staff_role.clone(),
        };
        self.rooms.create_room(&category, room_name, &permissions).await
    }

    async fn handle_claim(&self, room: RoomId, actor: UserId) -> Result<Signal> {
        let ticket = self
            .ticket_handle(&room)
            .await
            .ok_or_else(|| TicketError::UnknownRoom(room.clone()))?;

        let is_staff = self
            .permissions
            .has_role(&actor, &self.config.staff_role)
            .await;
        {
            let mut ticket = ticket.lock().await;
            ticket.claim(&actor, is_staff)?;
        }

        info!(room = %room, staff = %actor, "ticket claimed");
        if let Err(error) = self
            .delivery
            .send_notice(&room, &format!("Ticket claimed by {actor}."))
            .await
        {
            warn!(room = %room, %error, "failed to broadcast claim notice");
        }
        Ok(Signal::Claimed { room, by: actor })
    }

    async fn handle_close(&self, room: RoomId, actor: UserId) -> Result<Signal> {
        let ticket = self
            .ticket_handle(&room)
            .await
            .ok_or_else(|| TicketError::UnknownRoom(room.clone()))?;

        let begun = {
            let mut ticket = ticket.lock().await;
            ticket.begin_close()?
        };
        if begun == CloseBegin::AlreadyClosing {
            return Ok(Signal::AlreadyClosing { room });
        }

        info!(room = %room, by = %actor, "ticket close scheduled");
        if let Err(error) = self
            .delivery
            .send_notice(
                &room,
                &format!(
                    "Closing this ticket in {} seconds.",
                    self.config.close_delay_seconds
                ),
            )
            .await
        {
            warn!(room = %room, %error, "failed to send close notice");
        }

        // The ticket is already Closing, so a replayed close request lands
        // in AlreadyClosing while this job waits out the delay.
        let job = CloseJob {
            room: room.clone(),
            ticket,
            delay: Duration::from_secs(self.config.close_delay_seconds),
            history_limit: self.config.history_limit,
            archive_channel: self.config.archive_channel.clone(),
            state: Arc::clone(&self.state),
            rooms: Arc::clone(&self.rooms),
            history: Arc::clone(&self.history),
            delivery: Arc::clone(&self.delivery),
        };
        tokio::spawn(job.run());

        Ok(Signal::CloseScheduled { room })
    }

    fn handle_config(&self, workspace: WorkspaceId, config: PanelConfig) -> Result<Signal> {
        self.panels.save(workspace.clone(), config);
        info!(workspace = %workspace, "panel configuration saved");
        Ok(Signal::ConfigSaved { workspace })
    }

    async fn ticket_handle(&self, room: &RoomId) -> Option<Arc<Mutex<Ticket>>> {
        self.state.lock().await.registry.ticket(room)
    }
}

/// The deferred tail of a close: wait out the feedback delay, archive the
/// transcript, then tear the ticket down. Runs on its own task so other
/// rooms' events proceed unaffected.
struct CloseJob {
    room: RoomId,
    ticket: Arc<Mutex<Ticket>>,
    delay: Duration,
    history_limit: usize,
    archive_channel: ChannelId,
    state: Arc<Mutex<ControllerState>>,
    rooms: Arc<dyn RoomProvisioner>,
    history: Arc<dyn MessageHistorySource>,
    delivery: Arc<dyn DeliverySink>,
}

impl CloseJob {
    async fn run(self) {
        tokio::time::sleep(self.delay).await;

        let room_name = {
            let ticket = self.ticket.lock().await;
            ticket.room_name.clone()
        };

        // Archival is best-effort; ticket cleanup below happens regardless.
        match self.history.fetch_history(&self.room, self.history_limit).await {
            Ok(messages) => {
                let artifact = transcript::render(&room_name, &messages);
                if let Err(error) = self
                    .delivery
                    .send_artifact(&self.archive_channel, &artifact)
                    .await
                {
                    warn!(room = %self.room, %error, "transcript delivery failed");
                }
            }
            Err(error) => {
                warn!(room = %self.room, %error, "history fetch failed, closing without transcript");
            }
        }

        {
            let mut ticket = self.ticket.lock().await;
            if let Err(error) = ticket.complete() {
                // Nothing leaves Closing except complete(), so this only
                // fires if the ticket was tampered with out-of-band.
                warn!(room = %self.room, %error, "close completion rejected");
            }
        }
        {
            let mut state = self.state.lock().await;
            state.registry.unregister_by_room(&self.room);
        }

        if let Err(error) = self.rooms.delete_room(&self.room).await {
            warn!(room = %self.room, %error, "room deletion failed");
        }
        info!(room = %self.room, "ticket closed");
    }
}
