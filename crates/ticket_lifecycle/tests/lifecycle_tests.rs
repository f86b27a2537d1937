//! End-to-end tests of the lifecycle controller against the in-memory
//! platform fakes.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use ticket_core::{
    CategoryId, ChannelId, Event, HistoryMessage, PanelConfig, RoleId, RoomId, Signal, TicketError,
    TicketState, UserId, WorkspaceId,
};
use ticket_lifecycle::platform::RoomPermissions;
use ticket_lifecycle::{ControllerConfig, FakePlatform, LifecycleController, RoomProvisioner};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn config() -> ControllerConfig {
    ControllerConfig::new(RoleId::new("staff"), ChannelId::new("archive"))
}

fn setup() -> (Arc<FakePlatform>, LifecycleController) {
    let platform = Arc::new(FakePlatform::new());
    let controller = LifecycleController::new(
        config(),
        platform.clone(),
        platform.clone(),
        platform.clone(),
        platform.clone(),
    );
    (platform, controller)
}

fn open_request(user: &str, at: DateTime<Utc>) -> Event {
    Event::OpenRequest {
        actor: UserId::new(user),
        workspace: WorkspaceId::new("ws"),
        at,
    }
}

async fn open_ticket(controller: &LifecycleController, user: &str, at: DateTime<Utc>) -> RoomId {
    match controller
        .handle_event(open_request(user, at))
        .await
        .unwrap()
    {
        Signal::Created { room } => room,
        other => panic!("expected Created, got {other:?}"),
    }
}

#[tokio::test]
async fn open_creates_a_room_and_registers_the_ticket() {
    let (platform, controller) = setup();

    let room = open_ticket(&controller, "alice", t0()).await;

    assert!(platform.room_exists(&room).await);
    assert_eq!(platform.room(&room).unwrap().name, "ticket-alice");
    assert_eq!(
        controller.open_ticket_for(&UserId::new("alice")).await,
        Some(room.clone())
    );

    let ticket = controller.ticket_snapshot(&room).await.unwrap();
    assert_eq!(ticket.state, TicketState::Open);
    assert_eq!(ticket.owner, UserId::new("alice"));
    assert_eq!(ticket.claimed_by, None);
}

#[tokio::test]
async fn second_open_reports_already_open_not_cooldown() {
    let (platform, controller) = setup();
    let room = open_ticket(&controller, "alice", t0()).await;

    // Dedup is checked before the cooldown, so even a request inside the
    // window reports the existing ticket.
    let signal = controller
        .handle_event(open_request("alice", t0() + ChronoDuration::seconds(5)))
        .await
        .unwrap();
    assert_eq!(signal, Signal::AlreadyOpen { room: Some(room) });
    assert_eq!(platform.created_room_count(), 1);
}

#[tokio::test]
async fn concurrent_opens_create_exactly_one_room() {
    let (platform, controller) = setup();

    let (first, second) = tokio::join!(
        controller.handle_event(open_request("alice", t0())),
        controller.handle_event(open_request("alice", t0())),
    );

    let signals = [first.unwrap(), second.unwrap()];
    let created = signals
        .iter()
        .filter(|signal| matches!(signal, Signal::Created { .. }))
        .count();
    assert_eq!(created, 1);
    assert_eq!(platform.created_room_count(), 1);
    for signal in &signals {
        assert!(matches!(
            signal,
            Signal::Created { .. } | Signal::AlreadyOpen { .. } | Signal::CooldownActive { .. }
        ));
    }
}

/// Provisioner wrapper that parks every create_room call on the paused
/// clock, keeping the reservation window open long enough to observe.
struct SlowRooms(Arc<FakePlatform>);

#[async_trait]
impl RoomProvisioner for SlowRooms {
    async fn ensure_category(
        &self,
        workspace: &WorkspaceId,
        name: &str,
    ) -> anyhow::Result<CategoryId> {
        self.0.ensure_category(workspace, name).await
    }

    async fn create_room(
        &self,
        category: &CategoryId,
        name: &str,
        permissions: &RoomPermissions,
    ) -> anyhow::Result<RoomId> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        self.0.create_room(category, name, permissions).await
    }

    async fn delete_room(&self, room: &RoomId) -> anyhow::Result<()> {
        self.0.delete_room(room).await
    }

    async fn room_exists(&self, room: &RoomId) -> bool {
        self.0.room_exists(room).await
    }
}

#[tokio::test(start_paused = true)]
async fn open_during_provisioning_sees_already_open() {
    let platform = Arc::new(FakePlatform::new());
    let controller = Arc::new(LifecycleController::new(
        config(),
        Arc::new(SlowRooms(platform.clone())),
        platform.clone(),
        platform.clone(),
        platform.clone(),
    ));

    let racing = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.handle_event(open_request("alice", t0())).await })
    };
    // Let the first request take its reservation and park in create_room.
    tokio::task::yield_now().await;

    let signal = controller
        .handle_event(open_request("alice", t0()))
        .await
        .unwrap();
    assert_eq!(signal, Signal::AlreadyOpen { room: None });

    let first = racing.await.unwrap().unwrap();
    assert!(matches!(first, Signal::Created { .. }));
    assert_eq!(platform.created_room_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn cooldown_blocks_reopen_after_close() {
    let (_platform, controller) = setup();
    let room = open_ticket(&controller, "alice", t0()).await;

    // Tear the ticket down so the registry is clear and only the cooldown
    // stands in the way.
    controller
        .handle_event(Event::CloseRequest {
            room: room.clone(),
            actor: UserId::new("alice"),
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(controller.open_ticket_for(&UserId::new("alice")).await, None);

    let signal = controller
        .handle_event(open_request("alice", t0() + ChronoDuration::seconds(30)))
        .await
        .unwrap();
    assert_eq!(
        signal,
        Signal::CooldownActive {
            remaining_seconds: 30
        }
    );

    let signal = controller
        .handle_event(open_request("alice", t0() + ChronoDuration::seconds(61)))
        .await
        .unwrap();
    assert!(matches!(signal, Signal::Created { .. }));
}

#[tokio::test]
async fn provisioning_failure_rolls_back_and_keeps_the_cooldown_slot() {
    let (platform, controller) = setup();
    platform.set_fail_create_room(true);

    let err = controller
        .handle_event(open_request("alice", t0()))
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::Provisioning(_)));
    assert_eq!(controller.open_ticket_for(&UserId::new("alice")).await, None);

    // Neither the registry slot nor the cooldown slot was consumed: the
    // same user retries at the same instant and succeeds.
    platform.set_fail_create_room(false);
    let room = open_ticket(&controller, "alice", t0()).await;
    assert!(platform.room_exists(&room).await);
}

#[tokio::test]
async fn users_do_not_share_cooldowns_or_tickets() {
    let (platform, controller) = setup();

    let room_a = open_ticket(&controller, "alice", t0()).await;
    let room_b = open_ticket(&controller, "bob", t0()).await;

    assert_ne!(room_a, room_b);
    assert_eq!(platform.created_room_count(), 2);
}

#[tokio::test]
async fn claim_by_staff_updates_the_ticket_and_broadcasts() {
    let (platform, controller) = setup();
    platform.grant_role(UserId::new("mod"), RoleId::new("staff"));
    let room = open_ticket(&controller, "alice", t0()).await;

    let signal = controller
        .handle_event(Event::ClaimRequest {
            room: room.clone(),
            actor: UserId::new("mod"),
        })
        .await
        .unwrap();
    assert_eq!(
        signal,
        Signal::Claimed {
            room: room.clone(),
            by: UserId::new("mod")
        }
    );

    let ticket = controller.ticket_snapshot(&room).await.unwrap();
    assert_eq!(ticket.state, TicketState::Claimed);
    assert_eq!(ticket.claimed_by, Some(UserId::new("mod")));

    let notices = platform.notices();
    assert!(notices
        .iter()
        .any(|(target, text)| *target == room && text.contains("claimed by mod")));
}

#[tokio::test]
async fn claim_without_staff_role_is_denied() {
    let (_platform, controller) = setup();
    let room = open_ticket(&controller, "alice", t0()).await;

    let err = controller
        .handle_event(Event::ClaimRequest {
            room: room.clone(),
            actor: UserId::new("alice"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::PermissionDenied));

    let ticket = controller.ticket_snapshot(&room).await.unwrap();
    assert_eq!(ticket.state, TicketState::Open);
    assert_eq!(ticket.claimed_by, None);
}

#[tokio::test]
async fn claim_of_unknown_room_errors() {
    let (_platform, controller) = setup();
    let err = controller
        .handle_event(Event::ClaimRequest {
            room: RoomId::new("nope"),
            actor: UserId::new("mod"),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::UnknownRoom(_)));
}

#[tokio::test(start_paused = true)]
async fn close_archives_the_transcript_and_tears_down() {
    let (platform, controller) = setup();
    let room = open_ticket(&controller, "alice", t0()).await;
    platform.push_history(
        &room,
        HistoryMessage {
            sent_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            author_name: "alice".to_string(),
            author_discriminator: "1".to_string(),
            text: "hi".to_string(),
        },
    );
    platform.push_history(
        &room,
        HistoryMessage {
            sent_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 5, 0).unwrap(),
            author_name: "bob".to_string(),
            author_discriminator: "2".to_string(),
            text: String::new(),
        },
    );

    let signal = controller
        .handle_event(Event::CloseRequest {
            room: room.clone(),
            actor: UserId::new("alice"),
        })
        .await
        .unwrap();
    assert_eq!(signal, Signal::CloseScheduled { room: room.clone() });

    // The archival work has not run yet; it is parked on the close delay.
    assert!(platform.artifacts().is_empty());

    tokio::time::sleep(Duration::from_secs(6)).await;

    let artifacts = platform.artifacts();
    assert_eq!(artifacts.len(), 1);
    let (target, transcript) = &artifacts[0];
    assert_eq!(*target, ChannelId::new("archive"));
    assert_eq!(transcript.filename, "ticket-alice.txt");
    assert_eq!(
        transcript.content,
        "[2024-05-01 09:00] alice#1: hi\n[2024-05-01 09:05] bob#2: <no content>\n"
    );

    assert!(!platform.room_exists(&room).await);
    assert_eq!(controller.open_ticket_for(&UserId::new("alice")).await, None);
    assert!(controller.ticket_snapshot(&room).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn double_close_is_a_noop_with_one_transcript() {
    let (platform, controller) = setup();
    let room = open_ticket(&controller, "alice", t0()).await;

    let first = controller
        .handle_event(Event::CloseRequest {
            room: room.clone(),
            actor: UserId::new("alice"),
        })
        .await
        .unwrap();
    assert_eq!(first, Signal::CloseScheduled { room: room.clone() });

    let second = controller
        .handle_event(Event::CloseRequest {
            room: room.clone(),
            actor: UserId::new("alice"),
        })
        .await
        .unwrap();
    assert_eq!(second, Signal::AlreadyClosing { room: room.clone() });

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(platform.artifacts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn delivery_failure_does_not_block_closure() {
    let (platform, controller) = setup();
    let room = open_ticket(&controller, "alice", t0()).await;
    platform.set_fail_delivery(true);

    controller
        .handle_event(Event::CloseRequest {
            room: room.clone(),
            actor: UserId::new("alice"),
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;

    // No transcript landed, but the ticket is gone and the room deleted.
    assert!(platform.artifacts().is_empty());
    assert!(!platform.room_exists(&room).await);
    assert_eq!(controller.open_ticket_for(&UserId::new("alice")).await, None);
}

#[tokio::test]
async fn stale_mapping_is_healed_on_the_next_open() {
    let (platform, controller) = setup();
    let old_room = open_ticket(&controller, "alice", t0()).await;

    // Room deleted out-of-band: the registry still maps alice to it.
    platform.forget_room(&old_room);
    assert_eq!(
        controller.open_ticket_for(&UserId::new("alice")).await,
        Some(old_room.clone())
    );

    let new_room = open_ticket(&controller, "alice", t0() + ChronoDuration::seconds(120)).await;
    assert_ne!(new_room, old_room);
    assert_eq!(
        controller.open_ticket_for(&UserId::new("alice")).await,
        Some(new_room)
    );
}

#[tokio::test]
async fn panel_requires_configuration_first() {
    let (_platform, controller) = setup();
    let ws = WorkspaceId::new("ws");

    let err = controller.panel(&ws).unwrap_err();
    assert!(matches!(err, TicketError::NotConfigured));

    let signal = controller
        .handle_event(Event::ConfigSubmit {
            workspace: ws.clone(),
            config: PanelConfig::new("Support", "Press the button to open a ticket.", "Open"),
        })
        .await
        .unwrap();
    assert_eq!(signal, Signal::ConfigSaved { workspace: ws.clone() });

    let panel = controller.panel(&ws).unwrap();
    assert_eq!(panel.title, "Support");

    // Latest write wins.
    controller
        .handle_event(Event::ConfigSubmit {
            workspace: ws.clone(),
            config: PanelConfig::new("Help desk", "Need a hand?", "Ask"),
        })
        .await
        .unwrap();
    assert_eq!(controller.panel(&ws).unwrap().title, "Help desk");
}
