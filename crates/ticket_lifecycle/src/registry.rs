//! The ticket registry
//!
//! Source of truth for "does this user already have a ticket?". Each user
//! maps to at most one slot: either an active ticket or a reservation
//! taken while that user's room is still being provisioned. Reservations
//! are what make the open sequence atomic without holding the map lock
//! across platform I/O — a concurrent open from the same user hits the
//! reservation and is turned away.
//!
//! Mappings are only trusted as far as the platform confirms them: a slot
//! whose room was deleted out-of-band is purged the next time it is
//! consulted (`resolve_stale_or_active`).

use std::collections::HashMap;
use std::sync::Arc;
use ticket_core::{Result, RoomId, Ticket, TicketError, UserId};
use tokio::sync::Mutex;
use tracing::debug;

enum Slot {
    /// Room provisioning is in flight for this user.
    Provisioning,
    /// A live ticket. The ticket carries its own lock so claim/close can
    /// serialize per room without touching the registry.
    Active {
        room: RoomId,
        ticket: Arc<Mutex<Ticket>>,
    },
}

/// What the registry knows about a user right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No ticket on file.
    None,
    /// A room is currently being provisioned for this user.
    Pending,
    /// An active ticket exists in the given room.
    Active(RoomId),
    /// A mapping existed but its room is gone; the entry has been purged.
    Healed,
}

#[derive(Default)]
pub struct TicketRegistry {
    by_user: HashMap<UserId, Slot>,
    by_room: HashMap<RoomId, UserId>,
}

impl TicketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The user's current slot, taken at face value (no staleness check).
    pub fn current(&self, user: &UserId) -> Resolution {
        match self.by_user.get(user) {
            None => Resolution::None,
            Some(Slot::Provisioning) => Resolution::Pending,
            Some(Slot::Active { room, .. }) => Resolution::Active(room.clone()),
        }
    }

    /// The room of the user's active ticket, if any.
    pub fn lookup(&self, user: &UserId) -> Option<RoomId> {
        match self.by_user.get(user) {
            Some(Slot::Active { room, .. }) => Some(room.clone()),
            _ => None,
        }
    }

    /// Re-resolve a user's slot against the platform's word on whether the
    /// mapped room still exists. A mapping whose room is gone is purged and
    /// reported as `Healed`; the caller then proceeds as if no ticket
    /// existed.
    pub fn resolve_stale_or_active(
        &mut self,
        user: &UserId,
        room_still_exists: bool,
    ) -> Resolution {
        if let Some(Slot::Active { room, .. }) = self.by_user.get(user) {
            if !room_still_exists {
                let room = room.clone();
                self.by_user.remove(user);
                self.by_room.remove(&room);
                debug!(user = %user, room = %room, "purged stale ticket mapping");
                return Resolution::Healed;
            }
        }
        self.current(user)
    }

    /// Take the user's slot ahead of provisioning. Fails if any slot —
    /// active or pending — is already occupied.
    pub fn reserve(&mut self, user: &UserId) -> Result<()> {
        if self.by_user.contains_key(user) {
            return Err(TicketError::DuplicateTicket);
        }
        self.by_user.insert(user.clone(), Slot::Provisioning);
        Ok(())
    }

    /// Replace the user's slot (reservation or none) with a live ticket.
    pub fn activate(&mut self, user: &UserId, ticket: Ticket) -> Arc<Mutex<Ticket>> {
        let room = ticket.room.clone();
        let handle = Arc::new(Mutex::new(ticket));
        self.by_user.insert(
            user.clone(),
            Slot::Active {
                room: room.clone(),
                ticket: Arc::clone(&handle),
            },
        );
        self.by_room.insert(room, user.clone());
        handle
    }

    /// Register a ticket directly. Fails with `DuplicateTicket` when the
    /// user already has a slot.
    pub fn register(&mut self, user: &UserId, ticket: Ticket) -> Result<Arc<Mutex<Ticket>>> {
        if self.by_user.contains_key(user) {
            return Err(TicketError::DuplicateTicket);
        }
        Ok(self.activate(user, ticket))
    }

    /// Drop a reservation after a failed provisioning. Active slots are
    /// left untouched.
    pub fn cancel_reservation(&mut self, user: &UserId) {
        if matches!(self.by_user.get(user), Some(Slot::Provisioning)) {
            self.by_user.remove(user);
        }
    }

    /// Remove the entry whose room matches. No-op if absent.
    pub fn unregister_by_room(&mut self, room: &RoomId) -> Option<UserId> {
        let user = self.by_room.remove(room)?;
        self.by_user.remove(&user);
        Some(user)
    }

    /// Handle to the ticket living in the given room.
    pub fn ticket(&self, room: &RoomId) -> Option<Arc<Mutex<Ticket>>> {
        let user = self.by_room.get(room)?;
        match self.by_user.get(user) {
            Some(Slot::Active { ticket, .. }) => Some(Arc::clone(ticket)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.by_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_user.is_empty()
    }
}
