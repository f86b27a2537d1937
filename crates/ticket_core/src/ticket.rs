//! The ticket state machine
//!
//! A ticket moves `Open → Claimed → Closing → Closed` and never backwards.
//! `Closing` exists so the archival step has a single well-defined entry
//! point: once a ticket is closing, the only remaining transition is
//! `complete()`, and repeated close requests are a no-op.

use crate::error::{Result, TicketError};
use crate::ids::{RoomId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketState {
    Open,
    Claimed,
    Closing,
    Closed,
}

/// Result of a `begin_close` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseBegin {
    /// The ticket just entered `Closing`; the caller owns the archival step.
    Started,
    /// The ticket was already `Closing`; nothing to do.
    AlreadyClosing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub owner: UserId,
    pub room: RoomId,
    /// Display name of the room, used for the transcript filename.
    pub room_name: String,
    pub state: TicketState,
    pub claimed_by: Option<UserId>,
    pub opened_at: DateTime<Utc>,
}

impl Ticket {
    /// A freshly provisioned ticket in state `Open`.
    pub fn open(
        owner: UserId,
        room: RoomId,
        room_name: impl Into<String>,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner,
            room,
            room_name: room_name.into(),
            state: TicketState::Open,
            claimed_by: None,
            opened_at,
        }
    }

    /// Claim the ticket for a staff member.
    ///
    /// Re-claiming an already claimed ticket is allowed and overwrites
    /// `claimed_by`. Claims on a closing or closed ticket are rejected.
    pub fn claim(&mut self, actor: &UserId, actor_has_staff_role: bool) -> Result<()> {
        if !actor_has_staff_role {
            return Err(TicketError::PermissionDenied);
        }
        match self.state {
            TicketState::Open | TicketState::Claimed => {
                self.state = TicketState::Claimed;
                self.claimed_by = Some(actor.clone());
                Ok(())
            }
            TicketState::Closing | TicketState::Closed => {
                Err(TicketError::InvalidTransition("claim on a closing ticket"))
            }
        }
    }

    /// Enter `Closing` from any non-terminal state.
    ///
    /// Idempotent while already `Closing` so a double-pressed close button
    /// cannot schedule the archival work twice.
    pub fn begin_close(&mut self) -> Result<CloseBegin> {
        match self.state {
            TicketState::Open | TicketState::Claimed => {
                self.state = TicketState::Closing;
                Ok(CloseBegin::Started)
            }
            TicketState::Closing => Ok(CloseBegin::AlreadyClosing),
            TicketState::Closed => Err(TicketError::InvalidTransition("close on a closed ticket")),
        }
    }

    /// Finish the close: `Closing → Closed`.
    pub fn complete(&mut self) -> Result<()> {
        match self.state {
            TicketState::Closing => {
                self.state = TicketState::Closed;
                Ok(())
            }
            _ => Err(TicketError::InvalidTransition(
                "complete on a ticket that is not closing",
            )),
        }
    }
}
